use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1_000);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("roster_fetch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("giving up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

/// Source of remote file bodies. Shared across download workers.
pub trait Fetcher: Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().map_err(request_error)?;
        Ok(bytes.to_vec())
    }
}

/// Linear backoff: after failed attempt `n` the next try waits
/// `base_delay * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            base_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

pub fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    url: &str,
    policy: RetryPolicy,
) -> Result<Vec<u8>, FetchError> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match fetcher.fetch(url) {
            Ok(bytes) => return Ok(bytes),
            Err(error) if attempt >= attempts => {
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts,
                    last: Box::new(error),
                });
            }
            Err(error) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    url,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "fetch_retry"
                );
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory fetcher. Urls listed in `flaky` fail that many times
    /// before they start answering.
    #[derive(Default)]
    pub(crate) struct MemoryFetcher {
        files: HashMap<String, Vec<u8>>,
        flaky: Mutex<HashMap<String, u32>>,
        requests: Mutex<Vec<String>>,
    }

    impl MemoryFetcher {
        pub(crate) fn insert(&mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
            self.files.insert(url.into(), body.into());
        }

        pub(crate) fn remove(&mut self, url: &str) {
            self.files.remove(url);
        }

        pub(crate) fn fail_times(&self, url: &str, times: u32) {
            self.flaky
                .lock()
                .expect("flaky lock")
                .insert(url.to_string(), times);
        }

        pub(crate) fn requests(&self) -> Vec<String> {
            self.requests.lock().expect("requests lock").clone()
        }
    }

    impl Fetcher for MemoryFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.requests
                .lock()
                .expect("requests lock")
                .push(url.to_string());
            if let Some(remaining) = self.flaky.lock().expect("flaky lock").get_mut(url) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(FetchError::Status {
                        url: url.to_string(),
                        status: 503,
                    });
                }
            }
            self.files.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }
}
