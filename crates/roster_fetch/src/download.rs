use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use engine::content::{
    character_folder_name, write_bytes_atomic, CharacterRecord, CharacterText, RosterWriteError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::fetch::{fetch_with_retry, FetchError, Fetcher, RetryPolicy};
use crate::layout::{
    assemble_record, check_folder_id, parse_json, CharacterSources, LayoutError, ANSWER_FILE,
    CHARACTER_DATA_FILE, DESCRIPTION_FILE, IDLE_INFO_FILE, IMAGE_FILES, SHORT_ANSWER_FILE,
    SIT_INFO_FILE, WALK_INFO_FILE,
};
use crate::{characters_dir, write_consolidated, CharacterFailure};

pub const DEFAULT_BASE_URL: &str =
    "https://raw.githubusercontent.com/Physda-Labs/technocracy/main/char_x1000";
pub const DEFAULT_CHARACTER_COUNT: u32 = 1000;
pub const DEFAULT_CONCURRENCY: usize = 10;

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub base_url: String,
    pub public_root: PathBuf,
    pub count: u32,
    pub concurrency: usize,
    /// Reuse files already on disk instead of fetching them again.
    pub resume: bool,
    pub retry: RetryPolicy,
}

impl DownloadOptions {
    pub fn new(public_root: PathBuf) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            public_root,
            count: DEFAULT_CHARACTER_COUNT,
            concurrency: DEFAULT_CONCURRENCY,
            resume: false,
            retry: RetryPolicy::default(),
        }
    }

    fn file_url(&self, folder: &str, file: &str) -> String {
        format!("{}/{folder}/{file}", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("{path} is not valid UTF-8")]
    NotUtf8 { path: PathBuf },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("download worker panicked")]
    WorkerPanicked,
}

#[derive(Debug)]
pub struct DownloadReport {
    pub records: usize,
    pub failed: Vec<CharacterFailure>,
    pub roster_path: PathBuf,
}

/// Fetches every file of one character into its folder and assembles the
/// record, text block included.
pub fn download_character(
    fetcher: &dyn Fetcher,
    options: &DownloadOptions,
    id: u32,
) -> Result<CharacterRecord, DownloadError> {
    let folder = character_folder_name(id);
    let dir = characters_dir(&options.public_root).join(&folder);
    let text = |file: &str| obtain_text(fetcher, options, &dir, &folder, file);

    let data_path = dir.join(CHARACTER_DATA_FILE);
    let data = parse_json(&data_path, &text(CHARACTER_DATA_FILE)?)?;
    let idle = parse_json(&dir.join(IDLE_INFO_FILE), &text(IDLE_INFO_FILE)?)?;
    let walk = parse_json(&dir.join(WALK_INFO_FILE), &text(WALK_INFO_FILE)?)?;
    let sit = parse_json(&dir.join(SIT_INFO_FILE), &text(SIT_INFO_FILE)?)?;
    let character_text = CharacterText {
        description: text(DESCRIPTION_FILE)?,
        answer: text(ANSWER_FILE)?,
        short_answer: text(SHORT_ANSWER_FILE)?,
    };

    for image in IMAGE_FILES {
        let path = dir.join(image);
        if options.resume && path.exists() {
            continue;
        }
        let bytes = fetch_with_retry(fetcher, &options.file_url(&folder, image), options.retry)?;
        write_file(&path, &bytes)?;
    }

    let sources = CharacterSources {
        data,
        idle,
        walk,
        sit,
        text: Some(character_text),
    };
    check_folder_id(&folder, sources.data.id)?;
    debug!(id, folder = %folder, "character_downloaded");
    Ok(assemble_record(&folder, sources))
}

fn obtain_text(
    fetcher: &dyn Fetcher,
    options: &DownloadOptions,
    dir: &Path,
    folder: &str,
    file: &str,
) -> Result<String, DownloadError> {
    let path = dir.join(file);
    if options.resume && path.exists() {
        return fs::read_to_string(&path).map_err(|source| DownloadError::Read { path, source });
    }
    let bytes = fetch_with_retry(fetcher, &options.file_url(folder, file), options.retry)?;
    let text = String::from_utf8(bytes).map_err(|_| DownloadError::NotUtf8 { path: path.clone() })?;
    write_file(&path, text.as_bytes())?;
    Ok(text)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), DownloadError> {
    write_bytes_atomic(path, bytes).map_err(|source| DownloadError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Downloads characters `1..=count` in batches of `concurrency`, then writes
/// the consolidated document from the ones that succeeded.
pub fn download_all(
    fetcher: &dyn Fetcher,
    options: &DownloadOptions,
) -> Result<DownloadReport, RosterWriteError> {
    let started = Instant::now();
    let ids: Vec<u32> = (1..=options.count).collect();
    let batch_size = options.concurrency.max(1);
    let mut records = Vec::with_capacity(ids.len());
    let mut failed = Vec::new();
    let mut completed = 0usize;

    info!(
        count = options.count,
        concurrency = batch_size,
        resume = options.resume,
        base_url = %options.base_url,
        "download_started"
    );

    for batch in ids.chunks(batch_size) {
        let results = thread::scope(|scope| {
            let workers: Vec<_> = batch
                .iter()
                .map(|&id| (id, scope.spawn(move || download_character(fetcher, options, id))))
                .collect();
            workers
                .into_iter()
                .map(|(id, worker)| {
                    let result = worker.join().unwrap_or(Err(DownloadError::WorkerPanicked));
                    (id, result)
                })
                .collect::<Vec<_>>()
        });

        for (id, result) in results {
            match result {
                Ok(record) => records.push(record),
                Err(error) => {
                    warn!(id, error = %error, "character_download_failed");
                    failed.push(CharacterFailure {
                        id,
                        reason: error.to_string(),
                    });
                }
            }
        }
        completed += batch.len();
        info!(
            completed,
            total = ids.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "download_progress"
        );
    }

    let roster_path = write_consolidated(&options.public_root, records.iter().cloned())?;
    info!(
        downloaded = records.len(),
        failed = failed.len(),
        path = %roster_path.display(),
        "download_finished"
    );
    Ok(DownloadReport {
        records: records.len(),
        failed,
        roster_path,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use engine::content::{load_roster, roster_path};
    use tempfile::TempDir;

    use super::*;
    use crate::fetch::fakes::MemoryFetcher;
    use crate::layout::fixtures::{raw_character, raw_sprite};
    use crate::layout::{JSON_FILES, TEXT_FILES};

    const BASE: &str = "https://assets.test/chars";

    fn options(root: &Path, count: u32) -> DownloadOptions {
        DownloadOptions {
            base_url: BASE.to_string(),
            public_root: root.to_path_buf(),
            count,
            concurrency: 3,
            resume: false,
            retry: RetryPolicy {
                attempts: 2,
                base_delay: Duration::ZERO,
            },
        }
    }

    fn url(id: u32, file: &str) -> String {
        format!("{BASE}/{}/{file}", character_folder_name(id))
    }

    fn serve_character(fetcher: &mut MemoryFetcher, id: u32) {
        let json = |value: String| value.into_bytes();
        fetcher.insert(
            url(id, CHARACTER_DATA_FILE),
            json(serde_json::to_string(&raw_character(id)).expect("json")),
        );
        for (file, name) in [
            (IDLE_INFO_FILE, "idle"),
            (WALK_INFO_FILE, "walk"),
            (SIT_INFO_FILE, "sit"),
        ] {
            fetcher.insert(
                url(id, file),
                json(serde_json::to_string(&raw_sprite(name)).expect("json")),
            );
        }
        fetcher.insert(url(id, DESCRIPTION_FILE), b"described".to_vec());
        fetcher.insert(url(id, ANSWER_FILE), b"answered".to_vec());
        fetcher.insert(url(id, SHORT_ANSWER_FILE), b"short".to_vec());
        for image in IMAGE_FILES {
            fetcher.insert(url(id, image), vec![0x89, b'P', b'N', b'G']);
        }
    }

    #[test]
    fn downloads_files_and_writes_consolidated_roster() {
        let temp = TempDir::new().expect("temp dir");
        let mut fetcher = MemoryFetcher::default();
        for id in 1..=4 {
            serve_character(&mut fetcher, id);
        }

        let report = download_all(&fetcher, &options(temp.path(), 4)).expect("download");
        assert_eq!(report.records, 4);
        assert!(report.failed.is_empty());
        assert_eq!(report.roster_path, roster_path(temp.path()));

        let folder = temp.path().join("characters").join("character_0002");
        for file in JSON_FILES.iter().chain(&TEXT_FILES).chain(&IMAGE_FILES) {
            assert!(folder.join(file).exists(), "{file} missing");
        }

        let roster = load_roster(&report.roster_path).expect("load roster");
        assert_eq!(roster.len(), 4);
        let record = roster.get(3).expect("character 3");
        let text = record.text.as_ref().expect("text block");
        assert_eq!(text.short_answer, "short");
        assert_eq!(record.sprites.idle.url, "/characters/character_0003/idle.png");
    }

    #[test]
    fn failed_character_is_reported_and_excluded() {
        let temp = TempDir::new().expect("temp dir");
        let mut fetcher = MemoryFetcher::default();
        for id in 1..=3 {
            serve_character(&mut fetcher, id);
        }
        fetcher.remove(&url(2, "walk.png"));

        let report = download_all(&fetcher, &options(temp.path(), 3)).expect("download");
        assert_eq!(report.records, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, 2);

        let roster = load_roster(&report.roster_path).expect("load roster");
        assert!(roster.get(2).is_none());
        assert!(roster.get(1).is_some());
    }

    #[test]
    fn flaky_file_is_retried_within_policy() {
        let temp = TempDir::new().expect("temp dir");
        let mut fetcher = MemoryFetcher::default();
        serve_character(&mut fetcher, 1);
        fetcher.fail_times(&url(1, "sit.png"), 1);

        let record = download_character(&fetcher, &options(temp.path(), 1), 1).expect("download");
        assert_eq!(record.id, 1);
        let sit_requests = fetcher
            .requests()
            .iter()
            .filter(|request| request.ends_with("sit.png"))
            .count();
        assert_eq!(sit_requests, 2);
    }

    #[test]
    fn resume_reads_local_files_and_skips_existing_images() {
        let temp = TempDir::new().expect("temp dir");
        let mut fetcher = MemoryFetcher::default();
        serve_character(&mut fetcher, 1);
        let mut opts = options(temp.path(), 1);
        download_character(&fetcher, &opts, 1).expect("first download");
        let first_requests = fetcher.requests().len();
        assert_eq!(first_requests, 10);

        opts.resume = true;
        let record = download_character(&fetcher, &opts, 1).expect("resumed download");
        assert_eq!(fetcher.requests().len(), first_requests);
        assert_eq!(record.text.expect("text").answer, "answered");
    }

    #[test]
    fn resume_fetches_only_missing_files() {
        let temp = TempDir::new().expect("temp dir");
        let mut fetcher = MemoryFetcher::default();
        serve_character(&mut fetcher, 1);
        let mut opts = options(temp.path(), 1);
        download_character(&fetcher, &opts, 1).expect("first download");
        let folder = temp.path().join("characters").join("character_0001");
        fs::remove_file(folder.join("idle.png")).expect("remove image");

        opts.resume = true;
        let before = fetcher.requests().len();
        download_character(&fetcher, &opts, 1).expect("resumed download");
        let new_requests = &fetcher.requests()[before..];
        assert_eq!(new_requests, [url(1, "idle.png")]);
    }
}
