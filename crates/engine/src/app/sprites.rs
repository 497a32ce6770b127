use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, warn};

use crate::sprite_keys::{resolve_sprite_path, SpriteUrlError};

#[derive(Debug, Error)]
pub enum SpriteLoadError {
    #[error("invalid sprite url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: SpriteUrlError,
    },
    #[error("failed to open sprite {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode sprite {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("rgba buffer holds {actual} bytes, {width}x{height} needs {expected}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("failed to start sprite loader thread: {0}")]
    SpawnWorker(#[source] std::io::Error),
}

/// Decoded RGBA8 image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl SpriteImage {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, SpriteLoadError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(SpriteLoadError::BufferSize {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = self.rgba.get(offset..offset + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

#[derive(Debug)]
enum SpriteSlot {
    Ready(SpriteImage),
    Failed,
}

/// Shared view of one sprite that may still be loading. Clones observe the
/// same slot, which is filled exactly once by the loader.
#[derive(Debug, Clone, Default)]
pub struct SpriteHandle {
    slot: Arc<OnceLock<SpriteSlot>>,
}

impl SpriteHandle {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn ready(image: SpriteImage) -> Self {
        let handle = Self::default();
        handle.complete(Some(image));
        handle
    }

    pub fn failed() -> Self {
        let handle = Self::default();
        handle.complete(None);
        handle
    }

    /// The decoded image, only once loading has fully succeeded.
    pub fn image(&self) -> Option<&SpriteImage> {
        match self.slot.get() {
            Some(SpriteSlot::Ready(image)) => Some(image),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.slot.get(), Some(SpriteSlot::Failed))
    }

    fn complete(&self, image: Option<SpriteImage>) {
        let slot = match image {
            Some(image) => SpriteSlot::Ready(image),
            None => SpriteSlot::Failed,
        };
        let _ = self.slot.set(slot);
    }
}

struct LoadRequest {
    url: String,
    path: PathBuf,
    handle: SpriteHandle,
}

/// Background decoder for sprite sheets. Requests are fire-and-forget: the
/// caller gets a handle right away and draws nothing until it fills in.
pub struct SpriteLoader {
    public_root: PathBuf,
    sender: Option<Sender<LoadRequest>>,
    cancelled: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    handles: HashMap<String, SpriteHandle>,
}

impl SpriteLoader {
    pub fn spawn(public_root: PathBuf) -> Result<Self, SpriteLoadError> {
        let (sender, receiver) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker_cancelled = Arc::clone(&cancelled);
        let worker = thread::Builder::new()
            .name("sprite-loader".to_string())
            .spawn(move || run_worker(receiver, worker_cancelled))
            .map_err(SpriteLoadError::SpawnWorker)?;
        Ok(Self {
            public_root,
            sender: Some(sender),
            cancelled,
            worker: Some(worker),
            handles: HashMap::new(),
        })
    }

    pub fn request(&mut self, url: &str) -> SpriteHandle {
        if let Some(existing) = self.handles.get(url) {
            return existing.clone();
        }
        let handle = match resolve_sprite_path(&self.public_root, url) {
            Ok(path) => self.enqueue(url, path),
            Err(source) => {
                let error = SpriteLoadError::InvalidUrl {
                    url: url.to_string(),
                    source,
                };
                warn!(url, error = %error, "sprite_load_failed");
                SpriteHandle::failed()
            }
        };
        self.handles.insert(url.to_string(), handle.clone());
        handle
    }

    fn enqueue(&self, url: &str, path: PathBuf) -> SpriteHandle {
        let handle = SpriteHandle::pending();
        let request = LoadRequest {
            url: url.to_string(),
            path,
            handle: handle.clone(),
        };
        let sent = self
            .sender
            .as_ref()
            .is_some_and(|sender| sender.send(request).is_ok());
        if !sent {
            warn!(url, "sprite_loader_unavailable");
            handle.complete(None);
        }
        handle
    }
}

impl Drop for SpriteLoader {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
        self.sender = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("sprite_loader_worker_panicked");
            }
        }
    }
}

fn run_worker(receiver: Receiver<LoadRequest>, cancelled: Arc<AtomicBool>) {
    for request in receiver {
        if cancelled.load(Ordering::Relaxed) {
            break;
        }
        match load_sprite_rgba(&request.path) {
            Ok(image) => {
                debug!(url = %request.url, width = image.width, height = image.height, "sprite_loaded");
                request.handle.complete(Some(image));
            }
            Err(error) => {
                warn!(url = %request.url, error = %error, "sprite_load_failed");
                request.handle.complete(None);
            }
        }
    }
}

pub fn load_sprite_rgba(path: &Path) -> Result<SpriteImage, SpriteLoadError> {
    let reader = ImageReader::open(path).map_err(|source| SpriteLoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| SpriteLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let image = decoded.to_rgba8();
    let (width, height) = (image.width(), image.height());
    SpriteImage::from_rgba(width, height, image.into_raw())
}
