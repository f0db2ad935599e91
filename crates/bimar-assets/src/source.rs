//! Byte sources that assets are fetched from.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};

use crate::error::{AssetError, Result};

/// Fetches the raw bytes behind a URL.
///
/// Fetching never blocks the caller; the returned future is polled from the frame
/// loop until it resolves.
pub trait AssetSource {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>>>;
}

/// Reads assets from a directory on disk.
///
/// Each read runs on a short-lived thread that only reports back through a oneshot
/// channel, so the frame loop never waits on the filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl AssetSource for FileSource {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>>> {
        let url = url.to_string();
        let path = self.root.join(&url);
        let (sender, receiver) = oneshot::channel();

        let spawned = std::thread::Builder::new()
            .name("bimar-asset-read".to_string())
            .spawn(move || {
                // The requester may have gone away; nothing to report to then.
                sender.send(std::fs::read(&path)).ok();
            });

        async move {
            if let Err(err) = spawned {
                return Err(AssetError::io(&url, &err));
            }
            match receiver.await {
                Ok(Ok(bytes)) => {
                    log::debug!("read {} bytes from {url}", bytes.len());
                    Ok(bytes)
                }
                Ok(Err(err)) => Err(AssetError::io(&url, &err)),
                Err(oneshot::Canceled) => Err(AssetError::Cancelled { url }),
            }
        }
        .boxed_local()
    }
}

#[derive(Default)]
struct MemoryInner {
    files: HashMap<String, Vec<u8>>,
    fetch_counts: HashMap<String, usize>,
    gated: bool,
    waiting: Vec<(String, oneshot::Sender<Result<Vec<u8>>>)>,
}

impl MemoryInner {
    fn lookup(&self, url: &str) -> Result<Vec<u8>> {
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| AssetError::NotFound {
                url: url.to_string(),
            })
    }
}

/// In-memory source with fetch accounting.
///
/// Clones share the same storage. A gated source holds every fetch pending until
/// [`MemorySource::release`], which lets callers observe in-flight loads.
#[derive(Clone, Default)]
pub struct MemorySource {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose fetches stay pending until released.
    pub fn gated() -> Self {
        let source = Self::default();
        source.inner.borrow_mut().gated = true;
        source
    }

    pub fn insert(&self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.inner
            .borrow_mut()
            .files
            .insert(url.into(), bytes.into());
    }

    /// Completes all pending fetches with the current contents and ungates the source.
    pub fn release(&self) {
        let waiting = {
            let mut inner = self.inner.borrow_mut();
            inner.gated = false;
            std::mem::take(&mut inner.waiting)
        };
        for (url, sender) in waiting {
            let result = self.inner.borrow().lookup(&url);
            sender.send(result).ok();
        }
    }

    /// Number of fetches issued for `url`.
    pub fn fetch_count(&self, url: &str) -> usize {
        self.inner
            .borrow()
            .fetch_counts
            .get(url)
            .copied()
            .unwrap_or(0)
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Vec<u8>>> {
        let mut inner = self.inner.borrow_mut();
        *inner.fetch_counts.entry(url.to_string()).or_default() += 1;

        if !inner.gated {
            return future::ready(inner.lookup(url)).boxed_local();
        }

        let (sender, receiver) = oneshot::channel();
        inner.waiting.push((url.to_string(), sender));
        let url = url.to_string();
        async move {
            receiver
                .await
                .unwrap_or(Err(AssetError::Cancelled { url }))
        }
        .boxed_local()
    }
}
