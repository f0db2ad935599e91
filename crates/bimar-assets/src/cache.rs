//! Memoized asset loads keyed by URL.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};

use crate::error::Result;
use crate::source::AssetSource;

/// A load shared by every requester of the same URL.
pub type SharedLoad<T> = Shared<LocalBoxFuture<'static, Result<Arc<T>>>>;

type Decoder<T> = Rc<dyn Fn(&str, Vec<u8>) -> Result<T>>;

/// Decoded assets, one load per URL.
///
/// The first request for a URL starts the fetch; later requests, whether the load
/// is still pending or already done, get a clone of the same shared future. A
/// failed load stays failed: it is not retried.
pub struct AssetCache<T: 'static> {
    source: Rc<dyn AssetSource>,
    decode: Decoder<T>,
    loads: HashMap<String, SharedLoad<T>>,
}

impl<T: 'static> AssetCache<T> {
    pub fn new(
        source: Rc<dyn AssetSource>,
        decode: impl Fn(&str, Vec<u8>) -> Result<T> + 'static,
    ) -> Self {
        Self {
            source,
            decode: Rc::new(decode),
            loads: HashMap::new(),
        }
    }

    /// Returns the load for `url`, starting it on first use.
    pub fn load(&mut self, url: &str) -> SharedLoad<T> {
        if let Some(load) = self.loads.get(url) {
            return load.clone();
        }

        log::debug!("loading asset {url}");
        let fetch = self.source.fetch(url);
        let decode = Rc::clone(&self.decode);
        let owned_url = url.to_string();
        let load = async move {
            let bytes = fetch.await?;
            let asset = decode(&owned_url, bytes)?;
            log::info!("loaded asset {owned_url}");
            Ok(Arc::new(asset))
        }
        .boxed_local()
        .shared();

        self.loads.insert(url.to_string(), load.clone());
        load
    }

    /// Result of the load for `url` if it has finished.
    pub fn peek(&self, url: &str) -> Option<Result<Arc<T>>> {
        self.loads.get(url)?.peek().cloned()
    }

    /// Whether a load for `url` was ever started.
    pub fn contains(&self, url: &str) -> bool {
        self.loads.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetError;
    use crate::source::MemorySource;

    fn text_cache(source: &MemorySource) -> AssetCache<String> {
        AssetCache::new(Rc::new(source.clone()), |url, bytes| {
            String::from_utf8(bytes).map_err(|e| AssetError::decode(url, e))
        })
    }

    #[test]
    fn test_concurrent_requests_share_one_fetch() {
        let source = MemorySource::gated();
        source.insert("font.ttf", b"glyphs".to_vec());
        let mut cache = text_cache(&source);

        let first = cache.load("font.ttf");
        let second = cache.load("font.ttf");
        assert!(first.clone().now_or_never().is_none());
        assert_eq!(source.fetch_count("font.ttf"), 1);

        source.release();
        let a = first.now_or_never().unwrap().unwrap();
        let b = second.now_or_never().unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.as_str(), "glyphs");
    }

    #[test]
    fn test_completed_load_is_reused() {
        let source = MemorySource::new();
        source.insert("a", b"x".to_vec());
        let mut cache = text_cache(&source);

        cache.load("a").now_or_never().unwrap().unwrap();
        cache.load("a").now_or_never().unwrap().unwrap();
        assert_eq!(source.fetch_count("a"), 1);
        assert_eq!(cache.peek("a").unwrap().unwrap().as_str(), "x");
    }

    #[test]
    fn test_failure_is_memoized_not_retried() {
        let source = MemorySource::new();
        let mut cache = text_cache(&source);

        let err = cache.load("missing").now_or_never().unwrap().unwrap_err();
        assert!(matches!(err, AssetError::NotFound { .. }));

        // Appearing later does not help; the failed load is kept.
        source.insert("missing", b"late".to_vec());
        assert!(cache.load("missing").now_or_never().unwrap().is_err());
        assert_eq!(source.fetch_count("missing"), 1);
    }

    #[test]
    fn test_decode_error_surfaces() {
        let source = MemorySource::new();
        source.insert("bad", vec![0xff, 0xfe]);
        let mut cache = text_cache(&source);
        let err = cache.load("bad").now_or_never().unwrap().unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }
}
