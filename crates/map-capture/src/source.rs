use crate::cache::ImageCache;
use anyhow::{Context, Result};
use image::RgbaImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Produces the encoded bytes of a source map image for a key (URL or path).
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, key: &str) -> Result<Vec<u8>>;
}

/// Reads source images from disk. Relative keys resolve against `root`.
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageFetcher for FileFetcher {
    fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let path = Path::new(key);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

/// In-memory fetcher keyed by arbitrary strings
#[derive(Default)]
pub struct MemoryFetcher {
    images: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, bytes: Vec<u8>) {
        if let Ok(mut images) = self.images.write() {
            images.insert(key.to_string(), bytes);
        }
    }

    /// Register an image under `key`, stored PNG-encoded
    pub fn insert_image(&self, key: &str, image: &RgbaImage) -> Result<()> {
        self.insert(key, crate::encode_png(image)?);
        Ok(())
    }
}

impl ImageFetcher for MemoryFetcher {
    fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let images = self
            .images
            .read()
            .map_err(|_| anyhow::anyhow!("Image registry lock poisoned"))?;
        images
            .get(key)
            .cloned()
            .with_context(|| format!("No image registered for {}", key))
    }
}

/// Resolves source keys to decoded RGBA images, going through the cache first.
#[derive(Clone)]
pub struct ImageLoader {
    fetcher: Arc<dyn ImageFetcher>,
    cache: Arc<dyn ImageCache>,
}

impl ImageLoader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, cache: Arc<dyn ImageCache>) -> Self {
        Self { fetcher, cache }
    }

    pub fn cache(&self) -> &Arc<dyn ImageCache> {
        &self.cache
    }

    /// Cached original if present, otherwise fetch, decode and store it.
    pub fn load(&self, key: &str) -> Result<Arc<RgbaImage>> {
        if let Some(image) = self.cache.get_original(key) {
            debug!("Using cached original for {}", key);
            return Ok(image);
        }

        let bytes = self
            .fetcher
            .fetch(key)
            .with_context(|| format!("Failed to fetch {}", key))?;
        let image = image::load_from_memory(&bytes)
            .with_context(|| format!("Failed to decode {}", key))?
            .to_rgba8();

        info!("Fetched {} ({}x{})", key, image.width(), image.height());

        let image = Arc::new(image);
        self.cache.store_original(key, image.clone());
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TieredCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        inner: MemoryFetcher,
        calls: AtomicUsize,
    }

    impl ImageFetcher for CountingFetcher {
        fn fetch(&self, key: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(key)
        }
    }

    #[test]
    fn test_load_hits_cache_after_first_fetch() {
        let inner = MemoryFetcher::new();
        inner
            .insert_image("map", &RgbaImage::from_pixel(3, 3, image::Rgba([9, 9, 9, 255])))
            .unwrap();
        let fetcher = Arc::new(CountingFetcher {
            inner,
            calls: AtomicUsize::new(0),
        });
        let loader = ImageLoader::new(fetcher.clone(), Arc::new(TieredCache::new(2, 2)));

        let first = loader.load("map").unwrap();
        let second = loader.load("map").unwrap();
        assert_eq!(first.dimensions(), (3, 3));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_load_recomputes_without_cache_capacity() {
        let fetcher = Arc::new(MemoryFetcher::new());
        fetcher
            .insert_image("map", &RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255])))
            .unwrap();
        let loader = ImageLoader::new(fetcher, Arc::new(TieredCache::new(0, 0)));
        assert_eq!(loader.load("map").unwrap().get_pixel(1, 1)[2], 3);
        assert_eq!(loader.load("map").unwrap().get_pixel(1, 1)[2], 3);
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let loader = ImageLoader::new(
            Arc::new(MemoryFetcher::new()),
            Arc::new(TieredCache::new(1, 1)),
        );
        assert!(loader.load("absent").is_err());
    }

    #[test]
    fn test_file_fetcher_relative_key() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(4, 2, image::Rgba([0, 0, 0, 255]))
            .save(dir.path().join("map.png"))
            .unwrap();
        let loader = ImageLoader::new(
            Arc::new(FileFetcher::new(dir.path())),
            Arc::new(TieredCache::new(1, 1)),
        );
        assert_eq!(loader.load("map.png").unwrap().dimensions(), (4, 2));
    }
}
