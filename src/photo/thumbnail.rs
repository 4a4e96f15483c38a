use image::imageops::FilterType;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::state::data::AssetRef;

/// What the card view shows for an asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thumbnail {
    /// Path to a cached, resized JPEG
    Ready(PathBuf),
    /// Grey card; the source could not be decoded (yet)
    Placeholder,
}

/// Disk cache of resized photos.
///
/// Thumbnails are keyed by asset and size, so changing the configured size
/// simply produces new files next to the old ones.
#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    dir: PathBuf,
}

impl ThumbnailCache {
    /// Cache under ~/.cache/swipewipe/thumbnails on Linux
    pub fn new() -> Result<Self> {
        let mut dir = dirs_next::cache_dir()
            .or_else(dirs_next::home_dir)
            .ok_or(Error::NoDirectory("cache"))?;
        dir.push("swipewipe");
        dir.push("thumbnails");
        Self::at(dir)
    }

    pub fn at(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Expected cache path (doesn't generate)
    pub fn path_for(&self, asset: AssetRef, size: u32) -> PathBuf {
        self.dir.join(format!("{}_{}.jpg", asset.id(), size))
    }

    /// Produce a thumbnail for `asset` no larger than `size` on either side.
    ///
    /// Never fails: anything that goes wrong is logged and shown as a
    /// placeholder.
    pub fn fetch(
        &self,
        asset: AssetRef,
        source: PathBuf,
        size: u32,
    ) -> impl Future<Output = Thumbnail> + Send + 'static {
        let target = self.path_for(asset, size);
        async move {
            let result = tokio::task::spawn_blocking(move || generate(&source, &target, size)).await;
            match result {
                Ok(Ok(path)) => Thumbnail::Ready(path),
                Ok(Err(e)) => {
                    tracing::warn!(%asset, error = %e, "thumbnail generation failed");
                    Thumbnail::Placeholder
                }
                Err(e) => {
                    tracing::warn!(%asset, error = %e, "thumbnail task failed");
                    Thumbnail::Placeholder
                }
            }
        }
    }
}

fn generate(source: &Path, target: &Path, size: u32) -> Result<PathBuf> {
    if target.exists() {
        return Ok(target.to_path_buf());
    }

    let img = image::open(source)?;
    let thumbnail = img.resize(size, size, FilterType::Lanczos3);
    // JPEG has no alpha channel
    thumbnail.into_rgb8().save(target)?;

    tracing::debug!(path = %target.display(), "generated thumbnail");
    Ok(target.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_resizes_and_caches() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.png");
        image::RgbImage::from_pixel(64, 32, image::Rgb([200, 10, 10]))
            .save(&source)
            .unwrap();

        let cache = ThumbnailCache::at(dir.path().join("thumbs")).unwrap();
        let asset = AssetRef::new(7);
        let thumbnail = cache.fetch(asset, source.clone(), 16).await;

        let expected = cache.path_for(asset, 16);
        assert_eq!(thumbnail, Thumbnail::Ready(expected.clone()));
        let (w, h) = image::image_dimensions(&expected).unwrap();
        assert_eq!((w, h), (16, 8));

        // Second fetch reuses the cache even if the source is gone
        std::fs::remove_file(&source).unwrap();
        assert_eq!(cache.fetch(asset, source, 16).await, Thumbnail::Ready(expected));
    }

    #[tokio::test]
    async fn test_undecodable_source_gives_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.jpg");
        std::fs::write(&source, b"not a jpeg").unwrap();

        let cache = ThumbnailCache::at(dir.path().join("thumbs")).unwrap();
        let thumbnail = cache.fetch(AssetRef::new(1), source, 16).await;
        assert_eq!(thumbnail, Thumbnail::Placeholder);
    }
}
