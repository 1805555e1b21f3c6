//! Image storage seam.
//!
//! The engine never decodes files on its own terms: it asks an [`ImageSource`]
//! for an RGB raster by reference, optionally resized. [`FsImageSource`] reads
//! files with the `image` crate; [`InMemoryImages`] serves already-decoded
//! rasters.

use crate::error::{Error, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extensions picked up by [`image_paths_from_folder`].
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Something that can resolve an image reference to pixels.
pub trait ImageSource {
    /// Load `reference` as RGB, resized to `size = (width, height)` when given.
    fn load(&self, reference: &str, size: Option<(u32, u32)>) -> Result<RgbImage>;
}

impl<T: ImageSource + ?Sized> ImageSource for &T {
    fn load(&self, reference: &str, size: Option<(u32, u32)>) -> Result<RgbImage> {
        (**self).load(reference, size)
    }
}

fn fit(img: RgbImage, size: Option<(u32, u32)>) -> RgbImage {
    match size {
        Some((w, h)) if img.dimensions() != (w, h) => {
            imageops::resize(&img, w, h, FilterType::Triangle)
        }
        _ => img,
    }
}

fn not_found(reference: &str) -> Error {
    Error::ImageLoad {
        reference: reference.to_string(),
        source: image::ImageError::IoError(io::Error::new(
            io::ErrorKind::NotFound,
            "no such image",
        )),
    }
}

/// Reads images from the filesystem, treating references as paths.
///
/// Relative references are resolved against `root` when one is set.
#[derive(Debug, Clone, Default)]
pub struct FsImageSource {
    root: Option<PathBuf>,
}

impl FsImageSource {
    /// Source resolving references as given.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative references against `root`.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    fn resolve(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ImageSource for FsImageSource {
    fn load(&self, reference: &str, size: Option<(u32, u32)>) -> Result<RgbImage> {
        let path = self.resolve(reference);
        let img = image::open(&path).map_err(|source| Error::ImageLoad {
            reference: reference.to_string(),
            source,
        })?;
        Ok(fit(img.to_rgb8(), size))
    }
}

/// Already-decoded images keyed by reference.
#[derive(Debug, Clone, Default)]
pub struct InMemoryImages {
    images: HashMap<String, RgbImage>,
}

impl InMemoryImages {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an image.
    pub fn insert(&mut self, reference: impl Into<String>, image: RgbImage) {
        let _ = self.images.insert(reference.into(), image);
    }

    /// Number of stored images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl FromIterator<(String, RgbImage)> for InMemoryImages {
    fn from_iter<T: IntoIterator<Item = (String, RgbImage)>>(iter: T) -> Self {
        Self {
            images: iter.into_iter().collect(),
        }
    }
}

impl ImageSource for InMemoryImages {
    fn load(&self, reference: &str, size: Option<(u32, u32)>) -> Result<RgbImage> {
        let img = self
            .images
            .get(reference)
            .ok_or_else(|| not_found(reference))?;
        Ok(fit(img.clone(), size))
    }
}

/// List image files (`.jpg`, `.jpeg`, `.png`) in `folder`, sorted by name.
///
/// `amount` limits how many paths are returned.
pub fn image_paths_from_folder(
    folder: impl AsRef<Path>,
    amount: Option<usize>,
) -> Result<Vec<PathBuf>> {
    let folder = folder.as_ref();
    let mut paths = Vec::new();
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if is_image && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    if let Some(limit) = amount {
        paths.truncate(limit);
    }
    debug!(folder = %folder.display(), count = paths.len(), "listed images");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_in_memory_resize() {
        let mut store = InMemoryImages::new();
        store.insert("a", RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])));

        let img = store.load("a", Some((2, 3))).unwrap();
        assert_eq!(img.dimensions(), (2, 3));
        assert_eq!(img.get_pixel(0, 0), &Rgb([10, 20, 30]));

        let err = store.load("b", None).unwrap_err();
        assert!(matches!(err, Error::ImageLoad { ref reference, .. } if reference == "b"));
    }

    #[test]
    fn test_fs_source_and_listing() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(3, 3, Rgb([255, 0, 0]))
            .save(dir.path().join("b.png"))
            .unwrap();
        RgbImage::from_pixel(3, 3, Rgb([0, 0, 255]))
            .save(dir.path().join("a.png"))
            .unwrap();
        fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

        let paths = image_paths_from_folder(dir.path(), None).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
        assert_eq!(image_paths_from_folder(dir.path(), Some(1)).unwrap().len(), 1);

        let source = FsImageSource::new().with_root(dir.path());
        let img = source.load("b.png", Some((6, 6))).unwrap();
        assert_eq!(img.dimensions(), (6, 6));
        assert_eq!(img.get_pixel(3, 3), &Rgb([255, 0, 0]));

        assert!(source.load("missing.png", None).is_err());
    }
}
