//! Inputs accepted by the orchestrator.

use crate::core::OCRError;
use crate::domain::Image;
use crate::utils::{load_image, load_image_from_memory};
use std::path::{Path, PathBuf};

/// Where the page image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// An image file on disk.
    Path(PathBuf),
    /// Encoded image bytes (JPEG, PNG, BMP, ...).
    Bytes(Vec<u8>),
    /// An already decoded image.
    Image(Image),
}

impl ImageSource {
    /// Reads and decodes the image. Blocking.
    pub fn load(self) -> Result<Image, OCRError> {
        match self {
            ImageSource::Path(path) => load_image(path),
            ImageSource::Bytes(bytes) => load_image_from_memory(&bytes),
            ImageSource::Image(image) => Ok(image),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<&str> for ImageSource {
    fn from(path: &str) -> Self {
        ImageSource::Path(PathBuf::from(path))
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

impl From<Image> for ImageSource {
    fn from(image: Image) -> Self {
        ImageSource::Image(image)
    }
}
