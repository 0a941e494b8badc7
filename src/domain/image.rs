use crate::core::OCRError;
use image::{DynamicImage, RgbImage};
use std::sync::Arc;

/// A decoded input image in RGB8 layout.
///
/// The pixel buffer is immutable and shared, so cloning an `Image` is cheap and
/// every region worker can read it concurrently.
#[derive(Clone)]
pub struct Image {
    pixels: Arc<RgbImage>,
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("channels", &self.channels())
            .finish()
    }
}

impl Image {
    /// Wraps an RGB buffer. Empty images are rejected.
    pub fn from_rgb(pixels: RgbImage) -> Result<Self, OCRError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(OCRError::invalid_input(format!(
                "image must not be empty, got {}x{}",
                pixels.width(),
                pixels.height()
            )));
        }
        Ok(Self {
            pixels: Arc::new(pixels),
        })
    }

    /// Converts any decoded image to RGB8, dropping alpha and expanding grayscale.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self, OCRError> {
        Self::from_rgb(image.into_rgb8())
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Number of channels per pixel; always 3.
    pub fn channels(&self) -> usize {
        3
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_grayscale_is_expanded_to_rgb() {
        let gray = GrayImage::from_pixel(4, 2, Luma([200]));
        let image = Image::from_dynamic(DynamicImage::ImageLuma8(gray)).unwrap();
        assert_eq!((image.width(), image.height(), image.channels()), (4, 2, 3));
        assert_eq!(image.as_rgb().get_pixel(3, 1).0, [200, 200, 200]);
    }

    #[test]
    fn test_empty_image_rejected() {
        assert!(Image::from_rgb(RgbImage::new(0, 10)).is_err());
    }
}
