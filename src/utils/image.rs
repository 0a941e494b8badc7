//! Image loading.

use crate::core::OCRError;
use crate::domain::Image;
use std::path::Path;

/// Loads an image from disk and converts it to RGB8.
///
/// # Errors
///
/// * `OCRError::Io` if the file cannot be read.
/// * `OCRError::ImageDecode` if the bytes are not a supported image.
pub fn load_image(path: impl AsRef<Path>) -> Result<Image, OCRError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| OCRError::io_error(path, e))?;
    load_image_from_memory(&bytes).map_err(|e| match e {
        OCRError::ImageDecode { context, source } => OCRError::ImageDecode {
            context: format!("{}: {context}", path.display()),
            source,
        },
        other => other,
    })
}

/// Decodes an in-memory image (format guessed from its contents).
pub fn load_image_from_memory(bytes: &[u8]) -> Result<Image, OCRError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| OCRError::image_decode("failed to decode image", Some(e)))?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(OCRError::image_decode(
            format!("image has no pixels ({}x{})", decoded.width(), decoded.height()),
            None,
        ));
    }
    Image::from_dynamic(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(8, 4, Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_load_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let image = load_image(&path).unwrap();
        assert_eq!((image.width(), image.height(), image.channels()), (8, 4, 3));
        assert_eq!(image.as_rgb().get_pixel(3, 2), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_image(dir.path().join("absent.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_garbage_bytes_are_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        let err = load_image(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_truncated_png_is_decode_error() {
        let bytes = png_bytes();
        let err = load_image_from_memory(&bytes[..bytes.len() / 2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
