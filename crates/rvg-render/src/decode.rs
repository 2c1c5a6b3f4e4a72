//! Raster inputs: decoding encoded images and handing pixels to Vello.

use peniko::{Blob, ImageAlphaType, ImageData, ImageFormat};
use rvg_core::{BackendError, RasterImage, Result};
use std::sync::Arc;

/// Decode PNG, JPEG or WebP bytes into RGBA pixels.
pub fn decode_image(bytes: &[u8]) -> Result<RasterImage> {
    let decoded = ::image::load_from_memory(bytes).map_err(|e| BackendError::UnsupportedFormat(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    log::debug!("decoded {}x{} image", width, height);
    RasterImage::new(width, height, rgba.into_vec())
}

/// Wrap pixels as peniko image data.
pub fn image_data(image: &RasterImage) -> ImageData {
    ImageData {
        data: Blob::new(Arc::new(image.pixels().to_vec())),
        format: ImageFormat::Rgba8,
        width: image.width(),
        height: image.height(),
        alpha_type: ImageAlphaType::Alpha,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvg_core::RvgError;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = ::image::RgbaImage::from_pixel(width, height, ::image::Rgba(rgba));
        let mut bytes = Vec::new();
        ::image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ::image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_png() {
        let image = decode_image(&png_bytes(3, 2, [10, 20, 30, 255])).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(&image.pixels()[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_garbage_is_unsupported_format() {
        let err = decode_image(b"not an image").unwrap_err();
        assert!(matches!(err, RvgError::Backend(BackendError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_image_data_keeps_size() {
        let image = RasterImage::solid(4, 5, [0, 0, 0, 255]).unwrap();
        let data = image_data(&image);
        assert_eq!((data.width, data.height), (4, 5));
        assert_eq!(data.data.data().len(), 80);
    }
}
