//! Thin adapter over the `image` crate.
//!
//! The container is detected from the file content, never from its extension,
//! and only GIF, JPEG and PNG are accepted. Animated GIFs yield their first frame.

use std::path::Path;

use image::{ImageFormat, RgbImage};
use palette::Srgb;

use crate::error::{DecodeError, MIN_IMAGE_BYTES, PaletteError};

/// Anything the sampler can walk: known dimensions and a fallible RGB read.
pub trait PixelSource {
    fn dimensions(&self) -> (u32, u32);

    fn pixel(&self, x: u32, y: u32) -> Result<Srgb<u8>, DecodeError>;
}

/// A fully decoded raster, flattened to 8-bit RGB.
pub struct DecodedImage {
    format: ImageFormat,
    pixels: RgbImage,
}

impl DecodedImage {
    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

impl PixelSource for DecodedImage {
    fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn pixel(&self, x: u32, y: u32) -> Result<Srgb<u8>, DecodeError> {
        let px = self
            .pixels
            .get_pixel_checked(x, y)
            .ok_or(DecodeError::PixelOutOfRange { x, y })?;
        Ok(Srgb::new(px[0], px[1], px[2]))
    }
}

impl PixelSource for RgbImage {
    fn dimensions(&self) -> (u32, u32) {
        RgbImage::dimensions(self)
    }

    fn pixel(&self, x: u32, y: u32) -> Result<Srgb<u8>, DecodeError> {
        let px = self
            .get_pixel_checked(x, y)
            .ok_or(DecodeError::PixelOutOfRange { x, y })?;
        Ok(Srgb::new(px[0], px[1], px[2]))
    }
}

/// Decode an in-memory image buffer.
pub fn decode_bytes(input: &[u8]) -> Result<DecodedImage, DecodeError> {
    if input.len() < MIN_IMAGE_BYTES {
        return Err(DecodeError::TooSmall { size: input.len() });
    }

    let format = image::guess_format(input).map_err(|_| DecodeError::UnknownFormat)?;
    match format {
        ImageFormat::Gif | ImageFormat::Jpeg | ImageFormat::Png => {}
        other => return Err(DecodeError::Unsupported(other)),
    }

    let img = image::load_from_memory_with_format(input, format)?;
    Ok(DecodedImage {
        format,
        pixels: img.to_rgb8(),
    })
}

/// Read and decode an image file.
pub fn decode_file(path: &Path) -> Result<DecodedImage, PaletteError> {
    let bytes = std::fs::read(path).map_err(|e| {
        PaletteError::io(format!("Image {} is not readable", path.display()), e)
    })?;
    let decoded = decode_bytes(&bytes).map_err(|e| PaletteError::decode(path, e))?;
    tracing::debug!(
        path = %path.display(),
        format = ?decoded.format,
        width = decoded.pixels.width(),
        height = decoded.pixels.height(),
        "Decoded image"
    );
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::io::Cursor;

    fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn decodes_png_by_content() {
        let img = RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]));
        let decoded = decode_bytes(&encode(&img, ImageFormat::Png)).unwrap();
        assert_eq!(decoded.format(), ImageFormat::Png);
        assert_eq!(PixelSource::dimensions(&decoded), (3, 2));
        assert_eq!(decoded.pixel(2, 1).unwrap(), Srgb::new(10, 20, 30));
    }

    #[test]
    fn decodes_gif() {
        let img = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let decoded = decode_bytes(&encode(&img, ImageFormat::Gif)).unwrap();
        assert_eq!(decoded.format(), ImageFormat::Gif);
        assert_eq!(PixelSource::dimensions(&decoded), (4, 4));
    }

    #[test]
    fn rejects_tiny_input() {
        let err = decode_bytes(b"GIF89a").err().unwrap();
        assert!(matches!(err, DecodeError::TooSmall { size: 6 }));
    }

    #[test]
    fn rejects_unknown_content() {
        let err = decode_bytes(b"#!/bin/sh\necho not an image\n").err().unwrap();
        assert!(matches!(err, DecodeError::UnknownFormat));
    }

    #[test]
    fn rejects_recognized_but_unsupported_container() {
        let img = RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]));
        let err = decode_bytes(&encode(&img, ImageFormat::Bmp)).err().unwrap();
        assert!(matches!(err, DecodeError::Unsupported(ImageFormat::Bmp)));
    }

    #[test]
    fn truncated_png_is_a_decoder_error() {
        let img = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        let bytes = encode(&img, ImageFormat::Png);
        let err = decode_bytes(&bytes[..20]).err().unwrap();
        assert!(matches!(err, DecodeError::Decoder(_)));
    }

    #[test]
    fn out_of_range_pixel_fails() {
        let img = RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]));
        let err = img.pixel(2, 0).err().unwrap();
        assert!(matches!(err, DecodeError::PixelOutOfRange { x: 2, y: 0 }));
    }
}
