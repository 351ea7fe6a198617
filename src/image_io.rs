// image_io.rs
// Decoding of uploaded payloads and encoding of result images

use crate::error::{ImageRole, LocateError, LocateResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{GrayImage, ImageFormat, Luma, RgbImage};
use std::io::Cursor;

/// Decode an uploaded payload into an 8-bit RGB image.
///
/// An empty payload counts as missing rather than malformed.
pub fn decode_rgb(bytes: &[u8], role: ImageRole) -> LocateResult<RgbImage> {
    if bytes.is_empty() {
        return Err(LocateError::MissingImage { role });
    }

    let decoded = image::load_from_memory(bytes).map_err(|e| LocateError::InvalidImage {
        role,
        reason: e.to_string(),
    })?;
    let rgb = decoded.to_rgb8();

    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(LocateError::InvalidImage {
            role,
            reason: format!("zero-sized image ({}x{})", rgb.width(), rgb.height()),
        });
    }
    Ok(rgb)
}

pub fn encode_png(image: &RgbImage) -> LocateResult<Vec<u8>> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| LocateError::internal(format!("PNG encoding failed: {e}")))?;
    Ok(buffer)
}

pub fn base64_encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Intensity with BT.601 weights (0.299, 0.587, 0.114) in 14-bit fixed
/// point, rounded to nearest.
pub fn luma_bt601(image: &RgbImage) -> GrayImage {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    const SHIFT: u32 = 14;

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let luma = (r as u32 * R + g as u32 * G + b as u32 * B + (1 << (SHIFT - 1))) >> SHIFT;
        Luma([luma as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use image::Rgb;

    #[test]
    fn test_png_roundtrip_preserves_pixels() {
        let image = RgbImage::from_fn(7, 5, |x, y| Rgb([x as u8 * 30, y as u8 * 40, 99]));
        let png = encode_png(&image).unwrap();
        let decoded = decode_rgb(&png, ImageRole::Puzzle).unwrap();
        assert_eq!(decoded.as_raw(), image.as_raw());
    }

    #[test]
    fn test_garbage_is_invalid() {
        let err = decode_rgb(b"definitely not an image", ImageRole::Piece).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidImage);
        assert!(matches!(err, LocateError::InvalidImage { role: ImageRole::Piece, .. }));
    }

    #[test]
    fn test_empty_payload_is_missing() {
        let err = decode_rgb(&[], ImageRole::Puzzle).unwrap_err();
        assert!(matches!(err, LocateError::MissingImage { role: ImageRole::Puzzle }));
    }

    #[test]
    fn test_luma_uses_bt601_weights() {
        let image = RgbImage::from_fn(5, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            2 => Rgb([0, 0, 255]),
            3 => Rgb([255, 255, 255]),
            _ => Rgb([10, 200, 60]),
        });

        let gray = luma_bt601(&image);

        let values: Vec<u8> = gray.pixels().map(|p| p[0]).collect();
        // 0.299*10 + 0.587*200 + 0.114*60 = 127.25
        assert_eq!(values, vec![76, 150, 29, 255, 127]);
    }

    #[test]
    fn test_base64_encoding() {
        assert_eq!(base64_encode(b"puzzle"), "cHV6emxl");
        assert_eq!(base64_encode(b"pi"), "cGk=");
    }
}
