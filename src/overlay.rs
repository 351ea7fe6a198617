//! Result overlay: a box around the located piece, drawn on a copy of the
//! puzzle image

use crate::error::{LocateError, LocateResult};
use crate::image_io;
use crate::locate::Placement;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    /// Line thickness in pixels, centred on the box outline
    pub thickness: u32,
    pub color: [u8; 3],
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            thickness: 3,
            color: [0, 255, 0],
        }
    }
}

/// Inclusive corners of the box centred on the placement
pub fn box_corners(placement: &Placement) -> ((i32, i32), (i32, i32)) {
    let cx = placement.center_x as f64;
    let cy = placement.center_y as f64;
    let half_w = placement.width as f64 / 2.0;
    let half_h = placement.height as f64 / 2.0;
    (
        ((cx - half_w).trunc() as i32, (cy - half_h).trunc() as i32),
        ((cx + half_w).trunc() as i32, (cy + half_h).trunc() as i32),
    )
}

/// Copy `reference` and draw the placement box on the copy
pub fn draw_box(
    reference: &RgbImage,
    placement: &Placement,
    style: &OverlayStyle,
) -> LocateResult<RgbImage> {
    if placement.width == 0 || placement.height == 0 {
        return Err(LocateError::internal(format!(
            "cannot draw an empty {}x{} box",
            placement.width, placement.height
        )));
    }

    let mut boxed = reference.clone();
    let ((left, top), (right, bottom)) = box_corners(placement);
    let color = Rgb(style.color);

    // Nested outlines from -half to +half around the nominal edge
    let half = (style.thickness / 2) as i32;
    for offset in -half..(style.thickness as i32 - half) {
        let width = right - left + 1 + 2 * offset;
        let height = bottom - top + 1 + 2 * offset;
        if width <= 0 || height <= 0 {
            continue;
        }
        let rect = Rect::at(left - offset, top - offset).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(&mut boxed, rect, color);
    }

    Ok(boxed)
}

/// Draw the box and encode the result as PNG bytes
pub fn render_png(
    reference: &RgbImage,
    placement: &Placement,
    style: &OverlayStyle,
) -> LocateResult<Vec<u8>> {
    let boxed = draw_box(reference, placement, style)?;
    image_io::encode_png(&boxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(center_x: u32, center_y: u32, width: u32, height: u32) -> Placement {
        Placement {
            center_x,
            center_y,
            width,
            height,
        }
    }

    #[test]
    fn test_box_corners_truncate() {
        assert_eq!(box_corners(&placement(100, 100, 40, 40)), ((80, 80), (120, 120)));
        assert_eq!(box_corners(&placement(100, 50, 41, 9)), ((79, 45), (120, 54)));
    }

    #[test]
    fn test_draws_green_outline_without_touching_reference() {
        let reference = RgbImage::from_pixel(60, 60, Rgb([10, 10, 10]));
        let boxed = draw_box(&reference, &placement(30, 30, 20, 20), &OverlayStyle::default()).unwrap();

        // Nominal edge and both neighbours of a 3px line
        for x in [19, 20, 21] {
            assert_eq!(boxed.get_pixel(x, 30), &Rgb([0, 255, 0]));
        }
        // Centre untouched
        assert_eq!(boxed.get_pixel(30, 30), &Rgb([10, 10, 10]));
        assert_eq!(boxed.get_pixel(23, 30), &Rgb([10, 10, 10]));
        // Source image unchanged
        assert!(reference.pixels().all(|p| *p == Rgb([10, 10, 10])));
    }

    #[test]
    fn test_box_past_border_is_clipped() {
        let reference = RgbImage::from_pixel(30, 30, Rgb([0, 0, 0]));
        let boxed = draw_box(&reference, &placement(2, 2, 20, 20), &OverlayStyle::default()).unwrap();
        assert_eq!(boxed.dimensions(), (30, 30));
        assert_eq!(boxed.get_pixel(12, 0), &Rgb([0, 255, 0]));
    }

    #[test]
    fn test_empty_box_is_internal_error() {
        let reference = RgbImage::new(10, 10);
        let err = draw_box(&reference, &placement(5, 5, 0, 4), &OverlayStyle::default()).unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_render_png_decodes() {
        let reference = RgbImage::from_pixel(32, 24, Rgb([200, 0, 0]));
        let png = render_png(&reference, &placement(16, 12, 10, 10), &OverlayStyle::default()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (32, 24));
        assert_eq!(decoded.get_pixel(11, 12), &Rgb([0, 255, 0]));
    }
}
