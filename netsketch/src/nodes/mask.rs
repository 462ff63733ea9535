//! Pixel-level steps of node extraction: erase symbols and labels, isolate
//! wire strokes, bridge small gaps, label connected regions.

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
use imageproc::morphology;
use imageproc::point::Point as PixelPoint;
use imageproc::rect::Rect as PixelRect;
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::detection::{DetectedComponent, DetectedText};
use crate::geometry::{Rect, Shape};

/// Per-pixel region labels; 0 is background.
pub type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

const ERASE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Pixel coordinates are kept within `±PIXEL_LIMIT` so imageproc's
/// `left + width - 1` arithmetic cannot overflow.
const PIXEL_LIMIT: f64 = (1 << 20) as f64;

fn clamp_coord(v: f64) -> i32 {
    v.clamp(-PIXEL_LIMIT, PIXEL_LIMIT) as i32
}

/// Inclusive pixel rectangle for `rect`, or `None` if it cannot be drawn.
pub(crate) fn pixel_rect(rect: &Rect) -> Option<PixelRect> {
    if !rect.is_finite() {
        return None;
    }
    let r = rect.normalized();
    let (x1, y1) = (clamp_coord(r.x1), clamp_coord(r.y1));
    let (x2, y2) = (clamp_coord(r.x2), clamp_coord(r.y2));
    let width = (x2 - x1 + 1).max(1) as u32;
    let height = (y2 - y1 + 1).max(1) as u32;
    Some(PixelRect::at(x1, y1).of_size(width, height))
}

/// Polygon vertices as integer points, with a duplicated closing vertex
/// removed. `None` when fewer than three distinct vertices remain.
pub(crate) fn pixel_polygon(points: &[[f64; 2]]) -> Option<Vec<PixelPoint<i32>>> {
    if points.iter().any(|p| !p[0].is_finite() || !p[1].is_finite()) {
        return None;
    }
    let mut poly: Vec<PixelPoint<i32>> = points
        .iter()
        .map(|p| PixelPoint::new(clamp_coord(p[0]), clamp_coord(p[1])))
        .collect();
    poly.dedup();
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() < 3 {
        None
    } else {
        Some(poly)
    }
}

fn erase_shape(image: &mut RgbImage, shape: &Shape) {
    match shape {
        Shape::Rect(r) => {
            if let Some(rect) = pixel_rect(r) {
                draw_filled_rect_mut(image, rect, ERASE_COLOR);
            }
        }
        Shape::Polygon(points) => match pixel_polygon(points) {
            Some(poly) => draw_polygon_mut(image, &poly, ERASE_COLOR),
            // Slivers and two-point boxes still cover pixels; erase their extent.
            None => {
                if let Some(rect) = shape.bounding_rect().as_ref().and_then(pixel_rect) {
                    draw_filled_rect_mut(image, rect, ERASE_COLOR);
                }
            }
        },
    }
}

/// Copy of `image` with every component box and text region painted white,
/// leaving only wires.
pub fn erase_regions(
    image: &RgbImage,
    components: &[DetectedComponent],
    texts: &[DetectedText],
) -> RgbImage {
    let mut clean = image.clone();
    for component in components {
        erase_shape(&mut clean, &Shape::Rect(component.bbox));
    }
    for text in texts {
        erase_shape(&mut clean, &text.shape);
    }
    clean
}

/// Grayscale, then inverted threshold: pixels at or below `threshold`
/// become 255 (stroke), the rest 0.
pub fn binarize(image: &RgbImage, threshold: u8) -> GrayImage {
    let mut gray = image::imageops::grayscale(image);
    for pixel in gray.pixels_mut() {
        pixel[0] = if pixel[0] <= threshold { 255 } else { 0 };
    }
    gray
}

/// Dilate with a `kernel`×`kernel` square, `iterations` times.
pub fn dilate(mask: &GrayImage, kernel: u32, iterations: u32) -> GrayImage {
    let radius = (kernel / 2).min(u32::from(u8::MAX)) as u8;
    let mut out = mask.clone();
    if radius == 0 {
        return out;
    }
    for _ in 0..iterations {
        out = morphology::dilate(&out, Norm::LInf, radius);
    }
    out
}

/// 8-connected labelling of nonzero pixels.
pub fn label_regions(mask: &GrayImage) -> LabelImage {
    connected_components(mask, Connectivity::Eight, Luma([0u8]))
}
