//! Annotated schematic rendering.
//!
//! Draws the result of one pass over the input photo: node regions tinted
//! with a per-node color, node markers with their netlist names, component
//! boxes with name and value, and OCR outlines. Images are RGB.

use std::path::Path;

use ab_glyph::FontVec;
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut,
};
use imageproc::rect::Rect as PixelRect;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::NetSketchError;
use crate::detection::{DetectedComponent, DetectedText};
use crate::geometry::Shape;
use crate::netlist::Netlist;
use crate::nodes::mask::{pixel_polygon, pixel_rect};
use crate::nodes::{NodeExtraction, GROUND};

const MARKER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const MARKER_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const COMPONENT_BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const COMPONENT_TEXT_COLOR: Rgb<u8> = Rgb([0, 100, 0]);
const TEXT_OUTLINE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

const MAX_LINE_THICKNESS: i32 = 32;

/// Label drawn for the ground node.
pub const GROUND_LABEL: &str = "Gnd";

/// Drawing settings for the annotated schematic.
pub struct RenderConfig {
    /// Font for labels. Without one, only shapes are drawn.
    pub font: Option<FontVec>,
    pub font_scale: f32,
    /// Weight of the node color over wire pixels.
    pub overlay_alpha: f32,
    pub marker_radius: i32,
    pub line_thickness: i32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font: None,
            font_scale: 16.0,
            overlay_alpha: 0.3,
            marker_radius: 15,
            line_thickness: 2,
        }
    }
}

impl RenderConfig {
    pub fn with_font_path(font_path: &Path) -> Result<Self, NetSketchError> {
        let data = std::fs::read(font_path)?;
        let font = FontVec::try_from_vec(data).map_err(|_| {
            NetSketchError::Font(format!("Failed to parse font file: {}", font_path.display()))
        })?;
        Ok(Self {
            font: Some(font),
            ..Self::default()
        })
    }

    /// Try a few well-known system fonts; fall back to shapes only.
    pub fn with_system_font() -> Self {
        let font_paths = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ];
        for path in &font_paths {
            if let Ok(data) = std::fs::read(path) {
                if let Ok(font) = FontVec::try_from_vec(data) {
                    tracing::debug!("Loaded system font: {}", path);
                    return Self {
                        font: Some(font),
                        ..Self::default()
                    };
                }
            }
        }
        tracing::debug!("No system font found, labels will be skipped");
        Self::default()
    }
}

/// Stable pseudo-random color for a raw node label.
pub fn node_color(id: u32) -> Rgb<u8> {
    let mut rng = StdRng::seed_from_u64(u64::from(id));
    Rgb([rng.gen(), rng.gen(), rng.gen()])
}

fn blend(base: Rgb<u8>, tint: Rgb<u8>, alpha: f32) -> Rgb<u8> {
    let mix = |b: u8, t: u8| -> u8 {
        (f32::from(b) * (1.0 - alpha) + f32::from(t) * alpha)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Rgb([mix(base[0], tint[0]), mix(base[1], tint[1]), mix(base[2], tint[2])])
}

/// Annotated copy of `original`.
///
/// `netlist` entries are expected in the same order as `components`.
pub fn render_schematic(
    original: &RgbImage,
    extraction: &NodeExtraction,
    components: &[DetectedComponent],
    texts: &[DetectedText],
    netlist: &Netlist,
    config: &RenderConfig,
) -> RgbImage {
    let mut out = original.clone();

    tint_nodes(&mut out, extraction, config.overlay_alpha);
    draw_node_markers(&mut out, extraction, config);
    draw_components(&mut out, components, netlist, config);
    for text in texts {
        draw_shape_outline(&mut out, &text.shape, config.line_thickness);
    }

    out
}

fn tint_nodes(img: &mut RgbImage, extraction: &NodeExtraction, alpha: f32) {
    if extraction.node_map.is_empty() || extraction.labels.dimensions() != img.dimensions() {
        return;
    }
    for (x, y, label) in extraction.labels.enumerate_pixels() {
        let id = label[0];
        if id == 0 || !extraction.node_map.contains(id) {
            continue;
        }
        let base = *img.get_pixel(x, y);
        img.put_pixel(x, y, blend(base, node_color(id), alpha));
    }
}

fn draw_node_markers(img: &mut RgbImage, extraction: &NodeExtraction, config: &RenderConfig) {
    for region in extraction.active_regions() {
        let Some(name) = extraction.node_map.name(region.id) else {
            continue;
        };
        let (cx, cy) = (region.centroid.x as i32, region.centroid.y as i32);
        draw_filled_circle_mut(img, (cx, cy), config.marker_radius, MARKER_COLOR);

        if let Some(font) = &config.font {
            let label = if name == GROUND { GROUND_LABEL } else { name };
            let half = (config.font_scale / 2.0) as i32;
            let offset = half * label.chars().count() as i32 / 2;
            draw_text_mut(
                img,
                MARKER_TEXT_COLOR,
                cx - offset,
                cy - half,
                config.font_scale,
                font,
                label,
            );
        }
    }
}

fn draw_components(
    img: &mut RgbImage,
    components: &[DetectedComponent],
    netlist: &Netlist,
    config: &RenderConfig,
) {
    for (i, component) in components.iter().enumerate() {
        let Some(rect) = pixel_rect(&component.bbox) else {
            continue;
        };
        draw_thick_rect(img, rect, config.line_thickness, COMPONENT_BOX_COLOR);

        let Some(font) = &config.font else {
            continue;
        };
        let caption = match netlist.entries.get(i) {
            Some(entry) => format!("{} {}", entry.name, entry.value),
            None => component.name.clone(),
        };
        let y = rect.top() - config.font_scale as i32 - 5;
        draw_text_mut(
            img,
            COMPONENT_TEXT_COLOR,
            rect.left(),
            y,
            config.font_scale,
            font,
            &caption,
        );
    }
}

fn draw_thick_rect(img: &mut RgbImage, rect: PixelRect, thickness: i32, color: Rgb<u8>) {
    for t in 0..thickness.clamp(1, MAX_LINE_THICKNESS) {
        let grown = PixelRect::at(rect.left() - t, rect.top() - t)
            .of_size(rect.width() + 2 * t as u32, rect.height() + 2 * t as u32);
        draw_hollow_rect_mut(img, grown, color);
    }
}

fn draw_shape_outline(img: &mut RgbImage, shape: &Shape, thickness: i32) {
    match shape {
        Shape::Rect(r) => {
            if let Some(rect) = pixel_rect(r) {
                draw_thick_rect(img, rect, thickness, TEXT_OUTLINE_COLOR);
            }
        }
        Shape::Polygon(points) => {
            let Some(poly) = pixel_polygon(points) else {
                if let Some(rect) = shape.bounding_rect().as_ref().and_then(pixel_rect) {
                    draw_thick_rect(img, rect, thickness, TEXT_OUTLINE_COLOR);
                }
                return;
            };
            for t in 0..thickness.clamp(1, MAX_LINE_THICKNESS) {
                let d = t as f32;
                for (i, a) in poly.iter().enumerate() {
                    let b = &poly[(i + 1) % poly.len()];
                    draw_line_segment_mut(
                        img,
                        (a.x as f32 + d, a.y as f32 + d),
                        (b.x as f32 + d, b.y as f32 + d),
                        TEXT_OUTLINE_COLOR,
                    );
                }
            }
        }
    }
}
