//! Raster rendering of annotation state.
//!
//! Every function here takes the state by reference and returns a fresh
//! image; the original raster is only ever read.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut, draw_text_mut};
use std::path::Path;

use crate::config::RenderStyle;
use crate::error::AnnotateError;
use crate::model::{Point, PolygonSet};

/// How labels are written in the composite overview.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelMode {
    /// Label text only, used while reviewing.
    Plain,
    /// `"<index> - <label>"`, used for the exported image.
    Indexed,
}

/// Which colour the in-progress shape is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewMode {
    Drawing,
    /// Shape frozen while its label is being requested.
    Saving,
}

// ── Label font ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct LabelFont {
    font: FontArc,
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelFont")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl LabelFont {
    /// The proportional font egui ships by default.
    pub fn bundled() -> Result<Self, AnnotateError> {
        let defs = egui::FontDefinitions::default();
        let data = defs
            .families
            .get(&egui::FontFamily::Proportional)
            .and_then(|names| names.first())
            .and_then(|name| defs.font_data.get(name))
            .ok_or_else(|| AnnotateError::Font("no bundled proportional font".to_string()))?;
        Self::from_bytes(data.font.to_vec())
    }

    pub fn from_file(path: &Path) -> Result<Self, AnnotateError> {
        let bytes = std::fs::read(path)
            .map_err(|e| AnnotateError::Font(format!("{}: {e}", path.display())))?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, AnnotateError> {
        FontArc::try_from_vec(bytes)
            .map(|font| Self { font })
            .map_err(|e| AnnotateError::Font(e.to_string()))
    }

    pub fn load(path: Option<&Path>) -> Result<Self, AnnotateError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::bundled(),
        }
    }
}

// ── Views ───────────────────────────────────────────────────────────────────

/// The original raster with every committed polygon greyed out.
pub fn committed_backdrop(
    original: &RgbImage,
    polygons: &PolygonSet,
    style: &RenderStyle,
) -> RgbImage {
    let mut masked = original.clone();
    for polygon in polygons {
        fill_polygon(&mut masked, polygon.points(), style.mask_color);
    }
    blend(&masked, style.mask_opacity, original)
}

/// Backdrop plus the shape being drawn: a dot, a segment, or a translucent
/// closed polygon depending on how many points it has.
pub fn live_preview(
    original: &RgbImage,
    polygons: &PolygonSet,
    buffer: &[Point],
    style: &RenderStyle,
    mode: PreviewMode,
) -> RgbImage {
    let mut image = committed_backdrop(original, polygons, style);
    let color = match mode {
        PreviewMode::Drawing => style.drawing_color,
        PreviewMode::Saving => style.saving_color,
    };

    match buffer {
        [] => {}
        [p] => draw_filled_circle_mut(&mut image, (p.x, p.y), style.point_radius, color),
        [a, b] => draw_thick_line(&mut image, *a, *b, style.line_thickness, color),
        points => {
            let plain = image.clone();
            fill_polygon(&mut image, points, color);
            image = blend(&image, style.preview_fill_opacity, &plain);
            draw_closed_outline(&mut image, points, style.line_thickness, color);
        }
    }
    image
}

/// All committed polygons filled and labelled at their centroid, blended
/// over the original raster.
pub fn composite_overview(
    original: &RgbImage,
    polygons: &PolygonSet,
    font: &LabelFont,
    style: &RenderStyle,
    mode: LabelMode,
) -> RgbImage {
    let mut image = original.clone();
    for (index, polygon) in polygons.iter().enumerate() {
        fill_polygon(&mut image, polygon.points(), style.mask_color);

        let centre = polygon.centroid();
        let shift = polygon.label().chars().count() as i32 * style.label_char_offset;
        let text = match mode {
            LabelMode::Plain => polygon.label().to_string(),
            LabelMode::Indexed => format!("{index} - {}", polygon.label()),
        };
        draw_label(&mut image, &text, centre.x - shift, centre.y, font, style);
    }
    blend(&image, style.overview_opacity, original)
}

// ── Primitives ──────────────────────────────────────────────────────────────

/// Per-channel `top * alpha + bottom * (1 - alpha)`, rounded half-to-even.
pub fn blend(top: &RgbImage, alpha: f32, bottom: &RgbImage) -> RgbImage {
    debug_assert_eq!(top.dimensions(), bottom.dimensions());
    let mut out = top.clone();
    for (o, b) in out.pixels_mut().zip(bottom.pixels()) {
        for c in 0..3 {
            let v = o.0[c] as f32 * alpha + b.0[c] as f32 * (1.0 - alpha);
            o.0[c] = v.round_ties_even().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

fn fill_polygon(img: &mut RgbImage, points: &[Point], color: Rgb<u8>) {
    let mut poly: Vec<imageproc::point::Point<i32>> = points
        .iter()
        .map(|p| imageproc::point::Point::new(p.x, p.y))
        .collect();
    // imageproc rejects an explicitly closed ring
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() < 3 {
        return;
    }
    draw_polygon_mut(img, &poly, color);
}

fn draw_closed_outline(img: &mut RgbImage, points: &[Point], thickness: f32, color: Rgb<u8>) {
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        draw_thick_line(img, *a, b, thickness, color);
    }
}

fn draw_thick_line(img: &mut RgbImage, from: Point, to: Point, thickness: f32, color: Rgb<u8>) {
    let (x0, y0) = (from.x as f32, from.y as f32);
    let dx = to.x as f32 - x0;
    let dy = to.y as f32 - y0;
    let len = (dx * dx + dy * dy).sqrt();
    let steps = (len * 2.0) as i32;
    let half_t = (thickness / 2.0).max(0.5) as i32;
    let (w, h) = (img.width() as i32, img.height() as i32);

    for i in 0..=steps {
        let t = i as f32 / steps.max(1) as f32;
        let cx = (x0 + dx * t).round() as i32;
        let cy = (y0 + dy * t).round() as i32;
        for oy in -half_t..=half_t {
            for ox in -half_t..=half_t {
                let px = cx + ox;
                let py = cy + oy;
                if px >= 0 && px < w && py >= 0 && py < h {
                    img.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}

/// Writes `text` with its baseline starting at `(x, baseline)`.
fn draw_label(
    img: &mut RgbImage,
    text: &str,
    x: i32,
    baseline: i32,
    font: &LabelFont,
    style: &RenderStyle,
) {
    if text.is_empty() {
        return;
    }
    let scale = PxScale::from(style.label_scale);
    let ascent = font.font.as_scaled(scale).ascent().round() as i32;
    let top = baseline - ascent;
    let r = style.label_stroke / 2;
    for oy in -r..=r {
        for ox in -r..=r {
            draw_text_mut(img, style.label_color, x + ox, top + oy, scale, &font.font, text);
        }
    }
}
