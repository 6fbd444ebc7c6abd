use image::Rgb;
use std::path::PathBuf;

/// Colours, opacities and sizes used by the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderStyle {
    /// Weight of the masked copy when greying out committed polygons.
    pub mask_opacity: f32,
    /// Weight of the filled copy for a drawable shape in the live preview.
    pub preview_fill_opacity: f32,
    /// Weight of the filled copy in the composite overview.
    pub overview_opacity: f32,
    pub mask_color: Rgb<u8>,
    pub drawing_color: Rgb<u8>,
    pub saving_color: Rgb<u8>,
    pub label_color: Rgb<u8>,
    pub point_radius: i32,
    pub line_thickness: f32,
    /// Glyph height of labels, in pixels.
    pub label_scale: f32,
    /// Stroke width of labels, in pixels.
    pub label_stroke: i32,
    /// Horizontal shift per label character used to roughly centre labels.
    pub label_char_offset: i32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            mask_opacity: 0.8,
            preview_fill_opacity: 0.3,
            overview_opacity: 0.5,
            mask_color: Rgb([1, 1, 1]),
            drawing_color: Rgb([0, 255, 0]),
            saving_color: Rgb([255, 0, 0]),
            label_color: Rgb([255, 255, 255]),
            point_radius: 3,
            line_thickness: 2.0,
            label_scale: 32.0,
            label_stroke: 3,
            label_char_offset: 5,
        }
    }
}

/// Everything needed to start one annotation session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub image_path: PathBuf,
    pub output_dir: PathBuf,
    /// Label font; `None` uses the proportional font bundled with egui.
    pub font_path: Option<PathBuf>,
    /// Ask before ending the drawing phase with an uncommitted shape.
    pub confirm_discard: bool,
    pub window_size: [f32; 2],
    pub style: RenderStyle,
}

impl SessionConfig {
    pub fn new(image_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_path: image_path.into(),
            output_dir: output_dir.into(),
            font_path: None,
            confirm_discard: false,
            window_size: [1200.0, 800.0],
            style: RenderStyle::default(),
        }
    }
}
