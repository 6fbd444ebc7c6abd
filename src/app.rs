use eframe::egui;
use std::cell::RefCell;
use std::rc::Rc;

use crate::dispatch::{Command, InputEvent, Transition};
use crate::error::AnnotateError;
use crate::export::ExportReport;
use crate::model::Point;
use crate::prompt::LabelPrompt;
use crate::session::{Annotator, Phase};

/// Filled in when the window finishes; stays `None` if it is closed early.
pub type SharedOutcome = Rc<RefCell<Option<Result<ExportReport, AnnotateError>>>>;

const KEY_BINDINGS: [(egui::Key, char); 4] = [
    (egui::Key::U, 'u'),
    (egui::Key::C, 'c'),
    (egui::Key::S, 's'),
    (egui::Key::Q, 'q'),
];

// ── App ─────────────────────────────────────────────────────────────────────

pub struct AnnotateApp {
    annotator: Annotator,
    prompt: Box<dyn LabelPrompt>,
    confirm_discard: bool,
    outcome: SharedOutcome,

    texture: Option<egui::TextureHandle>,
    image_size: (f32, f32),
    // bumped on every state change; the texture is re-rendered when it moves
    revision: u64,
    shown_revision: Option<u64>,
    // the saving preview has been queued, prompt on the next pass
    label_pending: bool,

    // pan & zoom
    pan: egui::Vec2,
    zoom: f32,
    panning: bool,
}

impl AnnotateApp {
    pub fn new(
        annotator: Annotator,
        prompt: Box<dyn LabelPrompt>,
        confirm_discard: bool,
        outcome: SharedOutcome,
    ) -> Self {
        let original = annotator.session().original();
        let image_size = (original.width() as f32, original.height() as f32);
        Self {
            annotator,
            prompt,
            confirm_discard,
            outcome,
            texture: None,
            image_size,
            revision: 0,
            shown_revision: None,
            label_pending: false,
            pan: egui::Vec2::ZERO,
            zoom: 1.0,
            panning: false,
        }
    }

    /// Convert image-space coords to screen-space
    fn image_to_screen(&self, canvas_rect: egui::Rect, img_pos: egui::Pos2) -> egui::Pos2 {
        let center = canvas_rect.center();
        center
            + self.pan
            + (img_pos.to_vec2() - egui::vec2(self.image_size.0, self.image_size.1) * 0.5)
                * self.zoom
    }

    /// Convert screen-space coords to image-space
    fn screen_to_image(&self, canvas_rect: egui::Rect, screen_pos: egui::Pos2) -> egui::Pos2 {
        let center = canvas_rect.center();
        let rel = screen_pos - center - self.pan;
        egui::pos2(
            rel.x / self.zoom + self.image_size.0 * 0.5,
            rel.y / self.zoom + self.image_size.1 * 0.5,
        )
    }

    fn image_rect_on_screen(&self, canvas_rect: egui::Rect) -> egui::Rect {
        let top_left = self.image_to_screen(canvas_rect, egui::Pos2::ZERO);
        let bot_right = self.image_to_screen(
            canvas_rect,
            egui::pos2(self.image_size.0, self.image_size.1),
        );
        egui::Rect::from_min_max(top_left, bot_right)
    }

    /// Pixel under `screen_pos`, or `None` outside the raster.
    fn pixel_at(&self, canvas_rect: egui::Rect, screen_pos: egui::Pos2) -> Option<Point> {
        let p = self.screen_to_image(canvas_rect, screen_pos);
        if p.x < 0.0 || p.y < 0.0 || p.x >= self.image_size.0 || p.y >= self.image_size.1 {
            return None;
        }
        Some(Point::new(p.x.floor() as i32, p.y.floor() as i32))
    }

    fn refresh_texture(&mut self, ctx: &egui::Context) {
        if self.shown_revision == Some(self.revision) {
            return;
        }
        let frame = self.annotator.frame();
        let size = [frame.width() as usize, frame.height() as usize];
        let color_image = egui::ColorImage::from_rgb(size, frame.as_raw());
        match &mut self.texture {
            Some(tex) => tex.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("annotation", color_image, egui::TextureOptions::LINEAR));
            }
        }
        self.shown_revision = Some(self.revision);
    }

    fn dispatch(&mut self, ctx: &egui::Context, event: InputEvent) {
        match self.annotator.handle(event) {
            Transition::Unchanged => {}
            Transition::LabelRequested => {
                self.label_pending = true;
                self.revision += 1;
                ctx.request_repaint();
            }
            Transition::Quit { .. } if self.annotator.phase() == Phase::Finished => {
                self.finish(ctx);
            }
            Transition::BufferChanged | Transition::Quit { .. } => self.revision += 1,
        }
    }

    fn on_key(&mut self, ctx: &egui::Context, key: char) {
        let Some(command) = Command::from_key(key) else {
            return;
        };
        if command == Command::Quit
            && self.confirm_discard
            && self.annotator.phase() == Phase::Drawing
            && !self.annotator.buffer().is_empty()
            && !confirm_discard(self.annotator.buffer().len())
        {
            return;
        }
        self.dispatch(ctx, InputEvent::Command(command));
    }

    fn finish(&mut self, ctx: &egui::Context) {
        let result = self.annotator.finish();
        if let Err(err) = &result {
            log::error!("export failed: {err}");
        }
        *self.outcome.borrow_mut() = Some(result);
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn status_text(&self) -> String {
        let committed = self.annotator.session().polygons().len();
        match self.annotator.phase() {
            Phase::Drawing => format!(
                "Drawing | points: {} | objects: {committed} | double click: add point, u: undo, c: clear, s: save, q: done",
                self.annotator.buffer().len()
            ),
            Phase::Review => format!("Review | objects: {committed} | q: export and close"),
            Phase::Finished => "Exporting".to_string(),
        }
    }
}

fn confirm_discard(points: usize) -> bool {
    let answer = rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Warning)
        .set_title("Discard shape?")
        .set_description(format!(
            "The current shape has {points} uncommitted point(s). End drawing and discard it?"
        ))
        .set_buttons(rfd::MessageButtons::YesNo)
        .show();
    matches!(answer, rfd::MessageDialogResult::Yes)
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for AnnotateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested())
            && self.annotator.phase() != Phase::Finished
        {
            log::warn!("window closed before the review was quit; nothing exported");
        }

        // The saving preview went out last pass; now block for the label.
        if self.label_pending {
            self.label_pending = false;
            self.annotator.complete_label(self.prompt.as_mut());
            self.revision += 1;
        }

        // Keyboard commands
        let keys: Vec<char> = ctx.input(|i| {
            KEY_BINDINGS
                .iter()
                .filter(|(key, _)| i.key_pressed(*key))
                .map(|(_, c)| *c)
                .collect()
        });
        for key in keys {
            self.on_key(ctx, key);
        }

        // Status bar
        egui::TopBottomPanel::top("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status_text());
                ui.separator();
                ui.label(format!("Zoom: {:.0}%", self.zoom * 100.0));
            });
        });

        // Canvas
        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) = ui.allocate_painter(
                ui.available_size(),
                egui::Sense::click_and_drag(),
            );
            let canvas_rect = response.rect;

            painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));

            self.refresh_texture(ctx);
            if let Some(ref tex) = self.texture {
                let img_rect = self.image_rect_on_screen(canvas_rect);
                painter.image(
                    tex.id(),
                    img_rect,
                    egui::Rect::from_min_max(
                        egui::pos2(0.0, 0.0),
                        egui::pos2(1.0, 1.0),
                    ),
                    egui::Color32::WHITE,
                );
            }

            // Handle pan (middle mouse button)
            let middle_down = ctx.input(|i| i.pointer.middle_down());
            if middle_down {
                let delta = ctx.input(|i| i.pointer.delta());
                self.pan += delta;
                self.panning = true;
            } else {
                self.panning = false;
            }

            // Handle zoom (scroll wheel)
            let scroll_delta = ctx.input(|i| i.smooth_scroll_delta.y);
            if scroll_delta != 0.0 && response.hovered() {
                let zoom_factor = 1.0 + scroll_delta * 0.002;
                let new_zoom = (self.zoom * zoom_factor).clamp(0.1, 10.0);
                if let Some(cursor) = response.hover_pos() {
                    let center = canvas_rect.center();
                    let cursor_rel = cursor - center - self.pan;
                    self.pan -= cursor_rel * (new_zoom / self.zoom - 1.0);
                }
                self.zoom = new_zoom;
            }

            // Point placement (primary double click, not while panning)
            if !self.panning && response.double_clicked() {
                if let Some(point) = response
                    .interact_pointer_pos()
                    .and_then(|pos| self.pixel_at(canvas_rect, pos))
                {
                    self.dispatch(ctx, InputEvent::Click(point));
                }
            }
        });

        // Keep polling input while the texture is stale.
        if self.shown_revision != Some(self.revision) {
            ctx.request_repaint();
        }
    }
}
