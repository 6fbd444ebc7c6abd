//! One annotation session: the original raster, the committed polygons and
//! the output targets, driven through the drawing and review phases.

use image::RgbImage;

use crate::config::{RenderStyle, SessionConfig};
use crate::dispatch::{Command, Dispatcher, DrawState, InputEvent, Transition};
use crate::error::AnnotateError;
use crate::export::{self, ExportReport, OutputTargets};
use crate::model::{Point, PolygonSet};
use crate::prompt::LabelPrompt;
use crate::render::{self, LabelFont, LabelMode, PreviewMode};

pub const LEGEND: &str = "\nLEGEND:\n\
    u: Undo last insertion\n\
    c: Clear all insertions\n\
    s: Save points and go to the terminal to insert the label\n\
    q: Terminate the insertion\n";

pub struct Session {
    original: RgbImage,
    polygons: PolygonSet,
    targets: OutputTargets,
    font: LabelFont,
    style: RenderStyle,
}

impl Session {
    /// Loads the image and label font. Nothing is written until export.
    pub fn open(config: &SessionConfig) -> Result<Self, AnnotateError> {
        let original = image::open(&config.image_path)
            .map_err(|source| AnnotateError::ImageLoad {
                path: config.image_path.clone(),
                source,
            })?
            .to_rgb8();
        let font = LabelFont::load(config.font_path.as_deref())?;
        log::info!(
            "opened {} ({}x{})",
            config.image_path.display(),
            original.width(),
            original.height()
        );
        Ok(Self::new(
            original,
            OutputTargets::new(&config.image_path, &config.output_dir),
            font,
            config.style.clone(),
        ))
    }

    pub fn new(
        original: RgbImage,
        targets: OutputTargets,
        font: LabelFont,
        style: RenderStyle,
    ) -> Self {
        Self {
            original,
            polygons: PolygonSet::new(),
            targets,
            font,
            style,
        }
    }

    pub fn original(&self) -> &RgbImage {
        &self.original
    }

    pub fn polygons(&self) -> &PolygonSet {
        &self.polygons
    }

    pub fn targets(&self) -> &OutputTargets {
        &self.targets
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Drawing,
    /// Drawing is over; committed polygons are shown until quit.
    Review,
    /// Review quit; ready for export.
    Finished,
}

/// Drives a [`Session`] through both phases. State changes happen in
/// [`handle`](Self::handle) and [`complete_label`](Self::complete_label);
/// [`frame`](Self::frame) only reads.
pub struct Annotator {
    session: Session,
    dispatcher: Dispatcher,
    phase: Phase,
}

impl Annotator {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            dispatcher: Dispatcher::new(),
            phase: Phase::Drawing,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn draw_state(&self) -> DrawState {
        self.dispatcher.state()
    }

    pub fn buffer(&self) -> &[Point] {
        self.dispatcher.buffer().points()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn handle(&mut self, event: InputEvent) -> Transition {
        match self.phase {
            Phase::Drawing => {
                let transition = self.dispatcher.handle(event);
                if let Transition::Quit { .. } = transition {
                    self.phase = Phase::Review;
                    self.announce_review();
                }
                transition
            }
            Phase::Review => {
                if event == InputEvent::Command(Command::Quit) {
                    self.phase = Phase::Finished;
                    Transition::Quit { discarded: 0 }
                } else {
                    Transition::Unchanged
                }
            }
            Phase::Finished => Transition::Unchanged,
        }
    }

    /// Blocks on `prompt` for the pending label and commits the frozen shape.
    /// If the prompt fails the shape stays in the buffer, still drawable.
    pub fn complete_label(&mut self, prompt: &mut dyn LabelPrompt) -> Option<usize> {
        if self.dispatcher.state() != DrawState::AwaitingLabel {
            return None;
        }
        let answer = {
            let known = self.session.polygons.labels();
            prompt.request_label(&known)
        };
        match answer {
            Ok(label) => self
                .dispatcher
                .accept_label(label, &mut self.session.polygons),
            Err(err) => {
                log::warn!("label prompt failed, shape kept in buffer: {err}");
                self.dispatcher.cancel_label();
                None
            }
        }
    }

    /// The raster for the current phase.
    pub fn frame(&self) -> RgbImage {
        let s = &self.session;
        match self.phase {
            Phase::Drawing => {
                let mode = match self.dispatcher.state() {
                    DrawState::AwaitingLabel => PreviewMode::Saving,
                    _ => PreviewMode::Drawing,
                };
                render::live_preview(&s.original, &s.polygons, self.buffer(), &s.style, mode)
            }
            Phase::Review => self.overview(LabelMode::Plain),
            Phase::Finished => self.overview(LabelMode::Indexed),
        }
    }

    fn overview(&self, mode: LabelMode) -> RgbImage {
        let s = &self.session;
        render::composite_overview(&s.original, &s.polygons, &s.font, &s.style, mode)
    }

    /// Writes the final overlay and the polygon record.
    pub fn finish(&self) -> Result<ExportReport, AnnotateError> {
        let overlay = self.overview(LabelMode::Indexed);
        let report = export::write_outputs(&self.session.targets, &overlay, &self.session.polygons)?;
        println!("{}", report.record_path.display());
        Ok(report)
    }

    fn announce_review(&self) {
        println!("Committed {} object(s):", self.session.polygons.len());
        for (index, polygon) in self.session.polygons.iter().enumerate() {
            println!(
                "  {index}: {:?} ({} points)",
                polygon.label(),
                polygon.points().len()
            );
        }
        println!("\nReturn to the image and press q to close the window and terminate the process\n");
    }
}

/// Runs a scripted event sequence through both phases. Exports and returns
/// the report once the review phase is quit; returns `None` if the events
/// run out first.
pub fn replay<I>(
    annotator: &mut Annotator,
    events: I,
    prompt: &mut dyn LabelPrompt,
) -> Result<Option<ExportReport>, AnnotateError>
where
    I: IntoIterator<Item = InputEvent>,
{
    for event in events {
        match annotator.handle(event) {
            Transition::LabelRequested => {
                annotator.complete_label(prompt);
            }
            Transition::Quit { .. } if annotator.phase() == Phase::Finished => {
                return annotator.finish().map(Some);
            }
            _ => {}
        }
    }
    Ok(None)
}
