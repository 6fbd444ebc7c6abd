//! Manual polygon segmentation of a still image.
//!
//! The operator double-clicks vertices onto the image, commits each shape
//! under a label typed in the terminal, reviews the result and exports a
//! labelled overlay PNG plus a JSON record of every polygon, for comparison
//! against an automated segmentation.
//!
//! # Modules
//!
//! - [`model`]: points, the vertex buffer, polygons and the committed set
//! - [`dispatch`]: the drawing-phase input state machine
//! - [`session`]: session state and the two-phase driver
//! - [`render`]: live preview and composite overview rasters
//! - [`prompt`]: blocking label request
//! - [`export`]: output files and record reload
//! - [`app`]: the annotation window

pub mod app;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod model;
pub mod prompt;
pub mod render;
pub mod session;

use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui;

pub use config::{RenderStyle, SessionConfig};
pub use error::AnnotateError;

/// Runs one manual segmentation session.
///
/// Returns `Ok(false)` when the session could not start (unreadable image or
/// font, no window) or the window was closed before the review was quit, and
/// `Ok(true)` once both outputs are written. Export failures are returned as
/// errors; files already written are left in place.
pub fn run(config: SessionConfig) -> Result<bool, AnnotateError> {
    let session = match session::Session::open(&config) {
        Ok(session) => session,
        Err(err) => {
            log::error!("{err}");
            return Ok(false);
        }
    };

    println!("DOUBLE CLICK to insert a point.");
    println!("{}", session::LEGEND);

    let outcome: app::SharedOutcome = Rc::new(RefCell::new(None));
    let app = app::AnnotateApp::new(
        session::Annotator::new(session),
        Box::new(prompt::TerminalPrompt::stdin()),
        config.confirm_discard,
        Rc::clone(&outcome),
    );

    let title = "Select the objects";
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_title(title),
        ..Default::default()
    };

    if let Err(err) = eframe::run_native(
        title,
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    ) {
        log::error!("{}", AnnotateError::Window(err.to_string()));
        return Ok(false);
    }

    let result = outcome.borrow_mut().take();
    match result {
        Some(Ok(report)) => {
            log::info!(
                "session complete: {} polygon(s) exported",
                report.polygon_count
            );
            Ok(true)
        }
        Some(Err(err)) => Err(err),
        None => Ok(false),
    }
}
