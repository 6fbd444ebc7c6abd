#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::path::Path;

use image::{Rgb, RgbImage};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use seg_annotate::dispatch::{Command, InputEvent};
use seg_annotate::export::OutputTargets;
use seg_annotate::prompt::LabelPrompt;
use seg_annotate::render::LabelFont;
use seg_annotate::session::{Annotator, Session};
use seg_annotate::RenderStyle;

pub const IMAGE_SIZE: u32 = 64;

/// Hands out labels from a fixed list; fails once the list is exhausted.
pub struct ScriptedPrompt {
    labels: VecDeque<String>,
    pub asked: usize,
}

impl ScriptedPrompt {
    pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            asked: 0,
        }
    }

    /// Answers every request with a numbered label.
    pub fn numbered(count: usize) -> Self {
        Self::new((0..count).map(|i| format!("obj{i}")))
    }
}

impl LabelPrompt for ScriptedPrompt {
    fn request_label(&mut self, _known: &[&str]) -> io::Result<String> {
        self.asked += 1;
        self.labels
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }
}

pub fn test_image() -> RgbImage {
    RgbImage::from_fn(IMAGE_SIZE, IMAGE_SIZE, |x, y| {
        Rgb([(x * 3) as u8, (y * 3) as u8, 128])
    })
}

pub fn annotator(output_dir: &Path) -> Annotator {
    let targets = OutputTargets::new(Path::new("scene.jpg"), output_dir);
    let font = LabelFont::bundled().expect("bundled font");
    Annotator::new(Session::new(
        test_image(),
        targets,
        font,
        RenderStyle::default(),
    ))
}

pub fn key(c: char) -> InputEvent {
    InputEvent::Command(Command::from_key(c).expect("bound key"))
}

pub fn clicks(points: &[(i32, i32)]) -> Vec<InputEvent> {
    points.iter().map(|&(x, y)| InputEvent::click(x, y)).collect()
}

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);
    let mut config = ProptestConfig::default();
    config.cases = cases;
    config
}

/// Drawing-phase events only (no quit).
pub fn arb_drawing_event() -> impl Strategy<Value = InputEvent> {
    let max = IMAGE_SIZE as i32 - 1;
    prop_oneof![
        6 => (0..=max, 0..=max).prop_map(|(x, y)| InputEvent::click(x, y)),
        1 => Just(key('u')),
        1 => Just(key('c')),
        2 => Just(key('s')),
    ]
}

pub fn arb_drawing_events(max_len: usize) -> impl Strategy<Value = Vec<InputEvent>> {
    prop::collection::vec(arb_drawing_event(), 0..max_len)
}

/// Shapes of 3..=8 in-bounds points with arbitrary labels.
pub fn arb_shapes(max_shapes: usize) -> impl Strategy<Value = Vec<(String, Vec<(i32, i32)>)>> {
    let max = IMAGE_SIZE as i32 - 1;
    let shape = (
        "[a-z ]{0,8}",
        prop::collection::vec((0..=max, 0..=max), 3..=8),
    );
    prop::collection::vec(shape, 0..max_shapes)
}
