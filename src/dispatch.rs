//! Input dispatcher for the drawing phase.
//!
//! Point clicks and key commands mutate the [`VertexBuffer`]; a save command on
//! a drawable shape freezes it in [`DrawState::AwaitingLabel`] until the caller
//! supplies a label through [`Dispatcher::accept_label`] or gives up with
//! [`Dispatcher::cancel_label`]. Rendering is never triggered from here.

use crate::model::{Point, Polygon, PolygonSet, VertexBuffer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawState {
    /// Buffer empty.
    IdleEmpty,
    /// One or two points, preview only.
    Drawing,
    /// Three or more points, eligible for commit.
    Drawable,
    /// Shape frozen while the label is requested.
    AwaitingLabel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Undo,
    Clear,
    Save,
    Quit,
}

impl Command {
    /// Operator key binding: `u`, `c`, `s`, `q`.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'u' => Some(Command::Undo),
            'c' => Some(Command::Clear),
            's' => Some(Command::Save),
            'q' => Some(Command::Quit),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Click(Point),
    Command(Command),
}

impl InputEvent {
    pub fn click(x: i32, y: i32) -> Self {
        InputEvent::Click(Point::new(x, y))
    }
}

/// What a single event did to the drawing state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed (invalid command context or ignored event).
    Unchanged,
    BufferChanged,
    /// The shape is frozen and a label must now be obtained.
    LabelRequested,
    /// Drawing phase over. `discarded` uncommitted points were dropped.
    Quit { discarded: usize },
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    buffer: VertexBuffer,
    awaiting_label: bool,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DrawState {
        if self.awaiting_label {
            return DrawState::AwaitingLabel;
        }
        match self.buffer.len() {
            0 => DrawState::IdleEmpty,
            n if n < crate::model::MIN_POLYGON_POINTS => DrawState::Drawing,
            _ => DrawState::Drawable,
        }
    }

    pub fn buffer(&self) -> &VertexBuffer {
        &self.buffer
    }

    pub fn handle(&mut self, event: InputEvent) -> Transition {
        if self.awaiting_label {
            log::trace!("ignoring {event:?} while a label is pending");
            return Transition::Unchanged;
        }

        let transition = match event {
            InputEvent::Click(point) => {
                self.buffer.push(point);
                Transition::BufferChanged
            }
            InputEvent::Command(Command::Undo) => match self.buffer.undo() {
                Some(_) => Transition::BufferChanged,
                None => Transition::Unchanged,
            },
            InputEvent::Command(Command::Clear) => {
                if self.buffer.is_empty() {
                    Transition::Unchanged
                } else {
                    self.buffer.clear();
                    Transition::BufferChanged
                }
            }
            InputEvent::Command(Command::Save) => {
                if self.buffer.is_committable() {
                    self.awaiting_label = true;
                    Transition::LabelRequested
                } else {
                    Transition::Unchanged
                }
            }
            InputEvent::Command(Command::Quit) => {
                let discarded = self.buffer.len();
                if discarded > 0 {
                    log::warn!("drawing ended with {discarded} uncommitted point(s); discarding them");
                }
                self.buffer.clear();
                Transition::Quit { discarded }
            }
        };
        log::debug!("{event:?} -> {transition:?} (state {:?})", self.state());
        transition
    }

    /// Commits the frozen shape under `label`. Any string is accepted.
    /// Returns the positional index of the new polygon, or `None` when no
    /// label was pending.
    pub fn accept_label(&mut self, label: String, polygons: &mut PolygonSet) -> Option<usize> {
        if !self.awaiting_label {
            return None;
        }
        self.awaiting_label = false;
        let points = self.buffer.take();
        // is_committable() was checked when the label was requested
        let polygon = Polygon::new(label, points)?;
        let index = polygons.push(polygon);
        log::info!("committed polygon {index}");
        Some(index)
    }

    /// Leaves the label request, keeping the buffer as it was.
    pub fn cancel_label(&mut self) {
        self.awaiting_label = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(c: char) -> InputEvent {
        InputEvent::Command(Command::from_key(c).unwrap())
    }

    #[test]
    fn clicks_walk_through_states() {
        let mut d = Dispatcher::new();
        assert_eq!(d.state(), DrawState::IdleEmpty);
        d.handle(InputEvent::click(1, 1));
        assert_eq!(d.state(), DrawState::Drawing);
        d.handle(InputEvent::click(2, 1));
        assert_eq!(d.state(), DrawState::Drawing);
        d.handle(InputEvent::click(2, 2));
        assert_eq!(d.state(), DrawState::Drawable);
        d.handle(InputEvent::click(1, 2));
        assert_eq!(d.state(), DrawState::Drawable);
    }

    #[test]
    fn save_below_minimum_is_ignored() {
        let mut d = Dispatcher::new();
        d.handle(InputEvent::click(1, 1));
        d.handle(InputEvent::click(2, 2));
        let before = d.buffer().clone();
        assert_eq!(d.handle(cmd('s')), Transition::Unchanged);
        assert_eq!(d.buffer(), &before);
        assert_eq!(d.state(), DrawState::Drawing);
    }

    #[test]
    fn save_then_label_commits_and_clears() {
        let mut d = Dispatcher::new();
        let mut set = PolygonSet::new();
        for (x, y) in [(10, 10), (50, 10), (50, 50)] {
            d.handle(InputEvent::click(x, y));
        }
        assert_eq!(d.handle(cmd('s')), Transition::LabelRequested);
        assert_eq!(d.state(), DrawState::AwaitingLabel);
        assert_eq!(d.accept_label("box".into(), &mut set), Some(0));
        assert_eq!(d.state(), DrawState::IdleEmpty);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0).unwrap().label(), "box");
    }

    #[test]
    fn events_are_ignored_while_awaiting_label() {
        let mut d = Dispatcher::new();
        for (x, y) in [(0, 0), (5, 0), (5, 5)] {
            d.handle(InputEvent::click(x, y));
        }
        d.handle(cmd('s'));
        assert_eq!(d.handle(InputEvent::click(9, 9)), Transition::Unchanged);
        assert_eq!(d.handle(cmd('c')), Transition::Unchanged);
        assert_eq!(d.buffer().len(), 3);
    }

    #[test]
    fn cancel_label_keeps_buffer() {
        let mut d = Dispatcher::new();
        for (x, y) in [(0, 0), (5, 0), (5, 5)] {
            d.handle(InputEvent::click(x, y));
        }
        d.handle(cmd('s'));
        d.cancel_label();
        assert_eq!(d.state(), DrawState::Drawable);
        assert_eq!(d.buffer().len(), 3);
    }

    #[test]
    fn accept_without_request_does_nothing() {
        let mut d = Dispatcher::new();
        let mut set = PolygonSet::new();
        for (x, y) in [(0, 0), (5, 0), (5, 5)] {
            d.handle(InputEvent::click(x, y));
        }
        assert_eq!(d.accept_label("x".into(), &mut set), None);
        assert!(set.is_empty());
        assert_eq!(d.buffer().len(), 3);
    }

    #[test]
    fn quit_discards_buffer() {
        let mut d = Dispatcher::new();
        d.handle(InputEvent::click(1, 1));
        d.handle(InputEvent::click(2, 2));
        assert_eq!(d.handle(cmd('q')), Transition::Quit { discarded: 2 });
        assert!(d.buffer().is_empty());
    }

    #[test]
    fn unknown_keys_map_to_nothing() {
        assert_eq!(Command::from_key('x'), None);
        assert_eq!(Command::from_key('U'), None);
    }
}
