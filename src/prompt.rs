//! Blocking label request for a just-completed shape.

use std::io::{self, BufRead, Write};

/// Obtains a label for the shape that was just frozen. Implementations block
/// until a value is available; whatever text comes back is accepted as-is.
pub trait LabelPrompt {
    /// `known_labels` are the distinct labels used so far, offered as hints.
    fn request_label(&mut self, known_labels: &[&str]) -> io::Result<String>;
}

/// Shows a desktop notice, then reads one line from the terminal.
pub struct TerminalPrompt<R> {
    input: R,
    notify: bool,
}

impl TerminalPrompt<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self {
            input: io::stdin().lock(),
            notify: true,
        }
    }
}

impl<R: BufRead> TerminalPrompt<R> {
    /// Reads from `input` without the desktop notice.
    pub fn from_reader(input: R) -> Self {
        Self {
            input,
            notify: false,
        }
    }
}

impl<R: BufRead> LabelPrompt for TerminalPrompt<R> {
    fn request_label(&mut self, known_labels: &[&str]) -> io::Result<String> {
        if self.notify {
            rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Info)
                .set_title("Insert label")
                .set_description("Go back to the terminal and insert the label of the selected object")
                .set_buttons(rfd::MessageButtons::Ok)
                .show();
        }

        let mut out = io::stdout().lock();
        if !known_labels.is_empty() {
            writeln!(out, "Labels used so far:")?;
            for label in known_labels {
                writeln!(out, "  {label}")?;
            }
        }
        write!(out, "Insert the label to assign to the object: ")?;
        out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "label input closed",
            ));
        }
        let label = line.trim_end_matches(|c: char| c == '\r' || c == '\n').to_string();

        writeln!(out, "Go back to the image and continue to select other objects")?;
        writeln!(out, "'u':undo, 'c':clear, 's':save, 'q':quit\n")?;
        Ok(label)
    }
}
