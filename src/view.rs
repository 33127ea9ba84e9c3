//! Terminal presentation
//!
//! Pure functions from a [`Snapshot`] to display text, plus a renderer that
//! writes a progress line only when the visible state changes.

use crate::upload::{Phase, Snapshot};
use std::io::Write;

const BAR_WIDTH: usize = 30;

/// One-line status message
pub fn status_line(snapshot: &Snapshot) -> String {
    match snapshot.state.phase {
        Phase::Idle => match &snapshot.file {
            Some(_) => "Ready to upload".to_string(),
            None => "Drop your file here or pass it on the command line".to_string(),
        },
        Phase::Uploading if snapshot.indeterminate => "Uploading...".to_string(),
        Phase::Uploading => format!("Uploading... {}%", snapshot.state.progress),
        Phase::Succeeded => "File uploaded successfully!".to_string(),
        Phase::Failed => snapshot.state.error.clone().unwrap_or_default(),
    }
}

/// Name and human-readable size of the selected file
pub fn file_line(snapshot: &Snapshot) -> Option<String> {
    snapshot
        .file
        .as_ref()
        .map(|f| format!("{} ({})", f.name, f.formatted_size))
}

/// Fixed-width progress bar, e.g. `[#######-------]`
pub fn progress_bar(progress: u8, width: usize) -> String {
    let filled = width * usize::from(progress.min(100)) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Writes progress lines, skipping snapshots that look the same
pub struct ProgressRenderer<W: Write> {
    out: W,
    last: Option<(Phase, u8, bool)>,
}

impl<W: Write> ProgressRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    /// Render a snapshot; returns whether a line was written
    pub fn render(&mut self, snapshot: &Snapshot) -> bool {
        let key = (
            snapshot.state.phase,
            snapshot.state.progress,
            snapshot.indeterminate,
        );
        if self.last == Some(key) {
            return false;
        }
        self.last = Some(key);

        let line = match snapshot.state.phase {
            Phase::Uploading if !snapshot.indeterminate => format!(
                "{} {}",
                progress_bar(snapshot.state.progress, BAR_WIDTH),
                status_line(snapshot)
            ),
            _ => status_line(snapshot),
        };

        if let Err(e) = writeln!(self.out, "{}", line) {
            tracing::debug!(error = %e, "Failed to write progress line");
        }
        true
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
