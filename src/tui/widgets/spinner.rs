//! Spinner shown while device calls are in flight.

use std::time::Instant;

/// Braille spinner frames.
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Animation speed in milliseconds per frame.
const FRAME_DURATION_MS: u128 = 100;

/// Spinner state for animated indicators.
#[derive(Debug, Clone)]
pub struct Spinner {
    start_time: Instant,
    label: String,
}

impl Spinner {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            start_time: Instant::now(),
            label: label.into(),
        }
    }

    /// Returns the current frame of the animation.
    pub fn frame(&self) -> &'static str {
        let elapsed_ms = self.start_time.elapsed().as_millis();
        let frame_index = (elapsed_ms / FRAME_DURATION_MS) as usize;
        FRAMES[frame_index % FRAMES.len()]
    }

    /// Frame and label, with the in-flight count when more than one call is running.
    pub fn display(&self, pending: usize) -> String {
        if pending > 1 {
            format!("{} {} ({pending})", self.frame(), self.label)
        } else {
            format!("{} {}", self.frame(), self.label)
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}
