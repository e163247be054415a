//! Timed caption overlay.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One timed caption with a visibility window, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Overlay {
    /// Caption text (raw, unwrapped)
    pub text: String,
    /// First visible instant
    pub start: f64,
    /// First instant after the caption disappears
    pub end: f64,
}

impl Overlay {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    /// Whether the window satisfies `0 <= start < end` with finite bounds.
    pub fn has_valid_window(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start >= 0.0 && self.start < self.end
    }

    /// Visible duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
