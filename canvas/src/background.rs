//! Board background and its undo history.
//!
//! Exactly one background is active. Every change pushes the previous value
//! onto a bounded history; undo pops the most recent entry back into place.

#[cfg(test)]
#[path = "background_test.rs"]
mod background_test;

use serde::{Deserialize, Serialize};

use crate::consts::BACKGROUND_HISTORY_CAPACITY;

/// Inner stop of the default radial gradient, as RGB.
pub const DEFAULT_INNER_RGB: [u8; 3] = [0xFF, 0xF7, 0xD3];

/// Outer stop of the default radial gradient, as RGB.
pub const DEFAULT_OUTER_RGB: [u8; 3] = [0xFF, 0xE0, 0xB2];

/// The active board background.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum Background {
    /// The built-in two-stop radial gradient.
    #[default]
    Default,
    /// An image payload (data URI, URL or path), drawn cover-fit.
    Image(String),
}

impl Background {
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// The image payload, if this background is an image.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        match self {
            Self::Default => None,
            Self::Image(content) => Some(content),
        }
    }
}

/// Current background plus a bounded stack of prior values.
#[derive(Debug, Clone)]
pub struct BackgroundStack {
    current: Background,
    history: Vec<Background>,
    capacity: usize,
}

impl BackgroundStack {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(BACKGROUND_HISTORY_CAPACITY)
    }

    /// Create a stack that keeps at most `capacity` prior values.
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { current: Background::Default, history: Vec::new(), capacity: capacity.max(1) }
    }

    /// Push the current background and replace it with `content`.
    pub fn set_background(&mut self, content: impl Into<String>) {
        let next = Background::Image(content.into());
        let prev = std::mem::replace(&mut self.current, next);
        if self.history.len() == self.capacity {
            self.history.remove(0);
        }
        self.history.push(prev);
    }

    /// Restore the most recent prior background.
    ///
    /// Returns `false` (and changes nothing) when the history is empty.
    pub fn reset_background(&mut self) -> bool {
        let Some(prev) = self.history.pop() else {
            return false;
        };
        self.current = prev;
        true
    }

    #[must_use]
    pub fn current(&self) -> &Background {
        &self.current
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.current.is_default()
    }

    #[must_use]
    pub fn has_history(&self) -> bool {
        !self.history.is_empty()
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl Default for BackgroundStack {
    fn default() -> Self {
        Self::new()
    }
}
