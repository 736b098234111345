//! Status line and presentation-layer hooks.
use serde::{Deserialize, Serialize};

use crate::data::City;

/// Transient HUD message with a countdown in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StatusMessage {
    pub text: String,
    pub remaining: f32,
}

impl StatusMessage {
    pub fn set(&mut self, text: impl Into<String>, duration: f32) {
        self.text = text.into();
        self.remaining = duration.max(0.0);
    }

    /// Count down and clear the text once the message expires.
    pub fn decay(&mut self, dt: f32) {
        if self.remaining <= 0.0 {
            return;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            self.text.clear();
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&str> {
        (!self.text.is_empty()).then_some(self.text.as_str())
    }
}

/// Capabilities supplied by the presentation layer. Every hook defaults to a
/// no-op so headless callers only override what they render.
pub trait SessionHooks {
    fn status_posted(&mut self, _text: &str, _duration: f32) {}

    fn city_changed(&mut self, _city: &City) {}

    fn breakdown_shown(&mut self, _description: &str, _cost: i64) {}

    fn breakdown_hidden(&mut self) {}

    fn dot_wheel_opened(&mut self) {}

    fn dot_wheel_closed(&mut self) {}
}

/// Hooks implementation that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl SessionHooks for NoopHooks {}
