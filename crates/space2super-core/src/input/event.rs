// Space2Super Input Layer - Raw Events
// The (code, action) pairs handed from an event source to the daemon

use crate::{Action, Key};

/// EV_KEY event type code from input-event-codes.h
pub const EV_KEY: u16 = 0x01;

/// Check if an event is a key event.
///
/// Keyboard keys and pointer buttons both arrive as EV_KEY; everything else
/// (EV_SYN, EV_REL, EV_MSC, ...) is irrelevant to the engine.
pub fn is_key_event(event_type: u16) -> bool {
    event_type == EV_KEY
}

/// One physical key or button transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub key: Key,
    pub action: Action,
}

impl RawEvent {
    pub fn new(key: impl Into<Key>, action: Action) -> Self {
        Self {
            key: key.into(),
            action,
        }
    }

    /// Decode an evdev (type, code, value) triple; `None` for non-key events
    /// and unknown values
    pub fn from_evdev(event_type: u16, code: u16, value: i32) -> Option<Self> {
        if !is_key_event(event_type) {
            return None;
        }
        Action::from_i32(value).map(|action| Self::new(code, action))
    }

    pub fn press(key: impl Into<Key>) -> Self {
        Self::new(key, Action::Press)
    }

    pub fn release(key: impl Into<Key>) -> Self {
        Self::new(key, Action::Release)
    }

    pub fn repeat(key: impl Into<Key>) -> Self {
        Self::new(key, Action::Repeat)
    }
}
