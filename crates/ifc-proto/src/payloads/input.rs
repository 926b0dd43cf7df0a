//! Input forwarding payloads.
//!
//! Keyboard and click events happen inside the client's document, but some
//! host features (global shortcuts, dropdown dismissal) need to see them.

use serde::{Deserialize, Serialize};

/// A key chord.
///
/// Used both by the host to register global shortcuts (in `env_init`) and by
/// the client to echo a chord that fired (`registeredKeyFired`). Absent
/// modifiers mean "not pressed".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyData {
    /// Key value (`KeyboardEvent.key`).
    pub key: String,

    /// Physical key code (`KeyboardEvent.code`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Alt / Option held.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_key: Option<bool>,

    /// Control held.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctrl_key: Option<bool>,

    /// Meta / Command held.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_key: Option<bool>,

    /// Shift held.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_key: Option<bool>,
}

impl KeyData {
    /// Chord for a bare key with no modifiers.
    pub fn key(key: impl Into<String>) -> Self {
        Self { key: key.into(), ..Self::default() }
    }

    /// Whether a key press satisfies this registered chord.
    ///
    /// Keys compare case-insensitively; every modifier must agree.
    pub fn matches(&self, pressed: &KeyData) -> bool {
        self.key.eq_ignore_ascii_case(&pressed.key)
            && self.alt_key.unwrap_or(false) == pressed.alt_key.unwrap_or(false)
            && self.ctrl_key.unwrap_or(false) == pressed.ctrl_key.unwrap_or(false)
            && self.meta_key.unwrap_or(false) == pressed.meta_key.unwrap_or(false)
            && self.shift_key.unwrap_or(false) == pressed.shift_key.unwrap_or(false)
    }
}

/// Click signal forwarded from a client frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickData {
    /// Whether the original event bubbled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bubbles: Option<bool>,

    /// Whether the original event was cancelable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelable: Option<bool>,
}
