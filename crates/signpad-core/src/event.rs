//! Events reported to the host listener.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of state transition being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignatureEventType {
    /// Strokes were drawn, or a save failed.
    Draw,
    /// The signature was persisted.
    Save,
    /// The surface was cleared.
    Clear,
}

impl SignatureEventType {
    /// Classify an event from its flags.
    pub fn classify(is_save: bool, is_dirty: bool) -> Self {
        if is_save {
            SignatureEventType::Save
        } else if !is_dirty {
            SignatureEventType::Clear
        } else {
            SignatureEventType::Draw
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureEventType::Draw => "DRAW",
            SignatureEventType::Save => "SAVE",
            SignatureEventType::Clear => "CLEAR",
        }
    }
}

impl fmt::Display for SignatureEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque reference to the host window that owns the pad.
///
/// The core only carries it through to listeners; web hosts replace it
/// with the real window object when handing the result to script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostTarget(String);

impl HostTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Payload handed to the listener with every event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResult {
    #[serde(skip)]
    pub target: HostTarget,
    pub is_save: bool,
    pub is_dirty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EventResult {
    pub fn event_type(&self) -> SignatureEventType {
        SignatureEventType::classify(self.is_save, self.is_dirty)
    }
}

/// Internal description of a transition, before it is shaped for the listener.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventData {
    pub is_save: bool,
    pub is_dirty: bool,
    pub saved_id: Option<String>,
    pub request_id_key: Option<String>,
    pub preview_image_url: Option<String>,
    /// Prefix; the saved id is appended when building the result.
    pub stored_image_url: Option<String>,
    pub error: Option<String>,
}

impl EventData {
    pub fn draw() -> Self {
        Self {
            is_dirty: true,
            ..Default::default()
        }
    }

    pub fn clear() -> Self {
        Self::default()
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_dirty: true,
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn into_result(self, target: HostTarget) -> EventResult {
        let saved_id = self.saved_id.unwrap_or_default();
        let stored_image_url = self.stored_image_url.map(|prefix| prefix + &saved_id);
        EventResult {
            target,
            is_save: self.is_save,
            is_dirty: self.is_dirty,
            request_id_key: self.request_id_key,
            preview_image_url: self.preview_image_url,
            stored_image_url,
            error: self.error,
        }
    }
}
