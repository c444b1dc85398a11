//! Dirty/saved bookkeeping for one signature pad.

/// Coarse state of the pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PadState {
    /// Nothing drawn since the last clear.
    #[default]
    Empty,
    /// Unsaved strokes exist.
    Dirty,
    /// The current content was persisted.
    Saved,
}

/// Details of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSignature {
    pub saved_id: String,
    pub request_id_key: String,
    pub preview_image_url: String,
    pub stored_image_url: String,
}

/// Session state of one pad instance.
///
/// `is_dirty` and `is_saved` are never both set, and `saved_id` is present
/// only while the last terminal event was a successful save.
#[derive(Debug, Clone, Default)]
pub struct SignatureSession {
    is_dirty: bool,
    is_saved: bool,
    image_data: Option<Vec<u8>>,
    request_id_key: Option<String>,
    preview_image_url: Option<String>,
    stored_image_url: Option<String>,
    saved_id: Option<String>,
}

impl SignatureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn is_saved(&self) -> bool {
        self.is_saved
    }

    pub fn state(&self) -> PadState {
        if self.is_saved {
            PadState::Saved
        } else if self.is_dirty {
            PadState::Dirty
        } else {
            PadState::Empty
        }
    }

    /// Last encoded image captured from the surface.
    pub fn image_data(&self) -> Option<&[u8]> {
        self.image_data.as_deref()
    }

    pub fn request_id_key(&self) -> Option<&str> {
        self.request_id_key.as_deref()
    }

    pub fn preview_image_url(&self) -> Option<&str> {
        self.preview_image_url.as_deref()
    }

    pub fn stored_image_url(&self) -> Option<&str> {
        self.stored_image_url.as_deref()
    }

    pub fn saved_id(&self) -> Option<&str> {
        self.saved_id.as_deref()
    }

    /// A stroke was committed. `image_data` replaces the previous capture,
    /// so a failed encode leaves none rather than an older image.
    pub fn mark_stroke(&mut self, image_data: Option<Vec<u8>>) {
        self.is_dirty = true;
        self.is_saved = false;
        self.saved_id = None;
        self.image_data = image_data;
    }

    /// The surface was erased.
    pub fn mark_cleared(&mut self) {
        self.is_dirty = false;
        self.is_saved = false;
        self.saved_id = None;
        self.image_data = None;
    }

    /// The server accepted the signature.
    pub fn mark_saved(&mut self, saved: &SavedSignature) {
        self.is_dirty = false;
        self.is_saved = true;
        self.saved_id = Some(saved.saved_id.clone());
        self.request_id_key = Some(saved.request_id_key.clone());
        self.preview_image_url = Some(saved.preview_image_url.clone());
        self.stored_image_url = Some(saved.stored_image_url.clone());
    }

    /// A save attempt failed; the content counts as unsaved.
    pub fn mark_save_failed(&mut self) {
        self.is_dirty = true;
        self.is_saved = false;
        self.saved_id = None;
    }

    /// Record the image captured for an outgoing save.
    pub(crate) fn set_image_data(&mut self, image_data: Vec<u8>) {
        self.image_data = Some(image_data);
    }
}
