//! SignPad Web
//!
//! Binds the core signature pad to a page: a `<canvas>`, the hidden image
//! field, the signature form and its save/clear buttons. The bindings
//! themselves only exist on wasm; the option types are shared so they can be
//! tested natively.

use serde::Deserialize;
use signpad_core::SignPadConfig;

/// Element ids the pad looks up on the page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementIds {
    pub image_field: String,
    pub form: String,
    pub save_button: String,
    pub clear_button: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            image_field: "signatureImage".to_string(),
            form: "signatureForm".to_string(),
            save_button: "save".to_string(),
            clear_button: "clear".to_string(),
        }
    }
}

/// Window that listeners receive as `result.target`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetWindow {
    /// The embedding page (the pad usually lives in an iframe).
    #[default]
    Parent,
    /// The window the pad itself runs in.
    #[serde(rename = "self")]
    Current,
}

impl TargetWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetWindow::Parent => "parent",
            TargetWindow::Current => "self",
        }
    }
}

/// Options accepted by `prepare`, as a plain JS object.
///
/// Pad configuration keys (`options`, `savePath`, `imageField`,
/// `exportFormat`) sit at the top level next to `elements` and `target`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebOptions {
    #[serde(flatten)]
    pub config: SignPadConfig,
    pub elements: ElementIds,
    pub target: TargetWindow,
}

impl WebOptions {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::WebSignaturePad;
