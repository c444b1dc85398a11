//! Pad configuration.

use crate::error::{SignPadError, SignPadResult};
use crate::format::ImageFormat;
use crate::options::PadOptions;
use serde::{Deserialize, Serialize};

/// Path of the persistence endpoint, relative to the endpoint base.
pub const DEFAULT_SAVE_PATH: &str = "/digitalSignature.do";

/// Form field that carries the encoded image.
pub const DEFAULT_IMAGE_FIELD: &str = "signatureImage";

/// Configuration for a signature pad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignPadConfig {
    /// Pen and background style.
    pub options: PadOptions,
    /// Appended to the endpoint base passed to `save`.
    pub save_path: String,
    /// Name of the form field holding the data URL.
    pub image_field: String,
    /// Format stashed into the image field after each stroke.
    pub export_format: ImageFormat,
}

impl Default for SignPadConfig {
    fn default() -> Self {
        Self {
            options: PadOptions::default(),
            save_path: DEFAULT_SAVE_PATH.to_string(),
            image_field: DEFAULT_IMAGE_FIELD.to_string(),
            export_format: ImageFormat::Png,
        }
    }
}

impl SignPadConfig {
    /// Parse a JSON configuration. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> SignPadResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SignPadError::Config(e.to_string()))?;
        config.options.resolve()?;
        if config.image_field.is_empty() {
            return Err(SignPadError::Config(
                "imageField must not be empty".to_string(),
            ));
        }
        Ok(config)
    }

    /// Replace the style options.
    pub fn with_options(mut self, options: PadOptions) -> Self {
        self.options = options;
        self
    }

    /// Full endpoint URL for a given base (a context path or an origin).
    pub fn endpoint_url(&self, endpoint_base: &str) -> String {
        format!("{}{}", endpoint_base.trim_end_matches('/'), self.save_path)
    }
}
