//! Exported image formats and data URL encoding.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// Default JPEG quality, as used by browser canvases.
pub const DEFAULT_QUALITY: f32 = 0.92;

/// Image format of an exported signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format.
    #[default]
    Png,
    /// JPEG format.
    Jpeg,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    /// Map a requested MIME type to a format.
    ///
    /// Unknown types fall back to PNG, matching `canvas.toDataURL`.
    pub fn from_mime_type(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => ImageFormat::Jpeg,
            _ => ImageFormat::Png,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        None
    }
}

/// Wrap encoded image bytes in a `data:` URL.
pub fn to_data_url(format: ImageFormat, bytes: &[u8]) -> String {
    let encoded = STANDARD.encode(bytes);
    format!("data:{};base64,{encoded}", format.mime_type())
}

/// A decoded `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Decode a base64 `data:` URL.
///
/// A bare base64 payload without the `data:` prefix is also accepted, since
/// some clients strip everything up to the first comma.
pub fn decode_data_url(value: &str) -> Option<DataUrl> {
    let value = value.trim();
    let (mime_type, payload) = match value.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',')?;
            let mime = header.strip_suffix(";base64")?;
            (mime.to_string(), payload)
        }
        None => (String::new(), value),
    };

    let bytes = STANDARD.decode(payload).ok()?;
    let mime_type = if mime_type.is_empty() {
        ImageFormat::from_magic_bytes(&bytes)?
            .mime_type()
            .to_string()
    } else {
        mime_type
    };
    Some(DataUrl { mime_type, bytes })
}
