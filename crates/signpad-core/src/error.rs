//! Error types for the signature pad.

use thiserror::Error;

/// Signature pad errors.
///
/// Setup problems (`InvalidSurface`, `Config`) are returned to the host when
/// wiring the widget. Everything on the save path is converted into a
/// listener-visible event instead, using the `Display` text below.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignPadError {
    #[error("Invalid canvas element provided: {0}")]
    InvalidSurface(String),
    #[error("Listener does not implement onSignaturePadEvent and is not a function")]
    InvalidListener,
    #[error("Canvas element not found")]
    SurfaceMissing,
    #[error("{0} element not found")]
    MissingElement(&'static str),
    #[error("Signature client is not available")]
    ClientUnavailable,
    #[error("Server responded with status: {0}")]
    HttpStatus(u16),
    #[error("Invalid server response format")]
    InvalidResponse,
    #[error("{0}")]
    Transport(String),
    #[error("Image encoding failed: {0}")]
    Encode(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for signature pad operations.
pub type SignPadResult<T> = Result<T, SignPadError>;
