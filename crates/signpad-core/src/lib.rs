//! SignPad Core Library
//!
//! Platform-agnostic signature capture: stroke rendering onto a raster,
//! the dirty/saved session state machine, listener notification and
//! form-based persistence through a pluggable transport.

pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod host;
pub mod input;
pub mod listener;
pub mod options;
pub mod pad;
pub mod raster;
pub mod session;
pub mod stroke;
pub mod surface;
pub mod transport;

pub use config::{DEFAULT_IMAGE_FIELD, DEFAULT_SAVE_PATH, SignPadConfig};
pub use error::{SignPadError, SignPadResult};
pub use event::{EventResult, HostTarget, SignatureEventType};
pub use format::{DEFAULT_QUALITY, DataUrl, ImageFormat, decode_data_url, to_data_url};
pub use host::{Control, FormSource, HostBindings, ImageField, SurfaceElement};
pub use input::{PointerEvent, StrokeAction, StrokeTracker};
pub use listener::{EventCallback, Listener, SignaturePadEventListener};
pub use options::{PadOptions, PenStyle};
pub use pad::{PendingSave, SaveOutcome, SignaturePad};
pub use raster::{MAX_PIXELS, Raster};
pub use session::{PadState, SavedSignature, SignatureSession};
pub use stroke::{Stroke, StrokePoint};
pub use surface::SignatureSurface;
pub use transport::{BoxFuture, FormRequest, Transport, TransportResponse};

#[cfg(all(feature = "http", not(target_arch = "wasm32")))]
pub use transport::HttpTransport;
