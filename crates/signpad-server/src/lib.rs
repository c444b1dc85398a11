//! SignPad persistence endpoint.
//!
//! Accepts the signature form posted by the pad and keeps the decoded image
//! in memory.
//!
//! ## Protocol
//!
//! `POST /digitalSignature.do` with a URL-encoded body:
//! ```text
//! signatureImage=data:image/png;base64,...
//! signatureRequestId=<correlation key>
//! demographicNo=<integer, optional>
//! saveToDB=true
//! source=<free text, optional>
//! ```
//! answers `{"signatureId": "<uuid>"}`. Without `signatureRequestId` the
//! answer is `{}`; with `saveToDB` other than `true` the image is accepted but
//! not stored and the id is empty.
//!
//! `GET /digitalSignature/{id}` answers the stored image bytes and
//! `GET /digitalSignature/{id}/info` answers what was recorded with them.

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use signpad_core::{DEFAULT_SAVE_PATH, decode_data_url};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Environment variable holding the bind address.
pub const ADDR_ENV: &str = "SIGNPAD_ADDR";

const DEFAULT_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 3030);

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(DEFAULT_ADDR),
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the environment.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_addr_var(std::env::var(ADDR_ENV).ok().as_deref())
    }

    fn from_addr_var(value: Option<&str>) -> Result<Self, ServerError> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(addr) => addr
                .parse()
                .map(|addr| Self { addr })
                .map_err(|_| {
                    ServerError::Config(format!("{ADDR_ENV}={addr:?} is not a socket address"))
                }),
            None => Ok(Self::default()),
        }
    }
}

/// Endpoint errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid demographicNo: {0:?}")]
    BadDemographic(String),
    #[error("signature image could not be decoded")]
    UndecodableImage,
    #[error("signature not found")]
    NotFound,
    #[error("configuration error: {0}")]
    Config(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match self {
            ServerError::BadDemographic(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::UndecodableImage | ServerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

/// Fields posted with the signature form. Unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignatureForm {
    pub signature_image: String,
    pub signature_request_id: Option<String>,
    pub demographic_no: Option<String>,
    #[serde(rename = "saveToDB")]
    pub save_to_db: Option<String>,
    pub source: Option<String>,
}

/// JSON body answered to a save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(rename = "signatureId", skip_serializing_if = "Option::is_none")]
    pub signature_id: Option<String>,
}

impl SaveResponse {
    fn stored(signature_id: String) -> Self {
        Self {
            signature_id: Some(signature_id),
        }
    }
}

/// A stored signature.
#[derive(Debug, Clone)]
pub struct StoredSignature {
    pub id: Uuid,
    pub request_id_key: String,
    pub demographic_no: Option<i64>,
    pub source: Option<String>,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Metadata answered for a stored signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature_id: String,
    pub request_id_key: String,
    pub demographic_no: Option<i64>,
    pub source: Option<String>,
    pub mime_type: String,
    pub size: usize,
}

impl From<&StoredSignature> for SignatureInfo {
    fn from(signature: &StoredSignature) -> Self {
        Self {
            signature_id: signature.id.to_string(),
            request_id_key: signature.request_id_key.clone(),
            demographic_no: signature.demographic_no,
            source: signature.source.clone(),
            mime_type: signature.mime_type.clone(),
            size: signature.bytes.len(),
        }
    }
}

/// Shared application state
#[derive(Default)]
pub struct AppState {
    signatures: DashMap<Uuid, StoredSignature>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &Uuid) -> Option<StoredSignature> {
        self.signatures.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    fn insert(&self, signature: StoredSignature) {
        self.signatures.insert(signature.id, signature);
    }
}

/// Build the router with its middleware.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route(DEFAULT_SAVE_PATH, post(save_signature))
        .route("/digitalSignature/{id}", get(stored_signature))
        .route("/digitalSignature/{id}/info", get(signature_info))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Index page
async fn index() -> &'static str {
    "SignPad signature server - POST signatures to /digitalSignature.do"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

async fn save_signature(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SignatureForm>,
) -> Result<Json<SaveResponse>, ServerError> {
    let Some(request_id_key) = form.signature_request_id.filter(|key| !key.is_empty()) else {
        debug!("signature posted without a request id; ignoring");
        return Ok(Json(SaveResponse::default()));
    };

    let demographic_no = match form.demographic_no.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| ServerError::BadDemographic(raw.to_string()))?,
        ),
    };

    let image = decode_data_url(&form.signature_image).ok_or_else(|| {
        warn!(%request_id_key, "undecodable signature image");
        ServerError::UndecodableImage
    })?;

    if form.save_to_db.as_deref() != Some("true") {
        debug!(%request_id_key, "signature accepted without storing");
        return Ok(Json(SaveResponse::stored(String::new())));
    }

    let id = Uuid::new_v4();
    info!(%id, %request_id_key, bytes = image.bytes.len(), "signature stored");
    state.insert(StoredSignature {
        id,
        request_id_key,
        demographic_no,
        source: form.source.filter(|s| !s.is_empty()),
        mime_type: image.mime_type,
        bytes: image.bytes,
    });
    Ok(Json(SaveResponse::stored(id.to_string())))
}

async fn stored_signature(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let signature = lookup(&state, &id)?;
    let headers = [(header::CONTENT_TYPE, signature.mime_type)];
    Ok((headers, signature.bytes))
}

async fn signature_info(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SignatureInfo>, ServerError> {
    let signature = lookup(&state, &id)?;
    Ok(Json(SignatureInfo::from(&signature)))
}

fn lookup(state: &AppState, id: &str) -> Result<StoredSignature, ServerError> {
    let id = Uuid::parse_str(id).map_err(|_| ServerError::NotFound)?;
    state.get(&id).ok_or(ServerError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_from_env_value() {
        let from_var = ServerConfig::from_addr_var;
        assert_eq!(from_var(None).unwrap(), ServerConfig::default());
        assert_eq!(from_var(Some("  ")).unwrap(), ServerConfig::default());
        assert_eq!(
            from_var(Some("127.0.0.1:8080")).unwrap().addr,
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert!(from_var(Some("localhost")).is_err());
    }

    #[test]
    fn test_save_response_shape() {
        let empty = serde_json::to_string(&SaveResponse::default()).unwrap();
        assert_eq!(empty, "{}");
        let saved = SaveResponse::stored("abc".to_string());
        let saved = serde_json::to_string(&saved).unwrap();
        assert_eq!(saved, r#"{"signatureId":"abc"}"#);
    }

    #[test]
    fn test_info_reports_recorded_fields() {
        let signature = StoredSignature {
            id: Uuid::nil(),
            request_id_key: "req-3".to_string(),
            demographic_no: Some(12),
            source: Some("inbox".to_string()),
            mime_type: "image/png".to_string(),
            bytes: vec![0; 7],
        };
        let json = serde_json::to_value(SignatureInfo::from(&signature)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "signatureId": Uuid::nil().to_string(),
                "requestIdKey": "req-3",
                "demographicNo": 12,
                "source": "inbox",
                "mimeType": "image/png",
                "size": 7,
            })
        );
    }

    #[test]
    fn test_error_status() {
        let bad = ServerError::BadDemographic("x".into());
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ServerError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::UndecodableImage.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
