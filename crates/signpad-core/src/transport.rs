//! Transport abstraction for submitting the signature form.

use crate::error::{SignPadError, SignPadResult};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A URL-encoded form POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRequest {
    pub url: String,
    pub fields: Vec<(String, String)>,
}

impl FormRequest {
    /// Value of the first field named `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response to a form POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Extract the signature id from a persistence endpoint response.
    ///
    /// Non-2xx status, unparsable JSON and a missing, empty or null
    /// `signatureId` are all failures.
    pub fn signature_id(&self) -> SignPadResult<String> {
        if !self.is_success() {
            return Err(SignPadError::HttpStatus(self.status));
        }
        let body: Value =
            serde_json::from_str(&self.body).map_err(|_| SignPadError::InvalidResponse)?;
        match body.get("signatureId") {
            Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
            Some(Value::Number(n)) if n.as_f64() != Some(0.0) => Ok(n.to_string()),
            _ => Err(SignPadError::InvalidResponse),
        }
    }
}

/// Sends one form POST. Implementations never retry.
///
/// The pad is single-threaded, so implementations are not required to be
/// `Send`; this lets the browser `fetch` transport share the trait.
pub trait Transport {
    fn post_form(&self, request: FormRequest) -> BoxFuture<'_, SignPadResult<TransportResponse>>;
}

/// Native HTTP transport backed by reqwest.
#[cfg(all(feature = "http", not(target_arch = "wasm32")))]
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[cfg(all(feature = "http", not(target_arch = "wasm32")))]
impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxies, cookies, TLS roots).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(all(feature = "http", not(target_arch = "wasm32")))]
impl Transport for HttpTransport {
    fn post_form(&self, request: FormRequest) -> BoxFuture<'_, SignPadResult<TransportResponse>> {
        Box::pin(async move {
            let response = self
                .client
                .post(&request.url)
                .form(&request.fields)
                .send()
                .await
                .map_err(|e| SignPadError::Transport(e.to_string()))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| SignPadError::Transport(e.to_string()))?;
            log::debug!("POST {} -> {}", request.url, status);
            Ok(TransportResponse { status, body })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> TransportResponse {
        TransportResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_signature_id_parsing() {
        let id = |status, body| response(status, body).signature_id();
        assert_eq!(id(200, r#"{"signatureId":"abc123"}"#).unwrap(), "abc123");
        assert_eq!(id(201, r#"{"signatureId":17}"#).unwrap(), "17");
    }

    #[test]
    fn test_signature_id_failures() {
        let id = |status, body| response(status, body).signature_id();
        assert_eq!(id(500, "oops"), Err(SignPadError::HttpStatus(500)));
        for body in ["not json", "{}", r#"{"signatureId":""}"#, "null"] {
            assert_eq!(id(200, body), Err(SignPadError::InvalidResponse), "{body}");
        }
    }

    #[test]
    fn test_form_field_lookup() {
        let request = FormRequest {
            url: "/x".to_string(),
            fields: vec![("a".to_string(), "1".to_string())],
        };
        assert_eq!(request.field("a"), Some("1"));
        assert_eq!(request.field("b"), None);
    }
}
