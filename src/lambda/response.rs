use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::LambdaError;

/// Result returned by an emulated handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Value,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl LambdaResponse {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Value>) -> Self {
        self.body = body.into();
        self
    }

    /// Applies the status, headers and body to an HTTP response.
    ///
    /// String bodies are sent as HTML text, other JSON values as JSON, and a
    /// null body as an empty response. A content type set by the handler is
    /// always kept.
    ///
    /// # Errors
    ///
    /// Fails when the status code, a header or a base64 body is invalid.
    pub fn into_http(self) -> Result<Response, LambdaError> {
        let status = StatusCode::from_u16(self.status_code)
            .map_err(|_| LambdaError::InvalidStatus(self.status_code))?;

        let mut builder = Response::builder().status(status);
        let headers = builder
            .headers_mut()
            .ok_or_else(|| LambdaError::Handler("response builder rejected status".into()))?;

        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| LambdaError::InvalidHeader(name.clone()))?;
            let value =
                HeaderValue::from_str(value).map_err(|_| LambdaError::InvalidHeader(name.to_string()))?;
            headers.insert(name, value);
        }

        let (bytes, default_type) = match self.body {
            Value::Null => (Vec::new(), None),
            Value::String(text) if self.is_base64_encoded => (
                base64::engine::general_purpose::STANDARD
                    .decode(text.as_bytes())
                    .map_err(|e| LambdaError::InvalidBody(e.to_string()))?,
                Some("application/octet-stream"),
            ),
            Value::String(text) => (text.into_bytes(), Some("text/html; charset=utf-8")),
            other => (
                serde_json::to_vec(&other).map_err(|e| LambdaError::InvalidBody(e.to_string()))?,
                Some("application/json; charset=utf-8"),
            ),
        };

        if let Some(content_type) = default_type {
            if !headers.contains_key(header::CONTENT_TYPE) {
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
        }

        builder
            .body(Body::from(bytes))
            .map_err(|e| LambdaError::Handler(e.to_string()))
    }
}
