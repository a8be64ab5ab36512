//! Request body parsing.
//!
//! JSON and URL-encoded payloads are buffered once and decoded into a
//! `serde_json::Value`; the next service gets the parsed value along with the
//! original bytes. Other bodies stream through untouched.

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use serde_json::{Map, Value};
use std::convert::Infallible;

use crate::error::AppError;

/// Largest request body accepted by the parser, in bytes.
pub const BODY_LIMIT: usize = 100 * 1024;

/// Parsed request body, available as a request extension and an extractor.
///
/// Requests without a JSON or URL-encoded body carry an empty object.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBody(pub Value);

impl Default for ParsedBody {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ParsedBody
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<ParsedBody>().cloned().unwrap_or_default())
    }
}

/// Middleware that parses the request body into [`ParsedBody`].
///
/// Only JSON and URL-encoded bodies are read, and only those are held to
/// [`BODY_LIMIT`]. Any other body reaches the next service unread.
/// Malformed JSON is rejected with 400 and oversized bodies with 413.
pub async fn parse_body(request: Request, next: Next) -> Result<Response, AppError> {
    let kind = match BodyKind::of(request.headers()) {
        Some(kind) => kind,
        None => {
            let mut request = request;
            request.extensions_mut().insert(ParsedBody::default());
            return Ok(next.run(request).await);
        }
    };

    let (mut parts, body) = request.into_parts();

    let bytes = axum::body::to_bytes(body, BODY_LIMIT).await.map_err(|e| {
        let source = e.into_inner();
        if source.is::<LengthLimitError>() {
            AppError::PayloadTooLarge(BODY_LIMIT)
        } else {
            AppError::BadRequest(format!("failed to read body: {}", source))
        }
    })?;

    let parsed = kind.decode(&bytes)?;
    parts.extensions.insert(ParsedBody(parsed));

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
}

impl BodyKind {
    fn of(headers: &HeaderMap) -> Option<Self> {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())?
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        if content_type == "application/json" || content_type.ends_with("+json") {
            Some(BodyKind::Json)
        } else if content_type == "application/x-www-form-urlencoded" {
            Some(BodyKind::Form)
        } else {
            None
        }
    }

    fn decode(self, bytes: &[u8]) -> Result<Value, AppError> {
        if bytes.is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        match self {
            BodyKind::Json => serde_json::from_slice(bytes)
                .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {}", e))),
            BodyKind::Form => Ok(Value::Object(urlencoded_to_json(bytes))),
        }
    }
}

/// Decodes `application/x-www-form-urlencoded` data into a JSON object.
///
/// Repeated keys collect into an array in the order they appear.
pub fn urlencoded_to_json(input: &[u8]) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        let value = Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    map
}
