use axum::http::{header, HeaderMap, Request};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::middleware::body::urlencoded_to_json;

/// Source address reported for every emulated invocation.
pub const EMULATED_SOURCE_IP: &str = "127.0.0.1";

/// User agent reported for every emulated invocation.
pub const EMULATED_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/107.0.0.0 Safari/537.36";

/// API Gateway proxy event synthesized from an incoming HTTP request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayEvent {
    pub headers: HashMap<String, String>,
    pub body: Value,
    pub query_string_parameters: Map<String, Value>,
    pub request_context: RequestContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub domain_name: Option<String>,
    pub domain_prefix: String,
    pub http_method: String,
    pub identity: Identity,
    pub path: String,
    pub protocol: String,
    pub request_time: String,
    pub request_time_epoch: i64,
    pub resource_id: String,
    pub resource_path: String,
}

/// Caller identity. Emulated requests always carry the same fake caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub access_key: Option<String>,
    pub account_id: Option<String>,
    pub caller: Option<String>,
    pub cognito_amr: Option<String>,
    pub cognito_authentication_provider: Option<String>,
    pub cognito_authentication_type: Option<String>,
    pub cognito_identity_id: Option<String>,
    pub cognito_identity_pool_id: Option<String>,
    pub principal_org_id: Option<String>,
    pub source_ip: String,
    pub user: Option<String>,
    pub user_agent: String,
    pub user_arn: Option<String>,
}

impl Identity {
    pub fn emulated() -> Self {
        Self {
            access_key: None,
            account_id: None,
            caller: None,
            cognito_amr: None,
            cognito_authentication_provider: None,
            cognito_authentication_type: None,
            cognito_identity_id: None,
            cognito_identity_pool_id: None,
            principal_org_id: None,
            source_ip: EMULATED_SOURCE_IP.to_string(),
            user: None,
            user_agent: EMULATED_USER_AGENT.to_string(),
            user_arn: None,
        }
    }
}

impl ApiGatewayEvent {
    /// Builds an event for `request` using the current time.
    pub fn from_request<B>(request: &Request<B>, body: Value) -> Self {
        Self::from_request_at(request, body, Utc::now())
    }

    /// Builds an event for `request` stamped with `now`.
    ///
    /// The root path `/` is reported as an empty path.
    pub fn from_request_at<B>(request: &Request<B>, body: Value, now: DateTime<Utc>) -> Self {
        let path = match request.uri().path() {
            "/" => String::new(),
            other => other.to_string(),
        };
        let method = request.method().as_str().to_string();

        let query_string_parameters = request
            .uri()
            .query()
            .map(|q| urlencoded_to_json(q.as_bytes()))
            .unwrap_or_default();

        let domain_name = request
            .headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(String::from)
            .or_else(|| request.uri().authority().map(|a| a.to_string()));

        Self {
            headers: flatten_headers(request.headers()),
            body,
            query_string_parameters,
            request_context: RequestContext {
                domain_name,
                domain_prefix: String::new(),
                http_method: method.clone(),
                identity: Identity::emulated(),
                resource_id: format!("{} {}", method, path),
                resource_path: path.clone(),
                path,
                protocol: "HTTP/1.1".to_string(),
                request_time: now.to_rfc3339_opts(SecondsFormat::Millis, true),
                request_time_epoch: now.timestamp_millis(),
            },
        }
    }
}

/// Collapses a header map into single string values, joining repeats with `, `.
/// Values that are not valid UTF-8 are dropped.
fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut flat: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    flat
}
