//! Security response headers.
//!
//! Each enabled setting becomes a `SetResponseHeaderLayer` that only fills the
//! header in when the handler did not set it.

use axum::{
    http::{HeaderName, HeaderValue},
    response::Response,
};
use serde::Deserialize;

use crate::error::ServerError;

pub const DEFAULT_CONTENT_SECURITY_POLICY: &str = "default-src 'self';base-uri 'self';font-src 'self' https: data:;form-action 'self';frame-ancestors 'self';img-src 'self' data:;object-src 'none';script-src 'self';script-src-attr 'none';style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests";

/// Security header settings. `None`/`false` disables a header.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HelmetConfig {
    pub content_security_policy: Option<String>,
    pub cross_origin_opener_policy: Option<String>,
    pub cross_origin_resource_policy: Option<String>,
    pub origin_agent_cluster: bool,
    pub referrer_policy: Option<String>,
    pub strict_transport_security: Option<String>,
    pub content_type_nosniff: bool,
    pub dns_prefetch_control: Option<String>,
    pub download_options: bool,
    pub frame_options: Option<String>,
    pub permitted_cross_domain_policies: Option<String>,
    pub xss_protection: Option<String>,
    pub hide_powered_by: bool,
}

impl Default for HelmetConfig {
    fn default() -> Self {
        Self {
            content_security_policy: Some(DEFAULT_CONTENT_SECURITY_POLICY.to_string()),
            cross_origin_opener_policy: Some("same-origin".to_string()),
            cross_origin_resource_policy: Some("same-origin".to_string()),
            origin_agent_cluster: true,
            referrer_policy: Some("no-referrer".to_string()),
            strict_transport_security: Some("max-age=15552000; includeSubDomains".to_string()),
            content_type_nosniff: true,
            dns_prefetch_control: Some("off".to_string()),
            download_options: true,
            frame_options: Some("SAMEORIGIN".to_string()),
            permitted_cross_domain_policies: Some("none".to_string()),
            xss_protection: Some("0".to_string()),
            hide_powered_by: true,
        }
    }
}

impl HelmetConfig {
    /// Every header disabled.
    pub fn disabled() -> Self {
        Self {
            content_security_policy: None,
            cross_origin_opener_policy: None,
            cross_origin_resource_policy: None,
            origin_agent_cluster: false,
            referrer_policy: None,
            strict_transport_security: None,
            content_type_nosniff: false,
            dns_prefetch_control: None,
            download_options: false,
            frame_options: None,
            permitted_cross_domain_policies: None,
            xss_protection: None,
            hide_powered_by: false,
        }
    }

    /// Resolves the enabled settings into header pairs.
    pub fn headers(&self) -> Result<Vec<(HeaderName, HeaderValue)>, ServerError> {
        let flag = |enabled: bool, value: &str| enabled.then(|| value.to_string());

        let entries = [
            ("content-security-policy", self.content_security_policy.clone()),
            ("cross-origin-opener-policy", self.cross_origin_opener_policy.clone()),
            ("cross-origin-resource-policy", self.cross_origin_resource_policy.clone()),
            ("origin-agent-cluster", flag(self.origin_agent_cluster, "?1")),
            ("referrer-policy", self.referrer_policy.clone()),
            ("strict-transport-security", self.strict_transport_security.clone()),
            ("x-content-type-options", flag(self.content_type_nosniff, "nosniff")),
            ("x-dns-prefetch-control", self.dns_prefetch_control.clone()),
            ("x-download-options", flag(self.download_options, "noopen")),
            ("x-frame-options", self.frame_options.clone()),
            ("x-permitted-cross-domain-policies", self.permitted_cross_domain_policies.clone()),
            ("x-xss-protection", self.xss_protection.clone()),
        ];

        entries
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .map(|(name, value)| {
                let value = HeaderValue::from_str(&value)
                    .map_err(|_| ServerError::Helmet(format!("invalid value for {name}: {value:?}")))?;
                Ok((HeaderName::from_static(name), value))
            })
            .collect()
    }
}

/// Strips `X-Powered-By` from the response.
pub async fn hide_powered_by(mut response: Response) -> Response {
    response.headers_mut().remove("x-powered-by");
    response
}
