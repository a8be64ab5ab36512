use axum::http::{HeaderName, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer, ExposeHeaders};

use crate::config::CorsConfig;
use crate::error::ServerError;

/// Builds a static CORS policy.
///
/// The policy is fixed at startup; per-request origin decisions beyond
/// mirroring the request are out of scope.
pub fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, ServerError> {
    let wildcard = config.origins.iter().any(|o| o == "*");
    if wildcard && config.credentials {
        return Err(ServerError::Cors(
            "credentials cannot be allowed for a wildcard origin; list the origins instead".into(),
        ));
    }

    if config.credentials {
        let wildcards = [
            ("methods", &config.methods),
            ("allowedHeaders", &config.allowed_headers),
            ("exposedHeaders", &config.exposed_headers),
        ];
        if let Some((field, _)) = wildcards
            .iter()
            .find(|(_, values)| values.iter().any(|v| v == "*"))
        {
            return Err(ServerError::Cors(format!(
                "credentials cannot be combined with a wildcard in {field}"
            )));
        }
    }

    let origin = if wildcard {
        AllowOrigin::from(Any)
    } else if config.origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        let origins = config
            .origins
            .iter()
            .map(|o| HeaderValue::from_str(o).map_err(|_| ServerError::Cors(format!("invalid origin {o:?}"))))
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    let methods = config
        .methods
        .iter()
        .map(|m| Method::from_bytes(m.as_bytes()).map_err(|_| ServerError::Cors(format!("invalid method {m:?}"))))
        .collect::<Result<Vec<_>, _>>()?;

    let headers = if config.allowed_headers.is_empty() {
        AllowHeaders::mirror_request()
    } else {
        AllowHeaders::list(parse_header_names(&config.allowed_headers)?)
    };

    let mut layer = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::list(methods))
        .allow_headers(headers)
        .allow_credentials(config.credentials);

    if !config.exposed_headers.is_empty() {
        layer = layer.expose_headers(ExposeHeaders::list(parse_header_names(&config.exposed_headers)?));
    }

    if let Some(secs) = config.max_age_secs {
        layer = layer.max_age(Duration::from_secs(secs));
    }

    Ok(layer)
}

fn parse_header_names(names: &[String]) -> Result<Vec<HeaderName>, ServerError> {
    names
        .iter()
        .map(|n| HeaderName::from_bytes(n.as_bytes()).map_err(|_| ServerError::Cors(format!("invalid header {n:?}"))))
        .collect()
}
