//! Cross-cutting middleware attached by the server builder.
//!
//! Each function here produces a [`Stage`]: a deferred transformation of the
//! router. The builder records stages in the order they are configured and
//! applies them once the routes are known.

pub mod body;
pub mod cors;
pub mod helmet;
pub mod session;

pub use body::{parse_body, ParsedBody, BODY_LIMIT};
pub use cors::cors_layer;
pub use helmet::HelmetConfig;
pub use session::session_stage;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
    CompressionLevel,
};

use crate::config::CorsConfig;
use crate::error::ServerError;
use crate::server::AppState;

/// A deferred router transformation.
pub type Stage = Box<dyn FnOnce(Router<AppState>) -> Router<AppState> + Send>;

/// Compression, request tracing and body parsing, outermost first.
pub fn standard_stage() -> Stage {
    Box::new(|router| {
        router.layer(
            ServiceBuilder::new()
                .layer(CompressionLayer::new().quality(CompressionLevel::Best))
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(parse_body)),
        )
    })
}

pub fn cors_stage(config: &CorsConfig) -> Result<Stage, ServerError> {
    let layer = cors_layer(config)?;
    Ok(Box::new(move |router| router.layer(layer)))
}

pub fn helmet_stage(config: &HelmetConfig) -> Result<Stage, ServerError> {
    let headers = config.headers()?;
    let hide_powered_by = config.hide_powered_by;
    Ok(Box::new(move |router| {
        let router = headers.into_iter().fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(name, value))
        });
        if hide_powered_by {
            router.layer(axum::middleware::map_response(helmet::hide_powered_by))
        } else {
            router
        }
    }))
}
