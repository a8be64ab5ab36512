use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use std::sync::Arc;

use super::{ApiGatewayEvent, LambdaError, LambdaHandler};
use crate::middleware::body::ParsedBody;

/// Middleware that serves a request through an emulated handler.
///
/// The event body is the body parser's output, or null when no parser ran.
/// When the handler fails, panics, or returns a result that cannot be applied
/// to a response, the request continues to the next service unchanged. The
/// handler runs on its own task so a panic stays contained to that task.
pub async fn emulate(
    State(handler): State<Arc<dyn LambdaHandler>>,
    request: Request,
    next: Next,
) -> Response {
    let body = request
        .extensions()
        .get::<ParsedBody>()
        .map(|parsed| parsed.0.clone())
        .unwrap_or(Value::Null);
    let event = ApiGatewayEvent::from_request(&request, body);
    let resource_id = event.request_context.resource_id.clone();

    tracing::debug!(resource = %resource_id, "Invoking emulated handler");

    let invocation = tokio::spawn(async move { handler.invoke(event).await })
        .await
        .unwrap_or_else(|join| Err(LambdaError::Handler(format!("handler panicked: {}", join))));

    match invocation.and_then(|result| result.into_http()) {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(
                resource = %resource_id,
                error = %err,
                "Emulated handler failed, falling through"
            );
            next.run(request).await
        }
    }
}
