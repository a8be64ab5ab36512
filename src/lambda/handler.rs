//! Handler abstraction for emulated invocations.
//!
//! Provides a trait-based seam so the server can host any function that
//! speaks the API Gateway proxy event format.

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::{ApiGatewayEvent, LambdaError, LambdaResponse};

/// Boxed future returned by [`LambdaHandler::invoke`].
pub type LambdaFuture<'a> = Pin<Box<dyn Future<Output = Result<LambdaResponse, LambdaError>> + Send + 'a>>;

/// A serverless-style request handler.
pub trait LambdaHandler: Send + Sync {
    /// Invokes the handler with a synthesized event.
    ///
    /// There is no timeout: the request waits for as long as the returned
    /// future takes to resolve.
    fn invoke(&self, event: ApiGatewayEvent) -> LambdaFuture<'_>;
}

/// Adapts an async closure into a [`LambdaHandler`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wraps `f` as a [`LambdaHandler`].
///
/// # Example
///
/// ```
/// use spa_host::lambda::{handler_fn, ApiGatewayEvent, LambdaError, LambdaResponse};
///
/// let handler = handler_fn(|event: ApiGatewayEvent| async move {
///     Ok::<_, LambdaError>(LambdaResponse::new(200).with_body(event.request_context.path))
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(ApiGatewayEvent) -> Fut + Send + Sync,
    Fut: Future<Output = Result<LambdaResponse, LambdaError>> + Send + 'static,
{
    HandlerFn { f }
}

impl<F, Fut> LambdaHandler for HandlerFn<F>
where
    F: Fn(ApiGatewayEvent) -> Fut + Send + Sync,
    Fut: Future<Output = Result<LambdaResponse, LambdaError>> + Send + 'static,
{
    fn invoke(&self, event: ApiGatewayEvent) -> LambdaFuture<'_> {
        Box::pin((self.f)(event))
    }
}

impl<T: LambdaHandler + ?Sized> LambdaHandler for Arc<T> {
    fn invoke(&self, event: ApiGatewayEvent) -> LambdaFuture<'_> {
        (**self).invoke(event)
    }
}

/// Returns the received event as a JSON body. Useful for checking what a
/// deployed function would see for a given request.
#[derive(Debug, Default, Clone)]
pub struct EchoHandler;

impl EchoHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl LambdaHandler for EchoHandler {
    fn invoke(&self, event: ApiGatewayEvent) -> LambdaFuture<'_> {
        Box::pin(async move {
            let body = serde_json::to_value(&event).map_err(|e| LambdaError::Handler(e.to_string()))?;
            Ok::<_, LambdaError>(LambdaResponse::new(200).with_body(Value::Object(
                [("event".to_string(), body)].into_iter().collect(),
            )))
        })
    }
}
