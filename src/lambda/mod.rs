//! Serverless invocation emulation.
//!
//! Translates between the framework's HTTP request/response and the API
//! Gateway proxy event/result pair so handlers written for a function
//! runtime can be hosted by this server unchanged.

pub mod adapter;
pub mod event;
pub mod handler;
pub mod response;

pub use adapter::emulate;
pub use event::{ApiGatewayEvent, Identity, RequestContext};
pub use handler::{handler_fn, EchoHandler, HandlerFn, LambdaFuture, LambdaHandler};
pub use response::LambdaResponse;

use thiserror::Error;

/// Failure of an emulated invocation. Never sent to the client.
#[derive(Error, Debug)]
pub enum LambdaError {
    #[error("Handler failed: {0}")]
    Handler(String),

    #[error("Handler returned invalid status code {0}")]
    InvalidStatus(u16),

    #[error("Handler returned invalid header {0}")]
    InvalidHeader(String),

    #[error("Handler returned invalid body: {0}")]
    InvalidBody(String),
}
