pub mod auth;
pub mod config;
pub mod error;
pub mod infra;
pub mod lambda;
pub mod manifest;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod views;

pub use config::Config;
pub use error::{AppError, ServerError};
pub use middleware::HelmetConfig;
pub use server::{ApiMode, AppState, Server};
pub use views::Locals;
