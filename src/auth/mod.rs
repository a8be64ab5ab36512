//! Session-backed authentication.
//!
//! The [`Authenticator`] holds named strategies registered at startup. Its
//! middleware restores the logged-in user from the session on every request
//! and exposes it through the [`CurrentUser`] extractor; handlers log users in
//! by running a strategy through [`Authenticator::authenticate`].

pub mod strategy;

pub use strategy::{AuthFuture, AuthStrategy, CredentialsStrategy};

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use thiserror::Error;
use tower_sessions::Session;

use crate::error::AppError;

/// Session key under which the logged-in user is stored.
pub const SESSION_USER_KEY: &str = "auth.user";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Strategy {name} failed: {message}")]
    Strategy { name: String, message: String },

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// The user persisted in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            roles: Vec::new(),
        }
    }
}

/// Registry of authentication strategies.
#[derive(Default)]
pub struct Authenticator {
    strategies: BTreeMap<String, Arc<dyn AuthStrategy>>,
}

impl Authenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `strategy` under its name, replacing any previous one.
    pub fn use_strategy(&mut self, strategy: impl AuthStrategy + 'static) -> &mut Self {
        let name = strategy.name().to_string();
        tracing::debug!(strategy = %name, "Registered authentication strategy");
        self.strategies.insert(name, Arc::new(strategy));
        self
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    /// Runs the named strategy and, on success, logs the user into `session`.
    ///
    /// Returns `Ok(None)` when the strategy rejects the credentials.
    pub async fn authenticate(
        &self,
        name: &str,
        session: &Session,
        headers: &HeaderMap,
        body: &Value,
    ) -> Result<Option<AuthUser>, AuthError> {
        let strategy = self
            .strategies
            .get(name)
            .ok_or_else(|| AuthError::UnknownStrategy(name.to_string()))?;

        let user = strategy.authenticate(headers, body).await?;
        if let Some(user) = &user {
            Self::login(session, user).await?;
        }
        Ok(user)
    }

    /// Stores `user` in the session under a fresh session id.
    pub async fn login(session: &Session, user: &AuthUser) -> Result<(), AuthError> {
        session.cycle_id().await?;
        session.insert(SESSION_USER_KEY, user).await?;
        tracing::debug!(user = %user.id, "User logged in");
        Ok(())
    }

    /// Removes the user from the session.
    pub async fn logout(session: &Session) -> Result<Option<AuthUser>, AuthError> {
        Ok(session.remove::<AuthUser>(SESSION_USER_KEY).await?)
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

/// The user restored from the session, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentUser(pub Option<AuthUser>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentUser>().cloned().unwrap_or_default())
    }
}

/// Middleware that exposes the authenticator and restores the session user.
///
/// Requests without a session layer simply carry no user.
pub async fn restore_user(
    State(authenticator): State<Arc<Authenticator>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = match request.extensions().get::<Session>().cloned() {
        Some(session) => session
            .get::<AuthUser>(SESSION_USER_KEY)
            .await
            .map_err(AuthError::from)?,
        None => None,
    };

    request.extensions_mut().insert(authenticator);
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
