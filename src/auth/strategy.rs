use axum::http::HeaderMap;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

use super::{AuthError, AuthUser};

pub type AuthFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<AuthUser>, AuthError>> + Send + 'a>>;

/// A way of turning request credentials into a user.
pub trait AuthStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the authenticated user, or `None` when the credentials are
    /// missing or wrong.
    fn authenticate<'a>(&'a self, headers: &'a HeaderMap, body: &'a Value) -> AuthFuture<'a>;
}

/// Username/password strategy reading `username` and `password` from the
/// parsed request body.
pub struct CredentialsStrategy<F> {
    verify: F,
}

impl<F> CredentialsStrategy<F>
where
    F: Fn(&str, &str) -> Option<AuthUser> + Send + Sync,
{
    pub fn new(verify: F) -> Self {
        Self { verify }
    }
}

impl<F> AuthStrategy for CredentialsStrategy<F>
where
    F: Fn(&str, &str) -> Option<AuthUser> + Send + Sync,
{
    fn name(&self) -> &str {
        "local"
    }

    fn authenticate<'a>(&'a self, _headers: &'a HeaderMap, body: &'a Value) -> AuthFuture<'a> {
        Box::pin(async move {
            let username = body.get("username").and_then(Value::as_str);
            let password = body.get("password").and_then(Value::as_str);
            Ok::<_, AuthError>(match (username, password) {
                (Some(username), Some(password)) => (self.verify)(username, password),
                _ => None,
            })
        })
    }
}
