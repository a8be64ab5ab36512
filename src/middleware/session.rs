use time::Duration;
use tower_sessions::{
    cookie::{Key, SameSite},
    Expiry, SessionManagerLayer, SessionStore,
};

use crate::config::SessionConfig;
use crate::error::ServerError;
use super::Stage;

/// Applies session management backed by `store` to `router`.
///
/// The cookie is signed when a secret is configured.
pub fn session_stage<S>(
    store: S,
    config: &SessionConfig,
) -> Result<Stage, ServerError>
where
    S: SessionStore + Clone,
{
    let same_site = match config.same_site.to_ascii_lowercase().as_str() {
        "strict" => SameSite::Strict,
        "lax" => SameSite::Lax,
        "none" => SameSite::None,
        other => return Err(ServerError::Session(format!("unknown sameSite value {other:?}"))),
    };

    let mut layer = SessionManagerLayer::new(store)
        .with_name(config.name.clone())
        .with_path(config.path.clone())
        .with_secure(config.secure)
        .with_http_only(config.http_only)
        .with_same_site(same_site);

    if let Some(secs) = config.max_age_secs {
        layer = layer.with_expiry(Expiry::OnInactivity(Duration::seconds(secs)));
    }

    match &config.secret {
        Some(secret) => {
            let key = Key::try_from(secret.as_bytes()).map_err(|_| {
                ServerError::Session("session secret must be at least 64 bytes".into())
            })?;
            let layer = layer.with_signed(key);
            Ok(Box::new(move |router| router.layer(layer)))
        }
        None => Ok(Box::new(move |router| router.layer(layer))),
    }
}
