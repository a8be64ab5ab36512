use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::error::ServerError;

/// Runtime environment. Development re-reads the build manifest on every
/// SPA request; production caches it for the life of the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

/// Which API mounting mode the launcher should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApiModeKind {
    #[default]
    Default,
    Lambda,
}

impl ApiModeKind {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("lambda") {
            ApiModeKind::Lambda
        } else {
            ApiModeKind::Default
        }
    }
}

/// Static CORS policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CorsConfig {
    /// Allowed origins. `"*"` allows any origin; an empty list mirrors the
    /// request's `Origin`.
    pub origins: Vec<String>,
    pub methods: Vec<String>,
    /// Allowed request headers. Empty mirrors `Access-Control-Request-Headers`.
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    pub credentials: bool,
    pub max_age_secs: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: vec!["*".to_string()],
            methods: ["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_headers: Vec::new(),
            exposed_headers: Vec::new(),
            credentials: false,
            max_age_secs: None,
        }
    }
}

/// Session cookie settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    pub name: String,
    /// Signing secret; must be at least 64 bytes when set.
    pub secret: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    /// One of `strict`, `lax` or `none`.
    pub same_site: String,
    pub path: String,
    /// Inactivity expiry in seconds. `None` keeps browser-session cookies.
    pub max_age_secs: Option<i64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "spa_host.sid".to_string(),
            secret: None,
            secure: false,
            http_only: true,
            same_site: "lax".to_string(),
            path: "/".to_string(),
            max_age_secs: None,
        }
    }
}

/// Listener settings. Key and certificate are PEM contents, not paths.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListenerConfig {
    pub enable_ssl: bool,
    pub ssl_key: Option<String>,
    pub ssl_cert: Option<String>,
    /// Only meaningful for encrypted keys; ignored otherwise.
    pub ssl_key_passphrase: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub port: u16,
    pub environment: Environment,
    /// Directory holding the front-end build output and `stats.json`.
    pub build_dir: PathBuf,
    pub views_dir: PathBuf,
    pub api_mode: ApiModeKind,
    pub cors: CorsConfig,
    pub session: SessionConfig,
    pub listener: ListenerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            environment: Environment::default(),
            build_dir: PathBuf::from("bin"),
            views_dir: PathBuf::from("views"),
            api_mode: ApiModeKind::default(),
            cors: CorsConfig::default(),
            session: SessionConfig::default(),
            listener: ListenerConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ServerError> {
        let defaults = Self::default();

        let mut cors = defaults.cors;
        if let Ok(origins) = env::var("CORS_ORIGINS") {
            cors.origins = split_list(&origins);
        }
        if let Ok(credentials) = env::var("CORS_CREDENTIALS") {
            cors.credentials = parse_flag(&credentials);
        }

        let mut session = defaults.session;
        if let Ok(name) = env::var("SESSION_NAME") {
            session.name = name;
        }
        session.secret = env::var("SESSION_SECRET").ok();
        if let Ok(secure) = env::var("SESSION_SECURE") {
            session.secure = parse_flag(&secure);
        }

        let listener = ListenerConfig {
            enable_ssl: env::var("ENABLE_SSL").map(|v| parse_flag(&v)).unwrap_or(false),
            ssl_key: read_pem_var("SSL_KEY_PATH")?,
            ssl_cert: read_pem_var("SSL_CERT_PATH")?,
            ssl_key_passphrase: env::var("SSL_KEY_PASSPHRASE").ok(),
        };

        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            environment: env::var("APP_ENV")
                .map(|v| Environment::parse(&v))
                .unwrap_or_default(),
            build_dir: env::var("BUILD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.build_dir),
            views_dir: env::var("VIEWS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.views_dir),
            api_mode: env::var("API_MODE")
                .map(|v| ApiModeKind::parse(&v))
                .unwrap_or_default(),
            cors,
            session,
            listener,
        })
    }

    /// Parses a JSON configuration document. Missing fields take defaults.
    pub fn from_json(raw: &str) -> Result<Self, ServerError> {
        serde_json::from_str(raw).map_err(|e| ServerError::Config(e.to_string()))
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn read_pem_var(var: &str) -> Result<Option<String>, ServerError> {
    match env::var(var) {
        Ok(path) => std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| ServerError::Config(format!("failed to read {var} ({path}): {e}"))),
        Err(_) => Ok(None),
    }
}
