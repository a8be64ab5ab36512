//! Fluent server builder.
//!
//! [`Server`] collects middleware, views, static assets and routes through
//! chained calls and assembles them into an axum [`Router`]. Middleware runs
//! in the order it was configured: the first configured layer sees the
//! request first.

mod listener;
mod state;

pub use state::AppState;

use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_sessions::SessionStore;

use crate::auth::{self, Authenticator};
use crate::config::Config;
use crate::error::ServerError;
use crate::lambda::{self, LambdaHandler};
use crate::manifest::ManifestCache;
use crate::middleware::{self, HelmetConfig, Stage};
use crate::routes::{spa, static_files, RouteModule};
use crate::views::{Locals, ViewEngine};

/// How API routes are mounted.
pub enum ApiMode {
    /// Mount each module's routes, in list order.
    Default(Vec<Box<dyn RouteModule>>),
    /// Serve unmatched requests through an emulated serverless handler.
    Lambda(Arc<dyn LambdaHandler>),
}

impl ApiMode {
    pub fn lambda(handler: impl LambdaHandler + 'static) -> Self {
        ApiMode::Lambda(Arc::new(handler))
    }
}

pub struct Server {
    config: Config,
    stages: Vec<Stage>,
    routes: Router<AppState>,
    locals: Locals,
    views: ViewEngine,
    authenticator: Arc<Authenticator>,
    lambda: Option<Arc<dyn LambdaHandler>>,
    spa: bool,
}

impl Server {
    pub fn new(config: Config) -> Self {
        let views = ViewEngine::new("html", config.views_dir.clone());
        Self {
            config,
            stages: Vec::new(),
            routes: Router::new(),
            locals: Locals::default(),
            views,
            authenticator: Arc::new(Authenticator::new()),
            lambda: None,
            spa: false,
        }
    }

    /// Compression, request tracing and JSON/URL-encoded body parsing.
    pub fn configure_middleware(mut self) -> Self {
        self.stages.push(middleware::standard_stage());
        self
    }

    /// Sets the variables available to every rendered view.
    pub fn configure_locals(mut self, locals: Locals) -> Self {
        self.locals = locals;
        self
    }

    /// Applies the static CORS policy from the configuration.
    pub fn configure_cors(mut self) -> Result<Self, ServerError> {
        self.stages.push(middleware::cors_stage(&self.config.cors)?);
        Ok(self)
    }

    /// Adds cookie sessions persisted in `store`.
    pub fn configure_session<S>(mut self, store: S) -> Result<Self, ServerError>
    where
        S: SessionStore + Clone,
    {
        self.stages
            .push(middleware::session_stage(store, &self.config.session)?);
        Ok(self)
    }

    /// Adds the authentication middleware; `register` installs strategies.
    ///
    /// Configure sessions first, otherwise no user can be restored.
    pub fn configure_auth<F>(mut self, register: F) -> Self
    where
        F: FnOnce(&mut Authenticator),
    {
        let mut authenticator = Authenticator::new();
        register(&mut authenticator);
        tracing::debug!(strategies = ?authenticator.strategy_names(), "Authentication configured");

        let authenticator = Arc::new(authenticator);
        let state = Arc::clone(&authenticator);
        self.stages.push(Box::new(move |router| {
            router.layer(axum::middleware::from_fn_with_state(state, auth::restore_user))
        }));
        self.authenticator = authenticator;
        self
    }

    /// Sets the template file extension and the views directory.
    pub fn configure_view_engine(mut self, extension: &str, views: impl Into<PathBuf>) -> Self {
        self.views = ViewEngine::new(extension, views);
        self
    }

    pub fn configure_helmet(mut self, config: HelmetConfig) -> Result<Self, ServerError> {
        self.stages.push(middleware::helmet_stage(&config)?);
        Ok(self)
    }

    /// Serves `<build_dir>/<directory>` under `/public`.
    pub fn set_public_directory(mut self, directory: &str) -> Self {
        let dir = static_files::public_directory(&self.config.build_dir, directory);
        self.routes = static_files::mount_public(self.routes, dir);
        self
    }

    pub fn set_public_routes(mut self, mode: ApiMode) -> Self {
        match mode {
            ApiMode::Lambda(handler) => {
                tracing::debug!("Mounting API routes in LAMBDA mode");
                self.lambda = Some(handler);
            }
            ApiMode::Default(modules) => {
                let names: Vec<&str> = modules.iter().map(|m| m.name()).collect();
                tracing::debug!(
                    "Mounting API routes in DEFAULT mode: {}",
                    serde_json::to_string_pretty(&names).unwrap_or_default()
                );
                for module in &modules {
                    self.routes = self.routes.merge(module.router());
                }
            }
        }
        self
    }

    /// Renders the SPA shell for every otherwise unmatched `GET`.
    pub fn set_spa_route(mut self) -> Self {
        self.spa = true;
        self
    }

    /// Assembles the configured router without binding a socket.
    pub fn into_router(self) -> Router {
        let state = AppState {
            environment: self.config.environment,
            manifest: ManifestCache::new(&self.config.build_dir),
            build_dir: Arc::new(self.config.build_dir),
            locals: Arc::new(self.locals),
            views: Arc::new(self.views),
            authenticator: self.authenticator,
        };

        let mut router = self.routes;

        // Unmatched requests go to the emulated handler first, then to the SPA.
        router = match self.lambda {
            Some(handler) => {
                let downstream: Router<AppState> = if self.spa {
                    Router::new().fallback(spa::render_shell)
                } else {
                    Router::new()
                };
                let fallback = downstream
                    .layer(axum::middleware::from_fn_with_state(handler, lambda::emulate))
                    .with_state(state.clone());
                router.fallback_service(fallback)
            }
            None if self.spa => router.fallback(spa::render_shell),
            None => router,
        };

        for stage in self.stages.into_iter().rev() {
            router = stage(router);
        }

        router.with_state(state)
    }

    /// Binds `0.0.0.0:port` and serves until the process exits.
    pub async fn listen(self, port: u16) -> Result<(), ServerError> {
        self.listen_with(port, |_| {}).await
    }

    /// Like [`listen`](Self::listen), calling `on_listening` once bound.
    pub async fn listen_with<F>(self, port: u16, on_listening: F) -> Result<(), ServerError>
    where
        F: FnOnce(SocketAddr) + Send + 'static,
    {
        let listener_config = self.config.listener.clone();
        let router = self.into_router();
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        listener::serve(router, addr, &listener_config, on_listening).await
    }
}
