use anyhow::Context;
use spa_host::{
    config::ApiModeKind,
    lambda::EchoHandler,
    routes::health::HealthRoutes,
    ApiMode, Config, HelmetConfig, Locals, Server,
};
use std::env;
use tower_sessions::MemoryStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spa_host=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    let port = config.port;
    let api_mode = match config.api_mode {
        ApiModeKind::Lambda => ApiMode::lambda(EchoHandler::new()),
        ApiModeKind::Default => ApiMode::Default(vec![Box::new(HealthRoutes)]),
    };
    let views_dir = config.views_dir.clone();

    tracing::info!(
        environment = ?config.environment,
        mode = ?config.api_mode,
        "Starting SPA host on port {}",
        port
    );

    let locals = Locals {
        title: env::var("SITE_TITLE").ok(),
        author: env::var("SITE_AUTHOR").ok(),
        keyword: env::var("SITE_KEYWORDS").ok(),
        description: env::var("SITE_DESCRIPTION").ok(),
        content_security_policy: env::var("SITE_CSP").ok(),
    };

    Server::new(config)
        .configure_middleware()
        .configure_locals(locals)
        .configure_cors()?
        .configure_session(MemoryStore::default())?
        .configure_auth(|_| {})
        .configure_view_engine("html", views_dir)
        .configure_helmet(HelmetConfig::default())?
        .set_public_directory("")
        .set_public_routes(api_mode)
        .set_spa_route()
        .listen_with(port, |addr| tracing::info!(%addr, "Ready"))
        .await?;

    Ok(())
}
