//! Catch-all route that renders the single-page application shell.
//!
//! Any client-side route must not collide with a server route: the server
//! route would answer first and the SPA would never load on a page refresh.

use axum::{
    extract::State,
    http::{Method, Uri},
    response::Html,
};
use serde::Serialize;

use crate::error::AppError;
use crate::manifest::{asset_file_path, join_public_path, parse_asset_paths};
use crate::server::AppState;

/// Template rendered for every SPA request.
pub const SHELL_VIEW: &str = "core";

/// Variables passed to the shell template alongside the locals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_src: Option<String>,
    pub main_src: String,
    pub css: String,
}

pub async fn render_shell(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Html<String>, AppError> {
    if method != Method::GET && method != Method::HEAD {
        return Err(AppError::NotFound(uri.path().to_string()));
    }

    tracing::debug!(path = %uri.path(), "Received request");

    if state.environment.is_development() {
        state.manifest.invalidate();
    }
    let stats = state.manifest.load().await?;

    let common = parse_asset_paths(stats.assets_by_chunk_name.get("common"));
    let main_chunk = stats
        .assets_by_chunk_name
        .get("main")
        .ok_or_else(|| AppError::Manifest("no `main` chunk in assetsByChunkName".into()))?;
    let main = parse_asset_paths(Some(main_chunk));

    let css = match &main.css {
        Some(file) => {
            let path = asset_file_path(&state.build_dir, &stats.public_path, file);
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| AppError::Asset {
                    path: path.display().to_string(),
                    source,
                })?
        }
        None => String::new(),
    };

    let context = ShellContext {
        common_src: (!common.js.is_empty()).then(|| join_public_path(&stats.public_path, &common.js)),
        main_src: join_public_path(&stats.public_path, &main.js),
        css,
    };

    let html = state.views.render(SHELL_VIEW, &state.locals, &context)?;
    Ok(Html(html))
}
