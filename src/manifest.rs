//! Webpack build manifest (`stats.json`) loading and asset path extraction.
//!
//! The manifest is produced by the front-end build and read lazily on the
//! first SPA request. Reads go through [`ManifestCache`], which keeps the parsed
//! manifest behind an `arc-swap` pointer so the hot path never locks.

use arc_swap::ArcSwapOption;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::AppError;

/// File name of the manifest inside the build directory.
pub const STATS_FILE: &str = "stats.json";

/// The subset of webpack's stats output consumed by the SPA route.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStats {
    #[serde(default)]
    pub public_path: String,
    #[serde(default)]
    pub assets_by_chunk_name: HashMap<String, ChunkAssets>,
}

/// Assets emitted for one chunk.
///
/// Development builds emit a single string for the main chunk; production
/// builds emit an array that also carries the extracted stylesheet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ChunkAssets {
    Single(String),
    Many(Vec<String>),
}

/// Script and stylesheet paths for a chunk, relative to `publicPath`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPaths {
    pub js: String,
    pub css: Option<String>,
}

/// Extracts script and stylesheet paths from a chunk entry.
///
/// A string entry is taken verbatim as the script and never yields a
/// stylesheet. An array entry yields its first `.js` and first `.css` file.
/// A missing chunk yields an empty script path.
pub fn parse_asset_paths(chunk: Option<&ChunkAssets>) -> AssetPaths {
    match chunk {
        None => AssetPaths::default(),
        Some(ChunkAssets::Single(js)) => AssetPaths {
            js: js.clone(),
            css: None,
        },
        Some(ChunkAssets::Many(files)) => AssetPaths {
            js: files
                .iter()
                .find(|f| has_extension(f, "js"))
                .cloned()
                .unwrap_or_default(),
            css: files.iter().find(|f| has_extension(f, "css")).cloned(),
        },
    }
}

fn has_extension(file: &str, ext: &str) -> bool {
    // Ignore query strings and fragments such as `main.css?v=3`.
    let file = file.split(['?', '#']).next().unwrap_or(file);
    Path::new(file)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Joins `publicPath` and an asset name the way a URL path is joined.
pub fn join_public_path(public_path: &str, asset: &str) -> String {
    let asset = asset.trim_start_matches('/');
    if asset.is_empty() {
        return public_path.to_string();
    }

    let base = public_path.trim_end_matches('/');
    if base.is_empty() {
        if public_path.starts_with('/') {
            format!("/{asset}")
        } else {
            asset.to_string()
        }
    } else {
        format!("{base}/{asset}")
    }
}

/// Resolves an asset named in the manifest to a file under the build directory.
pub fn asset_file_path(build_dir: &Path, public_path: &str, asset: &str) -> PathBuf {
    let mut path = build_dir.to_path_buf();
    for segment in public_path
        .split('/')
        .chain(asset.split('/'))
        .filter(|s| !s.is_empty() && *s != ".")
    {
        path.push(segment);
    }
    path
}

/// Shared, lock-free cache of the parsed build manifest.
#[derive(Clone, Debug)]
pub struct ManifestCache {
    path: Arc<PathBuf>,
    cached: Arc<ArcSwapOption<BuildStats>>,
}

impl ManifestCache {
    /// Creates an empty cache for `<build_dir>/stats.json`.
    pub fn new(build_dir: &Path) -> Self {
        Self {
            path: Arc::new(build_dir.join(STATS_FILE)),
            cached: Arc::new(ArcSwapOption::empty()),
        }
    }

    /// Returns the cached manifest, reading it from disk on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Manifest`] when the file is missing or malformed.
    pub async fn load(&self) -> Result<Arc<BuildStats>, AppError> {
        if let Some(stats) = self.cached.load_full() {
            return Ok(stats);
        }

        let raw = tokio::fs::read(self.path.as_path()).await.map_err(|e| {
            AppError::Manifest(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        let stats: BuildStats = serde_json::from_slice(&raw).map_err(|e| {
            AppError::Manifest(format!("failed to parse {}: {}", self.path.display(), e))
        })?;

        let stats = Arc::new(stats);
        self.cached.store(Some(Arc::clone(&stats)));
        Ok(stats)
    }

    /// Drops the cached manifest so the next [`load`](Self::load) re-reads it.
    pub fn invalidate(&self) {
        self.cached.store(None);
    }

    pub fn is_cached(&self) -> bool {
        self.cached.load().is_some()
    }
}
