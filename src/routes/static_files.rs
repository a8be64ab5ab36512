use axum::{
    http::{header, HeaderValue},
    Router,
};
use std::path::{Path, PathBuf};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer};

use crate::server::AppState;

/// URL prefix under which the public directory is served.
pub const PUBLIC_PREFIX: &str = "/public";

/// Resolves the on-disk directory served under [`PUBLIC_PREFIX`].
pub fn public_directory(build_dir: &Path, directory: &str) -> PathBuf {
    let directory = directory.trim_matches('/');
    if directory.is_empty() {
        build_dir.to_path_buf()
    } else {
        build_dir.join(directory)
    }
}

/// Mounts `dir` under [`PUBLIC_PREFIX`] on `router`.
///
/// Files are served with revalidation caching; a missing file is a 404.
pub fn mount_public(router: Router<AppState>, dir: PathBuf) -> Router<AppState> {
    tracing::debug!(dir = %dir.display(), prefix = PUBLIC_PREFIX, "Serving public directory");

    let service = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=0"),
        ))
        .service(ServeDir::new(dir));

    router.nest_service(PUBLIC_PREFIX, service)
}
