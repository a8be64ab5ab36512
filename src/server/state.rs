use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::Authenticator;
use crate::config::Environment;
use crate::manifest::ManifestCache;
use crate::views::{Locals, ViewEngine};

/// State shared by every handler. Written once at startup; cheap to clone.
#[derive(Clone, Debug)]
pub struct AppState {
    pub environment: Environment,
    pub build_dir: Arc<PathBuf>,
    pub locals: Arc<Locals>,
    pub views: Arc<ViewEngine>,
    pub manifest: ManifestCache,
    pub authenticator: Arc<Authenticator>,
}
