pub mod health;
pub mod spa;
pub mod static_files;

use axum::Router;

use crate::server::AppState;

/// A self-contained group of API routes mounted in `DEFAULT` mode.
pub trait RouteModule: Send + Sync {
    /// Name used when logging the mounted modules.
    fn name(&self) -> &str;

    fn router(&self) -> Router<AppState>;
}

/// A [`RouteModule`] built from an existing router.
#[derive(Clone)]
pub struct NamedRoutes {
    name: String,
    router: Router<AppState>,
}

impl NamedRoutes {
    pub fn new(name: impl Into<String>, router: Router<AppState>) -> Self {
        Self {
            name: name.into(),
            router,
        }
    }
}

impl RouteModule for NamedRoutes {
    fn name(&self) -> &str {
        &self.name
    }

    fn router(&self) -> Router<AppState> {
        self.router.clone()
    }
}
