//! Template rendering for the server-rendered shell.

use minijinja::Environment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::error::AppError;

/// Page-level template variables shared by every render.
///
/// Unset fields are left out of the render context entirely, so templates see
/// them as undefined rather than as `none`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Locals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_security_policy: Option<String>,
}

/// A template engine bound to a views directory.
///
/// Views are resolved as `<views_dir>/<name>.<extension>`.
pub struct ViewEngine {
    env: Environment<'static>,
    extension: String,
    views_dir: PathBuf,
}

impl ViewEngine {
    pub fn new(extension: &str, views_dir: impl Into<PathBuf>) -> Self {
        let views_dir = views_dir.into();
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(&views_dir));

        Self {
            env,
            extension: extension.trim_start_matches('.').to_string(),
            views_dir,
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Renders `view` with the locals overlaid by `data`.
    pub fn render<T: Serialize>(&self, view: &str, locals: &Locals, data: T) -> Result<String, AppError> {
        let template = self.env.get_template(&format!("{}.{}", view, self.extension))?;

        let mut context = to_object(locals)?;
        context.extend(to_object(&data)?);

        Ok(template.render(Value::Object(context))?)
    }
}

impl Default for ViewEngine {
    fn default() -> Self {
        Self::new("html", "views")
    }
}

impl std::fmt::Debug for ViewEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewEngine")
            .field("extension", &self.extension)
            .field("views_dir", &self.views_dir)
            .finish()
    }
}

fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, AppError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(AppError::Internal(format!(
            "template data must be an object, got {other}"
        ))),
        Err(e) => Err(AppError::Internal(e.to_string())),
    }
}
