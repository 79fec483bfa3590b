//! Error types for reference page generation

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MkRefsError {
    #[error("Failed to load configuration from {path}: {reason}")]
    ConfigLoad { path: String, reason: String },

    #[error("Missing configuration key '{key}' in section '{section}'")]
    MissingConfigKey { section: String, key: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load graph from {path}: {reason}")]
    GraphLoad { path: String, reason: String },

    #[error("Query failed: {reason}\n{query}")]
    Query { query: String, reason: String },

    #[error("Relation '{relation}' of '{subject}' points to unknown entity '{target}'")]
    UnknownEntity {
        relation: String,
        subject: String,
        target: String,
    },

    #[error("Entity '{entity}' has no value for '{attribute}'")]
    MissingAttribute { entity: String, attribute: String },

    #[error("Argument `{name}` described at {location} is not in the parameter list")]
    StaleParameterDoc { name: String, location: String },

    #[error("Package '{package}' has no documented symbol '{name}'")]
    UnknownSymbol { package: String, name: String },

    #[error("Template not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("Failed to render template {template}: {source}")]
    Render {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] yaml_serde::Error),
}

impl MkRefsError {
    /// Configuration errors are reported before any graph work begins
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            MkRefsError::ConfigLoad { .. }
                | MkRefsError::MissingConfigKey { .. }
                | MkRefsError::InvalidConfig(_)
        )
    }
}
