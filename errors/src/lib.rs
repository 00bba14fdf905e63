//! # Floe Errors
//!
//! Error types shared across the floe workspace.
//!
//! Conventions:
//! - `thiserror` enums with named fields
//! - one enum per failure domain (tree, loader, settings, secrets, db,
//!   context)
//! - errors carry enough context to be actionable without a backtrace

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dotted-path operations on a `ConfigTree`.
///
/// These are configuration errors in the strict sense: the caller handed us
/// a path that cannot be applied to the current tree shape. They surface
/// immediately, never as a deferred validation issue.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("path '{path}': segment '{segment}' is not a mapping")]
    NotAMapping { path: String, segment: String },

    #[error("path '{path}': segment '{segment}' addresses a sequence but is not an integer")]
    IndexExpected { path: String, segment: String },

    #[error("path '{path}': writing through a sequence segment is unsupported")]
    SequenceUnsupported { path: String },

    #[error("path '{path}': intermediate key '{segment}' does not exist")]
    MissingParent { path: String, segment: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String }
}

/// Config file loading.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("loader for '{format}' is unavailable: {reason}")]
    Unavailable { format: String, reason: String },

    #[error("failed to parse {path} as {format}: {reason}")]
    Parse {
        path: String,
        format: String,
        reason: String
    },

    #[error("io error reading {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("config file has no extension: {path}")]
    NoExtension { path: String },

    #[error("unsupported config file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("no config sources could be loaded out of {requested} requested file(s)")]
    NoSourcesLoaded { requested: usize }
}

/// A single structured validation failure, addressable by dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted path of the offending field, or `"."` for model-level issues.
    pub path: String,
    /// Machine-readable code (`validator` code or `"deserialize"`).
    pub code: String,
    pub message: String
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.path, self.message, self.code)
    }
}

/// Settings pipeline failures.
///
/// A failed load or reload propagates one of these to the triggering caller;
/// the previously valid settings instance stays authoritative.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings validation failed with {} issue(s)", issues.len())]
    Validation { issues: Vec<ValidationIssue> },

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error("reconfigure dispatch for '{signal}' failed: {failures:?}")]
    Dispatch {
        signal: String,
        failures: Vec<String>
    }
}

/// Secret provider lookups.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret not found: {secret_id}")]
    NotFound { secret_id: String },

    #[error("secret provider '{provider}' is unavailable")]
    Unavailable { provider: String },

    #[error("invalid secret reference '{reference}': {reason}")]
    InvalidRef { reference: String, reason: String }
}

/// Database-config registry and client construction.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database config '{name}' has no 'type' discriminator")]
    MissingDiscriminator { name: String },

    #[error("unknown database type '{db_type}' (known: {known:?})")]
    UnknownType {
        db_type: String,
        known: Vec<String>
    },

    #[error("invalid '{db_type}' database config: {issues:?}")]
    InvalidConfig {
        db_type: String,
        issues: Vec<ValidationIssue>
    },

    #[error("failed to initialize '{db_type}' client: {reason}")]
    ClientInit { db_type: String, reason: String }
}

/// Lifespan context configuration and teardown.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("no initializer registered for context field '{field}'")]
    UnknownField { field: String },

    #[error("config section '{config_key}' for context field '{field}' is missing")]
    MissingSection { field: String, config_key: String },

    #[error("initializer for context field '{field}' failed: {reason}")]
    InitFailed { field: String, reason: String },

    #[error("context is already configured")]
    AlreadyConfigured,

    #[error("teardown failed for {} field(s): {failures:?}", failures.len())]
    TeardownFailed { failures: Vec<(String, String)> }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "service.port".to_string(),
            code: "range".to_string(),
            message: "out of range".to_string()
        };
        assert_eq!(issue.to_string(), "service.port: out of range (range)");
    }

    #[test]
    fn test_tree_error_messages() {
        let err = TreeError::IndexExpected {
            path: "a.items.x".to_string(),
            segment: "x".to_string()
        };
        assert!(err.to_string().contains("not an integer"));
    }

    #[test]
    fn test_no_sources_loaded_counts_requested() {
        let err = LoaderError::NoSourcesLoaded { requested: 3 };
        assert!(err.to_string().contains("3 requested"));
    }

    #[test]
    fn test_settings_error_from_loader() {
        let err: SettingsError = LoaderError::NoExtension {
            path: "config".to_string()
        }
        .into();
        assert!(matches!(err, SettingsError::Loader(_)));
    }
}
