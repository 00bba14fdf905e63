//! # Configuration Structures
//!
//! The default settings schema for floe applications.
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization
//! - Use `validator` for input validation
//! - Carry per-field default functions so partial config files work

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Top-level settings schema.
///
/// Applications that need more fields embed this (or replace it) with their
/// own `Deserialize + Validate` model; the settings pipeline is generic over
/// the schema type.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct AppConfig {
    /// Toggles debug features (do not use in production!)
    #[serde(default = "default_debug")]
    pub debug: bool,

    /// Permits settings reloads via the reconfigure signal
    #[serde(default = "default_allow_reconfigure")]
    pub allow_reconfigure: bool,

    /// Additional config files to load after the initial load
    #[serde(default)]
    pub additional_config_files: Vec<String>,

    /// Description of the framework application to instantiate
    #[serde(default)]
    #[validate(nested)]
    pub service: ServiceConfig,

    /// Raw database sub-trees, consumed by the db-config registry
    #[serde(default)]
    pub databases: HashMap<String, serde_json::Value>
}

fn default_debug() -> bool {
    true
}

fn default_allow_reconfigure() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debug: default_debug(),
            allow_reconfigure: default_allow_reconfigure(),
            additional_config_files: Vec::new(),
            service: ServiceConfig::default(),
            databases: HashMap::new()
        }
    }
}

impl crate::settings::Reconfigurable for AppConfig {
    fn allow_reconfigure(&self) -> bool {
        self.allow_reconfigure
    }
}

/// Settings passed to the hosting framework when floe creates the
/// application instance.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ServiceConfig {
    /// Application title shown in generated docs
    #[serde(default = "default_service_title")]
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    /// One-line summary
    #[serde(default)]
    pub summary: Option<String>,

    /// Long-form description
    #[serde(default)]
    pub description: String,

    /// Application version string
    #[serde(default = "default_service_version")]
    #[validate(length(min = 1, max = 64))]
    pub version: String,

    /// Path of the interactive docs page
    #[serde(default = "default_docs_url")]
    #[validate(length(min = 1))]
    pub docs_url: String,

    /// Path of the OpenAPI document
    #[serde(default = "default_openapi_url")]
    #[validate(length(min = 1))]
    pub openapi_url: String,

    /// Mount prefix when the app runs behind a path-rewriting proxy
    #[serde(default)]
    pub root_path: String,

    /// Redirect trailing-slash variants of a route
    #[serde(default = "default_redirect_slashes")]
    pub redirect_slashes: bool,

    /// Advertised servers (base URL plus description)
    #[serde(default)]
    #[validate(nested)]
    pub servers: Vec<ServiceServer>,

    #[serde(default)]
    #[validate(nested)]
    pub contact: Option<ServiceContact>,

    #[serde(default)]
    #[validate(nested)]
    pub license: Option<ServiceLicense>
}

fn default_service_title() -> String {
    "Floe Service".to_string()
}

fn default_service_version() -> String {
    "0.1.0".to_string()
}

fn default_docs_url() -> String {
    "/docs".to_string()
}

fn default_openapi_url() -> String {
    "/openapi.json".to_string()
}

fn default_redirect_slashes() -> bool {
    true
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            title: default_service_title(),
            summary: None,
            description: String::new(),
            version: default_service_version(),
            docs_url: default_docs_url(),
            openapi_url: default_openapi_url(),
            root_path: String::new(),
            redirect_slashes: default_redirect_slashes(),
            servers: Vec::new(),
            contact: None,
            license: None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ServiceServer {
    #[validate(length(min = 1))]
    pub url: String,

    #[serde(default)]
    pub description: String
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ServiceContact {
    #[validate(length(min = 1))]
    pub name: String,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ServiceLicense {
    #[validate(length(min = 1))]
    pub name: String,

    #[serde(default)]
    pub identifier: Option<String>,

    #[serde(default)]
    pub url: Option<String>
}

/// The application value floe hands to the hosting framework.
///
/// The framework's routing and request pipeline stay external; this is the
/// fully resolved description the adapter layer consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceApp {
    pub title: String,
    pub version: String,
    pub description: String,
    pub docs_url: String,
    pub openapi_url: String,
    pub servers: Vec<ServiceServer>
}

impl ServiceConfig {
    /// Builds the framework-app description, resolving paths against
    /// `root_path`.
    pub fn build_app(&self) -> ServiceApp {
        let prefix = self.root_path.trim_end_matches('/');
        ServiceApp {
            title: self.title.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
            docs_url: format!("{prefix}{}", self.docs_url),
            openapi_url: format!("{prefix}{}", self.openapi_url),
            servers: self.servers.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(config.debug);
        assert!(config.allow_reconfigure);
        assert!(config.additional_config_files.is_empty());
        assert_eq!(config.service.title, "Floe Service");
        assert!(config.databases.is_empty());
    }

    #[test]
    fn test_service_config_default() {
        let service = ServiceConfig::default();
        assert_eq!(service.version, "0.1.0");
        assert_eq!(service.docs_url, "/docs");
        assert_eq!(service.openapi_url, "/openapi.json");
        assert!(service.redirect_slashes);
    }

    #[test]
    fn test_service_title_validation() {
        let mut service = ServiceConfig::default();
        service.title = String::new();
        assert!(service.validate().is_err());
    }

    #[test]
    fn test_nested_validation_reaches_service() {
        let mut config = AppConfig::default();
        config.service.version = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_contact_email_validation() {
        let contact = ServiceContact {
            name: "ops".to_string(),
            url: None,
            email: Some("not-an-email".to_string())
        };
        assert!(contact.validate().is_err());
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_build_app_resolves_root_path() {
        let mut service = ServiceConfig::default();
        service.root_path = "/api/".to_string();
        let app = service.build_app();
        assert_eq!(app.docs_url, "/api/docs");
        assert_eq!(app.openapi_url, "/api/openapi.json");
    }

    #[test]
    fn test_build_app_without_root_path() {
        let app = ServiceConfig::default().build_app();
        assert_eq!(app.docs_url, "/docs");
    }

    #[test]
    fn test_partial_config_file_fills_defaults() {
        let config: AppConfig =
            serde_json::from_value(serde_json::json!({"debug": false})).unwrap();
        assert!(!config.debug);
        assert_eq!(config.service.title, "Floe Service");
    }
}
