//! # Configuration System
//!
//! Centralized configuration management for floe applications.
//!
//! This crate provides:
//! - The default settings schema ([`AppConfig`]) with `validator` rules
//! - File loaders (YAML, TOML, dotenv) behind an extension-dispatched
//!   registry
//! - An environment-variable source (prefix + nested delimiter)
//! - A secret-manager source with pluggable providers
//! - A validating config store with dotted-path access
//! - A settings manager with an explicit, caller-triggered reconfigure
//!   signal (no file watching, no background poller)
//!
//! # Best Practices
//!
//! - Uses `validator` for schema validation
//! - Follows 12-factor app configuration principles
//! - Reload failures never corrupt the previously valid settings

pub mod env_loader;
pub mod file_loader;
pub mod model;
pub mod secrets;
pub mod settings;
pub mod signal;
pub mod store;

pub use env_loader::EnvSource;
pub use file_loader::{EnvFileLoader, FileLoader, LoaderRegistry, TomlLoader, YamlLoader};
pub use model::{AppConfig, ServiceApp, ServiceConfig};
pub use secrets::{LocalSecretProvider, SecretProvider, SecretsSource};
pub use settings::{Reconfigurable, SettingsBuilder, SettingsManager};
pub use signal::{RECONFIGURE_SIGNAL, SignalHub};
pub use store::{ConfigStore, validate_value};
pub use validator::Validate;
