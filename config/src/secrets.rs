//! Secret-manager config source.
//!
//! [`SecretsSource`] binds dotted config paths to secret ids served by a
//! pluggable [`SecretProvider`]. Secret ids in ARN form are resolved to the
//! ARN's resource id before the provider lookup, so the same bindings work
//! against both a local provider and a cloud secret manager.

use errors::{SecretError, SettingsError};
use floe_core::ConfigTree;
use floe_core::aws::Arn;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A backend that can resolve secret ids to secret values.
pub trait SecretProvider: Send + Sync {
    /// Provider name, used in errors and logs.
    fn name(&self) -> &'static str;

    fn get_secret(&self, secret_id: &str) -> Result<String, SecretError>;

    /// Whether the provider can serve lookups right now. Defaults to
    /// available.
    fn is_available(&self) -> bool {
        true
    }
}

/// In-memory provider for tests and local development.
#[derive(Debug, Default, Clone)]
pub struct LocalSecretProvider {
    secrets: HashMap<String, String>
}

impl LocalSecretProvider {
    pub fn new(secrets: HashMap<String, String>) -> Self {
        Self { secrets }
    }

    pub fn insert(&mut self, secret_id: impl Into<String>, value: impl Into<String>) {
        self.secrets.insert(secret_id.into(), value.into());
    }
}

impl SecretProvider for LocalSecretProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    fn get_secret(&self, secret_id: &str) -> Result<String, SecretError> {
        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| SecretError::NotFound {
                secret_id: secret_id.to_string()
            })
    }
}

struct SecretBinding {
    path: String,
    secret_id: String
}

/// Binds config paths to provider-resolved secrets.
pub struct SecretsSource {
    provider: Arc<dyn SecretProvider>,
    bindings: Vec<SecretBinding>
}

impl SecretsSource {
    pub fn new(provider: Arc<dyn SecretProvider>) -> Self {
        Self {
            provider,
            bindings: Vec::new()
        }
    }

    /// Binds the config value at `path` to the secret `secret_id`.
    pub fn bind(mut self, path: impl Into<String>, secret_id: impl Into<String>) -> Self {
        self.bindings.push(SecretBinding {
            path: path.into(),
            secret_id: secret_id.into()
        });
        self
    }

    /// Resolves every binding into a tree.
    ///
    /// Any individual lookup failure fails the whole load; secrets are not
    /// values an application should silently run without.
    pub fn load(&self) -> Result<ConfigTree, SettingsError> {
        if !self.provider.is_available() {
            return Err(SecretError::Unavailable {
                provider: self.provider.name().to_string()
            }
            .into());
        }

        let mut tree = ConfigTree::new();
        for binding in &self.bindings {
            let lookup_id = resolve_secret_id(&binding.secret_id)?;
            let value = self.provider.get_secret(&lookup_id)?;
            tree.set(&binding.path, Value::String(value), true)?;
        }
        Ok(tree)
    }
}

/// ARN-form ids resolve to the ARN's resource id; anything else is used
/// verbatim. An id that claims ARN form but does not parse is an error,
/// not a verbatim lookup.
fn resolve_secret_id(secret_id: &str) -> Result<String, SecretError> {
    if secret_id.starts_with("arn:") {
        let arn = Arn::parse(secret_id).map_err(|err| SecretError::InvalidRef {
            reference: secret_id.to_string(),
            reason: err.to_string()
        })?;
        return Ok(arn.resource_id);
    }
    Ok(secret_id.to_string())
}
