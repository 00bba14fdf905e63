//! Declarative startup/shutdown resources.

use std::any::Any;
use std::collections::HashMap;

use errors::ContextError;
use floe_core::ConfigTree;
use serde_json::Value;
use tracing::{info, warn};

/// A resource held in the lifespan context.
///
/// `terminate` is the teardown hook; the default is a no-op for resources
/// that release themselves on drop.
pub trait ContextResource: Any + Send + Sync {
    fn terminate(&self) -> Result<(), String> {
        Ok(())
    }

    /// For typed retrieval through [`LifespanContext::get_as`].
    fn as_any(&self) -> &dyn Any;
}

/// Declares a named resource bound to a config sub-tree.
#[derive(Debug, Clone)]
pub struct ContextField {
    name: String,
    config_key: Option<String>,
    use_default_section: bool
}

impl ContextField {
    /// A field whose config section is looked up under its own name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_key: None,
            use_default_section: false
        }
    }

    /// Looks the config section up under `key` instead of the field name.
    pub fn config_key(mut self, key: impl Into<String>) -> Self {
        self.config_key = Some(key.into());
        self
    }

    /// Falls back to the `"default"` section when the field's own section
    /// is missing.
    pub fn use_default_section(mut self) -> Self {
        self.use_default_section = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn resolved_key(&self) -> &str {
        self.config_key.as_deref().unwrap_or(&self.name)
    }
}

type Initializer = Box<dyn Fn(&Value) -> Result<Box<dyn ContextResource>, ContextError> + Send + Sync>;

/// Declared fields, their initializers and, once configured, their live
/// resources.
#[derive(Default)]
pub struct LifespanContext {
    fields: Vec<ContextField>,
    initializers: HashMap<String, Initializer>,
    resources: HashMap<String, Box<dyn ContextResource>>,
    configured: bool
}

impl LifespanContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field. Declaration order is initialization order.
    pub fn declare(&mut self, field: ContextField) -> &mut Self {
        self.fields.push(field);
        self
    }

    /// Registers the initializer for a declared field.
    pub fn on_init<F>(&mut self, name: &str, initializer: F) -> Result<(), ContextError>
    where
        F: Fn(&Value) -> Result<Box<dyn ContextResource>, ContextError> + Send + Sync + 'static
    {
        if !self.fields.iter().any(|field| field.name == name) {
            return Err(ContextError::UnknownField {
                field: name.to_string()
            });
        }
        self.initializers.insert(name.to_string(), Box::new(initializer));
        Ok(())
    }

    /// Runs every initializer against its config section.
    ///
    /// Fails on the first field without an initializer or config section.
    /// A context configures at most once per lifecycle.
    pub fn configure(&mut self, config: &ConfigTree) -> Result<(), ContextError> {
        if self.configured {
            return Err(ContextError::AlreadyConfigured);
        }

        for field in &self.fields {
            let initializer =
                self.initializers
                    .get(&field.name)
                    .ok_or_else(|| ContextError::UnknownField {
                        field: field.name.clone()
                    })?;

            let key = field.resolved_key();
            let mut section = config.get(key).ok().flatten();
            if section.is_none() && field.use_default_section {
                section = config.get("default").ok().flatten();
            }
            let section = section.ok_or_else(|| ContextError::MissingSection {
                field: field.name.clone(),
                config_key: key.to_string()
            })?;

            let resource = initializer(section).map_err(|err| match err {
                known @ (ContextError::MissingSection { .. }
                | ContextError::UnknownField { .. }) => known,
                other => ContextError::InitFailed {
                    field: field.name.clone(),
                    reason: other.to_string()
                }
            })?;
            info!(field = %field.name, "context field initialized");
            self.resources.insert(field.name.clone(), resource);
        }

        self.configured = true;
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn get(&self, name: &str) -> Option<&dyn ContextResource> {
        self.resources.get(name).map(Box::as_ref)
    }

    /// The resource behind `name`, downcast to its concrete type.
    pub fn get_as<T: ContextResource>(&self, name: &str) -> Option<&T> {
        self.get(name)?.as_any().downcast_ref::<T>()
    }

    /// Tears every configured resource down, in declaration order.
    ///
    /// Keeps going past individual failures and reports them all at once.
    /// After terminate the context may be configured again.
    pub fn terminate(&mut self) -> Result<(), ContextError> {
        let mut failures = Vec::new();
        for field in &self.fields {
            let Some(resource) = self.resources.get(&field.name) else {
                continue;
            };
            if let Err(reason) = resource.terminate() {
                warn!(field = %field.name, reason, "context teardown failed");
                failures.push((field.name.clone(), reason));
            }
        }
        self.resources.clear();
        self.configured = false;

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ContextError::TeardownFailed { failures })
        }
    }
}
