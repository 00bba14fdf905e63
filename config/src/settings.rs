//! Settings pipeline.
//!
//! [`SettingsBuilder`] describes the ordered config sources (defaults,
//! files, environment, secrets) and produces a validated model.
//! [`SettingsManager`] holds the current model behind an atomic swap and
//! rebuilds it when the reconfigure signal fires. A failed rebuild leaves
//! the previous model authoritative.

use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use errors::SettingsError;
use floe_core::ConfigTree;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};
use validator::Validate;

use crate::env_loader::EnvSource;
use crate::file_loader::LoaderRegistry;
use crate::secrets::SecretsSource;
use crate::signal::{RECONFIGURE_SIGNAL, SignalHub};
use crate::store::validate_value;

/// Opt-out hook for runtime reloads.
///
/// The manager consults the freshly validated model; a model that returns
/// `false` is never wired to the reconfigure signal.
pub trait Reconfigurable {
    fn allow_reconfigure(&self) -> bool {
        true
    }
}

enum SourceLayer {
    Defaults(Value),
    Files(Vec<PathBuf>),
    Env(EnvSource),
    Secrets(SecretsSource)
}

/// Ordered description of the config sources for a model `M`.
///
/// Later layers override earlier ones, leaf by leaf.
pub struct SettingsBuilder<M> {
    registry: LoaderRegistry,
    layers: Vec<SourceLayer>,
    _model: PhantomData<fn() -> M>
}

impl<M> SettingsBuilder<M>
where
    M: DeserializeOwned + Validate
{
    pub fn new() -> Self {
        Self {
            registry: LoaderRegistry::with_builtins(),
            layers: Vec::new(),
            _model: PhantomData
        }
    }

    /// Replaces the loader registry, for callers registering custom
    /// formats.
    pub fn with_registry(mut self, registry: LoaderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Adds a lowest-priority defaults layer from a JSON value.
    pub fn with_defaults(mut self, defaults: Value) -> Self {
        self.layers.push(SourceLayer::Defaults(defaults));
        self
    }

    /// Adds a layer of config files, loaded through the registry.
    pub fn with_files(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.layers
            .push(SourceLayer::Files(paths.into_iter().collect()));
        self
    }

    /// Adds an environment-variable layer.
    pub fn with_env(mut self, source: EnvSource) -> Self {
        self.layers.push(SourceLayer::Env(source));
        self
    }

    /// Adds a secret-manager layer.
    pub fn with_secrets(mut self, source: SecretsSource) -> Self {
        self.layers.push(SourceLayer::Secrets(source));
        self
    }

    /// Merges every layer into one tree, then follows the tree's
    /// `additional_config_files` list through the registry.
    pub fn build_tree(&self) -> Result<ConfigTree, SettingsError> {
        let mut tree = ConfigTree::new();
        for layer in &self.layers {
            match layer {
                SourceLayer::Defaults(value) => tree.merge_value(value)?,
                SourceLayer::Files(paths) => {
                    tree.merge(&self.registry.load_files(paths)?)?;
                }
                SourceLayer::Env(source) => tree.merge(&[source.load()])?,
                SourceLayer::Secrets(source) => tree.merge(&[source.load()?])?
            }
        }

        let additional = additional_files(&tree);
        if !additional.is_empty() {
            info!(count = additional.len(), "loading additional config files");
            tree.merge(&self.registry.load_files(&additional)?)?;
        }
        Ok(tree)
    }

    /// Builds the tree and validates it into the model.
    pub fn build(&self) -> Result<(ConfigTree, M), SettingsError> {
        let tree = self.build_tree()?;
        let model = validate_value::<M>(tree.root().clone())
            .map_err(|issues| SettingsError::Validation { issues })?;
        Ok((tree, model))
    }

}

impl<M> Default for SettingsBuilder<M>
where
    M: DeserializeOwned + Validate
{
    fn default() -> Self {
        Self::new()
    }
}

fn additional_files(tree: &ConfigTree) -> Vec<PathBuf> {
    let Ok(Some(Value::Array(entries))) = tree.get("additional_config_files") else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(path) => Some(PathBuf::from(path)),
            other => {
                warn!(value = %other, "ignoring non-string additional config file entry");
                None
            }
        })
        .collect()
}

struct LoadedSettings<M> {
    model: Arc<M>,
    loaded_at: DateTime<Utc>
}

/// Holds the current validated settings and rebuilds them on signal.
///
/// Readers take cheap snapshots; a reload swaps the whole instance in one
/// atomic store, so no reader ever observes a half-applied config.
pub struct SettingsManager<M> {
    builder: SettingsBuilder<M>,
    current: ArcSwap<LoadedSettings<M>>
}

impl<M> SettingsManager<M>
where
    M: DeserializeOwned + Validate + Reconfigurable + Send + Sync + 'static
{
    /// Performs the initial load and, when both the caller and the model
    /// permit it, wires a reload handler to [`RECONFIGURE_SIGNAL`].
    pub fn load(
        builder: SettingsBuilder<M>,
        hub: Option<&SignalHub>,
        allow_reconfigure: bool
    ) -> Result<Arc<Self>, SettingsError> {
        let (_, model) = builder.build()?;
        let reloadable = allow_reconfigure && model.allow_reconfigure();

        let manager = Arc::new(Self {
            builder,
            current: ArcSwap::from_pointee(LoadedSettings {
                model: Arc::new(model),
                loaded_at: Utc::now()
            })
        });

        if let Some(hub) = hub {
            if reloadable {
                let weak: Weak<Self> = Arc::downgrade(&manager);
                hub.connect(RECONFIGURE_SIGNAL, move || match weak.upgrade() {
                    Some(manager) => manager.reload(),
                    None => Ok(())
                });
            } else {
                info!("settings reloads disabled, not connecting reconfigure handler");
            }
        }

        Ok(manager)
    }

    /// The current validated model.
    pub fn snapshot(&self) -> Arc<M> {
        Arc::clone(&self.current.load().model)
    }

    /// When the current model was loaded.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.current.load().loaded_at
    }

    /// Rebuilds from all sources and swaps the result in.
    ///
    /// Errors propagate to the caller; the previous model stays in place.
    pub fn reload(&self) -> Result<(), SettingsError> {
        let (_, model) = self.builder.build()?;
        self.current.store(Arc::new(LoadedSettings {
            model: Arc::new(model),
            loaded_at: Utc::now()
        }));
        info!("settings reloaded");
        Ok(())
    }
}
