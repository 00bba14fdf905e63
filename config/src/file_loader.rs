//! Config file loaders.
//!
//! Each loader handles one on-disk format and produces a [`ConfigTree`].
//! [`LoaderRegistry`] dispatches on file extension, skips files it cannot
//! serve (with a warning), and fails only when parsing fails or nothing at
//! all could be loaded.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use errors::LoaderError;
use floe_core::ConfigTree;
use serde_json::Value;
use tracing::warn;

use crate::env_loader::coerce_scalar;

/// One on-disk config format.
pub trait FileLoader: Send + Sync {
    /// Human-readable format name, used in errors and logs.
    fn format(&self) -> &'static str;

    /// File extensions (lowercase, without the dot) this loader serves.
    fn extensions(&self) -> &'static [&'static str];

    /// Whether the loader can run at all. Defaults to available; loaders
    /// backed by optional tooling override this.
    fn check(&self) -> Result<(), LoaderError> {
        Ok(())
    }

    /// Parses file content that was already read into memory.
    fn load_from_str(&self, text: &str, origin: &str) -> Result<ConfigTree, LoaderError>;

    /// Reads and parses a file.
    fn load(&self, path: &Path) -> Result<ConfigTree, LoaderError> {
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|err| LoaderError::Io {
            path: origin.clone(),
            reason: err.to_string()
        })?;
        self.load_from_str(&text, &origin)
    }
}

/// YAML files (`.yaml`, `.yml`).
pub struct YamlLoader;

impl FileLoader for YamlLoader {
    fn format(&self) -> &'static str {
        "yaml"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["yaml", "yml"]
    }

    fn load_from_str(&self, text: &str, origin: &str) -> Result<ConfigTree, LoaderError> {
        let value: Value = serde_yaml::from_str(text).map_err(|err| LoaderError::Parse {
            path: origin.to_string(),
            format: self.format().to_string(),
            reason: err.to_string()
        })?;
        // An empty document parses as null; treat it as an empty tree.
        if value.is_null() {
            return Ok(ConfigTree::new());
        }
        ConfigTree::from_value(value).map_err(|err| LoaderError::Parse {
            path: origin.to_string(),
            format: self.format().to_string(),
            reason: err.to_string()
        })
    }
}

/// TOML files (`.toml`).
pub struct TomlLoader;

impl FileLoader for TomlLoader {
    fn format(&self) -> &'static str {
        "toml"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["toml"]
    }

    fn load_from_str(&self, text: &str, origin: &str) -> Result<ConfigTree, LoaderError> {
        let table: toml::Table = text.parse().map_err(|err: toml::de::Error| {
            LoaderError::Parse {
                path: origin.to_string(),
                format: self.format().to_string(),
                reason: err.to_string()
            }
        })?;
        let value = serde_json::to_value(table).map_err(|err| LoaderError::Parse {
            path: origin.to_string(),
            format: self.format().to_string(),
            reason: err.to_string()
        })?;
        ConfigTree::from_value(value).map_err(|err| LoaderError::Parse {
            path: origin.to_string(),
            format: self.format().to_string(),
            reason: err.to_string()
        })
    }
}

/// Dotenv-style files (`.env`).
///
/// `KEY=VALUE` lines, `#` comments, optional single/double quotes and a
/// leading `export `. Keys split on `nested_delimiter` become nested
/// mappings with lowercased segments.
pub struct EnvFileLoader {
    pub nested_delimiter: String
}

impl Default for EnvFileLoader {
    fn default() -> Self {
        Self {
            nested_delimiter: "__".to_string()
        }
    }
}

impl FileLoader for EnvFileLoader {
    fn format(&self) -> &'static str {
        "dotenv"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["env"]
    }

    fn load_from_str(&self, text: &str, origin: &str) -> Result<ConfigTree, LoaderError> {
        let mut tree = ConfigTree::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
            let Some((key, raw)) = line.split_once('=') else {
                return Err(LoaderError::Parse {
                    path: origin.to_string(),
                    format: self.format().to_string(),
                    reason: format!("line {}: expected KEY=VALUE", lineno + 1)
                });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(LoaderError::Parse {
                    path: origin.to_string(),
                    format: self.format().to_string(),
                    reason: format!("line {}: empty key", lineno + 1)
                });
            }
            let raw = raw.trim();
            let raw = raw
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .or_else(|| {
                    raw.strip_prefix('\'')
                        .and_then(|rest| rest.strip_suffix('\''))
                })
                .unwrap_or(raw);

            let path = key
                .split(self.nested_delimiter.as_str())
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
                .join(".");
            if let Err(err) = tree.set(&path, coerce_scalar(raw), true) {
                warn!(origin, key, error = %err, "skipping conflicting dotenv entry");
            }
        }
        Ok(tree)
    }
}

/// Extension-dispatched loader registry.
pub struct LoaderRegistry {
    by_extension: HashMap<String, Arc<dyn FileLoader>>
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self {
            by_extension: HashMap::new()
        }
    }

    /// A registry with the built-in YAML, TOML and dotenv loaders.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(YamlLoader));
        registry.register(Arc::new(TomlLoader));
        registry.register(Arc::new(EnvFileLoader::default()));
        registry
    }

    /// Registers a loader for all of its extensions. Later registrations
    /// override earlier ones for shared extensions.
    pub fn register(&mut self, loader: Arc<dyn FileLoader>) {
        for extension in loader.extensions() {
            self.by_extension
                .insert((*extension).to_string(), Arc::clone(&loader));
        }
    }

    pub fn loader_for(&self, path: &Path) -> Result<Arc<dyn FileLoader>, LoaderError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| LoaderError::NoExtension {
                path: path.display().to_string()
            })?;
        self.by_extension
            .get(&extension)
            .cloned()
            .ok_or(LoaderError::UnsupportedFormat { extension })
    }

    /// Loads each file into a tree, in order.
    ///
    /// Files with an unknown or missing extension, files that do not exist
    /// and files whose loader is unavailable are skipped with a warning.
    /// Parse failures propagate. If files were requested but none loaded,
    /// the whole call fails.
    pub fn load_files(&self, paths: &[std::path::PathBuf]) -> Result<Vec<ConfigTree>, LoaderError> {
        let mut trees = Vec::new();
        for path in paths {
            let loader = match self.loader_for(path) {
                Ok(loader) => loader,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping config file");
                    continue;
                }
            };
            if !path.exists() {
                warn!(path = %path.display(), "skipping missing config file");
                continue;
            }
            if let Err(err) = loader.check() {
                warn!(path = %path.display(), error = %err, "skipping config file, loader unavailable");
                continue;
            }
            trees.push(loader.load(path)?);
        }
        if trees.is_empty() && !paths.is_empty() {
            return Err(LoaderError::NoSourcesLoaded {
                requested: paths.len()
            });
        }
        Ok(trees)
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
