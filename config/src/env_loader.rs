//! Environment-variable config source.
//!
//! [`EnvSource`] scans the process environment for variables carrying the
//! configured prefix and builds a [`ConfigTree`] out of them. Variable names
//! split on the nested delimiter become nested mappings with lowercased
//! segments; values are coerced to JSON scalars.

use floe_core::ConfigTree;
use serde_json::Value;
use tracing::warn;

/// Interprets an environment-style string as the most specific JSON scalar
/// it matches.
///
/// Order: bool, integer, float, inline JSON (`{...}` / `[...]`), string.
pub(crate) fn coerce_scalar(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        if float.is_finite() {
            return Value::from(float);
        }
    }
    if raw.starts_with('{') || raw.starts_with('[') {
        if let Ok(value) = serde_json::from_str::<Value>(raw) {
            return value;
        }
    }
    Value::String(raw.to_string())
}

/// Environment-variable source with a prefix and a nesting delimiter.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    nested_delimiter: String
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            nested_delimiter: "__".to_string()
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.nested_delimiter = delimiter.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Builds a tree from the current process environment.
    ///
    /// Variables whose nested path conflicts with an already-set scalar are
    /// skipped with a warning rather than failing the load. Keys are
    /// processed in sorted order so the outcome does not depend on
    /// environment iteration order.
    pub fn load(&self) -> ConfigTree {
        let mut entries: Vec<(String, String)> = std::env::vars()
            .filter_map(|(name, value)| {
                name.strip_prefix(&self.prefix)
                    .map(|rest| (rest.to_string(), value))
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut tree = ConfigTree::new();
        for (name, value) in entries {
            let path = name
                .split(self.nested_delimiter.as_str())
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
                .join(".");
            if path.is_empty() || path.split('.').any(str::is_empty) {
                warn!(variable = %name, "skipping malformed environment variable name");
                continue;
            }
            if let Err(err) = tree.set(&path, coerce_scalar(&value), true) {
                warn!(variable = %name, error = %err, "skipping conflicting environment variable");
            }
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_coerce_scalar() {
        assert_eq!(coerce_scalar("true"), json!(true));
        assert_eq!(coerce_scalar("42"), json!(42));
        assert_eq!(coerce_scalar("4.5"), json!(4.5));
        assert_eq!(coerce_scalar("{\"a\": 1}"), json!({"a": 1}));
        assert_eq!(coerce_scalar("[1, 2]"), json!([1, 2]));
        assert_eq!(coerce_scalar("hello"), json!("hello"));
        // Broken inline JSON falls back to a string.
        assert_eq!(coerce_scalar("{broken"), json!("{broken"));
    }

    #[test]
    #[serial]
    fn test_env_source_nests_and_coerces() {
        unsafe {
            env::set_var("FLOETEST_SERVICE__TITLE", "from env");
            env::set_var("FLOETEST_DEBUG", "false");
            env::set_var("FLOETEST_SERVICE__WORKERS", "4");
        }

        let tree = EnvSource::new("FLOETEST_").load();

        unsafe {
            env::remove_var("FLOETEST_SERVICE__TITLE");
            env::remove_var("FLOETEST_DEBUG");
            env::remove_var("FLOETEST_SERVICE__WORKERS");
        }

        assert_eq!(tree.get("service.title").unwrap(), Some(&json!("from env")));
        assert_eq!(tree.get("debug").unwrap(), Some(&json!(false)));
        assert_eq!(tree.get("service.workers").unwrap(), Some(&json!(4)));
    }

    #[test]
    #[serial]
    fn test_env_source_ignores_other_prefixes() {
        unsafe {
            env::set_var("OTHERAPP_DEBUG", "true");
        }
        let tree = EnvSource::new("FLOETEST_").load();
        unsafe {
            env::remove_var("OTHERAPP_DEBUG");
        }
        assert_eq!(tree.get("debug").unwrap(), None);
    }

    #[test]
    #[serial]
    fn test_env_source_custom_delimiter() {
        unsafe {
            env::set_var("FLOETEST_SERVICE0TITLE", "custom");
        }
        let tree = EnvSource::new("FLOETEST_").with_delimiter("0").load();
        unsafe {
            env::remove_var("FLOETEST_SERVICE0TITLE");
        }
        assert_eq!(tree.get("service.title").unwrap(), Some(&json!("custom")));
    }

    #[test]
    #[serial]
    fn test_conflicting_variable_skipped() {
        // SERVICE is a scalar; SERVICE__TITLE cannot nest under it. Sorted
        // order loads SERVICE first, the nested write is then skipped.
        unsafe {
            env::set_var("FLOETEST_SERVICE", "scalar");
            env::set_var("FLOETEST_SERVICE__TITLE", "nested");
        }
        let tree = EnvSource::new("FLOETEST_").load();
        unsafe {
            env::remove_var("FLOETEST_SERVICE");
            env::remove_var("FLOETEST_SERVICE__TITLE");
        }
        assert_eq!(tree.get("service").unwrap(), Some(&json!("scalar")));
    }
}
