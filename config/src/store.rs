//! Validating config store.
//!
//! [`ConfigStore`] pairs a mutable [`ConfigTree`] with a typed schema model.
//! Mutations go through the tree; [`ConfigStore::validate`] deserializes and
//! validates the current tree into the model, caching the result until the
//! next mutation.

use std::sync::Arc;

use errors::{TreeError, ValidationIssue};
use floe_core::ConfigTree;
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Deserializes `value` into `M` and runs its `validator` rules, flattening
/// every failure into dotted-path [`ValidationIssue`]s.
pub fn validate_value<M>(value: Value) -> Result<M, Vec<ValidationIssue>>
where
    M: DeserializeOwned + Validate
{
    let model: M = serde_json::from_value(value).map_err(|err| {
        vec![ValidationIssue {
            path: ".".to_string(),
            code: "deserialize".to_string(),
            message: err.to_string()
        }]
    })?;

    match model.validate() {
        Ok(()) => Ok(model),
        Err(errors) => {
            let mut issues = Vec::new();
            flatten_validation_errors("", &errors, &mut issues);
            Err(issues)
        }
    }
}

fn flatten_validation_errors(
    prefix: &str,
    errors: &ValidationErrors,
    issues: &mut Vec<ValidationIssue>
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for err in field_errors {
                    issues.push(ValidationIssue {
                        path: path.clone(),
                        code: err.code.to_string(),
                        message: err
                            .message
                            .as_ref()
                            .map(|msg| msg.to_string())
                            .unwrap_or_else(|| format!("failed '{}' rule", err.code))
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                flatten_validation_errors(&path, nested, issues);
            }
            ValidationErrorsKind::List(entries) => {
                for (index, nested) in entries {
                    flatten_validation_errors(&format!("{path}.{index}"), nested, issues);
                }
            }
        }
    }
}

/// A config tree plus the schema model it validates into.
///
/// The model cache is invalidated by any mutation; `model()` returns the
/// result of the most recent successful [`ConfigStore::validate`] call.
pub struct ConfigStore<M> {
    tree: ConfigTree,
    model: Option<Arc<M>>,
    issues: Vec<ValidationIssue>
}

impl<M> ConfigStore<M>
where
    M: DeserializeOwned + Validate
{
    pub fn new(tree: ConfigTree) -> Self {
        Self {
            tree,
            model: None,
            issues: Vec::new()
        }
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn get(&self, path: &str) -> Result<Option<&Value>, TreeError> {
        self.tree.get(path)
    }

    /// Writes a value, creating intermediate mappings, and drops the cached
    /// model.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), TreeError> {
        self.tree.set(path, value, true)?;
        self.invalidate();
        Ok(())
    }

    /// Merges overlay trees on top of the current tree and drops the cached
    /// model.
    pub fn merge(&mut self, overlays: &[ConfigTree]) -> Result<(), TreeError> {
        self.tree.merge(overlays)?;
        self.invalidate();
        Ok(())
    }

    /// Re-validates the current tree. Returns `true` when the tree
    /// deserializes and passes all schema rules.
    ///
    /// Idempotent between mutations: calling it twice does not re-run
    /// deserialization.
    pub fn validate(&mut self) -> bool {
        if self.model.is_some() {
            return true;
        }
        if !self.issues.is_empty() {
            return false;
        }
        match validate_value::<M>(self.tree.root().clone()) {
            Ok(model) => {
                self.model = Some(Arc::new(model));
                true
            }
            Err(issues) => {
                self.issues = issues;
                false
            }
        }
    }

    /// The validated model, if the last [`ConfigStore::validate`] succeeded.
    pub fn model(&self) -> Option<Arc<M>> {
        self.model.clone()
    }

    /// Issues from the last failed [`ConfigStore::validate`].
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    fn invalidate(&mut self) {
        self.model = None;
        self.issues.clear();
    }
}
