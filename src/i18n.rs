//! Localized message lookup for error codes.

use crate::error::ConfigError;
use serde_json::Value;
use std::collections::HashMap;

/// Default key scope for error messages.
pub const DEFAULT_SCOPE: &str = "action_controller";

/// Localized string lookup. Missing keys return a placeholder, never fail.
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str) -> String;
}

/// `<scope>.<identity>.errors.<path>`
pub fn error_key(scope: &str, identity: &str, path: &str) -> String {
    format!("{}.{}.errors.{}", scope, identity, path)
}

/// Flat dotted-key message catalog.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a nested JSON object; nested keys are joined with `.`.
    /// Non-string leaves are stored in their JSON text form.
    pub fn from_json(value: &Value) -> Result<Self, ConfigError> {
        let Value::Object(root) = value else {
            return Err(ConfigError::Load("locale file must be a JSON object".into()));
        };
        let mut catalog = Catalog::new();
        let mut stack: Vec<(String, &Value)> =
            root.iter().map(|(k, v)| (k.clone(), v)).collect();
        while let Some((prefix, v)) = stack.pop() {
            match v {
                Value::Object(map) => {
                    for (k, child) in map {
                        stack.push((format!("{}.{}", prefix, k), child));
                    }
                }
                Value::String(s) => {
                    catalog.entries.insert(prefix, s.clone());
                }
                other => {
                    catalog.entries.insert(prefix, other.to_string());
                }
            }
        }
        Ok(catalog)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(s).map_err(|e| ConfigError::Load(e.to_string()))?;
        Self::from_json(&value)
    }

    pub fn insert(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.entries.insert(key.into(), message.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Translator for Catalog {
    fn translate(&self, key: &str) -> String {
        match self.get(key) {
            Some(s) => s.to_string(),
            None => {
                tracing::warn!(key = %key, "translation missing");
                format!("translation missing: {}", key)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_json_flattens_to_dotted_keys() {
        let catalog = Catalog::from_json_str(
            r#"{"action_controller": {"users": {"errors": {"404": "No such user", "422": {"1": "Taken"}}}}}"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.translate("action_controller.users.errors.404"), "No such user");
        assert_eq!(catalog.translate("action_controller.users.errors.422.1"), "Taken");
    }

    #[test]
    fn missing_key_returns_placeholder() {
        let catalog = Catalog::new();
        assert_eq!(catalog.translate("a.b"), "translation missing: a.b");
    }

    #[test]
    fn non_object_root_is_rejected() {
        assert!(Catalog::from_json_str("[1, 2]").is_err());
        assert_eq!(error_key("s", "users", "404"), "s.users.errors.404");
    }
}
