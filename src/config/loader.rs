//! Load config documents from disk and turn a scheme document into a builder.

use crate::config::types::*;
use crate::config::{validate, validate_table};
use crate::error::ConfigError;
use crate::i18n::Catalog;
use crate::scheme::{Scheme, SchemeBuilder};
use serde::de::DeserializeOwned;
use std::path::Path;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&text).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
}

/// Read and validate a scheme document.
pub fn load_scheme_config(path: impl AsRef<Path>) -> Result<SchemeConfig, ConfigError> {
    let config: SchemeConfig = read_json(path.as_ref())?;
    validate(&config)?;
    Ok(config)
}

/// Read and validate a table document.
pub fn load_table_config(path: impl AsRef<Path>) -> Result<TableConfig, ConfigError> {
    let table: TableConfig = read_json(path.as_ref())?;
    validate_table(&table)?;
    Ok(table)
}

/// Read a nested JSON message catalog.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, ConfigError> {
    let value: serde_json::Value = read_json(path.as_ref())?;
    Catalog::from_json(&value)
}

impl SchemeConfig {
    /// Builder with every declaration of this document applied. Translator and
    /// renderers are code, so the caller adds them before `build`.
    pub fn into_builder(self) -> Result<SchemeBuilder, ConfigError> {
        validate(&self)?;
        let mut builder = Scheme::builder(self.identity);
        if let Some(ns) = self.namespace {
            builder = builder.namespace(ns);
        }
        if let Some(scope) = self.locale_scope {
            builder = builder.locale_scope(scope);
        }
        for c in self.categories {
            builder = builder.define_category(c.name, c.parent);
        }
        if !self.error_map.is_empty() {
            builder = builder.error_map(self.error_map);
        }
        if !self.model_error_map.is_empty() {
            builder = builder.model_error_map(self.model_error_map);
        }
        if let Some(map) = self.param_map {
            builder = builder.param_map(map);
        }
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Code;
    use crate::failure::Failure;
    use std::io::Write;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("api-scheme-{}-{}", std::process::id(), name));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn scheme_document_builds() {
        let path = temp_file(
            "scheme.json",
            r#"{
                "identity": "users",
                "namespace": "Users",
                "categories": [{"name": "Locked", "parent": "Access"}],
                "error_map": [{"errors": ["locked"], "code": "423..1"}, {"errors": ["Record::NotFound"], "code": 404}]
            }"#,
        );
        let scheme = load_scheme_config(&path).unwrap().into_builder().unwrap().build().unwrap();
        std::fs::remove_file(&path).ok();

        let locked = scheme.registry().get("Users::Locked").cloned().unwrap();
        assert_eq!(scheme.classify(&Failure::new(locked, "locked")), Some(Code::range(423, 1)));
        assert_eq!(scheme.classify(&Failure::not_found("x")), Some(Code::Status(404)));
    }

    #[test]
    fn load_errors_name_the_file() {
        let err = load_scheme_config("/nonexistent/scheme.json").unwrap_err();
        assert!(matches!(err, ConfigError::Load(ref m) if m.contains("/nonexistent/scheme.json")));

        let path = temp_file("catalog.json", r#"{"action_controller": {"users": {"errors": {"404": "No such user"}}}}"#);
        let catalog = load_catalog(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(catalog.get("action_controller.users.errors.404"), Some("No such user"));
    }
}
