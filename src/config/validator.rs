//! Config validation: document consistency checked before a scheme or table is built.

use crate::config::{SchemeConfig, TableConfig};
use crate::code::Code;
use crate::error::ConfigError;
use std::collections::HashSet;

fn check_code(code: &Code) -> Result<(), ConfigError> {
    if !(100..=999).contains(&code.pure()) {
        return Err(ConfigError::InvalidCode(code.to_string()));
    }
    Ok(())
}

pub fn validate(config: &SchemeConfig) -> Result<(), ConfigError> {
    if config.identity.trim().is_empty() {
        return Err(ConfigError::Validation("identity must not be empty".into()));
    }

    let mut names = HashSet::new();
    for c in &config.categories {
        if c.name.trim().is_empty() {
            return Err(ConfigError::Validation("category name must not be empty".into()));
        }
        if !names.insert(c.name.as_str()) {
            return Err(ConfigError::Validation(format!("category '{}' declared twice", c.name)));
        }
    }

    for (i, entry) in config.error_map.iter().enumerate() {
        if entry.errors.is_empty() {
            return Err(ConfigError::Validation(format!("error_map[{}] lists no categories", i)));
        }
        check_code(&entry.code)?;
    }

    for (i, rule) in config.model_error_map.iter().enumerate() {
        if rule.pattern.is_empty() {
            return Err(ConfigError::Validation(format!("model_error_map[{}] has an empty pattern", i)));
        }
        check_code(&rule.code)?;
    }

    let mut actions = HashSet::new();
    for a in &config.actions {
        if !actions.insert(*a) {
            return Err(ConfigError::Validation(format!("action '{}' listed twice", a)));
        }
    }

    Ok(())
}

pub fn validate_table(table: &TableConfig) -> Result<(), ConfigError> {
    if table.name.trim().is_empty() {
        return Err(ConfigError::Validation("table name must not be empty".into()));
    }
    let mut columns = HashSet::new();
    for c in &table.columns {
        if !columns.insert(c.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "column '{}' declared twice on '{}'",
                c.name, table.name
            )));
        }
    }
    if !columns.contains(table.primary_key.as_str()) {
        return Err(ConfigError::Validation(format!(
            "primary key '{}' is not a column of '{}'",
            table.primary_key, table.name
        )));
    }
    for field in table.validation.keys() {
        if !columns.contains(field.as_str()) {
            return Err(ConfigError::Validation(format!(
                "validation for unknown column '{}' on '{}'",
                field, table.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scheme(v: serde_json::Value) -> SchemeConfig {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn accepts_a_complete_document() {
        let config = scheme(json!({
            "identity": "api/v1/users",
            "namespace": "Users",
            "categories": [{"name": "Locked"}],
            "error_map": [{"errors": ["Record::NotFound"], "code": 404}, {"errors": ["locked"], "code": "423..2"}],
            "model_error_map": [{"pattern": "taken", "code": [422, 1]}],
            "param_map": {"require": "user", "permit": ["name"]},
            "actions": ["index", "show", "create"],
            "require_user": true
        }));
        validate(&config).unwrap();
        assert_eq!(config.categories[0].parent, "Error");
    }

    #[test]
    fn rejects_defects() {
        let bad = [
            json!({"identity": ""}),
            json!({"identity": "u", "error_map": [{"errors": [], "code": 404}]}),
            json!({"identity": "u", "error_map": [{"errors": ["Timeout"], "code": 42}]}),
            json!({"identity": "u", "model_error_map": [{"pattern": "", "code": 422}]}),
            json!({"identity": "u", "categories": [{"name": "A"}, {"name": "A"}]}),
            json!({"identity": "u", "actions": ["show", "show"]}),
        ];
        for doc in bad {
            assert!(validate(&scheme(doc.clone())).is_err(), "{}", doc);
        }
    }

    #[test]
    fn table_checks_columns() {
        let table: TableConfig = serde_json::from_value(json!({
            "name": "users",
            "columns": [{"name": "id", "type": "bigint", "has_default": true}, {"name": "email", "type": {"name": "varchar", "params": [255]}}],
            "validation": {"email": {"required": true}}
        }))
        .unwrap();
        validate_table(&table).unwrap();
        assert_eq!(table.schema, "public");
        assert_eq!(table.column("email").unwrap().type_.pg_type_name(), "varchar(255)");

        let mut missing_pk = table.clone();
        missing_pk.primary_key = "uuid".into();
        assert!(validate_table(&missing_pk).is_err());
    }
}
