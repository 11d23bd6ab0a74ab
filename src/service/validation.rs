//! Record validation from config rules. Collects every field message instead
//! of stopping at the first.

use crate::config::{TableConfig, ValidationRule};
use crate::error::ConfigError;
use crate::failure::{FieldErrors, Failure};
use regex::Regex;
use serde_json::{Map, Value};

struct FieldRule {
    column: String,
    /// Declared rule, or a not-null constraint without a default.
    required: bool,
    rule: ValidationRule,
    pattern: Option<Regex>,
}

/// Rules of one table, in column order, patterns compiled.
pub struct RecordValidator {
    fields: Vec<FieldRule>,
}

impl RecordValidator {
    pub fn new(table: &TableConfig) -> Result<Self, ConfigError> {
        let mut fields = Vec::new();
        for column in &table.columns {
            let not_null = !column.nullable && !column.has_default && column.name != table.primary_key;
            let rule = match table.validation.get(&column.name) {
                Some(rule) => rule.clone(),
                None if not_null => ValidationRule::default(),
                None => continue,
            };
            let pattern = match &rule.pattern {
                Some(p) => Some(Regex::new(p).map_err(|e| ConfigError::InvalidPattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })?),
                None => None,
            };
            fields.push(FieldRule {
                column: column.name.clone(),
                required: not_null || rule.required == Some(true),
                rule,
                pattern,
            });
        }
        Ok(RecordValidator { fields })
    }

    pub fn errors(&self, record: &Map<String, Value>) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for f in &self.fields {
            let value = record.get(&f.column).filter(|v| !v.is_null());
            match value {
                None => {
                    if f.required {
                        errors.add(&f.column, "can't be blank");
                    }
                }
                Some(v) => check_field(&mut errors, f, v),
            }
        }
        errors
    }

    /// `Record::Validations` failure carrying every field message.
    pub fn validate(&self, record: &Map<String, Value>) -> Result<(), Failure> {
        let errors = self.errors(record);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Failure::validation(errors))
        }
    }
}

fn check_field(errors: &mut FieldErrors, f: &FieldRule, v: &Value) {
    let col = f.column.as_str();
    let rule = &f.rule;
    if let Some(s) = v.as_str() {
        if rule.required == Some(true) && s.trim().is_empty() {
            errors.add(col, "can't be blank");
        }
        if let Some(format) = &rule.format {
            if !format_ok(s, format) {
                errors.add(col, "is invalid");
            }
        }
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max as usize {
                errors.add(col, format!("is too long (maximum is {} characters)", max));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min as usize {
                errors.add(col, format!("is too short (minimum is {} characters)", min));
            }
        }
        if let Some(re) = &f.pattern {
            if !re.is_match(s) {
                errors.add(col, "is invalid");
            }
        }
    }
    if let Some(allowed) = &rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            errors.add(col, "is not included in the list");
        }
    }
    if let Some(n) = v.as_f64() {
        if let Some(min) = rule.minimum {
            if n < min {
                errors.add(col, format!("must be greater than or equal to {}", min));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                errors.add(col, format!("must be less than or equal to {}", max));
            }
        }
    }
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::String(t)) => s == t,
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn format_ok(s: &str, format: &str) -> bool {
    match format.to_lowercase().as_str() {
        "email" => s.len() >= 3 && s.contains('@'),
        "uuid" => uuid::Uuid::parse_str(s).is_ok(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::RECORD_VALIDATIONS;
    use serde_json::json;

    fn validator() -> RecordValidator {
        let table: TableConfig = serde_json::from_value(json!({
            "name": "users",
            "columns": [{"name": "id", "type": "bigint"}, {"name": "email", "type": "text"}, {"name": "role", "type": "text"}, {"name": "age", "type": "integer"}],
            "validation": {
                "email": {"required": true, "format": "email", "max_length": 20},
                "role": {"allowed": ["admin", "member"]},
                "age": {"minimum": 0, "maximum": 150}
            }
        }))
        .unwrap();
        RecordValidator::new(&table).unwrap()
    }

    fn record(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn collects_messages_in_column_order() {
        let errors = validator().errors(&record(json!({"role": "owner", "age": 200})));
        assert_eq!(
            errors.full_messages(),
            vec![
                "email can't be blank",
                "role is not included in the list",
                "age must be less than or equal to 150",
            ]
        );
        assert_eq!(errors.first_field_text().as_deref(), Some("can't be blank"));
    }

    #[test]
    fn valid_record_passes() {
        let v = validator();
        v.validate(&record(json!({"email": "a@b.c", "role": "admin", "age": 30}))).unwrap();
        let failure = v.validate(&record(json!({"email": "nope"}))).unwrap_err();
        assert_eq!(failure.category().name(), RECORD_VALIDATIONS);
        assert_eq!(failure.record_errors().unwrap().get("email").unwrap(), ["is invalid"]);
    }

    #[test]
    fn not_null_columns_without_default_are_required() {
        let table: TableConfig = serde_json::from_value(json!({
            "name": "posts",
            "columns": [
                {"name": "id", "type": "bigint", "nullable": false},
                {"name": "title", "type": "text", "nullable": false},
                {"name": "created_at", "type": "timestamptz", "nullable": false, "has_default": true},
                {"name": "body", "type": "text"}
            ]
        }))
        .unwrap();
        let v = RecordValidator::new(&table).unwrap();
        assert_eq!(v.errors(&record(json!({}))).full_messages(), vec!["title can't be blank"]);
        assert_eq!(v.errors(&record(json!({"title": null}))).full_messages(), vec!["title can't be blank"]);
        assert!(v.errors(&record(json!({"title": ""}))).is_empty());
    }

    #[test]
    fn bad_pattern_is_a_config_error() {
        let table: TableConfig = serde_json::from_value(json!({
            "name": "t",
            "columns": [{"name": "id", "type": "bigint"}],
            "validation": {"id": {"pattern": "("}}
        }))
        .unwrap();
        assert!(matches!(RecordValidator::new(&table), Err(ConfigError::InvalidPattern { .. })));
    }
}
