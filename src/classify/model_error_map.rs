//! Model error map: validation message patterns to codes, last declared match wins.

use crate::code::Code;
use crate::error::ConfigError;
use crate::failure::Failure;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One declared row: a regex over the aggregated validation text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelErrorRule {
    pub pattern: String,
    pub code: Code,
}

impl ModelErrorRule {
    pub fn new(pattern: impl Into<String>, code: Code) -> Self {
        ModelErrorRule {
            pattern: pattern.into(),
            code,
        }
    }
}

#[derive(Clone, Debug)]
struct CompiledRule {
    pattern: Regex,
    code: Code,
}

/// Compiled model error map.
#[derive(Clone, Debug, Default)]
pub struct ModelErrorMap {
    rules: Vec<CompiledRule>,
}

impl ModelErrorMap {
    pub fn compile(declared: &[ModelErrorRule]) -> Result<Self, ConfigError> {
        let rules = declared
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|pattern| CompiledRule {
                        pattern,
                        code: rule.code,
                    })
                    .map_err(|e| ConfigError::InvalidPattern {
                        pattern: rule.pattern.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ModelErrorMap { rules })
    }

    /// Text matched against the rules: the first non-empty field's messages, or
    /// the failure message when it carries no field errors.
    pub fn aggregate_text(failure: &Failure) -> String {
        match failure.record_errors() {
            Some(errors) => errors.first_field_text().unwrap_or_default(),
            None => failure.message().to_string(),
        }
    }

    /// Scans rules from the most recently declared backwards.
    pub fn classify(&self, failure: &Failure) -> Option<Code> {
        let text = Self::aggregate_text(failure);
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.pattern.is_match(&text))
            .map(|rule| rule.code)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
