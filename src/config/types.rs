//! Raw config types matching the JSON documents (scheme declarations and table definitions).

use crate::action::Action;
use crate::category::ROOT;
use crate::classify::{ErrorMapEntry, ModelErrorRule};
use crate::params::ParamMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Declarations for one resource handler type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchemeConfig {
    pub identity: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub locale_scope: Option<String>,
    /// Categories local to this scheme, nested under `namespace`.
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
    #[serde(default)]
    pub error_map: Vec<ErrorMapEntry>,
    #[serde(default)]
    pub model_error_map: Vec<ModelErrorRule>,
    #[serde(default)]
    pub param_map: Option<ParamMap>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub require_user: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default = "default_parent")]
    pub parent: String,
}

fn default_parent() -> String {
    ROOT.to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnTypeConfig {
    Simple(String),
    Parameterized { name: String, params: Option<Vec<u32>> },
}

impl ColumnTypeConfig {
    /// Postgres type as written in a cast, e.g. `varchar(255)`.
    pub fn pg_type_name(&self) -> String {
        match self {
            ColumnTypeConfig::Simple(s) => s.clone(),
            ColumnTypeConfig::Parameterized { name, params } => match params {
                Some(p) if !p.is_empty() => format!(
                    "{}({})",
                    name,
                    p.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
                ),
                _ => name.clone(),
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: ColumnTypeConfig,
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// The database fills the column when it is not written (serial keys, timestamps).
    #[serde(default)]
    pub has_default: bool,
}

fn default_true() -> bool {
    true
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_primary_key() -> String {
    "id".to_string()
}

/// One table exposed as a resource through the Postgres repository.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default = "default_schema")]
    pub schema: String,
    pub name: String,
    /// Singular resource name; the singular of `name` when omitted.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub validation: HashMap<String, ValidationRule>,
}

impl TableConfig {
    pub fn column(&self, name: &str) -> Option<&ColumnConfig> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}
