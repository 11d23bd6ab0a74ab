//! Request parameters and the declared parameter map used to permit them.

use crate::failure::Failure;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Routing key for the member id; never part of permitted attributes.
pub const ID_KEY: &str = "id";

/// Request parameters: body fields, query string and path id merged into one object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params(Map<String, Value>);

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Params from a JSON body. An empty body gives empty params; anything but
    /// an object is malformed.
    pub fn from_body(body: &[u8]) -> Result<Self, Failure> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Params::new());
        }
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| Failure::malformed(format!("invalid JSON body: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, Failure> {
        match value {
            Value::Object(m) => Ok(Params(m)),
            _ => Err(Failure::malformed("body must be a JSON object")),
        }
    }

    /// Merge query string pairs; body fields already present win.
    pub fn merge_query(mut self, query: HashMap<String, String>) -> Self {
        for (k, v) in query {
            self.0.entry(k).or_insert(Value::String(v));
        }
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.0.insert(ID_KEY.to_string(), Value::String(id.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// The member id as text, whether it arrived as a string or a number.
    pub fn id(&self) -> Option<String> {
        match self.0.get(ID_KEY)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Value under `key`; missing or blank values fail with `Params::Missing`.
    pub fn require(&self, key: &str) -> Result<&Value, Failure> {
        match self.0.get(key) {
            Some(v) if !is_blank(v) => Ok(v),
            _ => Err(Failure::param_missing(key)),
        }
    }

    /// Nested object under `key`.
    pub fn require_object(&self, key: &str) -> Result<Params, Failure> {
        match self.require(key)? {
            Value::Object(m) => Ok(Params(m.clone())),
            _ => Err(Failure::malformed(format!("param '{}' must be an object", key))),
        }
    }

    /// Keep only the listed keys.
    pub fn permit<S: AsRef<str>>(&self, fields: &[S]) -> Params {
        let mut out = Map::new();
        for f in fields {
            if let Some(v) = self.0.get(f.as_ref()) {
                out.insert(f.as_ref().to_string(), v.clone());
            }
        }
        Params(out)
    }

    /// Everything but the routing id.
    pub fn without_id(&self) -> Params {
        let mut m = self.0.clone();
        m.remove(ID_KEY);
        Params(m)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(m: Map<String, Value>) -> Self {
        Params(m)
    }
}

/// Declared attribute whitelist for a resource.
///
/// JSON forms: `{"require": "user", "permit": ["name", "email"]}` or
/// `["name", "nickname?"]` (a trailing `?` marks an optional top-level key).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamMap {
    Require { require: String, permit: Vec<String> },
    Permit(Vec<String>),
}

impl ParamMap {
    pub fn require<S: Into<String>>(key: impl Into<String>, fields: impl IntoIterator<Item = S>) -> Self {
        ParamMap::Require {
            require: key.into(),
            permit: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn permit<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        ParamMap::Permit(keys.into_iter().map(Into::into).collect())
    }

    pub fn permitted(&self, params: &Params) -> Result<Params, Failure> {
        match self {
            ParamMap::Require { require, permit } => Ok(params.require_object(require)?.permit(permit.as_slice())),
            ParamMap::Permit(keys) => {
                let mut out = Params::new();
                for key in keys {
                    match key.strip_suffix('?') {
                        Some(name) => {
                            if let Some(v) = params.get(name).filter(|v| !v.is_null()) {
                                out.insert(name, v.clone());
                            }
                        }
                        None => {
                            let v = params.require(key)?;
                            out.insert(key.as_str(), v.clone());
                        }
                    }
                }
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{PARAMS_MALFORMED, PARAMS_MISSING};
    use serde_json::json;

    fn params(v: Value) -> Params {
        Params::from_value(v).unwrap()
    }

    #[test]
    fn require_rejects_missing_and_blank() {
        let p = params(json!({"name": "Ada", "bio": "", "tags": []}));
        assert_eq!(p.require("name").unwrap(), &json!("Ada"));
        for key in ["bio", "tags", "absent"] {
            assert_eq!(p.require(key).unwrap_err().category().name(), PARAMS_MISSING);
        }
    }

    #[test]
    fn require_map_permits_nested_fields() {
        let p = params(json!({"user": {"name": "Ada", "admin": true}, "id": "7"}));
        let map = ParamMap::require("user", ["name", "email"]);
        assert_eq!(map.permitted(&p).unwrap().into_value(), json!({"name": "Ada"}));
    }

    #[test]
    fn permit_map_handles_optional_keys() {
        let map = ParamMap::permit(["name", "nickname?"]);
        let p = params(json!({"name": "Ada", "other": 1}));
        assert_eq!(map.permitted(&p).unwrap().into_value(), json!({"name": "Ada"}));
        let p = params(json!({"name": "Ada", "nickname": "ada"}));
        assert_eq!(
            map.permitted(&p).unwrap().into_value(),
            json!({"name": "Ada", "nickname": "ada"})
        );
        let p = params(json!({"nickname": "ada"}));
        assert_eq!(map.permitted(&p).unwrap_err().category().name(), PARAMS_MISSING);
    }

    #[test]
    fn param_map_deserializes_both_forms() {
        let m: ParamMap = serde_json::from_value(json!({"require": "user", "permit": ["name"]})).unwrap();
        assert_eq!(m, ParamMap::require("user", ["name"]));
        let m: ParamMap = serde_json::from_value(json!(["name", "bio?"])).unwrap();
        assert_eq!(m, ParamMap::permit(["name", "bio?"]));
    }

    #[test]
    fn body_parsing() {
        assert!(Params::from_body(b"  ").unwrap().is_empty());
        assert_eq!(Params::from_body(b"[1]").unwrap_err().category().name(), PARAMS_MALFORMED);
        assert_eq!(Params::from_body(b"{oops").unwrap_err().category().name(), PARAMS_MALFORMED);
        let p = Params::from_body(br#"{"a": 1}"#)
            .unwrap()
            .merge_query(HashMap::from([("a".to_string(), "2".to_string()), ("b".into(), "3".into())]))
            .with_id("9");
        assert_eq!(p.get("a"), Some(&json!(1)));
        assert_eq!(p.get("b"), Some(&json!("3")));
        assert_eq!(p.id().as_deref(), Some("9"));
        assert!(!p.without_id().contains_key(ID_KEY));
    }
}
