//! Failure categories: a named tree of classification tags and the registry that
//! resolves declared names to them.
//!
//! Names are fully qualified with `::` separators (`Record::NotFound`). A failure
//! matches a category when its own category is that category or descends from it.

use crate::case::camelize;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// Root of every category tree.
pub const ROOT: &str = "Error";
pub const RECORD: &str = "Record";
pub const RECORD_NOT_FOUND: &str = "Record::NotFound";
pub const RECORD_VALIDATIONS: &str = "Record::Validations";
pub const RECORD_DATABASE: &str = "Record::Database";
pub const PARAMS: &str = "Params";
pub const PARAMS_MISSING: &str = "Params::Missing";
pub const PARAMS_MALFORMED: &str = "Params::Malformed";
pub const PARAMS_TOO_LARGE: &str = "Params::TooLarge";
pub const ACCESS: &str = "Access";
pub const ACCESS_INVALID_USER: &str = "Access::InvalidUser";
pub const TIMEOUT: &str = "Timeout";
pub const INTERNAL: &str = "Internal";

/// Last name segment marking a validation failure; such failures are classified
/// by the model error map instead of the error map.
pub const VALIDATION_MARKER: &str = "Validations";

struct Node {
    name: String,
    parent: Option<Category>,
}

/// A classification tag for raised failures.
#[derive(Clone)]
pub struct Category(Arc<Node>);

impl Category {
    fn new(name: impl Into<String>, parent: Option<Category>) -> Self {
        Category(Arc::new(Node {
            name: name.into(),
            parent,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn parent(&self) -> Option<&Category> {
        self.0.parent.as_ref()
    }

    /// This category followed by its ancestors up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &Category> {
        std::iter::successors(Some(self), |c| c.parent())
    }

    pub fn is_a(&self, other: &Category) -> bool {
        self.ancestors().any(|c| c == other)
    }

    /// Whether failures of this category carry field-level validation messages.
    pub fn is_validation(&self) -> bool {
        self.name().rsplit("::").next() == Some(VALIDATION_MARKER)
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.name() == other.name()
    }
}

impl Eq for Category {}

impl Hash for Category {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Debug for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Category({})", self.name())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name -> category table. Always contains the standard taxonomy.
#[derive(Clone, Debug)]
pub struct CategoryRegistry {
    by_name: HashMap<String, Category>,
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        standard().clone()
    }
}

impl CategoryRegistry {
    /// Registry holding only the standard taxonomy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Define `name` under `parent`. Redefining with the same parent returns the
    /// existing category.
    pub fn define(&mut self, name: &str, parent: &str) -> Result<Category, ConfigError> {
        let parent_cat = self
            .by_name
            .get(parent)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownParentCategory {
                name: name.to_string(),
                parent: parent.to_string(),
            })?;
        if let Some(existing) = self.by_name.get(name) {
            let existing_parent = existing.parent().map(Category::name).unwrap_or("");
            if existing_parent == parent {
                return Ok(existing.clone());
            }
            return Err(ConfigError::DuplicateCategory {
                name: name.to_string(),
                existing: existing_parent.to_string(),
            });
        }
        let category = Category::new(name, Some(parent_cat));
        self.by_name.insert(name.to_string(), category.clone());
        Ok(category)
    }

    /// Resolve a declared name. Tried in order: the name as fully qualified, the name
    /// nested under `namespace`, then the camelized name under `namespace` and globally.
    pub fn resolve(&self, name: &str, namespace: Option<&str>) -> Result<Category, ConfigError> {
        if let Some(c) = self.by_name.get(name) {
            return Ok(c.clone());
        }
        let nested = |n: &str| namespace.map(|ns| format!("{}::{}", ns, n));
        if let Some(c) = nested(name).and_then(|n| self.by_name.get(&n)) {
            return Ok(c.clone());
        }
        let camel = camelize(name);
        nested(&camel)
            .and_then(|n| self.by_name.get(&n))
            .or_else(|| self.by_name.get(&camel))
            .cloned()
            .ok_or_else(|| ConfigError::InvalidErrorCategory(name.to_string()))
    }
}

/// Built-in categories, shared by every registry.
pub struct Builtins {
    pub root: Category,
    pub record: Category,
    pub not_found: Category,
    pub validations: Category,
    pub database: Category,
    pub params: Category,
    pub params_missing: Category,
    pub params_malformed: Category,
    pub params_too_large: Category,
    pub access: Category,
    pub invalid_user: Category,
    pub timeout: Category,
    pub internal: Category,
}

fn init_builtins() -> Builtins {
    let root = Category::new(ROOT, None);
    let child = |name: &str, parent: &Category| Category::new(name, Some(parent.clone()));
    let record = child(RECORD, &root);
    let params = child(PARAMS, &root);
    let access = child(ACCESS, &root);
    Builtins {
        not_found: child(RECORD_NOT_FOUND, &record),
        validations: child(RECORD_VALIDATIONS, &record),
        database: child(RECORD_DATABASE, &record),
        params_missing: child(PARAMS_MISSING, &params),
        params_malformed: child(PARAMS_MALFORMED, &params),
        params_too_large: child(PARAMS_TOO_LARGE, &params),
        invalid_user: child(ACCESS_INVALID_USER, &access),
        timeout: child(TIMEOUT, &root),
        internal: child(INTERNAL, &root),
        root,
        record,
        params,
        access,
    }
}

pub fn builtins() -> &'static Builtins {
    static BUILTINS: OnceLock<Builtins> = OnceLock::new();
    BUILTINS.get_or_init(init_builtins)
}

/// The standard registry: every builtin, nothing else.
pub fn standard() -> &'static CategoryRegistry {
    static STANDARD: OnceLock<CategoryRegistry> = OnceLock::new();
    STANDARD.get_or_init(|| {
        let b = builtins();
        let all = [
            &b.root,
            &b.record,
            &b.not_found,
            &b.validations,
            &b.database,
            &b.params,
            &b.params_missing,
            &b.params_malformed,
            &b.params_too_large,
            &b.access,
            &b.invalid_user,
            &b.timeout,
            &b.internal,
        ];
        CategoryRegistry {
            by_name: all
                .into_iter()
                .map(|c| (c.name().to_string(), c.clone()))
                .collect(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_taxonomy_is_a_tree() {
        let b = builtins();
        assert!(b.not_found.is_a(&b.record));
        assert!(b.not_found.is_a(&b.root));
        assert!(!b.not_found.is_a(&b.params));
        assert!(b.validations.is_validation());
        assert!(!b.not_found.is_validation());
        assert_eq!(standard().len(), 13);
    }

    #[test]
    fn define_checks_parent_and_duplicates() {
        let mut reg = CategoryRegistry::new();
        let declined = reg.define("Billing::Declined", ROOT).unwrap();
        assert!(declined.is_a(&builtins().root));
        assert_eq!(reg.define("Billing::Declined", ROOT).unwrap(), declined);
        assert_eq!(
            reg.define("Billing::Declined", RECORD),
            Err(ConfigError::DuplicateCategory {
                name: "Billing::Declined".into(),
                existing: ROOT.into(),
            })
        );
        assert!(matches!(
            reg.define("Orphan", "Nope"),
            Err(ConfigError::UnknownParentCategory { .. })
        ));
    }

    #[test]
    fn resolve_tries_qualified_then_nested_then_camelized() {
        let mut reg = CategoryRegistry::new();
        reg.define("Users::Locked", ROOT).unwrap();
        reg.define("Users::PaymentRequired", ROOT).unwrap();
        reg.define("QuotaExceeded", ROOT).unwrap();

        assert_eq!(reg.resolve(RECORD_NOT_FOUND, Some("Users")).unwrap().name(), RECORD_NOT_FOUND);
        assert_eq!(reg.resolve("Locked", Some("Users")).unwrap().name(), "Users::Locked");
        assert_eq!(
            reg.resolve("payment_required", Some("Users")).unwrap().name(),
            "Users::PaymentRequired"
        );
        assert_eq!(reg.resolve("quota_exceeded", Some("Users")).unwrap().name(), "QuotaExceeded");
        assert_eq!(
            reg.resolve("record/not_found", None).unwrap().name(),
            RECORD_NOT_FOUND
        );
    }

    #[test]
    fn unresolved_names_fail_deterministically() {
        let reg = CategoryRegistry::new();
        let first = reg.resolve("Missing", Some("Users"));
        let second = reg.resolve("Missing", Some("Users"));
        assert_eq!(first, Err(ConfigError::InvalidErrorCategory("Missing".into())));
        assert_eq!(first, second);
    }
}
