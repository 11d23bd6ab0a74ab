//! Error map: category matchers to codes, first declared match wins.

use crate::category::{Category, CategoryRegistry};
use crate::code::Code;
use crate::error::ConfigError;
use crate::failure::Failure;
use serde::{Deserialize, Serialize};

/// One declared row: any of `errors` maps to `code`. Names are resolved when the
/// owning scheme is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorMapEntry {
    pub errors: Vec<String>,
    pub code: Code,
}

impl ErrorMapEntry {
    pub fn new<I, S>(errors: I, code: Code) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ErrorMapEntry {
            errors: errors.into_iter().map(Into::into).collect(),
            code,
        }
    }
}

#[derive(Clone, Debug)]
struct ResolvedEntry {
    matchers: Vec<Category>,
    code: Code,
}

/// Error map with every matcher resolved to a concrete category.
#[derive(Clone, Debug, Default)]
pub struct ErrorMap {
    entries: Vec<ResolvedEntry>,
}

impl ErrorMap {
    /// Resolve declared entries against `registry`. The first unresolvable name
    /// fails the whole map.
    pub fn resolve(
        declared: &[ErrorMapEntry],
        registry: &CategoryRegistry,
        namespace: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let entries = declared
            .iter()
            .map(|entry| {
                let matchers = entry
                    .errors
                    .iter()
                    .map(|name| registry.resolve(name, namespace))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ResolvedEntry {
                    matchers,
                    code: entry.code,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(ErrorMap { entries })
    }

    /// Code of the first entry with a matcher the failure is an instance of.
    pub fn classify(&self, failure: &Failure) -> Option<Code> {
        self.entries
            .iter()
            .find(|entry| entry.matchers.iter().any(|m| failure.is_a(m)))
            .map(|entry| entry.code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{RECORD, RECORD_NOT_FOUND, ROOT};

    #[test]
    fn first_declared_match_wins() {
        let declared = vec![
            ErrorMapEntry::new([RECORD_NOT_FOUND], Code::Status(404)),
            ErrorMapEntry::new([RECORD], Code::range(500, 9)),
            ErrorMapEntry::new([ROOT], Code::Status(500)),
        ];
        let map = ErrorMap::resolve(&declared, &CategoryRegistry::new(), None).unwrap();
        assert_eq!(map.classify(&Failure::not_found("x")), Some(Code::Status(404)));
        assert_eq!(map.classify(&Failure::database("x")), Some(Code::range(500, 9)));
        assert_eq!(map.classify(&Failure::timeout("x")), Some(Code::Status(500)));
    }

    #[test]
    fn ancestor_matchers_catch_descendants() {
        let declared = vec![ErrorMapEntry::new(["Params"], Code::range(400, 2))];
        let map = ErrorMap::resolve(&declared, &CategoryRegistry::new(), None).unwrap();
        assert_eq!(map.classify(&Failure::param_missing("user")), Some(Code::range(400, 2)));
        assert_eq!(map.classify(&Failure::timeout("slow")), None);
    }

    #[test]
    fn unresolved_name_fails_the_map() {
        let declared = vec![
            ErrorMapEntry::new([RECORD_NOT_FOUND], Code::Status(404)),
            ErrorMapEntry::new(["Nonexistent"], Code::Status(418)),
        ];
        let err = ErrorMap::resolve(&declared, &CategoryRegistry::new(), Some("Users")).unwrap_err();
        assert_eq!(err, ConfigError::InvalidErrorCategory("Nonexistent".into()));
    }
}
