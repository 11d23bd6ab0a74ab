//! Response codes: a scalar status or a `(status, subcode)` range, and the
//! resolver turning a classification into status, sub-code and localized text.

use crate::error::ConfigError;
use crate::i18n::{error_key, Translator};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Key path used for failures no map classified.
pub const UNCATEGORIZED_KEY: &str = "uncategorized";

/// A classification result. `Range` refines the wire status with an
/// application sub-code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "CodeRepr")]
pub enum Code {
    Status(u16),
    Range(u16, u16),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CodeRepr {
    Status(u16),
    Range(u16, u16),
    Text(String),
}

impl TryFrom<CodeRepr> for Code {
    type Error = ConfigError;

    fn try_from(repr: CodeRepr) -> Result<Self, Self::Error> {
        match repr {
            CodeRepr::Status(s) => Ok(Code::Status(s)),
            CodeRepr::Range(s, sub) => Ok(Code::Range(s, sub)),
            CodeRepr::Text(t) => t.parse(),
        }
    }
}

impl Serialize for Code {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Code::Status(s) => serializer.serialize_u16(s),
            Code::Range(s, sub) => (s, sub).serialize(serializer),
        }
    }
}

impl Code {
    pub const fn range(status: u16, sub: u16) -> Self {
        Code::Range(status, sub)
    }

    /// Rebuild a code from its decomposition.
    pub const fn from_parts(pure: u16, sub: Option<u16>) -> Self {
        match sub {
            Some(sub) => Code::Range(pure, sub),
            None => Code::Status(pure),
        }
    }

    /// The scalar status, or the start of a range.
    pub const fn pure(&self) -> u16 {
        match *self {
            Code::Status(s) | Code::Range(s, _) => s,
        }
    }

    /// The end of a range; scalars have none.
    pub const fn sub(&self) -> Option<u16> {
        match *self {
            Code::Status(_) => None,
            Code::Range(_, sub) => Some(sub),
        }
    }

    /// Localization key path: `404` or `422.1`.
    pub fn key_path(&self) -> String {
        match *self {
            Code::Status(s) => s.to_string(),
            Code::Range(s, sub) => format!("{}.{}", s, sub),
        }
    }

    /// Wire status; values HTTP cannot carry become 500.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.pure()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<u16> for Code {
    fn from(s: u16) -> Self {
        Code::Status(s)
    }
}

impl From<(u16, u16)> for Code {
    fn from((s, sub): (u16, u16)) -> Self {
        Code::Range(s, sub)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Code::Status(s) => write!(f, "{}", s),
            Code::Range(s, sub) => write!(f, "{}..{}", s, sub),
        }
    }
}

impl FromStr for Code {
    type Err = ConfigError;

    /// Accepts `404` and `422..1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidCode(s.to_string());
        let s = s.trim();
        match s.split_once("..") {
            Some((start, end)) => {
                let start = start.trim().parse().map_err(|_| invalid())?;
                let end = end.trim().parse().map_err(|_| invalid())?;
                Ok(Code::Range(start, end))
            }
            None => s.parse().map(Code::Status).map_err(|_| invalid()),
        }
    }
}

/// Everything derived from a classification that renderers need.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedCode {
    /// `None` is the uncategorized sentinel.
    pub code: Option<Code>,
    pub pure_code: Option<u16>,
    pub sub_code: Option<u16>,
    pub text: String,
}

/// Derive status, sub-code and localized text for `code`.
pub fn resolve(
    code: Option<Code>,
    translator: &dyn Translator,
    scope: &str,
    identity: &str,
) -> ResolvedCode {
    let path = code
        .map(|c| c.key_path())
        .unwrap_or_else(|| UNCATEGORIZED_KEY.to_string());
    ResolvedCode {
        code,
        pure_code: code.map(|c| c.pure()),
        sub_code: code.and_then(|c| c.sub()),
        text: translator.translate(&error_key(scope, identity, &path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Catalog;

    #[test]
    fn decomposition_round_trips() {
        for code in [Code::Status(404), Code::range(422, 1), Code::range(409, 0)] {
            assert_eq!(Code::from_parts(code.pure(), code.sub()), code);
        }
        assert_eq!(Code::Status(404).sub(), None);
        assert_eq!(Code::range(422, 7).sub(), Some(7));
    }

    #[test]
    fn parses_and_displays_ranges() {
        assert_eq!("404".parse::<Code>().unwrap(), Code::Status(404));
        assert_eq!("422..1".parse::<Code>().unwrap(), Code::range(422, 1));
        assert_eq!(Code::range(422, 1).to_string(), "422..1");
        assert!("4x4".parse::<Code>().is_err());
        assert!("422..".parse::<Code>().is_err());
    }

    #[test]
    fn deserializes_every_config_form() {
        let codes: Vec<Code> = serde_json::from_str(r#"[404, [422, 1], "409..2"]"#).unwrap();
        assert_eq!(codes, vec![Code::Status(404), Code::range(422, 1), Code::range(409, 2)]);
        assert_eq!(serde_json::to_string(&codes[1]).unwrap(), "[422,1]");
    }

    #[test]
    fn out_of_range_status_is_500() {
        assert_eq!(Code::Status(42).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(Code::range(422, 3).status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn resolve_builds_text_key_from_code() {
        let mut catalog = Catalog::new();
        catalog.insert("action_controller.users.errors.404", "User not found");
        catalog.insert("action_controller.users.errors.422.1", "Email taken");

        let r = resolve(Some(Code::Status(404)), &catalog, "action_controller", "users");
        assert_eq!(r.text, "User not found");
        assert_eq!((r.pure_code, r.sub_code), (Some(404), None));

        let r = resolve(Some(Code::range(422, 1)), &catalog, "action_controller", "users");
        assert_eq!(r.text, "Email taken");
        assert_eq!((r.pure_code, r.sub_code), (Some(422), Some(1)));

        let r = resolve(None, &catalog, "action_controller", "users");
        assert_eq!(r.pure_code, None);
        assert!(r.text.contains("errors.uncategorized"));
    }
}
