//! Raised failures: a category, a message, and for validation failures the
//! field-level messages of the rejected record.

use crate::category::{builtins, Category};
use std::backtrace::Backtrace;
use std::fmt;
use std::sync::Arc;

/// Field-level validation messages in the order they were added.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to `field`, keeping the field's first-seen position.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some((_, messages)) => messages.push(message.into()),
            None => self.entries.push((field, vec![message.into()])),
        }
    }

    pub fn with(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.add(field, message);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, m)| m.is_empty())
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, m)| m.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(f, m)| (f.as_str(), m.as_slice()))
    }

    /// "field message" for every message, in order.
    pub fn full_messages(&self) -> Vec<String> {
        self.iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{} {}", field, m)))
            .collect()
    }

    /// Messages of the first field that has any, concatenated without separator.
    /// Only that one field contributes.
    pub fn first_field_text(&self) -> Option<String> {
        self.entries
            .iter()
            .find(|(_, m)| !m.is_empty())
            .map(|(_, m)| m.concat())
    }
}

/// A failure raised by an action, a prerequisite, or a collaborator.
#[derive(Clone, thiserror::Error)]
#[error("{message}")]
pub struct Failure {
    category: Category,
    message: String,
    record_errors: Option<FieldErrors>,
    backtrace: Arc<Backtrace>,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Failure {
    pub fn new(category: Category, message: impl Into<String>) -> Self {
        Failure {
            category,
            message: message.into(),
            record_errors: None,
            backtrace: Arc::new(Backtrace::force_capture()),
            source: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(builtins().not_found.clone(), message)
    }

    /// Validation failure of a record; the message lists every field message.
    pub fn validation(errors: FieldErrors) -> Self {
        let message = format!("Validation failed: {}", errors.full_messages().join(", "));
        let mut failure = Self::new(builtins().validations.clone(), message);
        failure.record_errors = Some(errors);
        failure
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(builtins().database.clone(), message)
    }

    pub fn param_missing(key: &str) -> Self {
        Self::new(
            builtins().params_missing.clone(),
            format!("param is missing or the value is empty: {}", key),
        )
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(builtins().params_malformed.clone(), message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(builtins().params_too_large.clone(), message)
    }

    pub fn invalid_user() -> Self {
        Self::new(builtins().invalid_user.clone(), "no authenticated user")
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(builtins().timeout.clone(), message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(builtins().internal.clone(), message)
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn with_record_errors(mut self, errors: FieldErrors) -> Self {
        self.record_errors = Some(errors);
        self
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn record_errors(&self) -> Option<&FieldErrors> {
        self.record_errors.as_ref()
    }

    pub fn is_a(&self, category: &Category) -> bool {
        self.category.is_a(category)
    }

    /// Up to `limit` frames of the stack at construction, one string per frame.
    /// Captured regardless of `RUST_BACKTRACE`.
    pub fn backtrace_frames(&self, limit: usize) -> Vec<String> {
        let rendered = self.backtrace.to_string();
        let mut frames: Vec<String> = Vec::new();
        for line in rendered.lines() {
            let trimmed = line.trim();
            let is_frame_start = trimmed
                .split_once(':')
                .map(|(n, _)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
                .unwrap_or(false);
            if is_frame_start {
                if frames.len() == limit {
                    break;
                }
                frames.push(trimmed.to_string());
            } else if let Some(last) = frames.last_mut() {
                last.push(' ');
                last.push_str(trimmed);
            }
        }
        frames
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("category", &self.category.name())
            .field("message", &self.message)
            .field("record_errors", &self.record_errors)
            .finish()
    }
}

impl From<serde_json::Error> for Failure {
    fn from(e: serde_json::Error) -> Self {
        Failure::internal(format!("serialization: {}", e)).with_source(e)
    }
}
