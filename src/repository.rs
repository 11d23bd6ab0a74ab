//! Persistence contract consumed by the standard actions.

use crate::case::{short_type_name, to_snake_case};
use crate::failure::Failure;
use crate::params::Params;
use async_trait::async_trait;
use serde::Serialize;

/// Storage for one resource type. Mutators fail with a `Record::Validations`
/// failure when the record is rejected.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    type Record: Serialize + Send + Sync + 'static;

    /// Singular snake_case resource name; keys responses and handler state.
    /// Derived from the record type unless overridden.
    fn model_name(&self) -> String {
        to_snake_case(short_type_name::<Self::Record>())
    }

    async fn all(&self) -> Result<Vec<Self::Record>, Failure>;

    /// Load one record; `Record::NotFound` when absent.
    async fn find(&self, id: &str) -> Result<Self::Record, Failure>;

    /// Construct an unsaved record from permitted attributes.
    fn build(&self, attrs: Params) -> Result<Self::Record, Failure>;

    async fn save(&self, record: &mut Self::Record) -> Result<(), Failure>;

    async fn update(&self, record: &mut Self::Record, attrs: Params) -> Result<(), Failure>;

    async fn destroy(&self, record: &mut Self::Record) -> Result<(), Failure>;
}
