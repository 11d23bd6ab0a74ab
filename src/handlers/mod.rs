//! HTTP handlers for composed resource actions.

pub mod resource;
pub use resource::*;
