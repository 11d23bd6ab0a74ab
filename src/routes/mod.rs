//! Route builders.

pub mod resource;

pub use resource::{resource_routes, resource_routes_with_limit, DEFAULT_BODY_LIMIT};
