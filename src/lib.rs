//! API scheme: declarative failure classification and dispatch, composable
//! CRUD actions and uniform response rendering for axum resource handlers.

pub mod action;
pub mod case;
pub mod category;
pub mod classify;
pub mod code;
pub mod config;
pub mod controller;
pub mod error;
pub mod extractors;
pub mod failure;
pub mod handlers;
pub mod i18n;
pub mod params;
pub mod repository;
pub mod response;
pub mod routes;
pub mod scheme;
pub mod service;
pub mod sql;

pub use action::{Action, ActionSet, Prerequisite};
pub use category::{Category, CategoryRegistry};
pub use classify::{ErrorMapEntry, ModelErrorRule};
pub use code::Code;
pub use config::{load_catalog, load_scheme_config, load_table_config, SchemeConfig, TableConfig};
pub use controller::{Handler, ResourceController};
pub use error::ConfigError;
pub use extractors::{CurrentUser, MaybeUser};
pub use failure::{FieldErrors, Failure};
pub use i18n::{Catalog, Translator};
pub use params::{ParamMap, Params};
pub use repository::Repository;
pub use response::{ErrorContext, ErrorRenderer, SuccessContext, SuccessRenderer};
pub use routes::resource_routes;
pub use scheme::{Scheme, SchemeBuilder};
pub use service::PgRepository;
