//! Classification tables: failures to codes.

pub mod error_map;
pub mod model_error_map;

pub use error_map::*;
pub use model_error_map::*;
