//! PgRepository: generic CRUD using the safe SQL builder.

mod crud;
mod validation;
pub use crud::PgRepository;
pub use validation::RecordValidator;
