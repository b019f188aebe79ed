//! Service layer providing business-oriented operations on top of models.
//! - Separates business logic from data access (repository traits per module).
//! - Reuses validation and entity definitions in `models` crate.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod auth;
pub mod entry;
#[cfg(test)]
pub mod test_support;
