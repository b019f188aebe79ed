//! Entry module: lead records with owner-scoped access.
//!
//! - `domain`: request bodies (`EntryInput`, `EntryPatch`) and response views
//! - `validator`: required-field and date-format checks on raw input
//! - `policy`: admin/owner access rules
//! - `repository` / `repo`: persistence seam plus the SeaORM implementation
//! - `export`: display rows and the xlsx encoder
//! - `service`: the use cases

pub mod domain;
pub mod validator;
pub mod policy;
pub mod repository;
pub mod repo;
pub mod export;
pub mod service;

pub use service::EntryService;
