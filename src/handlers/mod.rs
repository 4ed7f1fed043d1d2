//! HTTP handlers for country CRUD.

pub mod countries;
pub use countries::*;
