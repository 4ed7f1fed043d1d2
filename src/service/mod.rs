//! CountryService: CRUD over the repository, with request validation.

mod countries;
mod validation;
pub use countries::CountryService;
pub use validation::CountryValidator;
