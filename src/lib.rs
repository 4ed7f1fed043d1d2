//! Country API: CRUD over a `countries` table plus a one-way sync from the REST Countries dataset.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod model;
pub mod repository;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod source;
pub mod state;
pub mod store;
pub mod sync;

pub use error::{AppError, ConfigError, FetchError, StoreError, SyncError, TransformError};
pub use model::{Country, Currency};
pub use repository::{CountryRepository, CountryStore, MemoryCountryStore, PgCountryStore};
pub use routes::{app, common_routes, country_routes};
pub use service::{CountryService, CountryValidator};
pub use settings::Settings;
pub use source::{CountrySource, RawCountry, RestCountriesClient};
pub use state::AppState;
pub use store::{ensure_country_table, ensure_database_exists};
pub use sync::{reconcile, SyncJob, SyncReport};
