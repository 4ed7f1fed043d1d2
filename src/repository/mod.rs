//! Country persistence: a store hands out unit-of-work sessions with staged mutations.
//!
//! Lookups on a session read committed state only. `insert`/`update`/`delete` are staged
//! in memory and applied together by `commit()`; a failed commit or a dropped session
//! discards them.

mod memory;
mod postgres;

pub use memory::MemoryCountryStore;
pub use postgres::{PgCountryRepository, PgCountryStore};

use crate::error::StoreError;
use crate::model::Country;
use async_trait::async_trait;
use uuid::Uuid;

/// One staged change, applied at commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    Insert(Country),
    Update(Country),
    Delete(Uuid),
}

impl Mutation {
    /// Commit order: deletes, then updates, then inserts, so a code freed by a delete can be reused.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Mutation::Delete(_) => 0,
            Mutation::Update(_) => 1,
            Mutation::Insert(_) => 2,
        }
    }
}

/// Staged mutations in commit order (stable within each kind).
pub(crate) fn ordered(mut staged: Vec<Mutation>) -> Vec<Mutation> {
    staged.sort_by_key(Mutation::rank);
    staged
}

#[async_trait]
pub trait CountryRepository: Send + Sync {
    async fn find_by_external_code(&self, code: &str) -> Result<Option<Country>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Country>, StoreError>;

    /// Every committed country, ordered by name then id.
    async fn find_all(&self) -> Result<Vec<Country>, StoreError>;

    fn insert(&mut self, country: Country);

    fn update(&mut self, country: Country);

    fn delete(&mut self, country: &Country);

    /// Number of staged, uncommitted mutations.
    fn pending(&self) -> usize;

    /// Apply every staged mutation atomically.
    async fn commit(&mut self) -> Result<(), StoreError>;
}

/// Opens repository sessions. Shared by the HTTP state and the sync job.
#[async_trait]
pub trait CountryStore: Send + Sync {
    fn session(&self) -> Box<dyn CountryRepository>;

    /// Cheap reachability check used by `/ready`.
    async fn ping(&self) -> Result<(), StoreError>;
}
