//! In-process store. Backs tests and local runs without Postgres.

use super::{ordered, CountryRepository, CountryStore, Mutation};
use crate::error::StoreError;
use crate::model::Country;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct MemoryCountryStore {
    rows: Arc<RwLock<HashMap<Uuid, Country>>>,
}

impl MemoryCountryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with committed rows.
    pub fn with_countries(countries: impl IntoIterator<Item = Country>) -> Self {
        let rows = countries.into_iter().map(|c| (c.id, c)).collect();
        MemoryCountryStore {
            rows: Arc::new(RwLock::new(rows)),
        }
    }

    /// Committed rows ordered like `find_all`.
    pub fn snapshot(&self) -> Result<Vec<Country>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(sorted(rows.values().cloned().collect()))
    }
}

#[async_trait]
impl CountryStore for MemoryCountryStore {
    fn session(&self) -> Box<dyn CountryRepository> {
        Box::new(MemoryCountryRepository {
            rows: self.rows.clone(),
            staged: Vec::new(),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.rows.read().map(|_| ()).map_err(|_| StoreError::Poisoned)
    }
}

pub struct MemoryCountryRepository {
    rows: Arc<RwLock<HashMap<Uuid, Country>>>,
    staged: Vec<Mutation>,
}

fn sorted(mut countries: Vec<Country>) -> Vec<Country> {
    countries.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    countries
}

fn apply(rows: &mut HashMap<Uuid, Country>, mutation: Mutation) -> Result<(), StoreError> {
    let code_taken = |rows: &HashMap<Uuid, Country>, c: &Country| {
        c.external_code.as_ref().is_some_and(|code| {
            rows.values()
                .any(|other| other.id != c.id && other.external_code.as_ref() == Some(code))
        })
    };
    match mutation {
        Mutation::Insert(c) => {
            if code_taken(rows, &c) {
                return Err(StoreError::DuplicateCode(c.external_code.unwrap_or_default()));
            }
            rows.insert(c.id, c);
        }
        Mutation::Update(c) => {
            if !rows.contains_key(&c.id) {
                return Err(StoreError::Missing(c.id));
            }
            if code_taken(rows, &c) {
                return Err(StoreError::DuplicateCode(c.external_code.unwrap_or_default()));
            }
            rows.insert(c.id, c);
        }
        Mutation::Delete(id) => {
            rows.remove(&id).ok_or(StoreError::Missing(id))?;
        }
    }
    Ok(())
}

#[async_trait]
impl CountryRepository for MemoryCountryRepository {
    async fn find_by_external_code(&self, code: &str) -> Result<Option<Country>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows
            .values()
            .find(|c| c.external_code.as_deref() == Some(code))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Country>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Country>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(sorted(rows.values().cloned().collect()))
    }

    fn insert(&mut self, country: Country) {
        self.staged.push(Mutation::Insert(country));
    }

    fn update(&mut self, country: Country) {
        self.staged.push(Mutation::Update(country));
    }

    fn delete(&mut self, country: &Country) {
        self.staged.push(Mutation::Delete(country.id));
    }

    fn pending(&self) -> usize {
        self.staged.len()
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let staged = ordered(std::mem::take(&mut self.staged));
        if staged.is_empty() {
            return Ok(());
        }
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        let mut next = rows.clone();
        for mutation in staged {
            apply(&mut next, mutation)?;
        }
        *rows = next;
        Ok(())
    }
}
