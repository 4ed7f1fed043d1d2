//! Country CRUD over a repository session. Validation happens before any persistence call.

use crate::error::AppError;
use crate::model::{Country, CountryFields, CountryPatch};
use crate::repository::CountryStore;
use uuid::Uuid;

pub struct CountryService;

impl CountryService {
    /// All countries ordered by name.
    pub async fn list(store: &dyn CountryStore) -> Result<Vec<Country>, AppError> {
        Ok(store.session().find_all().await?)
    }

    pub async fn read(store: &dyn CountryStore, id: Uuid) -> Result<Country, AppError> {
        store
            .session()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("country {}", id)))
    }

    /// Insert a country without an external code; the next sync prunes it unless the code is assigned.
    pub async fn create(store: &dyn CountryStore, fields: CountryFields) -> Result<Country, AppError> {
        let country = fields.into_country(None);
        let mut repo = store.session();
        repo.insert(country.clone());
        repo.commit().await?;
        tracing::info!(id = %country.id, name = %country.name, "country created");
        Ok(country)
    }

    pub async fn update(store: &dyn CountryStore, id: Uuid, patch: CountryPatch) -> Result<Country, AppError> {
        let mut repo = store.session();
        let mut country = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("country {}", id)))?;
        if patch.is_empty() {
            return Ok(country);
        }
        patch.apply_to(&mut country);
        repo.update(country.clone());
        repo.commit().await?;
        tracing::info!(id = %id, "country updated");
        Ok(country)
    }

    /// Delete by id. Returns the deleted country.
    pub async fn delete(store: &dyn CountryStore, id: Uuid) -> Result<Country, AppError> {
        let mut repo = store.session();
        let country = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("country {}", id)))?;
        repo.delete(&country);
        repo.commit().await?;
        tracing::info!(id = %id, "country deleted");
        Ok(country)
    }
}
