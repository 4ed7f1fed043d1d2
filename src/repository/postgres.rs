//! PostgreSQL store. Commit runs every staged mutation inside one transaction.

use super::{ordered, CountryRepository, CountryStore, Mutation};
use crate::error::StoreError;
use crate::model::{Country, Currency};
use crate::store::qualified_country_table;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

const COLUMNS: &str =
    "id, external_code, name, region, sub_region, demonym, population, independent, flag, currency";

#[derive(sqlx::FromRow)]
struct CountryRow {
    id: Uuid,
    external_code: Option<String>,
    name: String,
    region: String,
    sub_region: String,
    demonym: String,
    population: i64,
    independent: bool,
    flag: String,
    currency: Json<Vec<Currency>>,
}

impl From<CountryRow> for Country {
    fn from(row: CountryRow) -> Self {
        Country {
            id: row.id,
            external_code: row.external_code,
            name: row.name,
            region: row.region,
            sub_region: row.sub_region,
            demonym: row.demonym,
            population: row.population,
            independent: row.independent,
            flag: row.flag,
            currency: row.currency.0,
        }
    }
}

#[derive(Clone)]
pub struct PgCountryStore {
    pool: PgPool,
    table: String,
}

impl PgCountryStore {
    pub fn new(pool: PgPool, schema: &str) -> Self {
        PgCountryStore {
            pool,
            table: qualified_country_table(schema),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CountryStore for PgCountryStore {
    fn session(&self) -> Box<dyn CountryRepository> {
        Box::new(PgCountryRepository {
            pool: self.pool.clone(),
            table: self.table.clone(),
            staged: Vec::new(),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

pub struct PgCountryRepository {
    pool: PgPool,
    table: String,
    staged: Vec<Mutation>,
}

impl PgCountryRepository {
    async fn execute(&self, tx: &mut PgConnection, mutation: &Mutation) -> Result<(), StoreError> {
        match mutation {
            Mutation::Insert(c) => {
                let sql = format!(
                    "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
                    self.table, COLUMNS
                );
                tracing::debug!(sql = %sql, id = %c.id, "query (tx)");
                sqlx::query(&sql)
                    .bind(c.id)
                    .bind(&c.external_code)
                    .bind(&c.name)
                    .bind(&c.region)
                    .bind(&c.sub_region)
                    .bind(&c.demonym)
                    .bind(c.population)
                    .bind(c.independent)
                    .bind(&c.flag)
                    .bind(Json(&c.currency))
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| unique_violation(e, c))?;
            }
            Mutation::Update(c) => {
                let sql = format!(
                    "UPDATE {} SET external_code = $2, name = $3, region = $4, sub_region = $5, demonym = $6, \
                     population = $7, independent = $8, flag = $9, currency = $10, updated_at = NOW() WHERE id = $1",
                    self.table
                );
                tracing::debug!(sql = %sql, id = %c.id, "query (tx)");
                let done = sqlx::query(&sql)
                    .bind(c.id)
                    .bind(&c.external_code)
                    .bind(&c.name)
                    .bind(&c.region)
                    .bind(&c.sub_region)
                    .bind(&c.demonym)
                    .bind(c.population)
                    .bind(c.independent)
                    .bind(&c.flag)
                    .bind(Json(&c.currency))
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| unique_violation(e, c))?;
                if done.rows_affected() == 0 {
                    return Err(StoreError::Missing(c.id));
                }
            }
            Mutation::Delete(id) => {
                let sql = format!("DELETE FROM {} WHERE id = $1", self.table);
                tracing::debug!(sql = %sql, id = %id, "query (tx)");
                let done = sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
                if done.rows_affected() == 0 {
                    return Err(StoreError::Missing(*id));
                }
            }
        }
        Ok(())
    }
}

/// Map a unique index violation on `external_code` to `DuplicateCode`.
fn unique_violation(e: sqlx::Error, country: &Country) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::DuplicateCode(country.external_code.clone().unwrap_or_default());
        }
    }
    StoreError::Db(e)
}

#[async_trait]
impl CountryRepository for PgCountryRepository {
    async fn find_by_external_code(&self, code: &str) -> Result<Option<Country>, StoreError> {
        let sql = format!("SELECT {} FROM {} WHERE external_code = $1", COLUMNS, self.table);
        tracing::debug!(sql = %sql, code = %code, "query");
        let row = sqlx::query_as::<_, CountryRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Country::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Country>, StoreError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", COLUMNS, self.table);
        tracing::debug!(sql = %sql, id = %id, "query");
        let row = sqlx::query_as::<_, CountryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Country::from))
    }

    async fn find_all(&self) -> Result<Vec<Country>, StoreError> {
        let sql = format!("SELECT {} FROM {} ORDER BY name, id", COLUMNS, self.table);
        tracing::debug!(sql = %sql, "query");
        let rows = sqlx::query_as::<_, CountryRow>(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Country::from).collect())
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
        // Dropping `tx` on any error path rolls the transaction back.
        let mut tx = self.pool.begin().await?;
        for mutation in &staged {
            self.execute(&mut tx, mutation).await?;
        }
        tx.commit().await?;
        tracing::debug!(mutations = staged.len(), "committed");
        Ok(())
    }
}
