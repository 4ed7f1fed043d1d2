//! Database bootstrap: create the database and the `countries` table if missing.
//! The table lives in the schema named by `COUNTRY_SCHEMA` (default `public`).

use crate::error::StoreError;
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Quote identifier for PostgreSQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Schema-qualified countries table, e.g. `"public"."countries"`.
pub fn qualified_country_table(schema: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident("countries"))
}

/// Create schema, table and the unique external code index. Idempotent.
pub async fn ensure_country_table(pool: &PgPool, schema: &str) -> Result<(), StoreError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)))
        .execute(pool)
        .await?;
    let table = qualified_country_table(schema);
    let ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id UUID PRIMARY KEY,
            external_code VARCHAR(100),
            name VARCHAR(100) NOT NULL,
            region VARCHAR(100) NOT NULL,
            sub_region VARCHAR(100) NOT NULL DEFAULT '',
            demonym VARCHAR(100) NOT NULL DEFAULT '',
            population BIGINT NOT NULL CHECK (population >= 0),
            independent BOOLEAN NOT NULL DEFAULT FALSE,
            flag TEXT NOT NULL,
            currency JSONB NOT NULL DEFAULT '[]'::jsonb,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        table
    );
    sqlx::query(&ddl).execute(pool).await?;
    // NULL codes (API-created rows) never collide under a plain unique index.
    let index = format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS countries_external_code_key ON {} (external_code)",
        table
    );
    sqlx::query(&index).execute(pool).await?;
    Ok(())
}

/// Connect to the `postgres` maintenance database and create the target database if absent.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StoreError> {
    let (admin_url, db_name) = split_db_name(database_url);
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Split `postgres://host/db?opts` into (`postgres://host/postgres`, `db`).
fn split_db_name(url: &str) -> (String, String) {
    let Some(slash) = url.rfind('/') else {
        return (url.to_string(), String::new());
    };
    let path_start = slash + 1;
    let db_name = url[path_start..].split('?').next().unwrap_or("").trim();
    let admin_url = format!("{}postgres", &url[..path_start]);
    (admin_url, db_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifies_and_quotes() {
        assert_eq!(qualified_country_table("geo"), "\"geo\".\"countries\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn splits_database_name() {
        let (admin, db) = split_db_name("postgres://u:p@localhost:5432/countries?sslmode=disable");
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres");
        assert_eq!(db, "countries");
    }
}
