//! Upsert-and-prune of local countries against one snapshot, keyed by external code.

use super::transform::{transform, SnapshotEntry};
use crate::error::{SyncError, TransformError};
use crate::repository::CountryRepository;
use crate::source::{CountrySource, RawCountry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Outcome of one successful run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Matched records that already carried the snapshot's values.
    pub unchanged: usize,
    pub deleted: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn message(&self) -> String {
        format!(
            "Country data synchronized successfully. ({} fetched: {} inserted, {} updated, {} unchanged, {} deleted)",
            self.fetched, self.inserted, self.updated, self.unchanged, self.deleted
        )
    }
}

/// Fetch a snapshot from `source` and reconcile `repo` with it.
/// A fetch failure returns before the repository is touched.
pub async fn reconcile(
    source: &dyn CountrySource,
    repo: &mut dyn CountryRepository,
) -> Result<SyncReport, SyncError> {
    let started_at = Utc::now();
    tracing::info!("fetching country snapshot");
    let snapshot = source.fetch_snapshot().await.map_err(|e| {
        tracing::warn!(error = %e, "snapshot fetch failed, nothing changed");
        SyncError::from(e)
    })?;
    tracing::info!(records = snapshot.len(), "snapshot fetched");
    apply_snapshot(&snapshot, repo, started_at).await
}

/// Transform every record first, so a bad record aborts before anything is staged.
fn prepare(snapshot: &[RawCountry]) -> Result<Vec<SnapshotEntry>, TransformError> {
    let mut seen = HashSet::with_capacity(snapshot.len());
    let mut entries = Vec::with_capacity(snapshot.len());
    for (index, raw) in snapshot.iter().enumerate() {
        let entry = transform(index, raw)?;
        if !seen.insert(entry.code.clone()) {
            return Err(TransformError {
                code: entry.code,
                reason: "code appears more than once in the snapshot".into(),
            });
        }
        entries.push(entry);
    }
    Ok(entries)
}

/// Stage inserts, updates and deletes for `snapshot` and commit them in one flush.
pub async fn apply_snapshot(
    snapshot: &[RawCountry],
    repo: &mut dyn CountryRepository,
    started_at: DateTime<Utc>,
) -> Result<SyncReport, SyncError> {
    let entries = prepare(snapshot).map_err(|e| {
        tracing::warn!(error = %e, "snapshot rejected, nothing changed");
        SyncError::from(e)
    })?;

    let mut report = SyncReport {
        fetched: snapshot.len(),
        inserted: 0,
        updated: 0,
        unchanged: 0,
        deleted: 0,
        started_at,
        finished_at: started_at,
    };

    for entry in &entries {
        let existing = repo
            .find_by_external_code(&entry.code)
            .await
            .map_err(SyncError::Lookup)?;
        match existing {
            Some(mut country) if !entry.fields.matches(&country) => {
                entry.fields.apply_to(&mut country);
                tracing::debug!(code = %entry.code, id = %country.id, "staging update");
                repo.update(country);
                report.updated += 1;
            }
            Some(_) => report.unchanged += 1,
            None => {
                let country = entry.fields.clone().into_country(Some(entry.code.clone()));
                tracing::debug!(code = %entry.code, id = %country.id, "staging insert");
                repo.insert(country);
                report.inserted += 1;
            }
        }
    }

    // Prune by external code over the whole table; rows without a code are not in any snapshot.
    let codes: HashSet<&str> = entries.iter().map(|e| e.code.as_str()).collect();
    for country in repo.find_all().await.map_err(SyncError::Lookup)? {
        let keep = country
            .external_code
            .as_deref()
            .is_some_and(|code| codes.contains(code));
        if !keep {
            tracing::debug!(code = ?country.external_code, id = %country.id, "staging delete");
            repo.delete(&country);
            report.deleted += 1;
        }
    }

    repo.commit().await.map_err(|e| {
        tracing::warn!(error = %e, "commit failed, staged changes discarded");
        SyncError::Commit(e)
    })?;
    report.finished_at = Utc::now();
    tracing::info!(
        fetched = report.fetched,
        inserted = report.inserted,
        updated = report.updated,
        unchanged = report.unchanged,
        deleted = report.deleted,
        "countries synchronized"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, StoreError};
    use crate::model::{sample_fields, Country};
    use crate::repository::{CountryStore, MemoryCountryStore};
    use crate::source::parse_snapshot;
    use async_trait::async_trait;
    use serde_json::json;
    use uuid::Uuid;

    struct StaticSource(serde_json::Value);

    #[async_trait]
    impl CountrySource for StaticSource {
        async fn fetch_snapshot(&self) -> Result<Vec<RawCountry>, FetchError> {
            parse_snapshot(self.0.to_string().as_bytes())
        }
    }

    struct DownSource;

    #[async_trait]
    impl CountrySource for DownSource {
        async fn fetch_snapshot(&self) -> Result<Vec<RawCountry>, FetchError> {
            Err(FetchError::Status {
                status: 502,
                body: "bad gateway".into(),
            })
        }
    }

    fn record(code: &str, name: &str, region: &str) -> serde_json::Value {
        json!({
            "name": {"common": name},
            "region": region,
            "subregion": "Sub",
            "demonyms": {"eng": {"f": format!("{}ian", name)}},
            "population": 1000,
            "independent": true,
            "cca3": code,
            "flags": {"png": format!("https://flags.example/{}.png", code)},
            "currencies": {"XTS": {"name": "Test Currency", "symbol": "T"}}
        })
    }

    fn local(code: Option<&str>, name: &str) -> Country {
        sample_fields(name).into_country(code.map(str::to_string))
    }

    async fn run(store: &MemoryCountryStore, snapshot: serde_json::Value) -> Result<SyncReport, SyncError> {
        let mut repo = store.session();
        reconcile(&StaticSource(snapshot), repo.as_mut()).await
    }

    fn codes(store: &MemoryCountryStore) -> Vec<String> {
        let mut codes: Vec<_> = store
            .snapshot()
            .unwrap()
            .into_iter()
            .filter_map(|c| c.external_code)
            .collect();
        codes.sort();
        codes
    }

    #[tokio::test]
    async fn inserts_into_empty_store() {
        let store = MemoryCountryStore::new();
        let snapshot = json!([{
            "cca3": "TST", "name": {"common": "Testland"}, "region": "R",
            "population": 1000, "independent": true, "flags": {"png": "u"}, "currencies": {}
        }]);
        let report = run(&store, snapshot).await.unwrap();
        assert_eq!(report.inserted, 1);

        let rows = store.snapshot().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Testland");
        assert_eq!(rows[0].external_code.as_deref(), Some("TST"));
        assert!(rows[0].currency.is_empty());
    }

    #[tokio::test]
    async fn matched_record_is_overwritten_in_place() {
        let mut existing = local(Some("TST"), "Testland");
        existing.region = "Old".into();
        let store = MemoryCountryStore::with_countries([existing.clone()]);

        let report = run(&store, json!([record("TST", "Testland", "New")])).await.unwrap();
        assert_eq!((report.inserted, report.updated, report.deleted), (0, 1, 0));

        let rows = store.snapshot().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, existing.id);
        assert_eq!(rows[0].external_code.as_deref(), Some("TST"));
        assert_eq!(rows[0].region, "New");
        assert_eq!(rows[0].demonym, "Testlandian");
        assert_eq!(rows[0].currency[0].name, "Test Currency");
    }

    #[tokio::test]
    async fn absent_codes_are_pruned() {
        let store = MemoryCountryStore::with_countries([local(Some("OLD"), "Oldland")]);
        let report = run(&store, json!([record("NEW", "Newland", "R")])).await.unwrap();
        assert_eq!((report.inserted, report.deleted), (1, 1));
        assert_eq!(codes(&store), ["NEW"]);
    }

    #[tokio::test]
    async fn pruning_ignores_names() {
        // Same name, different code: the old row goes, the new one is inserted with a new id.
        let old = local(Some("OLD"), "Testland");
        let store = MemoryCountryStore::with_countries([old.clone()]);
        run(&store, json!([record("TST", "Testland", "R")])).await.unwrap();
        let rows = store.snapshot().unwrap();
        assert_eq!(rows.len(), 1);
        assert_ne!(rows[0].id, old.id);
        assert_eq!(rows[0].external_code.as_deref(), Some("TST"));
    }

    #[tokio::test]
    async fn rows_without_code_are_pruned() {
        let store = MemoryCountryStore::with_countries([local(None, "Handmade")]);
        let report = run(&store, json!([record("TST", "Testland", "R")])).await.unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(codes(&store), ["TST"]);
        assert_eq!(store.snapshot().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn code_set_matches_snapshot_and_new_ids_are_fresh() {
        let keep = local(Some("AAA"), "Aland");
        let store = MemoryCountryStore::with_countries([keep.clone(), local(Some("ZZZ"), "Zland")]);
        let snapshot = json!([
            record("AAA", "Aland", "R"),
            record("BBB", "Bland", "R"),
            record("CCC", "Cland", "R"),
        ]);
        run(&store, snapshot).await.unwrap();
        assert_eq!(codes(&store), ["AAA", "BBB", "CCC"]);

        let rows = store.snapshot().unwrap();
        let ids: HashSet<_> = rows.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 3);
        assert!(rows.iter().any(|c| c.id == keep.id));
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let store = MemoryCountryStore::with_countries([local(Some("OLD"), "Oldland")]);
        let snapshot = json!([record("AAA", "Aland", "R"), record("BBB", "Bland", "R")]);
        run(&store, snapshot.clone()).await.unwrap();
        let first = store.snapshot().unwrap();

        let report = run(&store, snapshot).await.unwrap();
        assert_eq!((report.inserted, report.updated, report.deleted), (0, 0, 0));
        assert_eq!(report.unchanged, 2);
        assert_eq!(store.snapshot().unwrap(), first);
    }

    #[tokio::test]
    async fn missing_region_aborts_without_changes() {
        let before = vec![local(Some("OLD"), "Oldland")];
        let store = MemoryCountryStore::with_countries(before.clone());
        let mut bad = record("BAD", "Badland", "R");
        bad.as_object_mut().unwrap().remove("region");

        let err = run(&store, json!([record("NEW", "Newland", "R"), bad])).await.unwrap_err();
        match err {
            SyncError::Transform(e) => {
                assert_eq!(e.code, "BAD");
                assert_eq!(e.reason, "missing region");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(store.snapshot().unwrap(), before);
    }

    #[tokio::test]
    async fn mistyped_record_is_a_transform_error() {
        let store = MemoryCountryStore::new();
        let mut bad = record("BAD", "Badland", "R");
        bad["region"] = json!(7);
        let err = run(&store, json!([record("AAA", "Aland", "R"), bad])).await.unwrap_err();
        assert!(matches!(err, SyncError::Transform(ref e) if e.code == "BAD"), "{}", err);
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_codes_are_rejected() {
        let store = MemoryCountryStore::new();
        let err = run(&store, json!([record("TST", "A", "R"), record("TST", "B", "R")]))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Transform(ref e) if e.code == "TST"));
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_leaves_store_untouched() {
        let before = vec![local(Some("OLD"), "Oldland")];
        let store = MemoryCountryStore::with_countries(before.clone());
        let mut repo = store.session();
        let err = reconcile(&DownSource, repo.as_mut()).await.unwrap_err();
        assert!(matches!(err, SyncError::Fetch(FetchError::Status { status: 502, .. })));
        assert_eq!(repo.pending(), 0);
        assert_eq!(store.snapshot().unwrap(), before);
    }

    #[tokio::test]
    async fn empty_snapshot_clears_the_store() {
        let store = MemoryCountryStore::with_countries([local(Some("A"), "A"), local(None, "B")]);
        let report = run(&store, json!([])).await.unwrap();
        assert_eq!(report.deleted, 2);
        assert!(store.snapshot().unwrap().is_empty());
    }

    /// Session whose commit races a concurrent writer that takes `intruder`'s code first.
    struct RacedSession {
        inner: Box<dyn CountryRepository>,
        store: MemoryCountryStore,
        intruder: Country,
    }

    #[async_trait]
    impl CountryRepository for RacedSession {
        async fn find_by_external_code(&self, code: &str) -> Result<Option<Country>, StoreError> {
            self.inner.find_by_external_code(code).await
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Country>, StoreError> {
            self.inner.find_by_id(id).await
        }

        async fn find_all(&self) -> Result<Vec<Country>, StoreError> {
            self.inner.find_all().await
        }

        fn insert(&mut self, country: Country) {
            self.inner.insert(country)
        }

        fn update(&mut self, country: Country) {
            self.inner.update(country)
        }

        fn delete(&mut self, country: &Country) {
            self.inner.delete(country)
        }

        fn pending(&self) -> usize {
            self.inner.pending()
        }

        async fn commit(&mut self) -> Result<(), StoreError> {
            let mut other = self.store.session();
            other.insert(self.intruder.clone());
            other.commit().await?;
            self.inner.commit().await
        }
    }

    #[tokio::test]
    async fn commit_failure_is_reported_and_nothing_is_applied() {
        let old = local(Some("OLD"), "Oldland");
        let store = MemoryCountryStore::with_countries([old.clone()]);
        let intruder = local(Some("TST"), "Intruder");
        let mut repo = RacedSession {
            inner: store.session(),
            store: store.clone(),
            intruder: intruder.clone(),
        };

        let snapshot = json!([record("TST", "Testland", "R"), record("NEW", "Newland", "R")]);
        let err = reconcile(&StaticSource(snapshot), &mut repo).await.unwrap_err();
        assert!(
            matches!(err, SyncError::Commit(StoreError::DuplicateCode(ref code)) if code == "TST"),
            "unexpected error: {}",
            err
        );
        assert_eq!(repo.pending(), 0);

        // Only the concurrent writer's row landed; the prune of OLD and the insert of NEW did not.
        let mut expected = vec![intruder, old];
        expected.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(store.snapshot().unwrap(), expected);
    }

    #[test]
    fn report_message_reads_well() {
        let now = Utc::now();
        let report = SyncReport {
            fetched: 3,
            inserted: 1,
            updated: 1,
            unchanged: 1,
            deleted: 0,
            started_at: now,
            finished_at: now,
        };
        assert!(report.message().starts_with("Country data synchronized successfully."));
    }
}
