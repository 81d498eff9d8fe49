//! Rebuilding a dump from stored history.

use benchtrack_core::{BenchmarkRun, Commit, MeasurementRecord};
use benchtrack_storage::HistoryStore;
use std::collections::HashMap;
use tracing::debug;

use crate::dump::BenchmarkData;
use crate::error::Result;

/// Regroup every stored record into one run per (tool, commit) under
/// `suite`, ordered by commit timestamp.
///
/// Benches inside a run are ordered by name. `lastUpdate` is the latest
/// run date.
pub async fn export_history(store: &dyn HistoryStore, repo_url: &str, suite: &str) -> Result<BenchmarkData> {
    let mut groups: HashMap<(String, String), (Commit, Vec<MeasurementRecord>)> = HashMap::new();

    for tool in store.tools().await? {
        for name in store.all_benchmark_names(&tool).await? {
            let series = store.series_for(&tool, &name).await?;
            for record in series.iter() {
                groups
                    .entry((tool.clone(), record.commit.id.clone()))
                    .or_insert_with(|| (record.commit.clone(), Vec::new()))
                    .1
                    .push(record.clone());
            }
        }
    }

    let mut runs: Vec<BenchmarkRun> = groups
        .into_iter()
        .map(|((tool, _), (commit, records))| BenchmarkRun::from_records(&tool, commit, &records))
        .collect();
    runs.sort_by(|a, b| {
        a.commit
            .timestamp_utc()
            .cmp(&b.commit.timestamp_utc())
            .then_with(|| a.date.cmp(&b.date))
            .then_with(|| a.tool.cmp(&b.tool))
            .then_with(|| a.commit.id.cmp(&b.commit.id))
    });

    let mut data = BenchmarkData::new(repo_url);
    data.last_update = runs.iter().map(|r| r.date).max().unwrap_or(0);
    debug!(runs = runs.len(), suite, "exported history");
    if !runs.is_empty() {
        data.entries.insert(suite.to_string(), runs);
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::tests::SAMPLE;
    use crate::import::import_dump;
    use benchtrack_analyzer::RegressionAnalyzer;
    use benchtrack_collector::IngestionService;
    use benchtrack_storage::MemoryHistoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_import_then_export_reproduces_dump() {
        let store = Arc::new(MemoryHistoryStore::new());
        let original = BenchmarkData::parse(SAMPLE).unwrap();
        let service = IngestionService::new(store.clone(), RegressionAnalyzer::default());
        import_dump(&service, &original, |_| {}).await;

        let exported = export_history(store.as_ref(), &original.repo_url, "Rust Benchmark")
            .await
            .unwrap();

        assert_eq!(exported.repo_url, original.repo_url);
        assert_eq!(exported.entries, original.entries);
        assert_eq!(exported.last_update, 1656270500000);
    }

    #[tokio::test]
    async fn test_empty_store_exports_no_entries() {
        let store = MemoryHistoryStore::new();
        let exported = export_history(&store, "https://example.invalid", "Rust Benchmark")
            .await
            .unwrap();
        assert!(exported.entries.is_empty());
        assert_eq!(exported.last_update, 0);
    }
}
