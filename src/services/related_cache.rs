use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::clients::rxnav::RelatedConceptPayload;

/// Time-bounded cache of related-concept payloads keyed by rxcui.
///
/// Concurrent misses for the same rxcui share a single in-flight fetch: the
/// first caller runs it, the others wait for its result. Entries expire a fixed
/// time after insertion and are dropped lazily.
#[derive(Clone)]
pub struct RelatedConceptCache {
    entries: Cache<String, Arc<RelatedConceptPayload>>,
}

impl RelatedConceptCache {
    #[must_use]
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let entries = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .build();

        Self { entries }
    }

    /// Returns the cached payload for `rxcui`, running `fetch` on a miss.
    pub async fn get_or_fetch<F, Fut>(&self, rxcui: &str, fetch: F) -> Arc<RelatedConceptPayload>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RelatedConceptPayload>,
    {
        let entry = self
            .entries
            .entry_by_ref(rxcui)
            .or_insert_with(async move { Arc::new(fetch().await) })
            .await;

        let outcome = if entry.is_fresh() { "miss" } else { "hit" };
        debug!(rxcui = %rxcui, outcome, "Related concept cache lookup");
        metrics::counter!("related_cache_lookups_total", "outcome" => outcome).increment(1);

        entry.into_value()
    }

    pub async fn get(&self, rxcui: &str) -> Option<Arc<RelatedConceptPayload>> {
        self.entries.get(rxcui).await
    }

    pub async fn invalidate(&self, rxcui: &str) {
        self.entries.invalidate(rxcui).await;
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Approximate; pending maintenance is not flushed.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    pub async fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks().await;
    }
}
