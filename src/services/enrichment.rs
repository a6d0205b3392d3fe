use std::sync::Arc;

use crate::clients::rxnav::RxNavClient;
use crate::services::concepts::{AggregatedConcepts, aggregate};
use crate::services::related_cache::RelatedConceptCache;

/// Resolves the ingredient and dosage form names of a drug through the shared
/// related-concept cache. Never fails: a lookup RxNav cannot answer yields
/// empty lists.
pub struct EnrichmentService {
    client: Arc<RxNavClient>,
    cache: Arc<RelatedConceptCache>,
}

impl EnrichmentService {
    #[must_use]
    pub const fn new(client: Arc<RxNavClient>, cache: Arc<RelatedConceptCache>) -> Self {
        Self { client, cache }
    }

    pub async fn concepts_for(&self, rxcui: &str) -> AggregatedConcepts {
        let payload = self
            .cache
            .get_or_fetch(rxcui, || self.client.fetch_related(rxcui))
            .await;

        aggregate(&payload)
    }
}
