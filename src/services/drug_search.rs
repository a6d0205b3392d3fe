//! Drug name search enriched with ingredients and dosage forms.
//!
//! A search runs, in order: a per drug name and client rate-limit check, the
//! RxNav name search, and for each branded drug (`SBD`) up to the result cap a
//! cached related-concept lookup reduced by [`aggregate`](super::concepts::aggregate).
//! Only the name search can fail the request; enrichment failures leave the
//! drug in the results with empty lists.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::clients::rxnav::{RxNavClient, UpstreamError};
use crate::services::enrichment::EnrichmentService;
use crate::services::rate_limiter::{RateLimiter, slugify};

const MAX_QUERY_LEN: usize = 255;
const MAX_PREALLOCATED_RESULTS: usize = 16;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    Validation(String),

    #[error("Too many requests, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrugSearchResult {
    pub rxcui: String,
    pub name: String,
    pub ingredient_base_names: Vec<String>,
    pub dosage_forms: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub search_term: String,
    pub results: Vec<DrugSearchResult>,
}

pub struct DrugSearchService {
    client: Arc<RxNavClient>,
    enrichment: Arc<EnrichmentService>,
    rate_limiter: Arc<RateLimiter>,
    max_results: usize,
}

impl DrugSearchService {
    #[must_use]
    pub const fn new(
        client: Arc<RxNavClient>,
        enrichment: Arc<EnrichmentService>,
        rate_limiter: Arc<RateLimiter>,
        max_results: usize,
    ) -> Self {
        Self {
            client,
            enrichment,
            rate_limiter,
            max_results,
        }
    }

    /// Key the limiter counts `query` from `client_key` under.
    #[must_use]
    pub fn rate_limit_key(query: &str, client_key: &str) -> String {
        format!("drug-search:{}:{}", slugify(query), client_key)
    }

    pub async fn search(&self, query: &str, client_key: &str) -> Result<SearchResponse, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::Validation(
                "The drug_name field is required.".to_string(),
            ));
        }
        if query.chars().count() > MAX_QUERY_LEN {
            return Err(SearchError::Validation(format!(
                "The drug_name field must not be greater than {MAX_QUERY_LEN} characters."
            )));
        }

        let key = Self::rate_limit_key(query, client_key);
        if let Err(limited) = self.rate_limiter.hit(&key) {
            metrics::counter!("drug_search_rate_limited_total").increment(1);
            return Err(SearchError::RateLimited {
                retry_after: limited.retry_after_secs(),
            });
        }

        let drugs = self.client.search_by_name(query).await.inspect_err(|e| {
            warn!(query = %query, endpoint = e.endpoint(), error = %e, "Drug name search failed");
        })?;

        let mut results = Vec::with_capacity(self.max_results.min(MAX_PREALLOCATED_RESULTS));
        for drug in drugs.branded_drugs().take(self.max_results) {
            let concepts = self.enrichment.concepts_for(&drug.rxcui).await;

            results.push(DrugSearchResult {
                rxcui: drug.rxcui.clone(),
                name: drug.name.clone(),
                ingredient_base_names: concepts.ingredients,
                dosage_forms: concepts.dosage_forms,
            });
        }

        info!(query = %query, results = results.len(), "Drug search completed");

        Ok(SearchResponse {
            search_term: query.to_string(),
            results,
        })
    }
}
