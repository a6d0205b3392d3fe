use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::clients::rxnav::RxNavClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, DrugSearchService, EnrichmentService, RateLimiter, RelatedConceptCache,
    SeaOrmAuthService, SeaOrmUserDrugService, UserDrugService,
};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// This client should be reused across all HTTP-based services to enable
/// connection pooling and avoid socket exhaustion.
fn build_shared_http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent("Medlist/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// Upstream-facing half of the state: everything a drug search needs, without
/// a database.
#[derive(Clone)]
pub struct SearchComponents {
    pub rxnav: Arc<RxNavClient>,

    pub related_cache: Arc<RelatedConceptCache>,

    pub rate_limiter: Arc<RateLimiter>,

    pub enrichment: Arc<EnrichmentService>,

    pub drug_search: Arc<DrugSearchService>,
}

impl SearchComponents {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = build_shared_http_client(config.rxnav.request_timeout())?;
        let rxnav = Arc::new(RxNavClient::with_shared_client(
            http_client,
            &config.rxnav.base_url,
        ));

        let related_cache = Arc::new(RelatedConceptCache::new(
            config.rxnav.related_cache_ttl(),
            config.rxnav.related_cache_capacity,
        ));

        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit.max_attempts,
            Duration::from_secs(config.rate_limit.window_seconds),
        ));

        let enrichment = Arc::new(EnrichmentService::new(
            rxnav.clone(),
            related_cache.clone(),
        ));

        let drug_search = Arc::new(DrugSearchService::new(
            rxnav.clone(),
            enrichment.clone(),
            rate_limiter.clone(),
            config.rxnav.max_results,
        ));

        Ok(Self {
            rxnav,
            related_cache,
            rate_limiter,
            enrichment,
            drug_search,
        })
    }
}

/// Process-wide state, built once at startup and shared by every request.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub search: SearchComponents,

    pub auth_service: Arc<dyn AuthService>,

    pub user_drug_service: Arc<dyn UserDrugService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let search = SearchComponents::new(&config)?;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let user_drug_service = Arc::new(SeaOrmUserDrugService::new(
            store.clone(),
            search.rxnav.clone(),
            search.enrichment.clone(),
        )) as Arc<dyn UserDrugService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            search,
            auth_service,
            user_drug_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
