pub mod concepts;
pub use concepts::{AggregatedConcepts, aggregate};

pub mod related_cache;
pub use related_cache::RelatedConceptCache;

pub mod rate_limiter;
pub use rate_limiter::{RateLimited, RateLimiter, slugify};

pub mod enrichment;
pub use enrichment::EnrichmentService;

pub mod drug_search;
pub use drug_search::{DrugSearchResult, DrugSearchService, SearchError, SearchResponse};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthGrant, AuthService, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_drug_service;
pub mod user_drug_service_impl;
pub use user_drug_service::{Medication, UserDrugError, UserDrugService};
pub use user_drug_service_impl::SeaOrmUserDrugService;
