//! `SeaORM` implementation of the `UserDrugService` trait.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::info;

use crate::clients::rxnav::RxNavClient;
use crate::db::{InsertOutcome, Store};
use crate::services::enrichment::EnrichmentService;
use crate::services::user_drug_service::{Medication, UserDrugError, UserDrugService};

pub struct SeaOrmUserDrugService {
    store: Store,
    client: Arc<RxNavClient>,
    enrichment: Arc<EnrichmentService>,
}

impl SeaOrmUserDrugService {
    #[must_use]
    pub const fn new(
        store: Store,
        client: Arc<RxNavClient>,
        enrichment: Arc<EnrichmentService>,
    ) -> Self {
        Self {
            store,
            client,
            enrichment,
        }
    }
}

#[async_trait]
impl UserDrugService for SeaOrmUserDrugService {
    async fn add_drug(&self, user_id: i32, rxcui: &str) -> Result<(), UserDrugError> {
        let properties = self
            .client
            .get_properties(rxcui)
            .await?
            .ok_or(UserDrugError::InvalidRxcui)?;

        if self.store.user_drug_exists(user_id, rxcui).await? {
            return Err(UserDrugError::Duplicate);
        }

        // The unique index still catches a concurrent add that won the race
        match self
            .store
            .add_user_drug(user_id, rxcui, &properties.name)
            .await?
        {
            InsertOutcome::Inserted(drug) => {
                info!(user_id, rxcui = %drug.rxcui, "Drug added to list");
                Ok(())
            }
            InsertOutcome::Duplicate => Err(UserDrugError::Duplicate),
        }
    }

    async fn delete_drug(&self, user_id: i32, rxcui: &str) -> Result<(), UserDrugError> {
        if !self.store.remove_user_drug(user_id, rxcui).await? {
            return Err(UserDrugError::NotFound);
        }

        info!(user_id, rxcui = %rxcui, "Drug removed from list");
        Ok(())
    }

    async fn list_drugs(&self, user_id: i32) -> Result<Vec<Medication>, UserDrugError> {
        let drugs = self.store.list_user_drugs(user_id).await?;

        let enriched = join_all(drugs.into_iter().map(|drug| async move {
            let concepts = self.enrichment.concepts_for(&drug.rxcui).await;
            Medication {
                rxcui: drug.rxcui,
                drug_name: drug.drug_name,
                ingredient_base_names: concepts.ingredients,
                dosage_forms: concepts.dosage_forms,
            }
        }))
        .await;

        Ok(enriched)
    }
}
