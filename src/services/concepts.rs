//! Reduces a related-concept payload to ingredient and dosage form names.

use serde::Serialize;

use crate::clients::rxnav::{RelatedConceptPayload, TermType};

/// Ingredient base names and dosage forms of one drug, each without duplicates
/// and in the order RxNav listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregatedConcepts {
    pub ingredients: Vec<String>,
    pub dosage_forms: Vec<String>,
}

/// Walks every concept group of `payload`, collecting `IN` names as ingredients
/// and `DF` names as dosage forms. Other term types and nameless concepts are
/// skipped. Duplicates are dropped by exact match, keeping the first one seen.
#[must_use]
pub fn aggregate(payload: &RelatedConceptPayload) -> AggregatedConcepts {
    let mut aggregated = AggregatedConcepts::default();

    for group in &payload.related_group.concept_group {
        let target = match group.tty {
            TermType::Ingredient => &mut aggregated.ingredients,
            TermType::DoseForm => &mut aggregated.dosage_forms,
            _ => continue,
        };

        for concept in &group.concept_properties {
            push_unique(target, &concept.name);
        }
    }

    aggregated
}

fn push_unique(values: &mut Vec<String>, name: &str) {
    if !name.is_empty() && !values.iter().any(|v| v == name) {
        values.push(name.to_string());
    }
}
