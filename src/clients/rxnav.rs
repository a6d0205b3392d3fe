use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure talking to RxNav. Never retried by the client.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("RxNav {endpoint} request timed out")]
    Timeout { endpoint: &'static str },

    #[error("RxNav {endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("RxNav {endpoint} returned malformed JSON: {message}")]
    MalformedJson {
        endpoint: &'static str,
        message: String,
    },

    #[error("RxNav {endpoint} request failed: {message}")]
    Transport {
        endpoint: &'static str,
        message: String,
    },
}

impl UpstreamError {
    fn from_reqwest(endpoint: &'static str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { endpoint }
        } else {
            Self::Transport {
                endpoint,
                message: err.to_string(),
            }
        }
    }

    #[must_use]
    pub const fn endpoint(&self) -> &'static str {
        match self {
            Self::Timeout { endpoint }
            | Self::Status { endpoint, .. }
            | Self::MalformedJson { endpoint, .. }
            | Self::Transport { endpoint, .. } => endpoint,
        }
    }
}

/// RxNav term type tag of a concept group.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum TermType {
    /// `SBD`
    BrandedDrug,
    /// `IN`
    Ingredient,
    /// `DF`
    DoseForm,
    Other(String),
    #[default]
    Missing,
}

impl From<String> for TermType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "SBD" => Self::BrandedDrug,
            "IN" => Self::Ingredient,
            "DF" => Self::DoseForm,
            "" => Self::Missing,
            _ => Self::Other(value),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptProperties {
    #[serde(default)]
    pub rxcui: String,
    #[serde(default)]
    pub name: String,
    pub synonym: Option<String>,
    pub tty: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptGroup {
    #[serde(default)]
    pub tty: TermType,
    #[serde(default)]
    pub concept_properties: Vec<ConceptProperties>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugGroup {
    pub name: Option<String>,
    #[serde(default)]
    pub concept_group: Vec<ConceptGroup>,
}

/// Body of `GET /drugs.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugList {
    #[serde(default)]
    pub drug_group: DrugGroup,
}

impl DrugList {
    /// Concepts of every `SBD` group, in the order RxNav returned them.
    /// Concepts without an rxcui are skipped.
    pub fn branded_drugs(&self) -> impl Iterator<Item = &ConceptProperties> {
        self.drug_group
            .concept_group
            .iter()
            .filter(|group| group.tty == TermType::BrandedDrug)
            .flat_map(|group| group.concept_properties.iter())
            .filter(|concept| !concept.rxcui.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedGroup {
    pub rxcui: Option<String>,
    #[serde(default)]
    pub concept_group: Vec<ConceptGroup>,
}

/// Body of `GET /rxcui/{rxcui}/related.json`. An empty payload stands in for
/// any failed lookup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedConceptPayload {
    #[serde(default)]
    pub related_group: RelatedGroup,
}

#[derive(Debug, Deserialize)]
struct PropertiesResponse {
    properties: Option<ConceptProperties>,
}

#[derive(Clone)]
pub struct RxNavClient {
    client: Client,
    base_url: String,
}

impl RxNavClient {
    #[must_use]
    pub fn with_shared_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Searches drugs by free-text name.
    pub async fn search_by_name(&self, name: &str) -> Result<DrugList, UpstreamError> {
        let url = format!(
            "{}/drugs.json?name={}",
            self.base_url,
            urlencoding::encode(name)
        );

        self.get_json("drugs", &url).await
    }

    /// Fetches `IN` and `DF` concepts related to `rxcui`. Failures degrade to an
    /// empty payload so one missing lookup cannot sink a whole search.
    pub async fn fetch_related(&self, rxcui: &str) -> RelatedConceptPayload {
        let url = format!(
            "{}/rxcui/{}/related.json?tty=IN+DF",
            self.base_url,
            urlencoding::encode(rxcui)
        );

        match self.get_json("related", &url).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(rxcui = %rxcui, endpoint = e.endpoint(), error = %e, "Related concept lookup failed");
                RelatedConceptPayload::default()
            }
        }
    }

    /// Looks up the properties of a concept. Unknown identifiers, including ones
    /// RxNav answers with a non-success status, yield `None`.
    pub async fn get_properties(
        &self,
        rxcui: &str,
    ) -> Result<Option<ConceptProperties>, UpstreamError> {
        let url = format!(
            "{}/rxcui/{}/properties.json",
            self.base_url,
            urlencoding::encode(rxcui)
        );

        match self.get_json::<PropertiesResponse>("properties", &url).await {
            Ok(response) => Ok(response.properties.filter(|p| !p.name.is_empty())),
            Err(UpstreamError::Status { status, .. }) => {
                debug!(rxcui = %rxcui, status, "RxNav has no properties for concept");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
    ) -> Result<T, UpstreamError> {
        let result = self.send(endpoint, url).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(UpstreamError::Timeout { .. }) => "timeout",
            Err(UpstreamError::Status { .. }) => "status",
            Err(UpstreamError::MalformedJson { .. }) => "malformed",
            Err(UpstreamError::Transport { .. }) => "transport",
        };
        metrics::counter!("rxnav_requests_total", "endpoint" => endpoint, "outcome" => outcome)
            .increment(1);

        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
    ) -> Result<T, UpstreamError> {
        debug!(url = %url, "RxNav request");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(endpoint, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::from_reqwest(endpoint, &e))?;

        serde_json::from_slice(&body).map_err(|e| UpstreamError::MalformedJson {
            endpoint,
            message: e.to_string(),
        })
    }
}
