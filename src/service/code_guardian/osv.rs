use async_trait::async_trait;
use serde::Serialize;

use crate::dispatch::JsonObject;
use crate::service::{ApiClient, ClientConfig, ClientError, http_client, json_object};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Client for the OSV.dev vulnerability database.
///
/// `fetch` expects `name` and `ecosystem` parameters and an optional
/// `version`. The response carries a `vulns` array when advisories exist.
#[derive(Debug, Clone)]
pub struct OsvClient {
    config: ClientConfig,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct OsvQuery<'a> {
    package: OsvPackage<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct OsvPackage<'a> {
    name: &'a str,
    ecosystem: &'a str,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<'a> OsvQuery<'a> {
    /// Build a query from `name`, `ecosystem` and optional `version` parameters.
    /// Empty values count as absent.
    fn from_params(params: &[(&'a str, &'a str)]) -> Result<Self, ClientError> {
        let param = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v)
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            package: OsvPackage {
                name: param("name").ok_or(ClientError::MissingParameter("name"))?,
                ecosystem: param("ecosystem").ok_or(ClientError::MissingParameter("ecosystem"))?,
            },
            version: param("version"),
        })
    }
}

impl OsvClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: http_client(),
        }
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.config.base_url.as_str().trim_end_matches('/'))
    }

    async fn try_fetch(&self, params: &[(&str, &str)]) -> Result<JsonObject, ClientError> {
        let query = OsvQuery::from_params(params)?;
        let response = self
            .http
            .post(self.query_url())
            .json(&query)
            .timeout(self.config.timeout)
            .send()
            .await?;

        json_object(response).await
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl ApiClient for OsvClient {
    fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn fetch(&self, params: &[(&str, &str)]) -> Option<JsonObject> {
        match self.try_fetch(params).await {
            Ok(data) => Some(data),
            Err(ClientError::MissingParameter(key)) => {
                tracing::error!(?params, "OSV query skipped, missing parameter: {}", key);
                None
            }
            Err(ClientError::Status { status, body }) => {
                tracing::error!(
                    "OSV API returned HTTP {} for params={:?}: {}",
                    status,
                    params,
                    body
                );
                None
            }
            Err(e) => {
                tracing::error!(
                    code = e.code(),
                    "Error querying OSV for params={:?}: {}",
                    params,
                    e
                );
                None
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
