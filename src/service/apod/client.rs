use async_trait::async_trait;

use crate::dispatch::JsonObject;
use crate::service::{ApiClient, ClientConfig, ClientError, http_client, json_object};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// HTTP client for the NASA Astronomy Picture of the Day API.
///
/// Pass `("date", "YYYY-MM-DD")` to request an archive entry; with no
/// parameters the API returns today's entry.
#[derive(Debug, Clone)]
pub struct ApodClient {
    config: ClientConfig,
    http: reqwest::Client,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ApodClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: http_client(),
        }
    }

    async fn try_fetch(&self, params: &[(&str, &str)]) -> Result<JsonObject, ClientError> {
        let mut query: Vec<(&str, &str)> = vec![("api_key", self.config.api_key.as_str())];
        query.extend_from_slice(params);

        let response = self
            .http
            .get(self.config.base_url.clone())
            .query(&query)
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
impl ApiClient for ApodClient {
    fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn fetch(&self, params: &[(&str, &str)]) -> Option<JsonObject> {
        tracing::debug!(?params, "Fetching APOD entry");

        match self.try_fetch(params).await {
            Ok(data) => Some(data),
            Err(ClientError::Status { status, body }) => {
                tracing::error!(
                    "NASA API returned HTTP {} for params={:?}: {}",
                    status,
                    params,
                    body
                );
                None
            }
            Err(e) => {
                tracing::error!(
                    code = e.code(),
                    "Error while fetching APOD for params={:?}: {}",
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
