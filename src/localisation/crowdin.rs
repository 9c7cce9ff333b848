use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::{Config, DEFAULT_CROWDIN_BASE_URL},
    errors::InterfaceError,
    localisation::models::TranslationEntry,
};

/// File holding the interface strings in the translation project.
pub const TRANSLATIONS_FILE_ID: u64 = 8;
/// Page size requested from the translation API. Only the first page is fetched.
pub const TRANSLATIONS_PAGE_SIZE: u32 = 200;

/// Source of translated strings for a language.
#[async_trait]
pub trait TranslationsApi: Send + Sync {
    async fn list_language_translations(
        &self,
        language_code: &str,
    ) -> Result<Vec<TranslationEntry>, InterfaceError>;
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    data: Vec<DataWrapper>,
}

#[derive(Debug, Deserialize)]
struct DataWrapper {
    data: TranslationEntry,
}

/// Client for the Crowdin string translations endpoint.
pub struct CrowdinClient {
    client: Client,
    base_url: String,
    project_id: u64,
    api_token: String,
}

impl CrowdinClient {
    pub fn from_config(config: &Config) -> Result<Self, InterfaceError> {
        let (project_id, api_token) = config.crowdin_credentials()?;
        CrowdinClientBuilder::new()
            .project_id(project_id)
            .api_token(api_token)
            .base_url(config.crowdin_base_url.clone())
            .build()
    }
}

#[async_trait]
impl TranslationsApi for CrowdinClient {
    async fn list_language_translations(
        &self,
        language_code: &str,
    ) -> Result<Vec<TranslationEntry>, InterfaceError> {
        let url = format!(
            "{}/projects/{}/languages/{}/translations",
            self.base_url.trim_end_matches('/'),
            self.project_id,
            language_code
        );
        debug!(%url, "Fetching translations");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("fileId", TRANSLATIONS_FILE_ID.to_string()),
                ("limit", TRANSLATIONS_PAGE_SIZE.to_string()),
            ])
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InterfaceError::RecoverableError(format!(
                "Translation API returned {}: {}",
                status, body
            )));
        }

        let body: ListResponse = response.json().await?;
        Ok(body
            .data
            .into_iter()
            .map(|wrapper| wrapper.data)
            .collect())
    }
}

/// Builder pattern for constructing a `CrowdinClient`.
///
/// The project id and API token are required, the base url defaults to the public API.
pub struct CrowdinClientBuilder {
    project_id: Option<u64>,
    api_token: Option<String>,
    base_url: Option<String>,
    timeout: Duration,
}

impl Default for CrowdinClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CrowdinClientBuilder {
    pub fn new() -> Self {
        CrowdinClientBuilder {
            project_id: None,
            api_token: None,
            base_url: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn project_id(mut self, project_id: u64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn api_token(mut self, api_token: impl Into<String>) -> Self {
        self.api_token = Some(api_token.into());
        self
    }

    /// Sets the API base url manually.
    /// If it's not set, `https://api.crowdin.com/api/v2` is used.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<CrowdinClient, InterfaceError> {
        let (Some(project_id), Some(api_token)) = (self.project_id, self.api_token) else {
            return Err(InterfaceError::FatalError(
                "Please set the project id and API token before building the client".to_string(),
            ));
        };
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| InterfaceError::FatalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(CrowdinClient {
            client,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_CROWDIN_BASE_URL.to_string()),
            project_id,
            api_token,
        })
    }
}
