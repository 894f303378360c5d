/// TMDB API provider
///
/// Uses TMDB API v3 with a read access token sent as a bearer token:
/// https://developer.themoviedb.org/docs
use std::time::Duration;

use reqwest::{Client as HttpClient, Url};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{MediaType, RawAvailabilityPayload, WatchProvidersResponse},
    services::providers::MetadataProvider,
};

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    /// Path prefix every request must stay under, e.g. `/3/`
    base_path: String,
}

impl TmdbClient {
    pub fn new(api_key: Option<String>, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let api_url = api_url.trim_end_matches('/').to_string();
        let base = Url::parse(&api_url).map_err(|e| {
            AppError::Configuration(format!("Invalid TMDB API URL '{}': {}", api_url, e))
        })?;
        let base_path = format!("{}/", base.path().trim_end_matches('/'));

        Ok(Self {
            http_client,
            api_key,
            api_url,
            base_path,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            config.tmdb_api_key().map(str::to_string),
            config.tmdb_api_url.clone(),
            config.upstream_timeout(),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> AppResult<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            AppError::Configuration(
                "TMDB API key is not configured. Set TMDB_API_KEY in the environment or .env file."
                    .to_string(),
            )
        })
    }

    fn url(&self, path: &str) -> AppResult<Url> {
        let url = Url::parse(&format!("{}/{}", self.api_url, path.trim_start_matches('/')))
            .map_err(|e| AppError::InvalidInput(format!("Invalid TMDB API path: {}", e)))?;

        // Dot segments, encoded or not, are already resolved by the parser
        if !url.path().starts_with(&self.base_path) {
            return Err(AppError::InvalidInput("Invalid TMDB API path.".to_string()));
        }

        Ok(url)
    }

    /// Issues an authenticated GET and decodes the JSON body
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> AppResult<T> {
        // Checked before any I/O so a missing key never looks like an outage
        let api_key = self.api_key()?;
        let url = self.url(path)?;

        tracing::debug!(path = %path, "TMDB request");

        let response = self
            .http_client
            .get(url)
            .bearer_auth(api_key)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                path = %path,
                status = %status,
                body = %body,
                "TMDB request failed"
            );
            return Err(AppError::UpstreamUnavailable(format!(
                "TMDB returned status {}",
                status
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbClient {
    async fn fetch_watch_providers(
        &self,
        media_type: MediaType,
        title_id: &str,
    ) -> AppResult<RawAvailabilityPayload> {
        let path = format!("{}/{}/watch/providers", media_type, title_id);
        let response: WatchProvidersResponse = self.get(&path, &[]).await?;

        let results = response.results.ok_or_else(|| {
            AppError::UpstreamUnavailable("TMDB response is missing results".to_string())
        })?;

        tracing::info!(
            title_id = %title_id,
            media_type = %media_type,
            regions = results.len(),
            provider = "tmdb",
            "Watch providers fetched"
        );

        Ok(results)
    }

    async fn fetch_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> AppResult<serde_json::Value> {
        self.get(path, query).await
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
