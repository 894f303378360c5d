/// Upstream metadata provider abstraction
///
/// The resolution service and the pass-through proxy only talk to TMDB through
/// this trait, so tests can substitute a mock and the HTTP client stays an
/// injected dependency.
use crate::{
    error::AppResult,
    models::{MediaType, RawAvailabilityPayload},
};

pub mod tmdb;

pub use tmdb::TmdbClient;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch per-country watch-provider availability for a title
    ///
    /// Fails with `Configuration` when credentials are missing and with
    /// `UpstreamUnavailable` for any transport, status or payload problem.
    async fn fetch_watch_providers(
        &self,
        media_type: MediaType,
        title_id: &str,
    ) -> AppResult<RawAvailabilityPayload>;

    /// Fetch an arbitrary resource path and return the raw JSON body
    async fn fetch_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> AppResult<serde_json::Value>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
