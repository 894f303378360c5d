use axum::http::HeaderName;
use std::sync::Arc;

use crate::services::{TmdbProxyService, WatchProviderService};

/// Header Vercel sets to the caller's geo-IP country
pub const DEFAULT_REGION_HEADER: &str = "x-vercel-ip-country";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub watch_providers: Arc<WatchProviderService>,
    pub tmdb_proxy: Arc<TmdbProxyService>,
    /// Request header consulted for the caller's region
    pub region_header: HeaderName,
}

impl AppState {
    pub fn new(watch_providers: Arc<WatchProviderService>, tmdb_proxy: Arc<TmdbProxyService>) -> Self {
        Self {
            watch_providers,
            tmdb_proxy,
            region_header: HeaderName::from_static(DEFAULT_REGION_HEADER),
        }
    }

    pub fn with_region_header(mut self, region_header: HeaderName) -> Self {
        self.region_header = region_header;
        self
    }
}
