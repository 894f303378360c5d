pub mod clock;
pub mod normalizer;
pub mod providers;
pub mod region;
pub mod tmdb_proxy;
pub mod watch_providers;

pub use clock::{Clock, SystemClock};
pub use providers::{MetadataProvider, TmdbClient};
pub use tmdb_proxy::TmdbProxyService;
pub use watch_providers::{WatchProviderRequest, WatchProviderService};
