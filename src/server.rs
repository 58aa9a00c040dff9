use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::{
    cache::{Cache, MemoryCache},
    common::{http::HttpClient, types::AnyResult},
    configs::Config,
    stream::{
        StreamResolver, StreamStrategy, browser::BrowserEmulationStrategy,
        fast::FastScrapeStrategy, keys::KeyResolver,
    },
    upstream::{FmoviesClient, TmdbClient, VideostrClient},
};

/// Shared application state: one HTTP client, one cache, the upstream
/// clients and the resolver wired over them.
pub struct AppState {
    pub config: Config,
    pub cache: Arc<dyn Cache>,
    pub fmovies: Arc<FmoviesClient>,
    pub tmdb: Arc<TmdbClient>,
    pub resolver: Arc<StreamResolver>,
}

impl AppState {
    pub fn new(config: Config) -> AnyResult<Self> {
        let client = HttpClient::new()?;
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());

        let fmovies = Arc::new(FmoviesClient::new(client.clone(), config.fmovies.clone()));
        let videostr = Arc::new(VideostrClient::new(client.clone(), config.videostr.clone())?);
        let keys = Arc::new(KeyResolver::new(client.clone(), config.keys.clone()));
        let tmdb = Arc::new(TmdbClient::new(client.clone(), config.tmdb.clone()));

        // Cost order matters here: the resolver exhausts earlier entries
        // across all servers before moving down the list.
        let mut strategies: Vec<Arc<dyn StreamStrategy>> = vec![Arc::new(FastScrapeStrategy::new(
            client.clone(),
            fmovies.clone(),
            videostr.clone(),
            keys.clone(),
        ))];
        if config.browser.enabled {
            strategies.push(Arc::new(BrowserEmulationStrategy::new(
                client,
                fmovies.clone(),
                videostr,
                keys,
                config.browser.clone(),
            )));
        } else {
            info!("browser-emulation strategy disabled by config");
        }

        let resolver = Arc::new(StreamResolver::new(
            fmovies.clone(),
            strategies,
            cache.clone(),
            Duration::from_secs(config.cache.stream_ttl_secs),
            config.resolver.deadline_secs,
        ));

        Ok(Self {
            config,
            cache,
            fmovies,
            tmdb,
            resolver,
        })
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.config.cache.catalog_ttl_secs)
    }
}
