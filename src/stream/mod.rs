use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header::REFERER};
use tracing::{info, warn};
use url::Url;

pub mod browser;
pub mod error;
pub mod fast;
pub mod keys;
pub mod playlist;
pub mod types;

use crate::cache::Cache;
use crate::upstream::FmoviesClient;
use self::error::{NegotiateError, ResolveError};
use self::keys::KeyResolver;
use self::playlist::ManifestOutcome;
use self::types::{CandidateServer, MediaType, SourceManifest, StreamResult};

/// Lists candidate servers for a content item, in the order they should be
/// tried.
#[async_trait]
pub trait ServerDiscovery: Send + Sync {
    async fn discover(
        &self,
        content_id: &str,
        media_type: MediaType,
    ) -> Result<Vec<CandidateServer>, NegotiateError>;
}

#[async_trait]
impl ServerDiscovery for FmoviesClient {
    async fn discover(
        &self,
        content_id: &str,
        media_type: MediaType,
    ) -> Result<Vec<CandidateServer>, NegotiateError> {
        self.servers(content_id, media_type).await
    }
}

/// One way of turning a candidate server into a playable stream. Strategies
/// share a contract so the resolver can iterate them in cost order without
/// knowing what each one does.
#[async_trait]
pub trait StreamStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn negotiate(
        &self,
        server: &CandidateServer,
        content_id: &str,
        media_type: MediaType,
    ) -> Result<StreamResult, NegotiateError>;
}

/// Drives a full resolution: cache check, discovery, then every strategy
/// across every server until one attempt produces a result.
pub struct StreamResolver {
    discovery: Arc<dyn ServerDiscovery>,
    strategies: Vec<Arc<dyn StreamStrategy>>,
    cache: Arc<dyn Cache>,
    stream_ttl: Duration,
    deadline_secs: u64,
}

impl StreamResolver {
    pub fn new(
        discovery: Arc<dyn ServerDiscovery>,
        strategies: Vec<Arc<dyn StreamStrategy>>,
        cache: Arc<dyn Cache>,
        stream_ttl: Duration,
        deadline_secs: u64,
    ) -> Self {
        Self {
            discovery,
            strategies,
            cache,
            stream_ttl,
            deadline_secs,
        }
    }

    fn cache_key(media_type: MediaType, content_id: &str) -> String {
        format!("{media_type}-{content_id}")
    }

    pub async fn resolve(
        &self,
        content_id: &str,
        media_type: MediaType,
    ) -> Result<StreamResult, ResolveError> {
        let key = Self::cache_key(media_type, content_id);
        if let Some(cached) = self.cache.get(&key) {
            match serde_json::from_str::<StreamResult>(&cached) {
                Ok(result) => {
                    info!("cache HIT for stream key {key}");
                    return Ok(result);
                }
                Err(e) => {
                    warn!("cached stream entry for {key} was unreadable ({e}), resolving fresh");
                }
            }
        }
        info!("cache MISS for stream key {key}, starting resolution");

        let deadline = Duration::from_secs(self.deadline_secs);
        let resolved = tokio::time::timeout(
            deadline,
            self.resolve_uncached(content_id, media_type),
        )
        .await;

        match resolved {
            Ok(Ok(result)) => {
                match serde_json::to_string(&result) {
                    Ok(serialized) => self.cache.set(&key, serialized, self.stream_ttl),
                    Err(e) => warn!("stream result for {key} did not serialize: {e}"),
                }
                Ok(result)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ResolveError::DeadlineExceeded(self.deadline_secs)),
        }
    }

    /// Cost-ordered escalation: the cheap strategy is exhausted across ALL
    /// servers before the first expensive attempt. One attempt per
    /// strategy/server pair; upstream servers are fungible, so transient
    /// and permanent failures are treated alike.
    async fn resolve_uncached(
        &self,
        content_id: &str,
        media_type: MediaType,
    ) -> Result<StreamResult, ResolveError> {
        let servers = self
            .discovery
            .discover(content_id, media_type)
            .await
            .map_err(ResolveError::Discovery)?;
        if servers.is_empty() {
            return Err(ResolveError::NoServers);
        }

        for strategy in &self.strategies {
            for server in &servers {
                info!("attempting {} on server {}", strategy.name(), server.name);
                match strategy.negotiate(server, content_id, media_type).await {
                    Ok(result) => {
                        info!("{} succeeded on server {}", strategy.name(), server.name);
                        return Ok(result);
                    }
                    Err(e) => {
                        warn!("{} failed on server {}: {e}", strategy.name(), server.name);
                    }
                }
            }
        }

        Err(ResolveError::AllStrategiesExhausted)
    }
}

pub(crate) async fn fetch_manifest(
    client: &Client,
    url: &str,
    referer: &Url,
) -> Result<String, reqwest::Error> {
    client
        .get(url)
        .header(REFERER, referer.as_str())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}

/// Tail shared by both negotiation strategies: chase the master manifest,
/// resolve a key only for encrypted sources, build the result.
pub(crate) async fn assemble_result(
    client: &Client,
    keys: &KeyResolver,
    manifest: SourceManifest,
    embed_url: &Url,
    server_name: &str,
) -> Result<StreamResult, NegotiateError> {
    let master_url = manifest
        .sources
        .first()
        .map(|s| s.file.clone())
        .ok_or(NegotiateError::EmptySourceList)?;

    let outcome = ManifestOutcome::from_fetch(fetch_manifest(client, &master_url, embed_url).await);
    if outcome == ManifestOutcome::Unfetched {
        warn!("master manifest at {master_url} unreachable, handing out the unparsed URL");
    }
    let sources = outcome.into_renditions(&master_url);
    let decryption_key = keys.resolve(manifest.encrypted).await;

    Ok(StreamResult {
        sources,
        subtitles: manifest.subtitle_tracks(),
        decryption_key,
        source_server: server_name.to_string(),
        referer_url: embed_url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::cache::MemoryCache;
    use super::types::Rendition;

    fn sample_result(server: &str) -> StreamResult {
        StreamResult {
            sources: vec![Rendition {
                quality: "1080p".into(),
                url: "https://cdn.example/v/1080.m3u8".into(),
            }],
            subtitles: vec![],
            decryption_key: None,
            source_server: server.into(),
            referer_url: "https://videostr.net/embed-1/v3/e-1/abc".into(),
        }
    }

    struct ScriptedDiscovery {
        servers: Vec<CandidateServer>,
        calls: AtomicUsize,
    }

    impl ScriptedDiscovery {
        fn new(names: &[&str]) -> Self {
            Self {
                servers: names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| CandidateServer {
                        id: format!("{}", i + 1),
                        name: (*name).to_string(),
                    })
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ServerDiscovery for ScriptedDiscovery {
        async fn discover(
            &self,
            _content_id: &str,
            _media_type: MediaType,
        ) -> Result<Vec<CandidateServer>, NegotiateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.servers.clone())
        }
    }

    struct ScriptedStrategy {
        name: &'static str,
        succeed_on: Option<&'static str>,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl StreamStrategy for ScriptedStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn negotiate(
            &self,
            server: &CandidateServer,
            _content_id: &str,
            _media_type: MediaType,
        ) -> Result<StreamResult, NegotiateError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, server.name));
            if self.succeed_on == Some(server.name.as_str()) {
                Ok(sample_result(&server.name))
            } else {
                Err(NegotiateError::Protocol("scripted failure".into()))
            }
        }
    }

    fn resolver_with(
        discovery: Arc<ScriptedDiscovery>,
        strategies: Vec<Arc<dyn StreamStrategy>>,
        cache: Arc<MemoryCache>,
        deadline_secs: u64,
    ) -> StreamResolver {
        StreamResolver::new(
            discovery,
            strategies,
            cache,
            Duration::from_secs(3600),
            deadline_secs,
        )
    }

    #[tokio::test]
    async fn cheap_tier_is_exhausted_before_any_expensive_attempt() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let discovery = Arc::new(ScriptedDiscovery::new(&["UpCloud", "MegaCloud"]));
        let strategies: Vec<Arc<dyn StreamStrategy>> = vec![
            Arc::new(ScriptedStrategy {
                name: "fast",
                succeed_on: None,
                log: log.clone(),
            }),
            Arc::new(ScriptedStrategy {
                name: "browser",
                succeed_on: None,
                log: log.clone(),
            }),
        ];
        let resolver = resolver_with(discovery, strategies, Arc::new(MemoryCache::new()), 60);

        let err = resolver.resolve("19977", MediaType::Movie).await.unwrap_err();
        assert!(matches!(err, ResolveError::AllStrategiesExhausted));
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "fast:UpCloud",
                "fast:MegaCloud",
                "browser:UpCloud",
                "browser:MegaCloud"
            ]
        );
    }

    #[tokio::test]
    async fn fast_success_preempts_the_browser_tier() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let discovery = Arc::new(ScriptedDiscovery::new(&["UpCloud", "MegaCloud"]));
        let strategies: Vec<Arc<dyn StreamStrategy>> = vec![
            Arc::new(ScriptedStrategy {
                name: "fast",
                succeed_on: Some("MegaCloud"),
                log: log.clone(),
            }),
            Arc::new(ScriptedStrategy {
                name: "browser",
                succeed_on: Some("UpCloud"),
                log: log.clone(),
            }),
        ];
        let resolver = resolver_with(discovery, strategies, Arc::new(MemoryCache::new()), 60);

        let result = resolver.resolve("19977", MediaType::Movie).await.unwrap();
        assert_eq!(result.source_server, "MegaCloud");
        assert_eq!(*log.lock().unwrap(), vec!["fast:UpCloud", "fast:MegaCloud"]);
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache_without_discovery() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let discovery = Arc::new(ScriptedDiscovery::new(&["UpCloud"]));
        let strategies: Vec<Arc<dyn StreamStrategy>> = vec![Arc::new(ScriptedStrategy {
            name: "fast",
            succeed_on: Some("UpCloud"),
            log: log.clone(),
        })];
        let resolver = resolver_with(
            discovery.clone(),
            strategies,
            Arc::new(MemoryCache::new()),
            60,
        );

        let first = resolver.resolve("19977", MediaType::Movie).await.unwrap();
        let second = resolver.resolve("19977", MediaType::Movie).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(discovery.calls.load(Ordering::SeqCst), 1);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn zero_servers_is_terminal_and_writes_nothing() {
        let cache = Arc::new(MemoryCache::new());
        let discovery = Arc::new(ScriptedDiscovery::new(&[]));
        let strategies: Vec<Arc<dyn StreamStrategy>> = vec![Arc::new(ScriptedStrategy {
            name: "fast",
            succeed_on: Some("UpCloud"),
            log: Arc::new(Mutex::new(Vec::new())),
        })];
        let resolver = resolver_with(discovery, strategies, cache.clone(), 60);

        let err = resolver.resolve("19977", MediaType::Movie).await.unwrap_err();
        assert!(matches!(err, ResolveError::NoServers));
        assert!(cache.get("movie-19977").is_none());
    }

    #[tokio::test]
    async fn deadline_bounds_the_whole_resolution() {
        struct StallingStrategy;

        #[async_trait]
        impl StreamStrategy for StallingStrategy {
            fn name(&self) -> &'static str {
                "stalling"
            }

            async fn negotiate(
                &self,
                server: &CandidateServer,
                _content_id: &str,
                _media_type: MediaType,
            ) -> Result<StreamResult, NegotiateError> {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(sample_result(&server.name))
            }
        }

        let discovery = Arc::new(ScriptedDiscovery::new(&["UpCloud"]));
        let resolver = resolver_with(
            discovery,
            vec![Arc::new(StallingStrategy)],
            Arc::new(MemoryCache::new()),
            0,
        );

        let err = resolver.resolve("19977", MediaType::Movie).await.unwrap_err();
        assert!(matches!(err, ResolveError::DeadlineExceeded(0)));
    }

    #[tokio::test]
    async fn corrupt_cache_entry_triggers_a_fresh_resolution() {
        let cache = Arc::new(MemoryCache::new());
        cache.set("movie-19977", "not json".into(), Duration::from_secs(3600));

        let log = Arc::new(Mutex::new(Vec::new()));
        let discovery = Arc::new(ScriptedDiscovery::new(&["UpCloud"]));
        let strategies: Vec<Arc<dyn StreamStrategy>> = vec![Arc::new(ScriptedStrategy {
            name: "fast",
            succeed_on: Some("UpCloud"),
            log,
        })];
        let resolver = resolver_with(discovery.clone(), strategies, cache, 60);

        let result = resolver.resolve("19977", MediaType::Movie).await.unwrap();
        assert_eq!(result.source_server, "UpCloud");
        assert_eq!(discovery.calls.load(Ordering::SeqCst), 1);
    }
}
