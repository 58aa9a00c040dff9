use serde::{Deserialize, Serialize};

use crate::common::types::AnyResult;
use crate::configs::*;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fmovies: FmoviesConfig,
    #[serde(default)]
    pub videostr: VideostrConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads `config.toml` from the working directory, falling back to
    /// built-in defaults when the file is absent. Secrets may come from the
    /// environment instead of the file.
    pub fn load() -> AnyResult<Self> {
        let mut config = if std::path::Path::new("config.toml").exists() {
            let config_str = std::fs::read_to_string("config.toml")?;
            toml::from_str(&config_str)?
        } else {
            tracing::warn!("config.toml not found, using built-in defaults");
            Config::default()
        };

        if config.tmdb.api_key.is_none() {
            config.tmdb.api_key = std::env::var("TMDB_API_KEY").ok();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = Config::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.cache.stream_ttl_secs, 14_400);
        assert_eq!(config.cache.catalog_ttl_secs, 86_400);
        assert_eq!(config.keys.provider_order, vec!["mega", "vidstr"]);
        assert_eq!(config.videostr.token_patterns.len(), 2);
        assert_eq!(config.resolver.deadline_secs, 120);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8080

            [keys]
            static_keys = { mega = "abc123" }
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.keys.static_keys.get("mega").unwrap(), "abc123");
        assert_eq!(config.fmovies.base_url, "https://fmovies.ro");
    }
}
