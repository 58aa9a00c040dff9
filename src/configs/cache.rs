use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    /// Stream results age out fast; upstream signed URLs expire.
    #[serde(default = "default_stream_ttl_secs")]
    pub stream_ttl_secs: u64,
    /// Catalog listings and metadata are stable for much longer.
    #[serde(default = "default_catalog_ttl_secs")]
    pub catalog_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stream_ttl_secs: default_stream_ttl_secs(),
            catalog_ttl_secs: default_catalog_ttl_secs(),
        }
    }
}

fn default_stream_ttl_secs() -> u64 {
    14_400 // 4 hours
}

fn default_catalog_ttl_secs() -> u64 {
    86_400 // 24 hours
}
