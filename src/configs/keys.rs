use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Decryption-key registry settings.
///
/// Keys rotate upstream; the remote registry is the source of truth and the
/// static table is the last resort when it is unreachable.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KeysConfig {
    #[serde(default = "default_registry_url")]
    pub registry_url: String,
    /// Provider namespaces probed in order, both against the remote
    /// registry and the static table.
    #[serde(default = "default_provider_order")]
    pub provider_order: Vec<String>,
    /// Fallback keys by provider namespace, used when the registry fetch
    /// fails or lacks a usable entry.
    #[serde(default)]
    pub static_keys: BTreeMap<String, String>,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            registry_url: default_registry_url(),
            provider_order: default_provider_order(),
            static_keys: BTreeMap::new(),
        }
    }
}

fn default_registry_url() -> String {
    "https://raw.githubusercontent.com/yogesh-hacker/MegacloudKeys/refs/heads/main/keys.json"
        .to_string()
}

fn default_provider_order() -> Vec<String> {
    vec!["mega".to_string(), "vidstr".to_string()]
}
