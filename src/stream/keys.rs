use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::configs::KeysConfig;

/// Resolves the current decryption key for encrypted sources.
///
/// The remote registry rotates; failures of any kind degrade to the static
/// table. Resolution never fails a pipeline run: a missing key just ships
/// as `null` and the caller's player deals with it.
pub struct KeyResolver {
    client: Client,
    config: KeysConfig,
}

impl KeyResolver {
    pub fn new(client: Client, config: KeysConfig) -> Self {
        Self { client, config }
    }

    /// `required == false` answers immediately without touching the network;
    /// unencrypted streams never pay for key resolution.
    pub async fn resolve(&self, required: bool) -> Option<String> {
        if !required {
            return None;
        }

        match self.fetch_registry().await {
            Ok(registry) => {
                if let Some((provider, key)) = pick_key(&registry, &self.config.provider_order) {
                    debug!("decryption key served by remote registry (provider: {provider})");
                    return Some(key);
                }
                warn!(
                    "key registry has no entry for providers {:?}, falling back to static table",
                    self.config.provider_order
                );
            }
            Err(e) => {
                warn!("key registry fetch failed ({e}), falling back to static table");
            }
        }

        let fallback = self
            .config
            .provider_order
            .iter()
            .find_map(|provider| self.config.static_keys.get(provider).cloned());

        match &fallback {
            Some(_) => debug!("decryption key served by static table"),
            None => warn!("no decryption key available from any source"),
        }
        fallback
    }

    async fn fetch_registry(&self) -> Result<Value, reqwest::Error> {
        self.client
            .get(&self.config.registry_url)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
    }
}

/// First provider in preference order with a non-empty string entry.
fn pick_key(registry: &Value, provider_order: &[String]) -> Option<(String, String)> {
    provider_order.iter().find_map(|provider| {
        registry
            .get(provider)
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .map(|key| (provider.clone(), key.to_string()))
    })
}
