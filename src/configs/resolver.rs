use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResolverConfig {
    /// Overall wall-clock bound for one resolution, covering discovery and
    /// every strategy/server attempt.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline_secs(),
        }
    }
}

fn default_deadline_secs() -> u64 {
    120
}
