use serde::{Deserialize, Serialize};

/// Headless-browser fallback settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BrowserConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Bound on one browser attempt, navigation included.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Explicit Chromium binary; autodetected when unset.
    pub executable: Option<String>,
    #[serde(default = "default_no_sandbox")]
    pub no_sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            timeout_secs: default_timeout_secs(),
            executable: None,
            no_sandbox: default_no_sandbox(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    45
}

fn default_no_sandbox() -> bool {
    true
}
