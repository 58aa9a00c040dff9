use serde::{Deserialize, Serialize};

/// Hosting-site ("fmovies" family) endpoints.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FmoviesConfig {
    #[serde(default = "default_fmovies_base_url")]
    pub base_url: String,
}

impl Default for FmoviesConfig {
    fn default() -> Self {
        Self {
            base_url: default_fmovies_base_url(),
        }
    }
}

fn default_fmovies_base_url() -> String {
    "https://fmovies.ro".to_string()
}

/// Embed-provider ("videostr" family) endpoints and extraction rules.
///
/// The embed page layout shifts often; the patterns that pull the session
/// token and embed ID out of it are data, so a layout change is a config
/// edit rather than a release.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VideostrConfig {
    #[serde(default = "default_videostr_base_url")]
    pub base_url: String,
    /// Path of the source-resolution endpoint, relative to `base_url`.
    #[serde(default = "default_sources_path")]
    pub sources_path: String,
    /// Regexes probed in order against the embed page HTML; the first
    /// capture group of the first match is the session token.
    #[serde(default = "default_token_patterns")]
    pub token_patterns: Vec<String>,
    /// Regex applied to the embed URL; capture group 1 is the embed ID.
    #[serde(default = "default_embed_id_pattern")]
    pub embed_id_pattern: String,
}

impl Default for VideostrConfig {
    fn default() -> Self {
        Self {
            base_url: default_videostr_base_url(),
            sources_path: default_sources_path(),
            token_patterns: default_token_patterns(),
            embed_id_pattern: default_embed_id_pattern(),
        }
    }
}

fn default_videostr_base_url() -> String {
    "https://videostr.net".to_string()
}

fn default_sources_path() -> String {
    "/embed-1/v3/e-1/getSources".to_string()
}

fn default_token_patterns() -> Vec<String> {
    vec![
        // Primary location: nonce attribute on the bootstrap script tag.
        r#"nonce="([A-Za-z0-9_-]{24,})""#.to_string(),
        // Secondary location: data-dpi attribute on the player mount.
        r#"data-dpi="([A-Za-z0-9_-]+)""#.to_string(),
    ]
}

fn default_embed_id_pattern() -> String {
    r"/e-1/([A-Za-z0-9]+)".to_string()
}
