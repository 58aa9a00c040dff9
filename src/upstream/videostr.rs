use regex::Regex;
use reqwest::{Client, header::REFERER};
use tracing::{debug, trace};
use url::Url;

use crate::configs::VideostrConfig;
use crate::stream::error::NegotiateError;
use crate::stream::types::{EmbedSession, SourceManifest};

/// Embed-provider client: pulls the session token and embed ID out of the
/// player page and calls the source-resolution endpoint.
///
/// Extraction rules come from config (`VideostrConfig`); the page layout
/// rotates and patching a pattern string beats patching code.
pub struct VideostrClient {
    client: Client,
    config: VideostrConfig,
    token_patterns: Vec<Regex>,
    embed_id_re: Regex,
}

impl VideostrClient {
    pub fn new(client: Client, config: VideostrConfig) -> Result<Self, regex::Error> {
        let token_patterns = config
            .token_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        let embed_id_re = Regex::new(&config.embed_id_pattern)?;

        Ok(Self {
            client,
            config,
            token_patterns,
            embed_id_re,
        })
    }

    /// Allow-list check: server entries sometimes point at hosts this
    /// pipeline does not speak.
    pub fn host_allowed(&self, embed_url: &Url) -> bool {
        let expected = Url::parse(&self.config.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));
        match (expected, embed_url.host_str()) {
            (Some(expected), Some(host)) => host == expected,
            _ => false,
        }
    }

    /// URL of the source-resolution endpoint.
    pub fn sources_endpoint(&self) -> String {
        format!("{}{}", self.config.base_url, self.config.sources_path)
    }

    /// Path component alone; the browser fallback matches observed network
    /// responses against it.
    pub fn sources_path(&self) -> String {
        self.config.sources_path.clone()
    }

    pub async fn fetch_embed_page(
        &self,
        embed_url: &Url,
        referer: &str,
    ) -> Result<String, NegotiateError> {
        Ok(self
            .client
            .get(embed_url.clone())
            .header(REFERER, referer)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    }

    /// Derives the per-attempt session from the embed page. The token sits
    /// in one of the configured attribute locations; the embed ID is part
    /// of the URL path.
    pub fn extract_session(
        &self,
        embed_url: &Url,
        html: &str,
    ) -> Result<EmbedSession, NegotiateError> {
        let session_token = self
            .token_patterns
            .iter()
            .find_map(|re| re.captures(html))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                NegotiateError::Protocol("embed page had no session token attribute".into())
            })?;

        let embed_id = self
            .embed_id_re
            .captures(embed_url.as_str())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                NegotiateError::Protocol("embed URL did not match the embed-id pattern".into())
            })?;

        trace!("extracted embed session: id={embed_id}");
        Ok(EmbedSession {
            embed_url: embed_url.clone(),
            session_token,
            embed_id,
        })
    }

    pub async fn get_sources(
        &self,
        session: &EmbedSession,
    ) -> Result<SourceManifest, NegotiateError> {
        let url = format!(
            "{}?id={}&_k={}",
            self.sources_endpoint(),
            urlencoding::encode(&session.embed_id),
            urlencoding::encode(&session.session_token),
        );
        debug!("requesting source manifest: {url}");

        let manifest: SourceManifest = self
            .client
            .get(&url)
            .header(REFERER, session.embed_url.as_str())
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if manifest.sources.is_empty() {
            return Err(NegotiateError::EmptySourceList);
        }
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::http::HttpClient;

    fn client() -> VideostrClient {
        VideostrClient::new(HttpClient::new().unwrap(), VideostrConfig::default()).unwrap()
    }

    const EMBED_URL: &str = "https://videostr.net/embed-1/v3/e-1/kkCoxgDfMLoK?k=1&autoPlay=1";

    #[test]
    fn token_found_at_primary_location() {
        let html = r#"<script src="/js/player.js" nonce="Abc123DefGhi456JklMno789Pqr"></script>"#;
        let session = client()
            .extract_session(&Url::parse(EMBED_URL).unwrap(), html)
            .unwrap();
        assert_eq!(session.session_token, "Abc123DefGhi456JklMno789Pqr");
        assert_eq!(session.embed_id, "kkCoxgDfMLoK");
    }

    #[test]
    fn token_falls_back_to_secondary_location() {
        let html = r#"<div id="megacloud-player" data-dpi="fallback-token-77"></div>"#;
        let session = client()
            .extract_session(&Url::parse(EMBED_URL).unwrap(), html)
            .unwrap();
        assert_eq!(session.session_token, "fallback-token-77");
    }

    #[test]
    fn missing_token_is_a_protocol_failure() {
        let err = client()
            .extract_session(&Url::parse(EMBED_URL).unwrap(), "<html></html>")
            .unwrap_err();
        assert!(matches!(err, NegotiateError::Protocol(_)));
    }

    #[test]
    fn unmatched_embed_url_is_a_protocol_failure() {
        let html = r#"<div data-dpi="tok"></div>"#;
        let err = client()
            .extract_session(&Url::parse("https://videostr.net/other/path").unwrap(), html)
            .unwrap_err();
        assert!(matches!(err, NegotiateError::Protocol(_)));
    }

    #[test]
    fn host_allow_list_rejects_foreign_embeds() {
        let c = client();
        assert!(c.host_allowed(&Url::parse(EMBED_URL).unwrap()));
        assert!(!c.host_allowed(&Url::parse("https://evil.example/embed-1/v3/e-1/x").unwrap()));
    }
}
