use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::error::NegotiateError;
use super::keys::KeyResolver;
use super::types::{CandidateServer, MediaType, StreamResult};
use super::{StreamStrategy, assemble_result};
use crate::upstream::{FmoviesClient, VideostrClient};

/// Direct protocol replay: scrape the session token out of the embed page
/// and call the source-resolution endpoint ourselves. Cheap, and first in
/// line for every server.
pub struct FastScrapeStrategy {
    client: Client,
    fmovies: Arc<FmoviesClient>,
    videostr: Arc<VideostrClient>,
    keys: Arc<KeyResolver>,
}

impl FastScrapeStrategy {
    pub fn new(
        client: Client,
        fmovies: Arc<FmoviesClient>,
        videostr: Arc<VideostrClient>,
        keys: Arc<KeyResolver>,
    ) -> Self {
        Self {
            client,
            fmovies,
            videostr,
            keys,
        }
    }
}

#[async_trait]
impl StreamStrategy for FastScrapeStrategy {
    fn name(&self) -> &'static str {
        "fast-scrape"
    }

    async fn negotiate(
        &self,
        server: &CandidateServer,
        content_id: &str,
        _media_type: MediaType,
    ) -> Result<StreamResult, NegotiateError> {
        let link = self.fmovies.source_link(&server.id).await?;
        let embed_url = Url::parse(&link)
            .map_err(|e| NegotiateError::Protocol(format!("embed link did not parse: {e}")))?;
        if !self.videostr.host_allowed(&embed_url) {
            return Err(NegotiateError::Protocol(format!(
                "embed host {:?} is not the expected provider",
                embed_url.host_str()
            )));
        }
        debug!("server {} ({content_id}) embeds at {embed_url}", server.name);

        let referer = format!("{}/", self.fmovies.base_url());
        let html = self.videostr.fetch_embed_page(&embed_url, &referer).await?;
        let session = self.videostr.extract_session(&embed_url, &html)?;

        let manifest = self.videostr.get_sources(&session).await?;
        assemble_result(&self.client, &self.keys, manifest, &embed_url, &server.name).await
    }
}
