use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeLaunchConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EventResponseReceived, GetResponseBodyParams,
};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use super::error::NegotiateError;
use super::keys::KeyResolver;
use super::types::{CandidateServer, MediaType, SourceManifest, StreamResult};
use super::{StreamStrategy, assemble_result};
use crate::common::http::HttpClient;
use crate::configs::BrowserConfig;
use crate::upstream::{FmoviesClient, VideostrClient};

/// Full browser emulation: when the session token is generated client-side,
/// replaying the protocol is useless. Load the embed page under real script
/// execution and watch for the source-resolution response on the wire
/// instead.
///
/// An order of magnitude more expensive than the fast path; the resolver
/// only reaches for it once every server has failed the cheap way.
pub struct BrowserEmulationStrategy {
    client: reqwest::Client,
    fmovies: Arc<FmoviesClient>,
    videostr: Arc<VideostrClient>,
    keys: Arc<KeyResolver>,
    config: BrowserConfig,
}

impl BrowserEmulationStrategy {
    pub fn new(
        client: reqwest::Client,
        fmovies: Arc<FmoviesClient>,
        videostr: Arc<VideostrClient>,
        keys: Arc<KeyResolver>,
        config: BrowserConfig,
    ) -> Self {
        Self {
            client,
            fmovies,
            videostr,
            keys,
            config,
        }
    }

    async fn observe_sources(
        &self,
        session: &BrowserSession,
        embed_url: &Url,
    ) -> Result<SourceManifest, NegotiateError> {
        let page = session
            .browser
            .new_page("about:blank")
            .await
            .map_err(browser_err)?;
        page.set_user_agent(HttpClient::default_user_agent().as_str())
            .await
            .map_err(browser_err)?;

        // Register before navigating; the call can fire during page load.
        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(browser_err)?;

        page.goto(embed_url.as_str()).await.map_err(browser_err)?;
        debug!("browser navigated to {embed_url}");

        // The player usually boots on its own; a click covers embeds that
        // wait for a gesture. Cross-origin frames make this best-effort.
        if let Err(e) = page
            .evaluate(
                "(() => { const el = document.querySelector('#megacloud-player, .jw-video, iframe, video'); if (el) el.click(); })()",
            )
            .await
        {
            warn!("player click was swallowed: {e}");
        }

        let sources_path = self.videostr.sources_path();
        while let Some(event) = responses.next().await {
            if !event.response.url.contains(&sources_path) {
                continue;
            }
            debug!("observed source-resolution response: {}", event.response.url);

            let body = match page
                .execute(GetResponseBodyParams::new(event.request_id.clone()))
                .await
            {
                Ok(resp) => {
                    if resp.result.base64_encoded {
                        match BASE64.decode(resp.result.body.as_bytes()) {
                            Ok(raw) => String::from_utf8_lossy(&raw).into_owned(),
                            Err(_) => continue,
                        }
                    } else {
                        resp.result.body.clone()
                    }
                }
                Err(e) => {
                    debug!("response body was not retrievable yet: {e}");
                    continue;
                }
            };

            match serde_json::from_str::<SourceManifest>(&body) {
                Ok(manifest) if !manifest.sources.is_empty() => return Ok(manifest),
                Ok(_) => debug!("observed manifest had no sources, waiting for another"),
                Err(e) => debug!("observed body did not parse as a manifest: {e}"),
            }
        }

        Err(NegotiateError::Browser(
            "event stream ended before a source manifest appeared".into(),
        ))
    }
}

#[async_trait]
impl StreamStrategy for BrowserEmulationStrategy {
    fn name(&self) -> &'static str {
        "browser-emulation"
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
        info!(
            "driving browser for server {} ({content_id}) at {embed_url}",
            server.name
        );

        let session = BrowserSession::launch(&self.config).await?;

        // One shutdown path no matter how the drive ends: success, failure
        // or timeout all fall through to the same teardown.
        let driven = tokio::time::timeout(
            Duration::from_secs(self.config.timeout_secs),
            self.observe_sources(&session, &embed_url),
        )
        .await;
        session.shutdown().await;

        let manifest = match driven {
            Ok(result) => result?,
            Err(_) => return Err(NegotiateError::Timeout(self.config.timeout_secs)),
        };

        assemble_result(&self.client, &self.keys, manifest, &embed_url, &server.name).await
    }
}

fn browser_err(e: impl std::fmt::Display) -> NegotiateError {
    NegotiateError::Browser(e.to_string())
}

/// A launched Chromium plus the task pumping its CDP messages. Owning both
/// in one value keeps release in one place.
struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    async fn launch(config: &BrowserConfig) -> Result<Self, NegotiateError> {
        let mut builder = ChromeLaunchConfig::builder();
        if config.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(executable) = &config.executable {
            builder = builder.chrome_executable(executable);
        }
        let launch_config = builder.build().map_err(NegotiateError::Browser)?;

        let (browser, mut handler) = Browser::launch(launch_config)
            .await
            .map_err(browser_err)?;
        let handler_task = tokio::spawn(async move {
            while let Some(message) = handler.next().await {
                if message.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("browser did not close cleanly: {e}");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}

impl Drop for BrowserSession {
    /// Backstop for cancellation: `shutdown` is the normal path, but if
    /// this session is dropped mid-flight the message pump must not be
    /// left spinning.
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
