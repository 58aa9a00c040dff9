use regex::Regex;
use reqwest::{
    Client,
    header::{REFERER, USER_AGENT},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::common::http::HttpClient;
use crate::configs::FmoviesConfig;
use crate::stream::error::NegotiateError;
use crate::stream::types::{CandidateServer, MediaType};

/// One search hit on the hosting site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(rename = "fmoviesId")]
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub year: Option<String>,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub season_id: String,
    pub season_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub episode_id: String,
    pub title: Option<String>,
}

/// Title and kind scraped off a watch page, fed to metadata enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchPage {
    pub title: String,
    pub kind: String,
    pub year: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourceLinkResponse {
    link: Option<String>,
}

/// Catalog client for the hosting site: search, season/episode listing,
/// candidate-server discovery and the server-to-embed link lookup.
///
/// Everything here scrapes HTML fragments the site's own frontend consumes,
/// so each extraction is a compiled pattern and a missing attribute skips
/// the item instead of failing the listing.
pub struct FmoviesClient {
    client: Client,
    config: FmoviesConfig,
    anchor_re: Regex,
    href_re: Regex,
    title_re: Regex,
    data_id_re: Regex,
    data_linkid_re: Regex,
    item_block_re: Regex,
    item_id_re: Regex,
    fdi_type_re: Regex,
    fdi_item_re: Regex,
    og_title_re: Regex,
    release_re: Regex,
}

impl FmoviesClient {
    pub fn new(client: Client, config: FmoviesConfig) -> Self {
        Self {
            client,
            config,
            anchor_re: Regex::new(r"(?s)<a\b([^>]*)>(.*?)</a>").unwrap(),
            href_re: Regex::new(r#"href="([^"]+)""#).unwrap(),
            title_re: Regex::new(r#"title="([^"]+)""#).unwrap(),
            data_id_re: Regex::new(r#"data-id="([^"]+)""#).unwrap(),
            data_linkid_re: Regex::new(r#"data-linkid="([^"]+)""#).unwrap(),
            item_block_re: Regex::new(r#"class="flw-item""#).unwrap(),
            item_id_re: Regex::new(r"-(\d+)$").unwrap(),
            fdi_type_re: Regex::new(r#"class="fdi-type[^"]*"[^>]*>([^<]+)<"#).unwrap(),
            fdi_item_re: Regex::new(r#"class="fdi-item[^"]*"[^>]*>([^<]+)<"#).unwrap(),
            og_title_re: Regex::new(r#"<meta[^>]+property="og:title"[^>]+content="([^"]+)""#)
                .unwrap(),
            release_re: Regex::new(r"Released[^\d]*(\d{4})").unwrap(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub async fn search(&self, title: &str) -> Result<Vec<CatalogItem>, NegotiateError> {
        let slug = title
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");
        let url = format!("{}/search/{}", self.config.base_url, slug);
        info!("searching catalog: {url}");

        let html = self.get_html(&url).await?;
        let candidates = self.parse_search(&html);
        info!("found {} catalog candidates", candidates.len());
        Ok(candidates)
    }

    pub async fn seasons(&self, show_id: &str) -> Result<Vec<Season>, NegotiateError> {
        let url = format!("{}/ajax/season/list/{}", self.config.base_url, show_id);
        let html = self.get_html(&url).await?;
        Ok(self.parse_seasons(&html))
    }

    pub async fn episodes(&self, season_id: &str) -> Result<Vec<Episode>, NegotiateError> {
        let url = format!("{}/ajax/season/episodes/{}", self.config.base_url, season_id);
        let html = self.get_html(&url).await?;
        Ok(self.parse_episodes(&html))
    }

    /// Candidate servers for a content item, in the order the site lists
    /// them. Movies and episodes live behind different fragments.
    pub async fn servers(
        &self,
        content_id: &str,
        media_type: MediaType,
    ) -> Result<Vec<CandidateServer>, NegotiateError> {
        let url = match media_type {
            MediaType::Movie => {
                format!("{}/ajax/episode/list/{}", self.config.base_url, content_id)
            }
            MediaType::Episode => {
                format!("{}/ajax/episode/servers/{}", self.config.base_url, content_id)
            }
        };
        let html = self.get_html(&url).await?;
        let servers = self.parse_servers(&html);
        debug!("catalog lists {} servers for {media_type} {content_id}", servers.len());
        Ok(servers)
    }

    /// Resolves a server entry to its embed URL.
    pub async fn source_link(&self, server_id: &str) -> Result<String, NegotiateError> {
        let url = format!(
            "{}/ajax/episode/sources/{}",
            self.config.base_url, server_id
        );
        let response: SourceLinkResponse = self
            .client
            .get(&url)
            .header(USER_AGENT, HttpClient::random_user_agent())
            .header(REFERER, format!("{}/", self.config.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .link
            .filter(|link| !link.is_empty())
            .ok_or_else(|| NegotiateError::Protocol("source link response had no link".into()))
    }

    /// Liveness probe against the site root; drives the /health report.
    pub async fn reachable(&self) -> bool {
        match self
            .client
            .get(&self.config.base_url)
            .header(USER_AGENT, HttpClient::random_user_agent())
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    pub async fn watch_page(&self, href: &str) -> Result<WatchPage, NegotiateError> {
        let url = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{}{}", self.config.base_url, href)
        };
        let html = self.get_html(&url).await?;
        let kind = if href.contains("/tv/") { "tv" } else { "movie" };
        self.parse_watch_page(&html, kind)
            .ok_or_else(|| NegotiateError::Protocol("watch page had no og:title".into()))
    }

    async fn get_html(&self, url: &str) -> Result<String, NegotiateError> {
        Ok(self
            .client
            .get(url)
            .header(USER_AGENT, HttpClient::random_user_agent())
            .header(REFERER, format!("{}/", self.config.base_url))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    }

    fn parse_search(&self, html: &str) -> Vec<CatalogItem> {
        let mut candidates = Vec::new();

        // Block per result card; attributes live on the anchors inside it.
        let starts: Vec<usize> = self.item_block_re.find_iter(html).map(|m| m.start()).collect();
        for (n, &start) in starts.iter().enumerate() {
            let end = starts.get(n + 1).copied().unwrap_or(html.len());
            let block = &html[start..end];

            let Some((href, title)) = self.anchor_re.captures_iter(block).find_map(|caps| {
                let attrs = caps.get(1).map(|m| m.as_str())?;
                let href = self.href_re.captures(attrs)?.get(1)?.as_str();
                let title = self.title_re.captures(attrs)?.get(1)?.as_str();
                Some((href.to_string(), title.to_string()))
            }) else {
                continue;
            };

            let Some(id) = self
                .item_id_re
                .captures(href.split('?').next().unwrap_or(&href))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
            else {
                continue;
            };

            let kind = self
                .fdi_type_re
                .captures(block)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_lowercase())
                .unwrap_or_else(|| "movie".to_string());
            let year = self
                .fdi_item_re
                .captures(block)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string());

            candidates.push(CatalogItem {
                id,
                title,
                year: if kind == "movie" { year } else { None },
                kind,
                href,
            });
        }

        candidates
    }

    fn parse_seasons(&self, html: &str) -> Vec<Season> {
        self.anchor_re
            .captures_iter(html)
            .filter_map(|caps| {
                let attrs = caps.get(1).map(|m| m.as_str())?;
                if !attrs.contains("ss-item") {
                    return None;
                }
                let id = self.data_id_re.captures(attrs)?.get(1)?.as_str();
                let text = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
                let number = text.trim_start_matches("Season").trim().to_string();
                Some(Season {
                    season_id: id.to_string(),
                    season_number: number,
                })
            })
            .collect()
    }

    fn parse_episodes(&self, html: &str) -> Vec<Episode> {
        self.anchor_re
            .captures_iter(html)
            .filter_map(|caps| {
                let attrs = caps.get(1).map(|m| m.as_str())?;
                if !attrs.contains("eps-item") {
                    return None;
                }
                let id = self.data_id_re.captures(attrs)?.get(1)?.as_str();
                let title = self
                    .title_re
                    .captures(attrs)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string());
                Some(Episode {
                    episode_id: id.to_string(),
                    title,
                })
            })
            .collect()
    }

    fn parse_servers(&self, html: &str) -> Vec<CandidateServer> {
        self.anchor_re
            .captures_iter(html)
            .filter_map(|caps| {
                let attrs = caps.get(1).map(|m| m.as_str())?;
                let id = self
                    .data_id_re
                    .captures(attrs)
                    .or_else(|| self.data_linkid_re.captures(attrs))?
                    .get(1)?
                    .as_str();
                let title = self.title_re.captures(attrs)?.get(1)?.as_str();
                Some(CandidateServer {
                    id: id.to_string(),
                    name: title.trim_start_matches("Server ").trim().to_string(),
                })
            })
            .collect()
    }

    fn parse_watch_page(&self, html: &str, kind: &str) -> Option<WatchPage> {
        let raw_title = self
            .og_title_re
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())?;
        // og:title carries site branding after a separator.
        let title = raw_title
            .split(" - ")
            .next()
            .unwrap_or(raw_title)
            .trim()
            .to_string();
        let year = self
            .release_re
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        Some(WatchPage {
            title,
            kind: kind.to_string(),
            year,
        })
    }
}
