use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::configs::TmdbConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TmdbMetadata {
    pub tmdb_id: u64,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: u64,
    overview: Option<String>,
    poster_path: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    title: Option<String>,
    name: Option<String>,
}

const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";

/// Catalog metadata enrichment. Best-effort by design: a missing API key,
/// a network error or an empty result set all come back as `None`.
pub struct TmdbClient {
    client: Client,
    config: TmdbConfig,
}

impl TmdbClient {
    pub fn new(client: Client, config: TmdbConfig) -> Self {
        Self { client, config }
    }

    pub async fn lookup(
        &self,
        title: &str,
        kind: &str,
        year: Option<&str>,
    ) -> Option<TmdbMetadata> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            warn!("TMDB lookup skipped: no API key configured");
            return None;
        };

        let search_type = if kind == "tv" { "tv" } else { "movie" };
        let url = format!("{}/search/{}", self.config.base_url, search_type);

        let mut query: Vec<(&str, &str)> = vec![("api_key", api_key), ("query", title)];
        if let Some(year) = year {
            query.push(("year", year));
        }

        debug!("searching TMDB for '{title}' ({search_type})");
        let response = match self.client.get(&url).query(&query).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("TMDB request failed for '{title}': {e}");
                return None;
            }
        };

        let parsed: SearchResponse = match response.error_for_status() {
            Ok(r) => match r.json().await {
                Ok(p) => p,
                Err(e) => {
                    warn!("TMDB response for '{title}' did not parse: {e}");
                    return None;
                }
            },
            Err(e) => {
                warn!("TMDB rejected search for '{title}': {e}");
                return None;
            }
        };

        let hit = parsed.results.into_iter().next()?;
        debug!(
            "TMDB match for '{title}': {} (id {})",
            hit.name.as_deref().or(hit.title.as_deref()).unwrap_or("?"),
            hit.id
        );
        Some(hit.into_metadata())
    }
}

impl SearchHit {
    fn into_metadata(self) -> TmdbMetadata {
        let year = self
            .release_date
            .as_deref()
            .or(self.first_air_date.as_deref())
            .filter(|d| d.len() >= 4)
            .map(|d| d[..4].to_string());

        TmdbMetadata {
            tmdb_id: self.id,
            overview: self.overview,
            poster_url: self.poster_path.map(|p| format!("{POSTER_BASE}{p}")),
            year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_maps_to_metadata() {
        let hit: SearchHit = serde_json::from_value(serde_json::json!({
            "id": 27205,
            "overview": "A thief who steals corporate secrets.",
            "poster_path": "/inception.jpg",
            "release_date": "2010-07-16",
            "title": "Inception"
        }))
        .unwrap();

        let meta = hit.into_metadata();
        assert_eq!(meta.tmdb_id, 27205);
        assert_eq!(
            meta.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/inception.jpg")
        );
        assert_eq!(meta.year.as_deref(), Some("2010"));
    }

    #[test]
    fn tv_hit_uses_first_air_date() {
        let hit: SearchHit = serde_json::from_value(serde_json::json!({
            "id": 95396,
            "first_air_date": "2022-02-17",
            "name": "Severance"
        }))
        .unwrap();
        assert_eq!(hit.into_metadata().year.as_deref(), Some("2022"));
    }
}
