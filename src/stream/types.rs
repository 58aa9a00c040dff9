use serde::{Deserialize, Serialize};
use url::Url;

/// What kind of content a resolution targets. Episodic content goes through
/// a different server-listing endpoint upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Episode,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Episode => "episode",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Self::Movie),
            "episode" => Ok(Self::Episode),
            other => Err(format!("unknown media type '{other}'")),
        }
    }
}

/// One upstream endpoint that may serve a given content item. Fungible;
/// tried in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateServer {
    pub id: String,
    pub name: String,
}

/// State scraped from the embed page, valid for one resolution attempt.
#[derive(Debug, Clone)]
pub struct EmbedSession {
    pub embed_url: Url,
    pub session_token: String,
    pub embed_id: String,
}

/// One concrete playable variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendition {
    pub quality: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleTrack {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// The pipeline's output artifact. Immutable once constructed; cached by
/// serialized value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamResult {
    pub sources: Vec<Rendition>,
    pub subtitles: Vec<SubtitleTrack>,
    pub decryption_key: Option<String>,
    pub source_server: String,
    pub referer_url: String,
}

/// Wire shape of the provider's source-resolution response.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceManifest {
    #[serde(default)]
    pub sources: Vec<ManifestSource>,
    #[serde(default)]
    pub tracks: Vec<ManifestTrack>,
    #[serde(default)]
    pub encrypted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestSource {
    pub file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestTrack {
    pub file: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

impl SourceManifest {
    /// Caption tracks as caller-facing subtitles. Thumbnail strips and other
    /// non-text kinds are dropped.
    pub fn subtitle_tracks(&self) -> Vec<SubtitleTrack> {
        self.tracks
            .iter()
            .filter(|t| match t.kind.as_deref() {
                Some("captions") | Some("subtitles") | None => true,
                _ => false,
            })
            .map(|t| SubtitleTrack {
                url: t.file.clone(),
                label: t.label.clone(),
                language: t
                    .label
                    .as_deref()
                    .and_then(|l| l.split_whitespace().next())
                    .map(|l| l.to_lowercase()),
            })
            .collect()
    }
}
