use std::sync::OnceLock;

use regex::Regex;

use super::types::Rendition;

const MASTER_MARKER: &str = "#EXT-X-STREAM-INF";

fn resolution_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"RESOLUTION=\d+x(\d+)").unwrap())
}

/// Parses a master playlist into renditions, in source order.
///
/// Text without the master marker yields an empty list; the caller decides
/// whether the input was a leaf manifest worth playing directly. A
/// stream-info record whose URL line is missing is skipped.
pub fn parse_master_playlist(text: &str) -> Vec<Rendition> {
    if !text.contains(MASTER_MARKER) {
        return Vec::new();
    }

    let lines: Vec<&str> = text.trim().lines().map(str::trim).collect();
    let mut sources = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if !line.starts_with(MASTER_MARKER) {
            continue;
        }

        let quality = resolution_re()
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|height| format!("{}p", height.as_str()))
            .unwrap_or_else(|| "auto".to_string());

        // The URI is the next non-empty line; a tag there means the record
        // never got its URI.
        let url = lines[i + 1..]
            .iter()
            .find(|l| !l.is_empty())
            .filter(|l| !l.starts_with('#'));

        if let Some(url) = url {
            sources.push(Rendition {
                quality,
                url: (*url).to_string(),
            });
        }
    }

    sources
}

/// What came back from chasing the master manifest URL. Keeps the
/// partial-success decision explicit instead of an error being swallowed
/// somewhere on the way up.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestOutcome {
    /// Master manifest parsed into explicit renditions.
    Parsed(Vec<Rendition>),
    /// Fetched fine but wasn't a master manifest; the URL itself plays.
    LeafOnly,
    /// Fetch failed; the unparsed master URL is still handed out.
    Unfetched,
}

impl ManifestOutcome {
    pub fn from_fetch(fetched: Result<String, reqwest::Error>) -> Self {
        match fetched {
            Ok(text) => {
                let renditions = parse_master_playlist(&text);
                if renditions.is_empty() {
                    Self::LeafOnly
                } else {
                    Self::Parsed(renditions)
                }
            }
            Err(_) => Self::Unfetched,
        }
    }

    /// Always at least one rendition: this type only exists on the success
    /// path, where something playable must survive.
    pub fn into_renditions(self, master_url: &str) -> Vec<Rendition> {
        match self {
            Self::Parsed(renditions) => renditions,
            Self::LeafOnly => vec![Rendition {
                quality: "auto".to_string(),
                url: master_url.to_string(),
            }],
            Self::Unfetched => vec![Rendition {
                quality: "auto (master)".to_string(),
                url: master_url.to_string(),
            }],
        }
    }
}
