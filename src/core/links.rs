use crate::domain::model::LinkList;
use crate::utils::error::{RelayError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use url::Url;

/// Reads reel URLs, one per line.
#[derive(Debug, Clone)]
pub struct LinkSource {
    path: PathBuf,
}

impl LinkSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields an empty list; the caller decides whether to abort.
    pub fn load(&self) -> Result<LinkList> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(parse_links(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::error!("❌ File '{}' not found.", self.path.display());
                Ok(LinkList::default())
            }
            Err(e) => Err(RelayError::IoError(e)),
        }
    }
}

pub fn parse_links(content: &str) -> LinkList {
    LinkList::new(
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

const POST_MARKERS: [&str; 4] = ["p", "reel", "reels", "tv"];

/// 從連結取出 shortcode
///
/// Takes the segment after a `p`/`reel`/`reels`/`tv` marker when the URL has
/// one, otherwise the segment just before the trailing one
/// (`.../<shortcode>/`).
pub fn shortcode_from_url(link: &str) -> Result<String> {
    let invalid = |reason: &str| RelayError::InvalidLink {
        url: link.to_string(),
        reason: reason.to_string(),
    };

    if let Ok(url) = Url::parse(link) {
        if let Some(segments) = url.path_segments() {
            let segments: Vec<&str> = segments.collect();
            if let Some(position) = segments
                .iter()
                .position(|segment| POST_MARKERS.contains(segment))
            {
                return match segments.get(position + 1) {
                    Some(code) if !code.is_empty() => Ok(code.to_string()),
                    _ => Err(invalid("no shortcode after the post marker")),
                };
            }
        }
    }

    match link.rsplit('/').nth(1) {
        Some(code) if !code.is_empty() && !code.contains(':') => Ok(code.to_string()),
        _ => Err(invalid("expected a URL ending in /<shortcode>/")),
    }
}
