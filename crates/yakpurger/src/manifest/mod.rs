//! Manifest model, parsing and retrieval.
//!
//! A [`Manifest`] is the reference view of one HLS playlist: the URI it was
//! loaded from, the directory-style base URI its relative entries resolve
//! against, and the three classes of entries it can carry.

mod fetcher;
mod parser;
mod resolver;

pub use fetcher::{HttpManifestFetcher, ManifestSource};
pub use parser::parse_manifest;
pub use resolver::{DirectReferences, ManifestResolver, SEGMENT_EXTENSIONS, is_segment_reference};

use crate::error::ManifestError;
use url::Url;

/// Shape of a manifest, derived from which reference classes it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Master,
    Media,
    /// Carries both playlist references and segments.
    Mixed,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Exact URI the manifest was requested with, query string included.
    pub self_uri: String,
    /// `self_uri` without query, fragment and filename.
    pub base_uri: Url,
    /// Media segment and initialization section references, as written.
    pub segment_references: Vec<String>,
    /// Variant stream (and I-frame variant) playlist references.
    pub child_playlist_references: Vec<String>,
    /// Alternate rendition playlist references (audio, subtitles, ...).
    pub media_references: Vec<String>,
}

impl Manifest {
    /// Create an empty manifest rooted at `self_uri`.
    pub fn new(self_uri: impl Into<String>) -> Result<Self, ManifestError> {
        let self_uri = self_uri.into();
        let base_uri = base_uri(&self_uri)?;
        Ok(Self {
            self_uri,
            base_uri,
            segment_references: Vec::new(),
            child_playlist_references: Vec::new(),
            media_references: Vec::new(),
        })
    }

    pub fn kind(&self) -> ManifestKind {
        let has_playlists =
            !self.child_playlist_references.is_empty() || !self.media_references.is_empty();
        let has_segments = !self.segment_references.is_empty();
        match (has_playlists, has_segments) {
            (true, true) => ManifestKind::Mixed,
            (true, false) => ManifestKind::Master,
            (false, true) => ManifestKind::Media,
            (false, false) => ManifestKind::Empty,
        }
    }

    /// Resolve a reference found in this manifest to an absolute URI.
    pub fn resolve(&self, reference: &str) -> Result<String, ManifestError> {
        resolve_reference(&self.base_uri, reference)
    }
}

/// Derive the directory-style base of a manifest URI.
///
/// The query string and fragment are dropped first, then the trailing
/// filename, so `https://cdn/a/master.m3u8?token=1` becomes `https://cdn/a/`.
pub fn base_uri(uri: &str) -> Result<Url, ManifestError> {
    let mut url = Url::parse(uri.trim())
        .map_err(|e| ManifestError::invalid_url(uri, e.to_string()))?;
    url.set_query(None);
    url.set_fragment(None);
    url.join(".")
        .map_err(|e| ManifestError::invalid_url(uri, format!("cannot derive base URI: {e}")))
}

/// Resolve `reference` against `base`. Absolute references are returned as-is.
pub fn resolve_reference(base: &Url, reference: &str) -> Result<String, ManifestError> {
    base.join(reference.trim())
        .map(String::from)
        .map_err(|e| ManifestError::invalid_url(reference, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_uri_strips_query_and_filename() {
        let base = base_uri("https://cdn.example.com/vod/asset/master.m3u8?token=abc").unwrap();
        assert_eq!(base.as_str(), "https://cdn.example.com/vod/asset/");
    }

    #[test]
    fn base_uri_keeps_directory_uri() {
        let base = base_uri("https://cdn.example.com/vod/asset/").unwrap();
        assert_eq!(base.as_str(), "https://cdn.example.com/vod/asset/");
    }

    #[test]
    fn base_uri_rejects_relative_input() {
        assert!(matches!(
            base_uri("vod/master.m3u8"),
            Err(ManifestError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn manifest_keeps_query_in_self_uri() {
        let manifest = Manifest::new("https://cdn.example.com/a/master.m3u8?t=1").unwrap();
        assert_eq!(manifest.self_uri, "https://cdn.example.com/a/master.m3u8?t=1");
        assert_eq!(manifest.base_uri.as_str(), "https://cdn.example.com/a/");
        assert_eq!(manifest.kind(), ManifestKind::Empty);
    }

    #[test]
    fn resolve_handles_relative_and_absolute_references() {
        let manifest = Manifest::new("https://cdn.example.com/a/b/master.m3u8").unwrap();
        assert_eq!(
            manifest.resolve("720p/index.m3u8").unwrap(),
            "https://cdn.example.com/a/b/720p/index.m3u8"
        );
        assert_eq!(
            manifest.resolve("../audio/en.m3u8").unwrap(),
            "https://cdn.example.com/a/audio/en.m3u8"
        );
        assert_eq!(
            manifest.resolve("/root/seg.ts").unwrap(),
            "https://cdn.example.com/root/seg.ts"
        );
        assert_eq!(
            manifest.resolve("https://other.example.com/x.ts").unwrap(),
            "https://other.example.com/x.ts"
        );
    }

    #[test]
    fn kind_reflects_reference_classes() {
        let mut manifest = Manifest::new("https://cdn.example.com/master.m3u8").unwrap();
        manifest.media_references.push("audio.m3u8".into());
        assert_eq!(manifest.kind(), ManifestKind::Master);
        manifest.segment_references.push("seg.ts".into());
        assert_eq!(manifest.kind(), ManifestKind::Mixed);
        manifest.media_references.clear();
        assert_eq!(manifest.kind(), ManifestKind::Media);
    }
}
