// Manifest parser: turns raw playlist bytes into a reference-only Manifest.

use m3u8_rs::{MasterPlaylist, MediaPlaylist, Playlist, parse_playlist_res};
use tracing::{debug, warn};

use super::Manifest;
use crate::error::ManifestError;

/// Parse playlist bytes fetched from `self_uri`.
pub fn parse_manifest(self_uri: &str, bytes: &[u8]) -> Result<Manifest, ManifestError> {
    let mut manifest = Manifest::new(self_uri)?;
    let playlist = parse_playlist_res(bytes)
        .map_err(|e| ManifestError::parse(self_uri, e.to_string()))?;

    match playlist {
        Playlist::MasterPlaylist(pl) => collect_master(&mut manifest, &pl),
        Playlist::MediaPlaylist(pl) => collect_media(&mut manifest, &pl),
    }

    debug!(
        uri = %manifest.self_uri,
        kind = ?manifest.kind(),
        segments = manifest.segment_references.len(),
        variants = manifest.child_playlist_references.len(),
        renditions = manifest.media_references.len(),
        "Parsed manifest"
    );
    Ok(manifest)
}

fn collect_master(manifest: &mut Manifest, playlist: &MasterPlaylist) {
    manifest.child_playlist_references.extend(
        playlist
            .variants
            .iter()
            .map(|v| v.uri.trim())
            .filter(|uri| !uri.is_empty())
            .map(str::to_owned),
    );

    // Renditions without a URI are muxed into the variant stream.
    manifest.media_references.extend(
        playlist
            .alternatives
            .iter()
            .filter_map(|alt| alt.uri.as_deref())
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .map(str::to_owned),
    );
}

fn collect_media(manifest: &mut Manifest, playlist: &MediaPlaylist) {
    let mut last_map_uri: Option<String> = playlist_level_map_uri(playlist);
    if let Some(uri) = &last_map_uri {
        manifest.segment_references.push(uri.clone());
    }

    for (idx, segment) in playlist.segments.iter().enumerate() {
        if let Some(map) = &segment.map
            && !map.uri.trim().is_empty()
            && last_map_uri.as_deref() != Some(map.uri.trim())
        {
            let uri = map.uri.trim().to_owned();
            if !manifest.segment_references.contains(&uri) {
                manifest.segment_references.push(uri.clone());
            }
            last_map_uri = Some(uri);
        }

        let uri = segment.uri.trim();
        if uri.is_empty() {
            warn!(
                manifest = %manifest.self_uri,
                index = idx,
                "Skipping segment with empty URI"
            );
            continue;
        }
        manifest.segment_references.push(uri.to_owned());
    }
}

/// An `EXT-X-MAP` placed ahead of the first segment can end up in the
/// playlist's unknown tags instead of on a segment.
fn playlist_level_map_uri(playlist: &MediaPlaylist) -> Option<String> {
    let tag = playlist.unknown_tags.iter().find(|t| t.tag == "X-MAP")?;
    let rest = tag.rest.as_deref()?;

    rest.split(',').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("URI") {
            return None;
        }
        let value = value.trim().trim_matches('"').trim();
        (!value.is_empty()).then(|| value.to_owned())
    })
}
