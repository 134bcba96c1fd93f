// Reference Resolver: walks a manifest tree and collects every file it references.
//
// The walk is an explicit depth-first stack with a visited set keyed by absolute
// URI, so shared sub-playlists are fetched once and reference loops terminate.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, trace, warn};

use super::{Manifest, ManifestSource};
use crate::error::ManifestError;

/// Extensions treated as media segments when segments are excluded.
pub const SEGMENT_EXTENSIONS: [&str; 4] = ["mp4", "ts", "mp4a", "mp4v"];

/// Whether `reference` names a media segment by its file extension.
///
/// Only the path is considered; query string and fragment are ignored.
pub fn is_segment_reference(reference: &str) -> bool {
    let path = reference
        .split(['?', '#'])
        .next()
        .unwrap_or(reference);
    let filename = path.rsplit('/').next().unwrap_or(path);
    filename.rsplit_once('.').is_some_and(|(_, ext)| {
        SEGMENT_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    })
}

/// What one manifest contributes on its own, before any descent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectReferences {
    /// The manifest itself, its kept segments and every playlist it references.
    pub files: BTreeSet<String>,
    /// Absolute playlist URIs to descend into, deduplicated, in document order.
    pub playlists: Vec<String>,
}

impl DirectReferences {
    pub fn of(manifest: &Manifest, exclude_segments: bool) -> Self {
        let mut files = BTreeSet::new();
        files.insert(manifest.self_uri.clone());

        for reference in &manifest.segment_references {
            if exclude_segments && is_segment_reference(reference) {
                trace!(reference = %reference, "Excluding segment");
                continue;
            }
            match manifest.resolve(reference) {
                Ok(uri) => {
                    files.insert(uri);
                }
                Err(e) => warn!(manifest = %manifest.self_uri, error = %e, "Skipping unresolvable segment"),
            }
        }

        let mut playlists: Vec<String> = Vec::new();
        let playlist_references = manifest
            .child_playlist_references
            .iter()
            .chain(manifest.media_references.iter());
        for reference in playlist_references {
            match manifest.resolve(reference) {
                Ok(uri) => {
                    if files.insert(uri.clone()) {
                        playlists.push(uri);
                    } else {
                        trace!(uri = %uri, "Playlist reference already listed");
                    }
                }
                Err(e) => warn!(manifest = %manifest.self_uri, error = %e, "Skipping unresolvable playlist"),
            }
        }

        Self { files, playlists }
    }
}

/// Resolves manifests to the full set of files below them.
pub struct ManifestResolver<S> {
    source: S,
}

impl<S: ManifestSource> ManifestResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch `uri` and resolve everything below it.
    pub async fn resolve_uri(
        &self,
        uri: &str,
        exclude_segments: bool,
    ) -> Result<BTreeSet<String>, ManifestError> {
        let root = self.source.fetch(uri).await?;
        self.resolve(root, exclude_segments).await
    }

    /// Collect the transitive closure of absolute file URIs under `root`.
    ///
    /// Any nested fetch failure aborts the whole traversal.
    pub async fn resolve(
        &self,
        root: Manifest,
        exclude_segments: bool,
    ) -> Result<BTreeSet<String>, ManifestError> {
        let root_uri = root.self_uri.clone();
        let mut visited: HashSet<String> = HashSet::from([root_uri.clone()]);
        let mut files = BTreeSet::new();
        let mut pending: Vec<String> = Vec::new();

        let mut next = Some(root);
        while let Some(manifest) = next.take() {
            let direct = DirectReferences::of(&manifest, exclude_segments);
            files.extend(direct.files);

            // Reverse so the first reference is popped first.
            for uri in direct.playlists.into_iter().rev() {
                if visited.insert(uri.clone()) {
                    pending.push(uri);
                } else {
                    debug!(uri = %uri, root = %root_uri, "Playlist already visited, skipping");
                }
            }

            if let Some(uri) = pending.pop() {
                next = Some(self.source.fetch(&uri).await?);
            }
        }

        debug!(root = %root_uri, files = files.len(), manifests = visited.len(), "Resolved manifest tree");
        Ok(files)
    }
}
