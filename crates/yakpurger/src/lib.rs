//! Discover every file below a set of HLS manifests and purge them from the
//! CDN cache in resumable batches.
//!
//! The pipeline runs strictly forward:
//!
//! 1. [`manifest::HttpManifestFetcher`] retrieves and parses one playlist.
//! 2. [`manifest::ManifestResolver`] walks the playlist tree below a root.
//! 3. [`discovery::discover`] merges every root into one sorted list.
//! 4. [`purge::BatchSubmitter`] sends that list to a [`purge::PurgeApi`].

pub mod config;
pub mod discovery;
pub mod error;
pub mod manifest;
pub mod purge;
pub mod retry;

pub use config::{DEFAULT_BATCH_SIZE, FetchConfig, PurgeOptions};
pub use discovery::{DiscoveryReport, RootFailure, discover, read_root_list, write_file_list};
pub use error::{
    BatchError, ConfigError, CredentialsError, ManifestError, PurgeError, TransportError,
};
pub use manifest::{HttpManifestFetcher, Manifest, ManifestResolver, ManifestSource};
pub use purge::{
    BatchSubmitter, EdgeGridCredentials, FastPurgeClient, Network, PurgeApi, PurgeMethod,
    SubmitSummary,
};
pub use retry::RetryPolicy;
