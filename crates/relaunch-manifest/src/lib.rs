//! Application manifest: what a launcher must have on disk before it may start
//! an application.
//!
//! A [`Manifest`] is immutable. Replacing it means building a new value (see
//! [`Manifest::with_uri`]) and deciding, through [`decide`], whether a freshly
//! loaded remote copy should take over from the current one.

mod acceptance;
mod artifact;
mod error;
mod location;
mod manifest;

pub use acceptance::{Acceptance, decide};
pub use artifact::{Artifact, ArtifactPath};
pub use error::{ManifestError, Result};
pub use location::{base_url, parse_location};
pub use manifest::{MANIFEST_FILE, Manifest};
