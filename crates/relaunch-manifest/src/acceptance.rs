use crate::{Manifest, ManifestError};

/// Outcome of comparing a freshly loaded remote manifest with the current one.
#[derive(Debug)]
pub enum Acceptance {
    /// The remote copy could not be loaded; keep the current manifest.
    Unavailable(ManifestError),
    /// Remote and current are identical; nothing to write.
    Unchanged,
    /// Remote is strictly newer, or the current manifest accepts downgrades.
    Accepted(Manifest),
    /// Remote differs but is not newer and downgrades are not accepted.
    Rejected(Manifest),
}

impl Acceptance {
    pub fn is_accepted(&self) -> bool { matches!(self, Acceptance::Accepted(_)) }
}

/// Decide whether `remote` replaces `current`.
///
/// A remote manifest that differs without being strictly newer is rejected
/// unless `current` accepts downgrades. This also rejects same-version content
/// changes.
pub fn decide(current: &Manifest, remote: crate::Result<Manifest>) -> Acceptance {
    let remote = match remote {
        Ok(remote) => remote,
        Err(e) => return Acceptance::Unavailable(e),
    };

    if remote == *current {
        Acceptance::Unchanged
    } else if remote.is_newer_than(current) || current.accept_downgrade() {
        Acceptance::Accepted(remote)
    } else {
        Acceptance::Rejected(remote)
    }
}
