//! Port traits abstracting writes away from the pipeline.
//!
//! Reads go through [`RepoView`](provup_domain::RepoView).

use camino::Utf8Path;

/// File-system write operations.
pub trait WritePort {
    /// Replaces (or creates) the file at `path` with `contents`.
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
}
