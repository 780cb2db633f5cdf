use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use tracing::debug;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Read-only access to a module tree.
///
/// provup-domain and provup-core go through this so the whole pipeline can run against an
/// in-memory tree in tests.
pub trait RepoView {
    fn root(&self) -> &Utf8Path;

    fn read_to_string(&self, rel: &Utf8Path) -> anyhow::Result<String>;

    fn exists(&self, rel: &Utf8Path) -> bool;

    /// Lists a directory, sorted by name.
    fn list_dir(&self, rel: &Utf8Path) -> anyhow::Result<Vec<DirEntry>>;
}

/// File-system backed `RepoView`.
#[derive(Debug, Clone)]
pub struct FsRepoView {
    root: Utf8PathBuf,
}

impl FsRepoView {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    fn abs(&self, rel: &Utf8Path) -> Utf8PathBuf {
        if rel.is_absolute() {
            rel.to_path_buf()
        } else {
            self.root.join(rel)
        }
    }
}

impl RepoView for FsRepoView {
    fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn read_to_string(&self, rel: &Utf8Path) -> anyhow::Result<String> {
        let abs = self.abs(rel);
        fs::read_to_string(&abs).with_context(|| format!("read {}", abs))
    }

    fn exists(&self, rel: &Utf8Path) -> bool {
        self.abs(rel).exists()
    }

    fn list_dir(&self, rel: &Utf8Path) -> anyhow::Result<Vec<DirEntry>> {
        let abs = self.abs(rel);
        let mut entries = Vec::new();
        for entry in fs::read_dir(&abs).with_context(|| format!("read directory {}", abs))? {
            let entry = entry.with_context(|| format!("read directory {}", abs))?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    debug!(dir = %abs, name = ?raw, "skipping non-UTF-8 entry");
                    continue;
                }
            };
            let is_dir = entry
                .file_type()
                .with_context(|| format!("stat {}/{}", abs, name))?
                .is_dir();
            entries.push(DirEntry { name, is_dir });
        }
        entries.sort();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn list_dir_is_sorted_and_typed() {
        let td = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        fs::write(root.join("b.tf"), "").unwrap();
        fs::write(root.join("a.tf"), "").unwrap();
        fs::create_dir(root.join("modules")).unwrap();

        let repo = FsRepoView::new(root);
        let entries = repo.list_dir(Utf8Path::new("")).unwrap();
        assert_eq!(
            entries,
            vec![
                DirEntry::file("a.tf"),
                DirEntry::file("b.tf"),
                DirEntry::dir("modules"),
            ]
        );
    }

    #[test]
    fn read_reports_path_on_failure() {
        let td = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        let repo = FsRepoView::new(root);
        let err = repo.read_to_string(Utf8Path::new("missing.tf")).unwrap_err();
        assert!(format!("{:#}", err).contains("missing.tf"));
        assert!(!repo.exists(Utf8Path::new("missing.tf")));
    }
}
