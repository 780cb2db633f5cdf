//! Default port implementations: the filesystem, and an in-memory tree for embedding and tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use provup_domain::{DirEntry, RepoView};
use tracing::debug;

use crate::ports::WritePort;

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }
}

/// A module tree held in memory, readable as a [`RepoView`] and writable as a [`WritePort`].
///
/// Paths are relative; directories exist implicitly when a file lives below them.
#[derive(Debug, Default)]
pub struct InMemoryRepo {
    root: Utf8PathBuf,
    files: RefCell<BTreeMap<Utf8PathBuf, String>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<Utf8PathBuf>, text: impl Into<String>) -> Self {
        self.files.borrow_mut().insert(path.into(), text.into());
        self
    }

    /// Current contents of one file.
    pub fn file(&self, path: &str) -> Option<String> {
        self.files.borrow().get(Utf8Path::new(path)).cloned()
    }

    /// Snapshot of every file.
    pub fn files(&self) -> BTreeMap<Utf8PathBuf, String> {
        self.files.borrow().clone()
    }

    fn relative<'a>(&self, path: &'a Utf8Path) -> &'a Utf8Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

impl RepoView for InMemoryRepo {
    fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn read_to_string(&self, rel: &Utf8Path) -> anyhow::Result<String> {
        match self.files.borrow().get(self.relative(rel)) {
            Some(text) => Ok(text.clone()),
            None => bail!("read {}: no such file", rel),
        }
    }

    fn exists(&self, rel: &Utf8Path) -> bool {
        let rel = self.relative(rel);
        self.files.borrow().keys().any(|path| path.starts_with(rel))
    }

    fn list_dir(&self, rel: &Utf8Path) -> anyhow::Result<Vec<DirEntry>> {
        let rel = self.relative(rel);
        let mut entries = BTreeSet::new();
        for path in self.files.borrow().keys() {
            let Ok(rest) = path.strip_prefix(rel) else {
                continue;
            };
            let mut components = rest.components();
            let Some(first) = components.next() else {
                continue;
            };
            let name = first.as_str().to_string();
            if components.next().is_some() {
                entries.insert(DirEntry::dir(name));
            } else {
                entries.insert(DirEntry::file(name));
            }
        }
        if entries.is_empty() && !rel.as_str().is_empty() {
            bail!("list {}: no such directory", rel);
        }
        Ok(entries.into_iter().collect())
    }
}

impl WritePort for InMemoryRepo {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        let text = String::from_utf8(contents.to_vec())
            .with_context(|| format!("write {}: contents are not UTF-8", path))?;
        debug!(path = %path, bytes = contents.len(), "in-memory write");
        self.files
            .borrow_mut()
            .insert(self.relative(path).to_path_buf(), text);
        Ok(())
    }
}
