//! Finds the configuration files of a module directory.

use camino::{Utf8Path, Utf8PathBuf};
use provup_domain::RepoView;
use provup_types::{Diagnostic, Diagnostics};
use tracing::debug;

/// How a directory entry takes part in an upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `*.tf`: read, and possibly rewritten.
    Primary,
    /// `override.tf` / `*_override.tf`: reported and left alone.
    Override,
    /// `*.tf.json`: reported and left alone.
    Json,
}

/// Classifies a file name; `None` for files that are not configuration at all.
///
/// Editor backups and hidden files (`.foo.tf`, `#foo.tf#`, `foo.tf~`) are ignored.
pub fn classify(name: &str) -> Option<FileKind> {
    if name.starts_with('.') || name.starts_with('#') || name.ends_with('~') {
        return None;
    }
    if name.ends_with(".tf.json") {
        return Some(FileKind::Json);
    }
    let stem = name.strip_suffix(".tf")?;
    if stem == "override" || stem.ends_with("_override") {
        Some(FileKind::Override)
    } else {
        Some(FileKind::Primary)
    }
}

/// The configuration files of one module directory, each list sorted by file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleFiles {
    pub primary: Vec<Utf8PathBuf>,
    pub overrides: Vec<Utf8PathBuf>,
    pub json: Vec<Utf8PathBuf>,
}

impl ModuleFiles {
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.overrides.is_empty() && self.json.is_empty()
    }

    /// One warning per file that is found but not upgraded.
    pub fn skipped_warnings(&self) -> Diagnostics {
        let overrides = self.overrides.iter().map(|path| {
            Diagnostic::warning(
                format!("Ignoring override file {:?}: not implemented", path.as_str()),
                "",
            )
        });
        let json = self.json.iter().map(|path| {
            Diagnostic::warning(
                format!(
                    "Ignoring JSON configuration file {:?}: not implemented",
                    path.as_str()
                ),
                "",
            )
        });
        overrides.chain(json).collect()
    }
}

/// Lists the configuration files directly inside `dir`.
///
/// A directory that cannot be listed yields an empty set, so a missing directory and an empty
/// one are reported the same way by the caller.
pub fn discover_module(repo: &dyn RepoView, dir: &Utf8Path) -> ModuleFiles {
    let entries = match repo.list_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(dir = %dir, error = %format!("{err:#}"), "cannot list module directory");
            return ModuleFiles::default();
        }
    };

    let mut files = ModuleFiles::default();
    for entry in entries.iter().filter(|e| !e.is_dir) {
        let path = dir.join(&entry.name);
        match classify(&entry.name) {
            Some(FileKind::Primary) => files.primary.push(path),
            Some(FileKind::Override) => files.overrides.push(path),
            Some(FileKind::Json) => files.json.push(path),
            None => {}
        }
    }
    debug!(
        dir = %dir,
        primary = files.primary.len(),
        overrides = files.overrides.len(),
        json = files.json.len(),
        "discovered module files"
    );
    files
}

/// Returns `true` when `dir` holds at least one configuration file.
pub fn is_module_dir(repo: &dyn RepoView, dir: &Utf8Path) -> bool {
    !discover_module(repo, dir).is_empty()
}

/// Sub-directories worth descending into: not hidden (which also covers `.terraform`).
pub fn child_dirs(repo: &dyn RepoView, dir: &Utf8Path) -> Vec<Utf8PathBuf> {
    match repo.list_dir(dir) {
        Ok(entries) => entries
            .into_iter()
            .filter(|e| e.is_dir && !e.name.starts_with('.'))
            .map(|e| dir.join(e.name))
            .collect(),
        Err(_) => Vec::new(),
    }
}
