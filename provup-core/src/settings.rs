//! Clap-free settings for the upgrade pipeline.

use camino::Utf8PathBuf;

/// File name of the consolidated block when no single existing file can hold it.
pub const DEFAULT_OUTPUT_FILE: &str = "providers.tf";

/// Settings for one upgrade run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeSettings {
    /// Module directory, relative to the root of the [`RepoView`](provup_domain::RepoView).
    /// Empty means the root itself.
    pub module_dir: Utf8PathBuf,
    pub output_file: String,

    /// Compute the rewrite and a patch, but write nothing.
    pub dry_run: bool,
}

impl Default for UpgradeSettings {
    fn default() -> Self {
        Self {
            module_dir: Utf8PathBuf::new(),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            dry_run: false,
        }
    }
}

impl UpgradeSettings {
    /// The same settings pointed at another module directory.
    pub fn for_module(&self, module_dir: Utf8PathBuf) -> Self {
        Self {
            module_dir,
            ..self.clone()
        }
    }
}
