//! Domain logic: turn a module's configuration files into one requirement fact per provider.
//!
//! This crate owns *what* the consolidated requirements are. It does not own *how* files are
//! rewritten; that's the `provup-edit` crate.

mod collector;
mod loader;
mod ports;

pub use collector::collect_requirements;
pub use loader::{
    ModuleFile, ProviderConfig, RequiredProviderDecl, RequiredProvidersBlock, ResourceMode,
    ResourceRef, SourceFile, implied_provider, load_module, parse_source, pos_of,
};
pub use ports::{DirEntry, FsRepoView, RepoView};
