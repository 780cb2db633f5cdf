//! Embeddable core library for provup.
//!
//! Provides a clap-free, I/O-abstracted entry point that upgrades one module directory (or a
//! tree of them) to a single consolidated `required_providers` block.
//!
//! # Ports
//!
//! - [`RepoView`] reads the module tree.
//! - [`WritePort`](ports::WritePort) persists rewritten files.
//! - [`ProviderSource`] answers legacy provider lookups.
//!
//! The [`adapters`] module provides filesystem-backed and in-memory implementations.
//!
//! # Entry points
//!
//! - [`run_upgrade`](pipeline::run_upgrade) upgrades one module directory.
//! - [`run_recursive`](pipeline::run_recursive) upgrades every module directory below a root.

pub mod adapters;
pub mod discovery;
pub mod pipeline;
pub mod ports;
pub mod settings;

pub use pipeline::{ModuleOutcome, UpgradeError, UpgradeOutcome, run_recursive, run_upgrade};
pub use settings::{DEFAULT_OUTPUT_FILE, UpgradeSettings};

// Re-export the ports of the lower crates so embedders only need provup-core.
pub use provup_domain::{DirEntry, FsRepoView, RepoView};
pub use provup_registry::{
    InMemorySource, LookupError, ProviderSource, RegistryOptions, RegistrySource,
};
pub use provup_types::{Diagnostic, Diagnostics, RewritePlan, Severity, SourcePos};
