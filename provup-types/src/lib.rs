//! Shared data model for the provup workspace.
//!
//! # Design constraints
//! - Everything here is plain data: no I/O, no parsing of configuration files.
//! - Types are serializable so diagnostics and plans can be emitted as JSON.
//! - Ordering-sensitive collections use `BTreeMap` so iteration is name-sorted.

pub mod addr;
pub mod diagnostics;
pub mod requirement;

pub use addr::{AddrError, ProviderAddr};
pub use diagnostics::{Diagnostic, Diagnostics, Severity, SourcePos};
pub use requirement::{Provenance, RequirementFact, RequirementSet, RewritePlan};

/// Well-known registry constants.
pub mod registry {
    /// Hostname implied when a source address omits one.
    pub const DEFAULT_HOST: &str = "registry.terraform.io";
    /// Namespace implied when a source address is a bare type.
    pub const DEFAULT_NAMESPACE: &str = "hashicorp";
    /// Namespace marker for legacy (pre-namespace) provider addresses.
    pub const LEGACY_NAMESPACE: &str = "-";
}
