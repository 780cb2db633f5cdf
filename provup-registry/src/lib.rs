//! Provider source lookup.
//!
//! Facts collected from configuration only carry a local name. This crate asks a provider
//! registry which namespace currently owns each legacy (pre-namespace) provider type and
//! records the answer on the fact.
//!
//! - [`ProviderSource`] is the lookup port, with a three-way outcome: found, not known, error.
//! - [`RegistrySource`] talks to a real registry over HTTP.
//! - [`InMemorySource`] answers from a fixed table, for embedding and tests.
//! - [`resolve_provenance`] applies a source to a whole [`RequirementSet`].

mod error;
mod http;
mod memory;
mod resolve;

pub use error::LookupError;
pub use http::{RegistryOptions, RegistrySource};
pub use memory::InMemorySource;
pub use resolve::resolve_provenance;

use provup_types::ProviderAddr;

/// Looks up the current address of a legacy provider.
pub trait ProviderSource {
    /// Returns the fully-qualified address for `legacy`, [`LookupError::NotKnown`] when the
    /// source definitively has no such provider, or any other error when the answer is unknown.
    fn lookup_legacy(&self, legacy: &ProviderAddr) -> Result<ProviderAddr, LookupError>;
}

impl<T: ProviderSource + ?Sized> ProviderSource for &T {
    fn lookup_legacy(&self, legacy: &ProviderAddr) -> Result<ProviderAddr, LookupError> {
        (**self).lookup_legacy(legacy)
    }
}
