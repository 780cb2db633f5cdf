use crate::registry::{DEFAULT_HOST, DEFAULT_NAMESPACE, LEGACY_NAMESPACE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fully-qualified provider source address.
///
/// Components are stored lower-cased. The display form omits the default
/// registry hostname, so `registry.terraform.io/hashicorp/aws` prints as
/// `hashicorp/aws`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProviderAddr {
    pub hostname: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddrError {
    #[error("source address must have one to three parts separated by slashes, got {0:?}")]
    WrongPartCount(String),

    #[error("source address {0:?} has an empty part")]
    EmptyPart(String),

    #[error("invalid hostname {0:?}")]
    InvalidHostname(String),

    #[error("invalid provider namespace {0:?}: use only letters, digits and dashes")]
    InvalidNamespace(String),

    #[error("invalid provider type {0:?}: use only letters, digits and dashes")]
    InvalidType(String),

    #[error("the legacy namespace \"-\" cannot be used in an explicit source address")]
    LegacyNamespace,
}

impl ProviderAddr {
    pub fn new(
        hostname: impl Into<String>,
        namespace: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            namespace: namespace.into(),
            type_name: type_name.into(),
        }
    }

    /// `registry.terraform.io/hashicorp/<type>`.
    pub fn default_for(type_name: &str) -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_NAMESPACE, type_name)
    }

    /// Legacy placeholder `registry.terraform.io/-/<type>`, pending a registry lookup.
    pub fn legacy(type_name: &str) -> Self {
        Self::new(DEFAULT_HOST, LEGACY_NAMESPACE, type_name)
    }

    pub fn is_legacy(&self) -> bool {
        self.namespace == LEGACY_NAMESPACE
    }

    /// Parses an operator-written source string.
    ///
    /// Accepted forms are `type`, `namespace/type` and `hostname/namespace/type`.
    pub fn parse(source: &str) -> Result<Self, AddrError> {
        let parts: Vec<&str> = source.split('/').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(AddrError::WrongPartCount(source.to_string()));
        }
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(AddrError::EmptyPart(source.to_string()));
        }

        let (hostname, namespace, type_name) = match parts.as_slice() {
            [t] => (DEFAULT_HOST, DEFAULT_NAMESPACE, *t),
            [ns, t] => (DEFAULT_HOST, *ns, *t),
            [host, ns, t] => (*host, *ns, *t),
            _ => return Err(AddrError::WrongPartCount(source.to_string())),
        };

        let hostname = hostname.to_ascii_lowercase();
        if !is_valid_hostname(&hostname) {
            return Err(AddrError::InvalidHostname(hostname));
        }
        if namespace == LEGACY_NAMESPACE {
            return Err(AddrError::LegacyNamespace);
        }
        let namespace = namespace.to_ascii_lowercase();
        if !is_valid_name(&namespace) {
            return Err(AddrError::InvalidNamespace(namespace));
        }
        let type_name = type_name.to_ascii_lowercase();
        if !is_valid_name(&type_name) {
            return Err(AddrError::InvalidType(type_name));
        }

        Ok(Self {
            hostname,
            namespace,
            type_name,
        })
    }
}

impl FromStr for ProviderAddr {
    type Err = AddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ProviderAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hostname == DEFAULT_HOST {
            write!(f, "{}/{}", self.namespace, self.type_name)
        } else {
            write!(f, "{}/{}/{}", self.hostname, self.namespace, self.type_name)
        }
    }
}

fn is_valid_name(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('-')
        && !s.ends_with('-')
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn is_valid_hostname(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('.')
        && !s.ends_with('.')
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == ':')
}
