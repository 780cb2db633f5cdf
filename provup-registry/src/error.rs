use provup_types::ProviderAddr;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum LookupError {
    /// The source answered and does not have this provider.
    #[error("provider {:?} is not known to the registry", addr.type_name)]
    NotKnown { addr: ProviderAddr },

    #[error("host {host} does not offer a provider registry")]
    NoProviderService { host: String },

    #[error("registry request to {url} failed with HTTP status {status}")]
    Status { url: Url, status: u16 },

    #[error("invalid response from {url}: {message}")]
    InvalidResponse { url: Url, message: String },

    #[error("invalid registry URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Unavailable(String),
}

impl LookupError {
    /// True for the definitive "no such provider" answer.
    pub fn is_not_known(&self) -> bool {
        matches!(self, LookupError::NotKnown { .. })
    }
}
