use std::sync::OnceLock;
use std::time::Duration;

use provup_types::ProviderAddr;
use provup_types::registry::DEFAULT_HOST;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{LookupError, ProviderSource};

const PROVIDERS_SERVICE: &str = "providers.v1";

#[derive(Clone, Debug)]
pub struct RegistryOptions {
    /// Registry hostname; also the hostname of every resolved address.
    pub host: String,
    /// Skips service discovery and uses this `providers.v1` base URL directly.
    pub base_url: Option<Url>,
    /// Overrides `https://<host>/.well-known/terraform.json`.
    pub discovery_url: Option<Url>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            base_url: None,
            discovery_url: None,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Blocking HTTP client for the registry's legacy namespace lookup.
///
/// The client and the discovered service URL are created on first use and reused for every
/// later lookup.
#[derive(Debug)]
pub struct RegistrySource {
    options: RegistryOptions,
    client: OnceLock<Client>,
    providers_base: OnceLock<Url>,
}

#[derive(Debug, Deserialize)]
struct LegacyNamespace {
    namespace: String,
}

impl RegistrySource {
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            options,
            client: OnceLock::new(),
            providers_base: OnceLock::new(),
        }
    }

    /// A source for the default host that skips discovery and queries `base` directly.
    pub fn with_base_url(base: Url) -> Self {
        Self::with_options(RegistryOptions {
            base_url: Some(base),
            ..RegistryOptions::default()
        })
    }

    fn client(&self) -> Result<&Client, LookupError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = Client::builder()
            .connect_timeout(self.options.connect_timeout)
            .timeout(self.options.request_timeout)
            .user_agent(concat!("provup/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(self.client.get_or_init(|| client))
    }

    fn providers_base(&self) -> Result<&Url, LookupError> {
        if let Some(base) = self.providers_base.get() {
            return Ok(base);
        }
        let base = match &self.options.base_url {
            Some(url) => with_trailing_slash(url.clone()),
            None => self.discover()?,
        };
        debug!(host = %self.options.host, base = %base, "provider registry base");
        Ok(self.providers_base.get_or_init(|| base))
    }

    fn discover(&self) -> Result<Url, LookupError> {
        let discovery_url = match &self.options.discovery_url {
            Some(url) => url.clone(),
            None => Url::parse(&format!(
                "https://{}/.well-known/terraform.json",
                self.options.host
            ))?,
        };

        let res = self
            .client()?
            .get(discovery_url.clone())
            .header(ACCEPT, "application/json")
            .send()?;
        match res.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                return Err(LookupError::NoProviderService {
                    host: self.options.host.clone(),
                });
            }
            status => {
                return Err(LookupError::Status {
                    url: discovery_url,
                    status: status.as_u16(),
                });
            }
        }

        let services: serde_json::Value =
            res.json().map_err(|err| LookupError::InvalidResponse {
                url: discovery_url.clone(),
                message: err.to_string(),
            })?;
        let service = services
            .get(PROVIDERS_SERVICE)
            .and_then(|v| v.as_str())
            .ok_or_else(|| LookupError::NoProviderService {
                host: self.options.host.clone(),
            })?;

        Ok(with_trailing_slash(discovery_url.join(service)?))
    }
}

impl Default for RegistrySource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderSource for RegistrySource {
    fn lookup_legacy(&self, legacy: &ProviderAddr) -> Result<ProviderAddr, LookupError> {
        let url = self
            .providers_base()?
            .join(&format!("-/{}", legacy.type_name))?;
        debug!(url = %url, "legacy provider lookup");

        let res = self
            .client()?
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()?;
        match res.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                return Err(LookupError::NotKnown {
                    addr: legacy.clone(),
                });
            }
            status => {
                return Err(LookupError::Status {
                    url,
                    status: status.as_u16(),
                });
            }
        }

        let body: LegacyNamespace = res.json().map_err(|err| LookupError::InvalidResponse {
            url: url.clone(),
            message: err.to_string(),
        })?;
        if body.namespace.is_empty() {
            return Err(LookupError::InvalidResponse {
                url,
                message: "empty namespace".to_string(),
            });
        }

        Ok(ProviderAddr::new(
            self.options.host.clone(),
            body.namespace.to_ascii_lowercase(),
            legacy.type_name.clone(),
        ))
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
