//! Configuration file loading for provup.
//!
//! Discovers and loads `provup.toml` from the module directory and merges it with CLI
//! arguments (CLI takes precedence).

use std::time::Duration;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use provup_core::discovery::{FileKind, classify};
use provup_core::{DEFAULT_OUTPUT_FILE, RegistryOptions};
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "provup.toml";

/// Top-level configuration from provup.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProvupConfig {
    pub registry: RegistryConfig,
    pub output: OutputConfig,
}

/// Registry section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Registry hostname, e.g. `registry.terraform.io`.
    pub host: Option<String>,

    /// Explicit `providers.v1` base URL; skips service discovery.
    pub base_url: Option<String>,

    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

/// Output section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// File that receives the consolidated block when no single existing file can.
    pub file_name: Option<String>,
}

/// Discover the provup.toml config file in `dir`.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.is_file() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a provup.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<ProvupConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<ProvupConfig> {
    let config: ProvupConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from `dir`, or return the default if there is none.
pub fn load_or_default(dir: &Utf8Path) -> anyhow::Result<ProvupConfig> {
    match discover_config(dir) {
        Some(path) => load_config(&path),
        None => Ok(ProvupConfig::default()),
    }
}

/// Configuration after merging the config file with CLI arguments.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub registry: RegistryOptions,
    pub output_file: String,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: ProvupConfig,
}

impl ConfigMerger {
    pub fn new(config: ProvupConfig) -> Self {
        Self { config }
    }

    /// CLI values replace file values; anything unset falls back to the built-in defaults.
    pub fn merge_args(
        self,
        cli_registry: Option<&str>,
        cli_registry_url: Option<&Url>,
        cli_output_file: Option<&str>,
    ) -> anyhow::Result<MergedConfig> {
        let file = self.config;
        let mut registry = RegistryOptions::default();

        if let Some(host) = cli_registry.map(str::to_string).or(file.registry.host) {
            registry.host = host;
        }
        registry.base_url = match cli_registry_url {
            Some(url) => Some(url.clone()),
            None => file
                .registry
                .base_url
                .as_deref()
                .map(|raw| {
                    Url::parse(raw).with_context(|| format!("invalid registry.base_url {:?}", raw))
                })
                .transpose()?,
        };
        if let Some(secs) = file.registry.connect_timeout_secs {
            registry.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.registry.request_timeout_secs {
            registry.request_timeout = Duration::from_secs(secs);
        }

        let output_file = cli_output_file
            .map(str::to_string)
            .or(file.output.file_name)
            .unwrap_or_else(|| DEFAULT_OUTPUT_FILE.to_string());
        validate_output_file(&output_file)?;

        Ok(MergedConfig {
            registry,
            output_file,
        })
    }
}

/// The output file is a primary `.tf` file name inside the module directory, so later runs
/// read it back.
fn validate_output_file(name: &str) -> anyhow::Result<()> {
    if name.contains('/') || name.contains('\\') {
        anyhow::bail!("output file {:?} must be a file name, not a path", name);
    }
    if !name.ends_with(".tf") || name.len() == ".tf".len() {
        anyhow::bail!("output file {:?} must end in .tf", name);
    }
    match classify(name) {
        Some(FileKind::Primary) => Ok(()),
        Some(FileKind::Override) => {
            anyhow::bail!("output file {:?} would be an override file", name)
        }
        _ => anyhow::bail!("output file {:?} would be ignored as configuration", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn parse_full_config() {
        let config = parse_config(
            r#"
[registry]
host = "registry.example.com"
base_url = "http://127.0.0.1:8080/v1/providers/"
connect_timeout_secs = 2
request_timeout_secs = 10

[output]
file_name = "versions.tf"
"#,
        )
        .unwrap();

        assert_eq!(config.registry.host.as_deref(), Some("registry.example.com"));
        assert_eq!(config.registry.connect_timeout_secs, Some(2));
        assert_eq!(config.output.file_name.as_deref(), Some("versions.tf"));
    }

    #[test]
    fn parse_empty_config() {
        let config = parse_config("").unwrap();
        assert!(config.registry.host.is_none());
        assert!(config.output.file_name.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config("[registry]\nhots = \"x\"\n").is_err());
        assert!(parse_config("[policy]\n").is_err());
    }

    #[test]
    fn merge_defaults() {
        let merged = ConfigMerger::new(ProvupConfig::default())
            .merge_args(None, None, None)
            .unwrap();
        assert_eq!(merged.registry.host, "registry.terraform.io");
        assert!(merged.registry.base_url.is_none());
        assert_eq!(merged.registry.request_timeout, Duration::from_secs(30));
        assert_eq!(merged.output_file, "providers.tf");
    }

    #[test]
    fn merge_file_values() {
        let config = parse_config(
            r#"
[registry]
host = "registry.example.com"
base_url = "http://127.0.0.1:8080/v1/providers/"
request_timeout_secs = 3

[output]
file_name = "versions.tf"
"#,
        )
        .unwrap();
        let merged = ConfigMerger::new(config)
            .merge_args(None, None, None)
            .unwrap();

        assert_eq!(merged.registry.host, "registry.example.com");
        assert_eq!(
            merged.registry.base_url.as_ref().map(Url::as_str),
            Some("http://127.0.0.1:8080/v1/providers/")
        );
        assert_eq!(merged.registry.request_timeout, Duration::from_secs(3));
        assert_eq!(merged.registry.connect_timeout, Duration::from_secs(5));
        assert_eq!(merged.output_file, "versions.tf");
    }

    #[test]
    fn cli_overrides_file() {
        let config = parse_config(
            r#"
[registry]
host = "registry.example.com"
base_url = "http://127.0.0.1:8080/v1/providers/"

[output]
file_name = "versions.tf"
"#,
        )
        .unwrap();
        let url = Url::parse("http://localhost:9000/p/").unwrap();
        let merged = ConfigMerger::new(config)
            .merge_args(Some("other.example.com"), Some(&url), Some("main.tf"))
            .unwrap();

        assert_eq!(merged.registry.host, "other.example.com");
        assert_eq!(merged.registry.base_url, Some(url));
        assert_eq!(merged.output_file, "main.tf");
    }

    #[test]
    fn invalid_values_are_errors() {
        let bad_url = parse_config("[registry]\nbase_url = \"not a url\"\n").unwrap();
        assert!(
            ConfigMerger::new(bad_url)
                .merge_args(None, None, None)
                .is_err()
        );

        for name in [
            "sub/providers.tf",
            "providers.txt",
            ".tf",
            "override.tf",
            "providers_override.tf",
            ".providers.tf",
        ] {
            assert!(
                ConfigMerger::new(ProvupConfig::default())
                    .merge_args(None, None, Some(name))
                    .is_err(),
                "{name}"
            );
        }
    }

    #[test]
    fn load_or_default_reads_dir() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();

        assert!(discover_config(dir).is_none());
        assert!(load_or_default(dir).unwrap().output.file_name.is_none());

        std::fs::write(
            dir.join(CONFIG_FILE_NAME),
            "[output]\nfile_name = \"versions.tf\"\n",
        )
        .unwrap();
        assert_eq!(
            load_or_default(dir).unwrap().output.file_name.as_deref(),
            Some("versions.tf")
        );
    }
}
