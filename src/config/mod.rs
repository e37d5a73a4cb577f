#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

use crate::core::coordinator::DEFAULT_DRAIN_TIMEOUT;
use crate::core::probe::DEFAULT_SIGNATURE;
use crate::domain::model::{ArtifactMode, DEFAULT_PORTS};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty, validate_path, validate_ports, validate_positive_number,
    validate_timeout, Validate,
};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 64;

/// Fully resolved scan settings, after merging defaults, the optional TOML
/// file and command line overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSettings {
    pub ports: Vec<u16>,
    pub concurrency: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub resolve_timeout: Duration,
    pub drain_timeout: Duration,
    pub output_dir: PathBuf,
    pub artifact_mode: ArtifactMode,
    pub signature: String,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            ports: DEFAULT_PORTS.to_vec(),
            concurrency: DEFAULT_CONCURRENCY,
            connect_timeout: Duration::from_secs(3),
            request_timeout: Duration::from_secs(10),
            resolve_timeout: Duration::from_secs(5),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            output_dir: PathBuf::from("."),
            artifact_mode: ArtifactMode::default(),
            signature: DEFAULT_SIGNATURE.to_string(),
        }
    }
}

impl Validate for ScanSettings {
    fn validate(&self) -> Result<()> {
        validate_ports("ports", &self.ports)?;
        validate_positive_number("concurrency", self.concurrency, 1)?;
        validate_timeout("connect_timeout", self.connect_timeout)?;
        validate_timeout("request_timeout", self.request_timeout)?;
        validate_timeout("resolve_timeout", self.resolve_timeout)?;
        validate_path("output_dir", &self.output_dir.to_string_lossy())?;
        validate_non_empty("signature", &self.signature)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = ScanSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.ports, vec![8888, 8889, 8890, 30000]);
        assert_eq!(settings.signature, "jupyterlab");
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let settings = ScanSettings {
            request_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
