use crate::config::ScanSettings;
use crate::domain::model::ArtifactMode;
use crate::utils::error::{Result, ScanError};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Optional scan configuration file. Every table and key may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub scan: ScanSection,
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanSection {
    pub ports: Option<Vec<u16>>,
    pub concurrency: Option<usize>,
    pub signature: Option<String>,
    pub drain_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub resolve_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    pub directory: Option<PathBuf>,
    pub artifact_mode: Option<ArtifactMode>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScanError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ScanError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are
    /// left untouched.
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex");

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// Layers this file over `base`.
    pub fn apply_to(&self, mut base: ScanSettings) -> ScanSettings {
        if let Some(ports) = &self.scan.ports {
            base.ports = ports.clone();
        }
        if let Some(concurrency) = self.scan.concurrency {
            base.concurrency = concurrency;
        }
        if let Some(signature) = &self.scan.signature {
            base.signature = signature.clone();
        }
        if let Some(ms) = self.scan.drain_timeout_ms {
            base.drain_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.http.connect_timeout_ms {
            base.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.http.request_timeout_ms {
            base.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.http.resolve_timeout_ms {
            base.resolve_timeout = Duration::from_millis(ms);
        }
        if let Some(dir) = &self.output.directory {
            base.output_dir = dir.clone();
        }
        if let Some(mode) = self.output.artifact_mode {
            base.artifact_mode = mode;
        }
        base
    }

    pub fn to_settings(&self) -> ScanSettings {
        self.apply_to(ScanSettings::default())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.to_settings().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[scan]
ports = [8888, 9999]
concurrency = 16
signature = "JupyterLab"

[http]
connect_timeout_ms = 500
request_timeout_ms = 2000

[output]
directory = "./artifacts"
artifact_mode = "shared"
"#;

        let settings = TomlConfig::from_toml_str(toml_content)
            .unwrap()
            .to_settings();

        assert_eq!(settings.ports, vec![8888, 9999]);
        assert_eq!(settings.concurrency, 16);
        assert_eq!(settings.signature, "JupyterLab");
        assert_eq!(settings.connect_timeout, Duration::from_millis(500));
        assert_eq!(settings.request_timeout, Duration::from_secs(2));
        assert_eq!(settings.output_dir, PathBuf::from("./artifacts"));
        assert_eq!(settings.artifact_mode, ArtifactMode::Shared);
    }

    #[test]
    fn test_empty_file_keeps_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.to_settings(), ScanSettings::default());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("JUPYTER_SCANNER_TEST_DIR", "/tmp/scan-artifacts");

        let toml_content = r#"
[output]
directory = "${JUPYTER_SCANNER_TEST_DIR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.output.directory,
            Some(PathBuf::from("/tmp/scan-artifacts"))
        );

        std::env::remove_var("JUPYTER_SCANNER_TEST_DIR");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = TomlConfig::from_toml_str("[scan]\nthreads = 4\n").unwrap_err();
        assert!(matches!(err, ScanError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str("[scan]\nports = []\n").unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[scan]\nconcurrency = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[scan]\nports = [30000]\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.to_settings().ports, vec![30000]);
    }
}
