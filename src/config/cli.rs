use crate::config::{ScanSettings, TomlConfig};
use crate::core::resolver::resolve_ipv4;
use crate::domain::model::{AddressRange, ArtifactMode};
use crate::utils::error::{Result, ScanError};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "jupyter-scanner")]
#[command(about = "Scan an IPv4 range for exposed Jupyter Lab instances")]
pub struct CliConfig {
    /// IP address range in the format 'start_ip-end_ip'
    #[arg(short, long, conflicts_with = "host", required_unless_present = "host")]
    pub range: Option<String>,

    /// Single hostname or address to probe instead of a range
    #[arg(long)]
    pub host: Option<String>,

    /// Comma-separated ports to probe [default: 8888,8889,8890,30000]
    #[arg(short, long, value_delimiter = ',')]
    pub ports: Option<Vec<u16>>,

    /// Maximum number of probes in flight [default: 64]
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// TCP connect timeout in milliseconds
    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,

    /// Total timeout per HTTP request in milliseconds
    #[arg(long)]
    pub request_timeout_ms: Option<u64>,

    /// Timeout for resolving --host in milliseconds
    #[arg(long)]
    pub resolve_timeout_ms: Option<u64>,

    /// Grace period for in-flight probes after ctrl-c, in milliseconds
    #[arg(long)]
    pub drain_timeout_ms: Option<u64>,

    /// Directory favicon artifacts are written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Write every favicon to a single jupyter_lab_banner.ico
    #[arg(long)]
    pub single_artifact: bool,

    /// Body substring that identifies a Jupyter Lab page
    #[arg(long)]
    pub signature: Option<String>,

    /// Path to a TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print matches and the summary as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Hide the live progress line
    #[arg(short, long)]
    pub quiet: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Defaults, then the config file, then command line flags.
    pub fn to_settings(&self) -> Result<ScanSettings> {
        let base = match &self.config {
            Some(path) => TomlConfig::from_file(path)
                .map_err(|e| ScanError::ConfigValidationError {
                    field: "config".to_string(),
                    message: format!("{}: {}", path.display(), e),
                })?
                .to_settings(),
            None => ScanSettings::default(),
        };
        Ok(self.apply_to(base))
    }

    /// The range to scan. `--host` is resolved once here and a failed
    /// lookup is returned as an error instead of an empty scan.
    pub async fn target_range(&self, resolve_timeout: Duration) -> Result<AddressRange> {
        match (&self.range, &self.host) {
            (Some(range), _) => AddressRange::parse(range),
            (None, Some(host)) => {
                let address = resolve_ipv4(host, resolve_timeout).await?;
                tracing::info!("Resolved {} to {}", host, address);
                Ok(AddressRange::single(address))
            }
            (None, None) => Err(ScanError::parse("", "either --range or --host is required")),
        }
    }

    /// The live progress line only makes sense for human-readable output.
    pub fn show_progress(&self) -> bool {
        !self.json && !self.quiet
    }

    fn apply_to(&self, mut settings: ScanSettings) -> ScanSettings {
        if let Some(ports) = &self.ports {
            settings.ports = ports.clone();
        }
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        if let Some(ms) = self.connect_timeout_ms {
            settings.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.request_timeout_ms {
            settings.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.resolve_timeout_ms {
            settings.resolve_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.drain_timeout_ms {
            settings.drain_timeout = Duration::from_millis(ms);
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if self.single_artifact {
            settings.artifact_mode = ArtifactMode::Shared;
        }
        if let Some(signature) = &self.signature {
            settings.signature = signature.clone();
        }
        settings
    }
}
