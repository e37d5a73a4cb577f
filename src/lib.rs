pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{ScanSettings, TomlConfig};

pub use adapters::LocalArtifactStore;
pub use core::{coordinator::ScanCoordinator, probe::ProbeExecutor};
pub use domain::model::{AddressRange, ArtifactMode, ProbeOutcome, ProbeTarget, ScanSummary};
pub use domain::ports::{ArtifactStore, Prober};
pub use tokio_util::sync::CancellationToken;
pub use utils::error::{Result, ScanError};
