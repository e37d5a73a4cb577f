pub mod coordinator;
pub mod probe;
pub mod resolver;

pub use crate::domain::model::{AddressRange, ProbeOutcome, ProbeTarget, ScanSummary};
pub use crate::domain::ports::{ArtifactStore, Prober};
pub use crate::utils::error::Result;
