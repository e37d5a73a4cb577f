use crate::domain::model::{ProbeOutcome, ProbeTarget};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Probes a single target. Implementations contain every per-target failure
/// and report it as [`ProbeOutcome::NoService`].
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: ProbeTarget) -> ProbeOutcome;
}

pub trait ArtifactStore: Send + Sync {
    /// Persists `data` as the artifact for `target` and returns where it landed.
    fn save(
        &self,
        target: ProbeTarget,
        data: Vec<u8>,
    ) -> impl std::future::Future<Output = Result<PathBuf>> + Send;
}
