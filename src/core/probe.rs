use crate::config::ScanSettings;
use crate::domain::model::{ProbeOutcome, ProbeTarget};
use crate::domain::ports::{ArtifactStore, Prober};
use crate::utils::error::Result;
use reqwest::{Client, StatusCode};

/// Substring that marks a Jupyter Lab page. It matches any page mentioning
/// the word, so false positives are possible.
pub const DEFAULT_SIGNATURE: &str = "jupyterlab";

/// Probes one target for a Jupyter Lab instance and fetches its favicon on a
/// match. Every network failure collapses to [`ProbeOutcome::NoService`].
pub struct ProbeExecutor<S: ArtifactStore> {
    client: Client,
    store: S,
    signature: String,
}

impl<S: ArtifactStore> ProbeExecutor<S> {
    pub fn new(store: S, settings: &ScanSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            store,
            signature: settings.signature.clone(),
        })
    }

    pub async fn probe_target(&self, target: ProbeTarget) -> ProbeOutcome {
        match self.fetch_lab_page(&target).await {
            Ok(body) if body.contains(&self.signature) => {}
            Ok(_) => return ProbeOutcome::NoService,
            Err(e) => {
                tracing::trace!("{} unreachable: {}", target, e);
                return ProbeOutcome::NoService;
            }
        }

        tracing::info!("Jupyter Lab instance found at {}", target);

        let favicon = match self.fetch_favicon(&target).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return ProbeOutcome::detected(target),
            Err(e) => {
                tracing::debug!("favicon fetch from {} failed: {}", target, e);
                return ProbeOutcome::detected(target);
            }
        };

        match self.store.save(target, favicon).await {
            Ok(path) => {
                tracing::info!("Saved favicon from {} to {}", target, path.display());
                ProbeOutcome::saved(target, path)
            }
            Err(e) => {
                tracing::warn!("{}", e);
                ProbeOutcome::detected(target)
            }
        }
    }

    async fn fetch_lab_page(&self, target: &ProbeTarget) -> Result<String> {
        let url = format!("http://{}/lab", target.socket_addr());
        let response = self.client.get(&url).send().await?;
        tracing::trace!("GET {} -> {}", url, response.status());
        Ok(response.text().await?)
    }

    /// `Ok(None)` when the server answers with anything but 200.
    async fn fetch_favicon(&self, target: &ProbeTarget) -> Result<Option<Vec<u8>>> {
        let url = format!("http://{}/lab/favicon.ico", target.socket_addr());
        let response = self.client.get(&url).send().await?;
        if response.status() != StatusCode::OK {
            tracing::debug!("GET {} -> {}, no artifact", url, response.status());
            return Ok(None);
        }
        Ok(Some(response.bytes().await?.to_vec()))
    }
}

#[async_trait::async_trait]
impl<S: ArtifactStore> Prober for ProbeExecutor<S> {
    async fn probe(&self, target: ProbeTarget) -> ProbeOutcome {
        self.probe_target(target).await
    }
}
