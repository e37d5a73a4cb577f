//! Drives the whole probe space through a [`Prober`] with a hard cap on
//! concurrently running probes.
//!
//! Targets are produced lazily from the [`AddressRange`], so the memory
//! footprint depends on the concurrency limit and not on the range size.
//! Every finished probe is handed to the caller's callback as soon as it
//! completes. Cancellation stops dispatch at once; probes already running
//! get a bounded drain window and are aborted afterwards.

use crate::domain::model::{AddressRange, ProbeOutcome, ProbeTarget, ScanSummary};
use crate::domain::ports::Prober;
use crate::utils::error::{Result, ScanError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{Id, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ScanCoordinator<P: Prober + 'static> {
    prober: Arc<P>,
    concurrency: usize,
    drain_timeout: Duration,
}

impl<P: Prober + 'static> ScanCoordinator<P> {
    /// `concurrency` below 1 is treated as 1.
    pub fn new(prober: P, concurrency: usize) -> Self {
        Self {
            prober: Arc::new(prober),
            concurrency: concurrency.max(1),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// How long in-flight probes may keep running after cancellation.
    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    /// Probes every `(address, port)` pair of `range × ports` once.
    ///
    /// Duplicate ports are ignored. Returns the summary when the whole space
    /// has been probed, or [`ScanError::CancelledError`] carrying the partial
    /// counts if `cancel` fired first.
    pub async fn run<F>(
        &self,
        range: &AddressRange,
        ports: &[u16],
        mut on_outcome: F,
        cancel: &CancellationToken,
    ) -> Result<ScanSummary>
    where
        F: FnMut(ProbeTarget, &ProbeOutcome),
    {
        let started = Instant::now();
        let ports = dedup_ports(ports);
        let total = range.len() * ports.len() as u64;

        tracing::info!(
            "Scanning {} ({} targets, concurrency {})",
            range,
            total,
            self.concurrency
        );

        let mut targets = range.probe_targets(&ports);
        let mut in_flight: JoinSet<(ProbeTarget, ProbeOutcome)> = JoinSet::new();
        let mut pending: HashMap<Id, ProbeTarget> = HashMap::new();
        let mut summary = ScanSummary::default();
        let mut exhausted = false;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            while !exhausted && in_flight.len() < self.concurrency {
                match targets.next() {
                    Some(target) => {
                        let prober = Arc::clone(&self.prober);
                        let handle =
                            in_flight.spawn(async move { (target, prober.probe(target).await) });
                        pending.insert(handle.id(), target);
                    }
                    None => exhausted = true,
                }
            }

            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(joined) = in_flight.join_next_with_id() => {
                    let (target, outcome) = settle(joined, &mut pending);
                    summary.record(&outcome);
                    on_outcome(target, &outcome);
                }
            }
        }

        if cancel.is_cancelled() {
            self.drain(&mut in_flight, &mut pending, &mut summary, &mut on_outcome)
                .await;
            tracing::warn!(
                "Scan cancelled after {} of {} probes",
                summary.scanned,
                total
            );
            return Err(ScanError::CancelledError {
                scanned: summary.scanned,
                matched: summary.matched,
            });
        }

        summary.elapsed = started.elapsed();
        tracing::info!(
            "Scan finished: {} probes, {} matches in {:?}",
            summary.scanned,
            summary.matched,
            summary.elapsed
        );
        Ok(summary)
    }

    /// Lets running probes finish within the drain window, then aborts the
    /// rest. Aborted probes produce no outcome.
    async fn drain<F>(
        &self,
        in_flight: &mut JoinSet<(ProbeTarget, ProbeOutcome)>,
        pending: &mut HashMap<Id, ProbeTarget>,
        summary: &mut ScanSummary,
        on_outcome: &mut F,
    ) where
        F: FnMut(ProbeTarget, &ProbeOutcome),
    {
        let deadline = tokio::time::sleep(self.drain_timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                joined = in_flight.join_next_with_id() => match joined {
                    Some(joined) => {
                        let (target, outcome) = settle(joined, pending);
                        summary.record(&outcome);
                        on_outcome(target, &outcome);
                    }
                    None => return,
                },
            }
        }

        tracing::debug!("Aborting {} in-flight probes", in_flight.len());
        in_flight.shutdown().await;
    }
}

/// Maps a finished task back to its target. A probe that panicked still
/// counts, as `NoService`.
fn settle(
    joined: std::result::Result<(Id, (ProbeTarget, ProbeOutcome)), JoinError>,
    pending: &mut HashMap<Id, ProbeTarget>,
) -> (ProbeTarget, ProbeOutcome) {
    match joined {
        Ok((id, result)) => {
            pending.remove(&id);
            result
        }
        Err(e) => {
            let target = pending.remove(&e.id());
            tracing::error!("Probe task for {:?} failed: {}", target, e);
            (
                target.unwrap_or_else(|| ProbeTarget::new(std::net::Ipv4Addr::UNSPECIFIED, 0)),
                ProbeOutcome::NoService,
            )
        }
    }
}

/// First occurrence wins, so probe order follows the caller's list.
fn dedup_ports(ports: &[u16]) -> Vec<u16> {
    let mut seen = HashSet::with_capacity(ports.len());
    ports
        .iter()
        .copied()
        .filter(|port| seen.insert(*port))
        .collect()
}
