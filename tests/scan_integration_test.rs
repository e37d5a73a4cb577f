use httpmock::prelude::*;
use jupyter_scanner::{
    AddressRange, ArtifactMode, CancellationToken, LocalArtifactStore, ProbeExecutor,
    ProbeOutcome, ProbeTarget, ScanCoordinator, ScanError, ScanSettings,
};
use std::collections::HashSet;
use std::net::TcpListener;
use std::time::Duration;
use tempfile::TempDir;

fn test_settings(dir: &TempDir, mode: ArtifactMode) -> ScanSettings {
    ScanSettings {
        connect_timeout: Duration::from_millis(500),
        request_timeout: Duration::from_millis(500),
        output_dir: dir.path().to_path_buf(),
        artifact_mode: mode,
        ..Default::default()
    }
}

fn coordinator(settings: &ScanSettings) -> ScanCoordinator<ProbeExecutor<LocalArtifactStore>> {
    let store = LocalArtifactStore::new(settings.output_dir.clone(), settings.artifact_mode);
    let executor = ProbeExecutor::new(store, settings).unwrap();
    ScanCoordinator::new(executor, settings.concurrency)
        .with_drain_timeout(Duration::from_millis(500))
}

async fn jupyter_server(favicon: &'static [u8]) -> MockServer {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/lab");
            then.status(200)
                .body("<html><script src=\"/static/jupyterlab/main.js\"></script></html>");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/lab/favicon.ico");
            then.status(200).body(favicon);
        })
        .await;
    server
}

async fn plain_server() -> MockServer {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/lab");
            then.status(200).body("<html>It works!</html>");
        })
        .await;
    server
}

fn closed_port() -> u16 {
    distinct_closed_ports(1)[0]
}

/// All listeners stay bound until every port is read, so the OS cannot hand
/// the same ephemeral port out twice.
fn distinct_closed_ports(count: usize) -> Vec<u16> {
    let listeners: Vec<TcpListener> = (0..count)
        .map(|_| TcpListener::bind("127.0.0.1:0").unwrap())
        .collect();
    listeners
        .iter()
        .map(|listener| listener.local_addr().unwrap().port())
        .collect()
}

#[test]
fn test_distinct_closed_ports_are_unique() {
    let ports = distinct_closed_ports(20);
    let unique: std::collections::HashSet<u16> = ports.iter().copied().collect();
    assert_eq!(unique.len(), 20);
}

#[tokio::test]
async fn test_scan_reports_every_probe_and_counts_matches() {
    let temp_dir = TempDir::new().unwrap();
    let jupyter = jupyter_server(&[0x00, 0x01, 0x02]).await;
    let plain = plain_server().await;
    let ports = [jupyter.port(), plain.port(), closed_port()];

    let settings = test_settings(&temp_dir, ArtifactMode::PerTarget);
    let range = AddressRange::parse("127.0.0.1-127.0.0.1").unwrap();
    let mut outcomes: Vec<(ProbeTarget, ProbeOutcome)> = Vec::new();

    let summary = coordinator(&settings)
        .run(
            &range,
            &ports,
            |target, outcome| outcomes.push((target, outcome.clone())),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(summary.scanned, 3);
    assert_eq!(outcomes.len(), 3);
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.artifacts_saved, 1);

    let matched: Vec<_> = outcomes.iter().filter(|(_, o)| o.is_match()).collect();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].0.port, jupyter.port());

    let path = matched[0].1.artifact_path().unwrap();
    assert_eq!(std::fs::read(path).unwrap(), vec![0x00, 0x01, 0x02]);
}

#[tokio::test]
async fn test_shared_artifact_holds_one_complete_favicon() {
    let temp_dir = TempDir::new().unwrap();
    let first = jupyter_server(&[0xAA; 2048]).await;
    let second = jupyter_server(&[0xBB; 2048]).await;

    let settings = test_settings(&temp_dir, ArtifactMode::Shared);
    let range = AddressRange::single("127.0.0.1".parse().unwrap());

    let summary = coordinator(&settings)
        .run(
            &range,
            &[first.port(), second.port()],
            |_, _| {},
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(summary.matched, 2);
    let data = std::fs::read(temp_dir.path().join("jupyter_lab_banner.ico")).unwrap();
    assert_eq!(data.len(), 2048);
    assert!(data.iter().all(|&b| b == data[0]));
    assert!(data[0] == 0xAA || data[0] == 0xBB);
}

#[tokio::test]
async fn test_repeated_scans_detect_same_targets() {
    let temp_dir = TempDir::new().unwrap();
    let jupyter = jupyter_server(&[1]).await;
    let plain = plain_server().await;

    let settings = test_settings(&temp_dir, ArtifactMode::PerTarget);
    let scanner = coordinator(&settings);
    let range = AddressRange::single("127.0.0.1".parse().unwrap());
    let ports = [jupyter.port(), plain.port()];

    let mut runs = Vec::new();
    for _ in 0..2 {
        let mut found = HashSet::new();
        scanner
            .run(
                &range,
                &ports,
                |target, outcome| {
                    if outcome.is_match() {
                        found.insert(target);
                    }
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        runs.push(found);
    }

    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[0].len(), 1);
}

#[tokio::test]
async fn test_cancelled_scan_returns_partial_counts() {
    let temp_dir = TempDir::new().unwrap();
    let settings = ScanSettings {
        concurrency: 1,
        ..test_settings(&temp_dir, ArtifactMode::PerTarget)
    };
    let range = AddressRange::parse("127.0.0.1-127.0.0.1").unwrap();
    let ports = distinct_closed_ports(20);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let mut reported = 0u64;

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        coordinator(&settings).run(
            &range,
            &ports,
            |_, _| {
                reported += 1;
                if reported == 3 {
                    trigger.cancel();
                }
            },
            &cancel,
        ),
    )
    .await
    .expect("scan should stop promptly");

    match result {
        Err(ScanError::CancelledError { scanned, matched }) => {
            assert_eq!(scanned, 3);
            assert_eq!(matched, 0);
        }
        other => panic!("expected cancellation, got {:?}", other),
    }
    assert_eq!(reported, 3);
}
