use clap::Parser;
use colored::Colorize;
use jupyter_scanner::utils::error::ErrorSeverity;
use jupyter_scanner::utils::progress::ScanProgress;
use jupyter_scanner::utils::{logger, validation::Validate};
use jupyter_scanner::{
    CancellationToken, CliConfig, LocalArtifactStore, ProbeExecutor, ProbeOutcome, ProbeTarget,
    ScanCoordinator, ScanError, ScanSummary,
};

const BANNER: &str = r#"
     _                   _              ___
  _ | |_  _ _ __ _  _ __| |_ ___ _ _  / __| __ __ _ _ _  _ _  ___ _ _
 | || | || | '_ \ || |  _|  _/ -_) '_| \__ \/ _/ _` | ' \| ' \/ -_) '_|
  \__/ \_,_| .__/\_, |\__|\__\___|_|   |___/\__\__,_|_||_|_||_\___|_|
           |_|   |__/
"#;

fn exit_code(error: &ScanError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(error: &ScanError) -> ! {
    tracing::error!(
        "{} (Category: {:?}, Severity: {:?})",
        error,
        error.category(),
        error.severity()
    );
    eprintln!("❌ {}", error.user_friendly_message());
    eprintln!("💡 {}", error.recovery_suggestion());
    std::process::exit(exit_code(error));
}

fn report(target: ProbeTarget, outcome: &ProbeOutcome, json: bool, progress: &ScanProgress) {
    progress.record(target);

    if json {
        if outcome.is_match() {
            println!(
                "{}",
                serde_json::json!({ "target": target, "outcome": outcome })
            );
        }
        return;
    }

    match outcome {
        ProbeOutcome::NoService => tracing::debug!("No service at {}", target),
        ProbeOutcome::ServiceDetected { address, port } => {
            progress.println(
                format!("Jupyter Lab instance found at IP: {}, Port: {}", address, port)
                    .green()
                    .to_string(),
            );
        }
        ProbeOutcome::ArtifactSaved {
            address,
            port,
            path,
        } => {
            progress.println(
                format!("Jupyter Lab instance found at IP: {}, Port: {}", address, port)
                    .green()
                    .to_string(),
            );
            progress.println(
                format!("Jupyter Lab banner saved as {}", path.display())
                    .green()
                    .to_string(),
            );
        }
    }
}

fn print_summary(summary: &ScanSummary, json: bool) {
    if json {
        println!("{}", serde_json::json!({ "summary": summary }));
    } else {
        println!(
            "Scan completed. {} probes, {} instances found, {} banners saved ({:.1}s)",
            summary.scanned,
            summary.matched,
            summary.artifacts_saved,
            summary.elapsed.as_secs_f64()
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    let progress = ScanProgress::new(config.show_progress());

    let log_progress = progress.clone();
    let log_writer = move || log_progress.writer();
    if config.log_json {
        logger::init_json_logger_with_writer(config.verbose, log_writer);
    } else {
        logger::init_cli_logger_with_writer(config.verbose, log_writer);
    }

    if !config.json {
        println!("{}", BANNER);
    }
    tracing::debug!("CLI config: {:?}", config);

    let settings = match config.to_settings() {
        Ok(settings) => settings,
        Err(e) => fail(&e),
    };
    if let Err(e) = settings.validate() {
        fail(&e);
    }

    let range = match config.target_range(settings.resolve_timeout).await {
        Ok(range) => range,
        Err(e) => fail(&e),
    };

    let store = LocalArtifactStore::new(settings.output_dir.clone(), settings.artifact_mode);
    let executor = match ProbeExecutor::new(store, &settings) {
        Ok(executor) => executor,
        Err(e) => fail(&e),
    };
    let coordinator = ScanCoordinator::new(executor, settings.concurrency)
        .with_drain_timeout(settings.drain_timeout);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let signal_progress = progress.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_progress.eprintln("\nScan interrupted by user. Exiting.");
            on_signal.cancel();
        }
    });

    let json = config.json;
    progress.start(range.len().saturating_mul(settings.ports.len() as u64));
    let result = coordinator
        .run(
            &range,
            &settings.ports,
            |target, outcome| report(target, outcome, json, &progress),
            &cancel,
        )
        .await;
    progress.finish();

    match result {
        Ok(summary) => print_summary(&summary, json),
        Err(e @ ScanError::CancelledError { .. }) => {
            tracing::info!("{}", e);
            eprintln!("{}", e.user_friendly_message());
            std::process::exit(exit_code(&e));
        }
        Err(e) => fail(&e),
    }

    Ok(())
}
