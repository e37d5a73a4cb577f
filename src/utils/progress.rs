use crate::domain::model::ProbeTarget;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;

/// Single status line on stderr, `Scanning <addr> (<n>/<total>)`.
///
/// Anything printed while a scan runs should go through [`ScanProgress::println`]
/// or [`ScanProgress::writer`] so the line is cleared first and redrawn after.
#[derive(Clone)]
pub struct ScanProgress {
    bar: ProgressBar,
}

impl ScanProgress {
    pub fn new(visible: bool) -> Self {
        if !visible {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        match ProgressStyle::with_template("{msg}") {
            Ok(style) => bar.set_style(style),
            Err(e) => tracing::debug!("progress template rejected: {}", e),
        }
        Self { bar }
    }

    pub fn start(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    pub fn record(&self, target: ProbeTarget) {
        self.bar.inc(1);
        self.bar.set_message(status_line(
            target,
            self.bar.position(),
            self.bar.length().unwrap_or(0),
        ));
    }

    pub fn scanned(&self) -> u64 {
        self.bar.position()
    }

    pub fn message(&self) -> String {
        self.bar.message()
    }

    /// Prints to stdout with the status line out of the way.
    pub fn println(&self, line: impl AsRef<str>) {
        self.bar.suspend(|| println!("{}", line.as_ref()));
    }

    pub fn eprintln(&self, line: impl AsRef<str>) {
        self.bar.suspend(|| eprintln!("{}", line.as_ref()));
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// stderr writer for the log subscriber.
    pub fn writer(&self) -> ProgressWriter {
        ProgressWriter {
            bar: self.bar.clone(),
        }
    }
}

pub fn status_line(target: ProbeTarget, scanned: u64, total: u64) -> String {
    format!("Scanning {} ({}/{})", target.address, scanned, total)
}

pub struct ProgressWriter {
    bar: ProgressBar,
}

impl Write for ProgressWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.bar.suspend(|| std::io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stderr().flush()
    }
}
