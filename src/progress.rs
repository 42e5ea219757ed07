//! Concrete [`ProgressSink`]: mirrors structured error lines to a
//! [`FileLogger`] and periodic progress to the process-wide `log`
//! facade, the way a worker task splits "this task's own log" from
//! "the daemon's syslog".

use std::sync::atomic::{AtomicBool, Ordering};

use scrub_core::progress::{ErrorKind, ErrorSource, ProgressSink};
use scrub_tools::{scrub_log, FileLogger, HumanByte};

/// Emit a progress line at most this often, in blocks done, so a large
/// scrub doesn't flood the log with one line per block.
const REPORT_EVERY: usize = 64;

/// Flipped by the process's `SIGINT`/`SIGTERM` handler; `report` polls it
/// on every block boundary so a stop request never interrupts mid-read.
pub static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);

pub struct FileProgressSink {
    log: FileLogger,
    verbose: bool,
}

impl FileProgressSink {
    pub fn new(log: FileLogger, verbose: bool) -> Self {
        FileProgressSink { log, verbose }
    }
}

/// Renders the `<source>` and optional `<path>` segments of
/// `error:<i>:<source>:<path>: <kind>`. Disk sources carry both a slot
/// label and the file path that was open at the time; parity/qarity
/// have no separate path.
fn source_label(source: &ErrorSource) -> String {
    match source {
        ErrorSource::Disk { label, path } => format!("{label}:{path}"),
        ErrorSource::Parity => "parity".to_string(),
        ErrorSource::Qarity => "qarity".to_string(),
    }
}

impl ProgressSink for FileProgressSink {
    fn begin(&mut self, total: usize) {
        scrub_log!(self.log, "scrub started, {total} blocks planned");
        log::info!("scrub started, {total} blocks planned");
    }

    fn report(&mut self, index: usize, done: usize, total: usize, bytes: u64) -> bool {
        if self.verbose && (done % REPORT_EVERY == 0 || done == total) {
            scrub_log!(
                self.log,
                "{done}/{total} blocks (at index {index}), {} read",
                HumanByte::from(bytes)
            );
        }
        STOP_REQUESTED.load(Ordering::SeqCst)
    }

    fn log_error(&mut self, index: usize, source: &ErrorSource, kind: ErrorKind) {
        let line = format!("error:{index}:{}: {}", source_label(source), kind.as_str());
        scrub_log!(self.log, "{line}");
        log::warn!("{line}");
    }

    fn pause(&mut self) {
        scrub_log!(self.log, "-- autosave --");
    }

    fn resume(&mut self) {}

    fn end(&mut self) {
        scrub_log!(self.log, "scrub finished");
        log::info!("scrub finished");
    }
}
