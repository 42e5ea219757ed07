//! Progress reporting and cooperative cancellation, modeled on a
//! worker-task progress channel but reduced to the narrow synchronous
//! interface the core actually needs.

/// One distinct error class, used to build the structured log lines of
/// the structured log (`error:<i>:<source>:<kind>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    OpenError,
    ReadError,
    DataError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::OpenError => "Open error",
            ErrorKind::ReadError => "Read error",
            ErrorKind::DataError => "Data error",
        }
    }
}

/// Where a per-block error originated, for the `<source>`/`<path>` fields
/// of the structured log line (`error:<i>:<source>:<path>: <kind>` for a
/// disk source; parity/qarity carry no separate path).
#[derive(Debug, Clone)]
pub enum ErrorSource {
    Disk { label: String, path: String },
    Parity,
    Qarity,
}

/// Sink for user-facing progress and the structured error log.
///
/// `report` is called once per processed block with the running totals;
/// returning `true` requests cooperative cancellation
/// — the loop finishes the current block, then exits through teardown.
pub trait ProgressSink {
    fn begin(&mut self, total: usize);

    /// Returns `true` if the caller asked the run to stop.
    fn report(&mut self, index: usize, done: usize, total: usize, bytes: u64) -> bool;

    fn log_error(&mut self, index: usize, source: &ErrorSource, kind: ErrorKind);

    /// Paused/resumed around a synchronous autosave so that no
    /// progress line interleaves with the checkpoint write.
    fn pause(&mut self);
    fn resume(&mut self);

    fn end(&mut self);
}

/// A no-op sink, useful for tests and for embedding scrub-core where
/// progress reporting is not wired up yet.
#[derive(Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn begin(&mut self, _total: usize) {}
    fn report(&mut self, _index: usize, _done: usize, _total: usize, _bytes: u64) -> bool {
        false
    }
    fn log_error(&mut self, _index: usize, _source: &ErrorSource, _kind: ErrorKind) {}
    fn pause(&mut self) {}
    fn resume(&mut self) {}
    fn end(&mut self) {}
}
