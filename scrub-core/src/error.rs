use thiserror::Error;

/// Fatal errors that abort a scrub run before or during the main loop.
///
/// Transient and silent per-block errors are *not* represented here — they
/// are recorded into the block's info record and the run's error counters
/// instead of being propagated, per the block classification rules.
#[derive(Debug, Error)]
pub enum ScrubError {
    #[error("array has no used blocks to scrub")]
    EmptyArray,

    #[error("failed to open parity file: {0}")]
    ParityOpenFailed(String),

    #[error("failed to close disk handle for slot {slot} mid-scan: {source}")]
    CloseFailed {
        slot: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("block-info store error: {0}")]
    InfoStore(String),
}
