//! scrub-core: block selection, stripe verification, and autosave for a
//! file-level RAID scrub.
//!
//! This crate holds the logic of a read-only integrity pass over a
//! parity-protected array. It knows nothing about on-disk formats,
//! network protocols, or CLI surfaces — those live behind the traits in
//! [`disk`], [`parity`], [`hash`], [`raid`], [`info`] and
//! [`state_writer`], implemented by whatever binary embeds this crate.

pub mod autosave;
pub mod disk;
pub mod engine;
pub mod error;
pub mod hash;
pub mod info;
pub mod parity;
pub mod plan;
pub mod progress;
pub mod raid;
pub mod state_writer;
pub mod stripe;

pub use engine::{run_scrub, BlockOutcome, ScrubConfig, ScrubOutcome};
pub use error::ScrubError;
