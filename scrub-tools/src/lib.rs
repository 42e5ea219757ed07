//! Shared ambient helpers for `snapscrub`: a dual file/stdout logger and
//! a human-readable byte-size formatter for progress lines.

mod file_logger;
mod human_byte;

pub use file_logger::{FileLogOptions, FileLogger};
pub use human_byte::HumanByte;
