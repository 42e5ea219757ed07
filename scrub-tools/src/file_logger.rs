use std::io::Write;

use anyhow::Error;

/// Options controlling a [`FileLogger`].
#[derive(Debug, Default)]
pub struct FileLogOptions {
    /// Open the underlying log file in append mode.
    pub append: bool,
    /// Duplicate logged lines to stdout, like `tee`.
    pub to_stdout: bool,
    /// Prefix logged lines with the current local time.
    pub prefix_time: bool,
}

/// Logs scrub progress and structured error lines to a file, optionally
/// mirroring them to stdout. This is the concrete backend for
/// `scrub_core::progress::ProgressSink`'s text output — it does not
/// implement the trait itself, since `scrub-core` must not depend on
/// I/O policy.
#[derive(Debug)]
pub struct FileLogger {
    file: std::fs::File,
    options: FileLogOptions,
}

/// Log a line to a [`FileLogger`], `write!`-style.
#[macro_export]
macro_rules! scrub_log {
    ($log:expr, $($arg:tt)*) => {
        $log.log(format!($($arg)*))
    };
}

impl FileLogger {
    pub fn new<P: AsRef<std::path::Path>>(path: P, options: FileLogOptions) -> Result<Self, Error> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(options.append)
            .open(path)?;
        Ok(Self { file, options })
    }

    pub fn log<S: AsRef<str>>(&mut self, msg: S) {
        let msg = msg.as_ref();
        let line = if self.options.prefix_time {
            format!("{} {}\n", now_rfc3339_ish(), msg)
        } else {
            format!("{msg}\n")
        };

        let _ = self.file.write_all(line.as_bytes());

        if self.options.to_stdout {
            let _ = std::io::stdout().write_all(line.as_bytes());
        }
    }
}

/// A minimal timestamp, intentionally not pulling in a date/time crate
/// for something only used to prefix log lines.
fn now_rfc3339_ish() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("[{secs}]")
}
