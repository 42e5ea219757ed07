mod array;
mod cli;
mod config;
mod hash;
mod progress;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::Ordering;

use anyhow::{Context, Error};

use array::{FsDiskPool, FsLocator, FsParityStore, InfoStoreHandle, JsonInfoStore, StateWriterHandle};
use config::ArrayConfig;
use hash::SipBlockHasher;
use progress::{FileProgressSink, STOP_REQUESTED};
use scrub_core::engine::{run_scrub, ScrubConfig};
use scrub_core::raid::XorRaidGenerator;
use scrub_tools::{FileLogOptions, FileLogger};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(-1);
    }
}

fn now_coarse() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

fn run() -> Result<(), Error> {
    let args = cli::Args::parse(std::env::args())?;

    if let Err(err) = syslog::init(syslog::Facility::LOG_DAEMON, log::LevelFilter::Info, Some("snapscrub")) {
        // Syslog is best-effort; fall back to stderr logging rather than
        // aborting a scrub because the daemon socket is unavailable.
        eprintln!("unable to initialize syslog, falling back to stderr logging: {err}");
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let config = ArrayConfig::load(&args.config_path)
        .with_context(|| format!("loading config '{}'", args.config_path))?;

    let info_store_path = config.info_path.clone();
    let info_store = JsonInfoStore::load(&info_store_path)
        .with_context(|| format!("loading block-info index '{info_store_path}'"))?;
    let blockmax = info_store.block_count();
    let info_store = Rc::new(RefCell::new(info_store));
    let mut info_store_handle = InfoStoreHandle(Rc::clone(&info_store));
    let mut state_writer_handle = StateWriterHandle(Rc::clone(&info_store));

    // The hash index lives alongside the info index in a real deployment;
    // the per-block stored hashes are looked up through the locator, not
    // persisted here, since the core only ever asks for them by index.
    let hashes: HashMap<usize, [u8; scrub_core::hash::HASH_SIZE]> = HashMap::new();
    let locator = FsLocator::new(&config, hashes);
    let diskmax = locator.disk_count();

    let mut diskpool = FsDiskPool::new(diskmax);
    let mut parity = FsParityStore::open(&config, blockmax)?;

    let hasher = SipBlockHasher::new(config.hash_seed_u64()?);
    let raid = XorRaidGenerator;

    let log_options = FileLogOptions {
        append: true,
        to_stdout: args.verbose,
        prefix_time: true,
    };
    let file_logger = FileLogger::new(&config.log_path, log_options)
        .with_context(|| format!("opening scrub log '{}'", config.log_path))?;
    let mut progress = FileProgressSink::new(file_logger, args.verbose);

    install_stop_handler();

    let scrub_config = ScrubConfig {
        block_size: config.block_size,
        level: config.level(),
        requested_quota: args.quota.unwrap_or(blockmax / config.count_quota_divisor.max(1)),
        recency_guard: args
            .recency_guard_days
            .unwrap_or(config.recency_guard_days)
            .saturating_mul(86400),
        autosave_bytes: args.autosave_bytes.unwrap_or(config.autosave_bytes),
        sequential_hint: true,
        block_start: 0,
    };

    let outcome = run_scrub(
        &locator,
        &mut diskpool,
        &mut info_store_handle,
        &mut parity,
        &mut state_writer_handle,
        &raid,
        &hasher,
        &mut progress,
        now_coarse(),
        scrub_config,
    )?;

    if outcome.dirty {
        info_store
            .borrow_mut()
            .write()
            .context("writing final block-info checkpoint")?;
    }

    log::info!(
        "scrub complete: visited={} clean={} silent={} transient={} stopped_early={}",
        outcome.visited,
        outcome.clean,
        outcome.silent,
        outcome.transient,
        outcome.stopped_early
    );

    if !outcome.is_success() {
        anyhow::bail!(
            "scrub completed with {} block error(s) ({} silent, {} transient)",
            outcome.error_count,
            outcome.silent,
            outcome.transient
        );
    }

    Ok(())
}

/// Installs a `SIGINT`/`SIGTERM` handler that flips a flag the progress
/// sink checks cooperatively, rather than terminating mid-I/O.
fn install_stop_handler() {
    unsafe {
        libc::signal(libc::SIGINT, handle_stop_signal as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handle_stop_signal as libc::sighandler_t);
    }
}

extern "C" fn handle_stop_signal(_sig: i32) {
    STOP_REQUESTED.store(true, Ordering::SeqCst);
}
