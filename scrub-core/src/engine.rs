//! Scrub loop and the per-block state machine.

use crate::autosave::AutosaveController;
use crate::disk::{BlockLocator, DiskPool};
use crate::error::ScrubError;
use crate::hash::{digest_eq, BlockHasher};
use crate::info::{BlockInfo, BlockInfoStore, CoarseTime};
use crate::parity::ParityStore;
use crate::plan::plan_selection;
use crate::progress::{ErrorKind, ErrorSource, ProgressSink};
use crate::raid::{ParityLevel, RaidGenerator};
use crate::state_writer::StateWriter;
use crate::stripe::StripeBuffers;

/// Terminal classification of one processed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    Skipped,
    Clean,
    Silent,
    Transient,
}

/// Tunables for one scrub run.
#[derive(Debug, Clone, Copy)]
pub struct ScrubConfig {
    pub block_size: usize,
    pub level: ParityLevel,
    /// Blocks to verify this run, before the recency guard is applied.
    pub requested_quota: usize,
    pub recency_guard: u32,
    /// Total autosave budget in bytes; 0 disables autosave.
    pub autosave_bytes: u64,
    /// Sequential-read hint passed through opaquely to the disk pool.
    pub sequential_hint: bool,
    pub block_start: usize,
}

/// Summary of one completed (or cooperatively stopped) run.
#[derive(Debug, Default, Clone)]
pub struct ScrubOutcome {
    pub visited: usize,
    pub clean: usize,
    pub silent: usize,
    pub transient: usize,
    pub error_count: usize,
    pub dirty: bool,
    pub stopped_early: bool,
}

impl ScrubOutcome {
    /// The run's overall result is failure if any error counter is
    /// nonzero at end.
    pub fn is_success(&self) -> bool {
        self.error_count == 0
    }
}

/// Runs one scrub pass over `[block_start, blockmax)` of the array,
/// verifying at most the planner's `countlimit` oldest-first blocks.
///
/// This is the core's single entry point.
#[allow(clippy::too_many_arguments)]
pub fn run_scrub(
    locator: &dyn BlockLocator,
    diskpool: &mut dyn DiskPool,
    info_store: &mut dyn BlockInfoStore,
    parity: &mut dyn ParityStore,
    state_writer: &mut dyn StateWriter,
    raid: &dyn RaidGenerator,
    hasher: &dyn BlockHasher,
    progress: &mut dyn ProgressSink,
    now: CoarseTime,
    config: ScrubConfig,
) -> Result<ScrubOutcome, ScrubError> {
    let diskmax = locator.disk_count();
    let blockmax = info_store.block_count();

    let plan = plan_selection(info_store, now, config.requested_quota, config.recency_guard)?;

    // Pre-pass: find blocklimit without doing any work.
    let mut counted = 0usize;
    let mut blocklimit = blockmax;
    for i in config.block_start..blockmax {
        let info = info_store.get(i);
        if info.is_used() && info.time() <= plan.timelimit {
            counted += 1;
            if counted >= plan.countlimit {
                blocklimit = i + 1;
                break;
            }
        }
    }

    let mut stripe = StripeBuffers::new(diskmax, config.level, config.block_size);
    let mut autosave = AutosaveController::new(config.autosave_bytes, diskmax, config.block_size);

    // `counted` (the pre-pass's actual achievable match count) is what
    // bounds progress reporting and autosave pacing, not `plan.countlimit`
    // — the recency guard can cap `timelimit` below `times[countlimit]`,
    // in which case fewer than `countlimit` blocks actually qualify.
    let total = counted;

    let mut outcome = ScrubOutcome::default();
    progress.begin(total);

    let mut countpos = 0usize;
    let run_result = (|| -> Result<(), ScrubError> {
        for i in config.block_start..blocklimit {
            let info = info_store.get(i);
            if !info.is_used() || info.time() > plan.timelimit {
                continue; // Skipped — does not advance countpos.
            }

            let (block_outcome, bytes_read, had_error) =
                process_one_block(i, info, locator, diskpool, parity, raid, hasher, progress, &mut stripe, &config, now)?;

            match block_outcome {
                BlockOutcome::Clean => {
                    info_store.set(i, BlockInfo::make(now, false));
                    info_store.mark_dirty();
                    outcome.clean += 1;
                }
                BlockOutcome::Silent => {
                    info_store.set(i, info.set_error());
                    info_store.mark_dirty();
                    outcome.silent += 1;
                }
                BlockOutcome::Transient => {
                    // Info unchanged: a transient error says nothing about the data.
                    outcome.transient += 1;
                }
                BlockOutcome::Skipped => unreachable!("skip filter already handled above"),
            }
            if had_error {
                outcome.error_count += 1;
            }
            outcome.visited += 1;
            countpos += 1;

            let stop_requested = progress.report(i, countpos, total, bytes_read);

            autosave.record_done();
            let missing = total.saturating_sub(countpos);
            if autosave.should_save(missing) {
                progress.pause();
                state_writer
                    .write()
                    .map_err(|_| ScrubError::InfoStore("autosave write failed".into()))?;
                progress.resume();
                autosave.reset();
            }

            if stop_requested {
                outcome.stopped_early = true;
                break;
            }
        }
        Ok(())
    })();

    // Teardown: close every handle on every exit path. Close failures
    // here are reported, not fatal.
    for slot in 0..diskmax {
        if let Some(path) = diskpool.open_file(slot).map(str::to_string) {
            if let Err(err) = diskpool.close(slot) {
                log::warn!("failed to close disk handle for slot {slot} during teardown: {err}");
                progress.log_error(
                    blockmax,
                    &ErrorSource::Disk { label: format!("disk{slot}"), path },
                    ErrorKind::OpenError,
                );
            }
        }
    }
    if let Err(err) = parity.close() {
        log::warn!("failed to close parity store during teardown: {err}");
    }

    progress.end();
    outcome.dirty = info_store.is_dirty();

    run_result?;
    Ok(outcome)
}

#[allow(clippy::too_many_arguments)]
fn process_one_block(
    index: usize,
    info: BlockInfo,
    locator: &dyn BlockLocator,
    diskpool: &mut dyn DiskPool,
    parity: &mut dyn ParityStore,
    raid: &dyn RaidGenerator,
    hasher: &dyn BlockHasher,
    progress: &mut dyn ProgressSink,
    stripe: &mut StripeBuffers,
    config: &ScrubConfig,
    _now: CoarseTime,
) -> Result<(BlockOutcome, u64, bool), ScrubError> {
    let _ = info;
    let diskmax = stripe.diskmax;
    let mut io_error = false;
    let mut hash_error = false;
    let mut bytes_read = 0u64;

    for slot in 0..diskmax {
        match locator.locate(slot, index) {
            None => {
                stripe.zero_fill(slot);
                continue;
            }
            Some(desc) => {
                let disk_source = || ErrorSource::Disk {
                    label: format!("disk{slot}"),
                    path: desc.file.clone(),
                };

                if let Some(open_path) = diskpool.open_file(slot).map(str::to_string) {
                    if open_path != desc.file {
                        if let Err(err) = diskpool.close(slot) {
                            log::error!("failed to close disk handle for slot {slot} mid-scan: {err}");
                            progress.log_error(
                                index,
                                &ErrorSource::Disk { label: format!("disk{slot}"), path: open_path },
                                ErrorKind::OpenError,
                            );
                            return Err(ScrubError::CloseFailed { slot, source: err });
                        }
                    }
                }

                if diskpool.get(slot, &desc.file, config.sequential_hint).is_err() {
                    io_error = true;
                    progress.log_error(index, &disk_source(), ErrorKind::OpenError);
                    stripe.zero_fill(slot);
                    continue;
                }

                let buf = stripe.data_slot(slot);
                if diskpool.read_at(slot, desc.position, buf).is_err() {
                    io_error = true;
                    progress.log_error(index, &disk_source(), ErrorKind::ReadError);
                    stripe.zero_fill(slot);
                    continue;
                }
                bytes_read += config.block_size as u64;

                if let Some(stored) = desc.stored_hash {
                    let computed = hasher.hash(stripe.data_slot(slot));
                    if !digest_eq(&computed, &stored) {
                        hash_error = true;
                        progress.log_error(index, &disk_source(), ErrorKind::DataError);
                    }
                }
            }
        }
    }

    let mut silent_error = hash_error;

    if !io_error && !hash_error {
        let p_slot = stripe.on_disk_p_slot();
        let p_read_ok = parity.read_p(index, &mut stripe.buffers[p_slot]).is_ok();
        if !p_read_ok {
            io_error = true;
            progress.log_error(index, &ErrorSource::Parity, ErrorKind::OpenError);
        }

        let q_read_ok = if config.level == ParityLevel::Dual {
            let q_slot = stripe.on_disk_q_slot();
            let ok = parity.read_q(index, &mut stripe.buffers[q_slot]).is_ok();
            if !ok {
                io_error = true;
                progress.log_error(index, &ErrorSource::Qarity, ErrorKind::OpenError);
            }
            ok
        } else {
            false
        };

        let computed_len = diskmax + config.level.parity_count();
        raid.generate(config.level, &mut stripe.buffers[..computed_len], diskmax, config.block_size);

        if p_read_ok {
            let computed_p = stripe.buffers[diskmax].clone();
            let on_disk_p = stripe.buffers[p_slot].clone();
            if computed_p != on_disk_p {
                silent_error = true;
                progress.log_error(index, &ErrorSource::Parity, ErrorKind::DataError);
            }
        }

        if config.level == ParityLevel::Dual && q_read_ok {
            let q_computed_slot = diskmax + 1;
            let q_slot = stripe.on_disk_q_slot();
            let computed_q = stripe.buffers[q_computed_slot].clone();
            let on_disk_q = stripe.buffers[q_slot].clone();
            if computed_q != on_disk_q {
                silent_error = true;
                progress.log_error(index, &ErrorSource::Qarity, ErrorKind::DataError);
            }
        }
    }

    let outcome = if io_error {
        BlockOutcome::Transient
    } else if silent_error {
        BlockOutcome::Silent
    } else {
        BlockOutcome::Clean
    };

    let had_error = io_error || silent_error;
    Ok((outcome, bytes_read, had_error))
}
