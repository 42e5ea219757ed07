//! Selection planner: decides the time threshold and count cap
//! for "oldest-first" sampling.

use crate::error::ScrubError;
use crate::info::{BlockInfoStore, CoarseTime};

/// Default fraction of the array to consider per run (1/12).
pub const DEFAULT_COUNT_QUOTA_DIVISOR: usize = 12;

/// Default recency guard, in the same coarse time unit as [`BlockInfo`].
pub const DEFAULT_RECENCY_GUARD_DAYS: u32 = 10 * 86400;

/// Output of the planner: verify at most `countlimit` blocks whose
/// last-check time is `<= timelimit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub timelimit: CoarseTime,
    pub countlimit: usize,
}

/// Oldest-first block sampling with a quota and a recency guard.
///
/// `requested_quota` is the number of blocks the caller would like to
/// check this run (typically `used_count / DEFAULT_COUNT_QUOTA_DIVISOR`,
/// computed by the caller so the divisor stays a policy knob, not baked
/// into the planner). `recency_guard` floors how recently a block may
/// have been checked before it is eligible again.
pub fn plan_selection(
    store: &dyn BlockInfoStore,
    now: CoarseTime,
    requested_quota: usize,
    recency_guard: u32,
) -> Result<Plan, ScrubError> {
    let mut times: Vec<CoarseTime> = (0..store.block_count())
        .map(|i| store.get(i))
        .filter(|info| info.is_used())
        .map(|info| info.time())
        .collect();

    if times.is_empty() {
        return Err(ScrubError::EmptyArray);
    }

    times.sort_unstable();

    let countlimit = requested_quota.min(times.len() - 1);
    let mut timelimit = times[countlimit];

    let guarded = now.saturating_sub(recency_guard);
    if timelimit > guarded {
        timelimit = guarded;
    }

    log::debug!("scrub plan: countlimit={countlimit} timelimit={timelimit}");

    Ok(Plan {
        timelimit,
        countlimit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::BlockInfo;

    struct FakeStore(Vec<BlockInfo>);

    impl BlockInfoStore for FakeStore {
        fn block_count(&self) -> usize {
            self.0.len()
        }
        fn get(&self, index: usize) -> BlockInfo {
            self.0[index]
        }
        fn set(&mut self, index: usize, info: BlockInfo) {
            self.0[index] = info;
        }
        fn mark_dirty(&mut self) {}
        fn is_dirty(&self) -> bool {
            false
        }
    }

    #[test]
    fn empty_array_is_fatal() {
        let store = FakeStore(vec![BlockInfo::unused(); 5]);
        let err = plan_selection(&store, 1_000_000, 10, 0).unwrap_err();
        assert!(matches!(err, ScrubError::EmptyArray));
    }

    #[test]
    fn countlimit_clamped_to_used_minus_one() {
        let store = FakeStore(
            (1..=5)
                .map(|t| BlockInfo::make(t, false))
                .collect::<Vec<_>>(),
        );
        let plan = plan_selection(&store, 1_000_000, 100, 0).unwrap();
        assert_eq!(plan.countlimit, 4);
        assert_eq!(plan.timelimit, 5);
    }

    #[test]
    fn recency_guard_caps_timelimit() {
        let store = FakeStore(
            (1..=10)
                .map(|t| BlockInfo::make(t * 1000, false))
                .collect::<Vec<_>>(),
        );
        let now = 5000;
        let guard = 2000;
        let plan = plan_selection(&store, now, 9, guard).unwrap();
        // Unguarded timelimit would be times[9] = 10000, but now-guard=3000 caps it.
        assert_eq!(plan.timelimit, 3000);
    }

    #[test]
    fn oldest_first_quota_respected() {
        // S5-style: uniform times, countlimit small, guard large (never binds).
        let store = FakeStore(
            (0..120)
                .map(|i| BlockInfo::make(i + 1, false))
                .collect::<Vec<_>>(),
        );
        let plan = plan_selection(&store, 10_000_000, 10, 0).unwrap();
        assert_eq!(plan.countlimit, 10);
        assert_eq!(plan.timelimit, 11); // times[10] == 11 (1-indexed values)
    }
}
