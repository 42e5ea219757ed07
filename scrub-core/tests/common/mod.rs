//! Shared test fixtures: an in-memory array standing in for the real
//! disk/parity/state-store collaborators that are out of scope for
//! scrub-core itself.

use std::collections::HashMap;

use scrub_core::disk::{BlockDescriptor, BlockLocator, DiskPool};
use scrub_core::hash::{BlockHasher, HASH_SIZE};
use scrub_core::info::{BlockInfo, BlockInfoStore};
use scrub_core::parity::ParityStore;
use scrub_core::progress::{ErrorKind, ErrorSource, ProgressSink};
use scrub_core::raid::ParityLevel;
use scrub_core::state_writer::StateWriter;

pub struct MemFile {
    pub data: Vec<u8>,
}

/// A tiny keyed hash good enough to distinguish corrupted bytes in
/// tests; not cryptographically meaningful.
pub struct TestHasher {
    pub seed: u64,
}

impl BlockHasher for TestHasher {
    fn hash(&self, data: &[u8]) -> [u8; HASH_SIZE] {
        let mut state = self.seed;
        for &b in data {
            state = state.wrapping_mul(1099511628211).wrapping_add(b as u64);
        }
        let mut out = [0u8; HASH_SIZE];
        out[..8].copy_from_slice(&state.to_le_bytes());
        out[8..].copy_from_slice(&state.rotate_left(17).to_le_bytes());
        out
    }
}

pub struct MockLocator {
    pub diskmax: usize,
    // slot -> index -> (file name, position)
    pub blocks: Vec<HashMap<usize, (String, u64)>>,
    pub hasher: TestHasher,
    pub files: HashMap<String, MemFile>,
    pub block_size: usize,
}

impl MockLocator {
    pub fn stored_hash_for(&self, file: &str, position: u64) -> [u8; HASH_SIZE] {
        let f = &self.files[file];
        let start = position as usize;
        let end = start + self.block_size;
        self.hasher.hash(&f.data[start..end])
    }
}

impl BlockLocator for MockLocator {
    fn locate(&self, slot: usize, index: usize) -> Option<BlockDescriptor> {
        let (file, position) = self.blocks[slot].get(&index)?.clone();
        let stored_hash = Some(self.stored_hash_for(&file, position));
        Some(BlockDescriptor {
            file,
            position,
            stored_hash,
        })
    }

    fn disk_count(&self) -> usize {
        self.diskmax
    }
}

#[derive(Default)]
pub struct MockDiskPool {
    pub open: Vec<Option<String>>,
    pub files: HashMap<String, Vec<u8>>,
    pub fail_open: HashMap<(usize, String), ()>,
    pub fail_read: HashMap<(usize, u64), ()>,
    /// Slots whose `close` call fails every time, simulating the
    /// mid-scan close failure that §4.2/§9 treats as fatal.
    pub fail_close: std::collections::HashSet<usize>,
    pub close_calls: Vec<usize>,
}

impl MockDiskPool {
    pub fn new(diskmax: usize, files: HashMap<String, Vec<u8>>) -> Self {
        MockDiskPool {
            open: vec![None; diskmax],
            files,
            fail_open: HashMap::new(),
            fail_read: HashMap::new(),
            fail_close: std::collections::HashSet::new(),
            close_calls: Vec::new(),
        }
    }
}

impl DiskPool for MockDiskPool {
    fn get(&mut self, slot: usize, file: &str, _sequential_hint: bool) -> std::io::Result<()> {
        if self.fail_open.contains_key(&(slot, file.to_string())) {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "mock open failure"));
        }
        self.open[slot] = Some(file.to_string());
        Ok(())
    }

    fn read_at(&mut self, slot: usize, position: u64, buf: &mut [u8]) -> std::io::Result<()> {
        if self.fail_read.contains_key(&(slot, position)) {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "mock read failure"));
        }
        let file = self.open[slot].as_ref().expect("slot must be open before read");
        let data = &self.files[file];
        let start = position as usize;
        buf.copy_from_slice(&data[start..start + buf.len()]);
        Ok(())
    }

    fn close(&mut self, slot: usize) -> std::io::Result<()> {
        self.close_calls.push(slot);
        if self.fail_close.contains(&slot) {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "mock close failure"));
        }
        self.open[slot] = None;
        Ok(())
    }

    fn open_file(&self, slot: usize) -> Option<&str> {
        self.open[slot].as_deref()
    }
}

pub struct MockParityStore {
    pub level: ParityLevel,
    pub p: HashMap<usize, Vec<u8>>,
    pub q: HashMap<usize, Vec<u8>>,
    pub fail_p: std::collections::HashSet<usize>,
    pub fail_q: std::collections::HashSet<usize>,
    pub blockmax: usize,
}

impl ParityStore for MockParityStore {
    fn level(&self) -> ParityLevel {
        self.level
    }

    fn block_count(&self) -> usize {
        self.blockmax
    }

    fn read_p(&mut self, index: usize, buf: &mut [u8]) -> std::io::Result<()> {
        if self.fail_p.contains(&index) {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "mock parity read failure"));
        }
        buf.copy_from_slice(&self.p[&index]);
        Ok(())
    }

    fn read_q(&mut self, index: usize, buf: &mut [u8]) -> std::io::Result<()> {
        if self.fail_q.contains(&index) {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "mock qarity read failure"));
        }
        buf.copy_from_slice(&self.q[&index]);
        Ok(())
    }

    fn close(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MockInfoStore {
    pub entries: Vec<BlockInfo>,
    pub dirty: bool,
}

impl BlockInfoStore for MockInfoStore {
    fn block_count(&self) -> usize {
        self.entries.len()
    }
    fn get(&self, index: usize) -> BlockInfo {
        self.entries[index]
    }
    fn set(&mut self, index: usize, info: BlockInfo) {
        self.entries[index] = info;
    }
    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
    fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[derive(Default)]
pub struct MockStateWriter {
    pub write_calls: Vec<usize>,
    pub call_count: usize,
}

impl StateWriter for MockStateWriter {
    fn write(&mut self) -> std::io::Result<()> {
        self.call_count += 1;
        self.write_calls.push(self.call_count);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    pub log_lines: Vec<String>,
    pub stop_after: Option<usize>,
    pub reports: usize,
    pub paused: usize,
}

impl ProgressSink for RecordingProgress {
    fn begin(&mut self, _total: usize) {}

    fn report(&mut self, _index: usize, done: usize, _total: usize, _bytes: u64) -> bool {
        self.reports += 1;
        matches!(self.stop_after, Some(n) if done >= n)
    }

    fn log_error(&mut self, index: usize, source: &ErrorSource, kind: ErrorKind) {
        let source_str = match source {
            ErrorSource::Disk { label, path } => format!("{label}:{path}"),
            ErrorSource::Parity => "parity".to_string(),
            ErrorSource::Qarity => "qarity".to_string(),
        };
        self.log_lines
            .push(format!("error:{}:{}: {}", index, source_str, kind.as_str()));
    }

    fn pause(&mut self) {
        self.paused += 1;
    }
    fn resume(&mut self) {}
    fn end(&mut self) {}
}
