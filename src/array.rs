//! Filesystem-backed adapters wiring `scrub-core`'s traits to an on-disk
//! array: one flat image file per disk slot, a matching pair of flat
//! parity files, and a JSON-serialized block-info index.
//!
//! The block-to-file mapping is deliberately the simplest one that
//! satisfies the traits: each
//! disk slot is a single contiguous image file, and block `index` lives
//! at byte offset `index * block_size`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Error};
use serde::{Deserialize, Serialize};

use scrub_core::disk::{BlockDescriptor, BlockLocator, DiskPool};
use scrub_core::hash::HASH_SIZE;
use scrub_core::info::{BlockInfo, BlockInfoStore};
use scrub_core::parity::ParityStore;
use scrub_core::raid::ParityLevel;
use scrub_core::state_writer::StateWriter;

use crate::config::ArrayConfig;

/// One contiguous image file per data disk slot.
pub struct FsLocator {
    disk_paths: Vec<Option<String>>,
    block_size: u64,
    hashes: HashMap<usize, [u8; HASH_SIZE]>,
}

impl FsLocator {
    pub fn new(config: &ArrayConfig, hashes: HashMap<usize, [u8; HASH_SIZE]>) -> Self {
        FsLocator {
            disk_paths: config.disks.iter().map(|d| d.path.clone()).collect(),
            block_size: config.block_size as u64,
            hashes,
        }
    }
}

impl BlockLocator for FsLocator {
    fn locate(&self, slot: usize, index: usize) -> Option<BlockDescriptor> {
        let file = self.disk_paths.get(slot)?.clone()?;
        Some(BlockDescriptor {
            file,
            position: index as u64 * self.block_size,
            stored_hash: self.hashes.get(&index).copied(),
        })
    }

    fn disk_count(&self) -> usize {
        self.disk_paths.len()
    }
}

/// One open file handle per data disk slot.
pub struct FsDiskPool {
    handles: Vec<Option<(String, File)>>,
}

impl FsDiskPool {
    pub fn new(diskmax: usize) -> Self {
        FsDiskPool {
            handles: (0..diskmax).map(|_| None).collect(),
        }
    }
}

impl DiskPool for FsDiskPool {
    fn get(&mut self, slot: usize, file: &str, sequential_hint: bool) -> std::io::Result<()> {
        if let Some((current, _)) = &self.handles[slot] {
            if current == file {
                return Ok(());
            }
        }
        let handle = OpenOptions::new().read(true).open(file)?;
        advise_sequential(&handle, sequential_hint);
        self.handles[slot] = Some((file.to_string(), handle));
        Ok(())
    }

    fn read_at(&mut self, slot: usize, position: u64, buf: &mut [u8]) -> std::io::Result<()> {
        let (_, handle) = self.handles[slot]
            .as_mut()
            .expect("read_at called before get opened the slot");
        handle.seek(SeekFrom::Start(position))?;
        handle.read_exact(buf)
    }

    fn close(&mut self, slot: usize) -> std::io::Result<()> {
        self.handles[slot] = None;
        Ok(())
    }

    fn open_file(&self, slot: usize) -> Option<&str> {
        self.handles[slot].as_ref().map(|(path, _)| path.as_str())
    }
}

#[cfg(unix)]
fn advise_sequential(file: &File, sequential_hint: bool) {
    use std::os::unix::io::AsRawFd;
    let advice = if sequential_hint {
        libc::POSIX_FADV_SEQUENTIAL
    } else {
        libc::POSIX_FADV_NORMAL
    };
    unsafe {
        libc::posix_fadvise(file.as_raw_fd(), 0, 0, advice);
    }
}

#[cfg(not(unix))]
fn advise_sequential(_file: &File, _sequential_hint: bool) {}

/// Flat-file P/Q parity reader. The on-disk parity layout is out of
/// scope, so this is the simplest layout consistent with the trait:
/// parity for block `index` lives at `index * block_size`.
pub struct FsParityStore {
    level: ParityLevel,
    block_size: usize,
    block_count: usize,
    p_file: File,
    q_file: Option<File>,
}

impl FsParityStore {
    pub fn open(config: &ArrayConfig, block_count: usize) -> Result<Self, Error> {
        let p_file = OpenOptions::new()
            .read(true)
            .open(&config.parity_path)
            .with_context(|| format!("opening parity file '{}'", config.parity_path))?;
        let q_file = match (&config.qarity_path, config.dual_parity) {
            (Some(path), true) => Some(
                OpenOptions::new()
                    .read(true)
                    .open(path)
                    .with_context(|| format!("opening qarity file '{path}'"))?,
            ),
            (None, true) => anyhow::bail!("dual_parity set but qarity_path missing"),
            _ => None,
        };
        Ok(FsParityStore {
            level: config.level(),
            block_size: config.block_size,
            block_count,
            p_file,
            q_file,
        })
    }

    fn read_one(file: &mut File, index: usize, block_size: usize, buf: &mut [u8]) -> std::io::Result<()> {
        file.seek(SeekFrom::Start(index as u64 * block_size as u64))?;
        file.read_exact(buf)
    }
}

impl ParityStore for FsParityStore {
    fn level(&self) -> ParityLevel {
        self.level
    }

    fn block_count(&self) -> usize {
        self.block_count
    }

    fn read_p(&mut self, index: usize, buf: &mut [u8]) -> std::io::Result<()> {
        Self::read_one(&mut self.p_file, index, self.block_size, buf)
    }

    fn read_q(&mut self, index: usize, buf: &mut [u8]) -> std::io::Result<()> {
        let q = self
            .q_file
            .as_mut()
            .expect("read_q called on a single-parity store");
        Self::read_one(q, index, self.block_size, buf)
    }

    fn close(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// On-disk representation of the block-info index: a flat array of raw
/// packed words, one per block, serialized as JSON for readability (an
/// image-backed array is small enough that a binary format buys little).
#[derive(Debug, Serialize, Deserialize)]
struct InfoFile {
    blocks: Vec<u32>,
}

/// JSON-backed [`BlockInfoStore`] that doubles as the [`StateWriter`]
/// for the autosave checkpoint: `write()` persists the whole
/// index atomically.
pub struct JsonInfoStore {
    path: PathBuf,
    blocks: Vec<BlockInfo>,
    dirty: bool,
}

impl JsonInfoStore {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading info file '{}'", path.display()))?;
        let parsed: InfoFile =
            serde_json::from_str(&raw).with_context(|| format!("parsing info file '{}'", path.display()))?;
        let blocks = parsed.blocks.into_iter().map(BlockInfo::from_raw).collect();
        Ok(JsonInfoStore {
            path,
            blocks,
            dirty: false,
        })
    }

    fn serialize(&self) -> String {
        let raw = InfoFile {
            blocks: self.blocks.iter().map(BlockInfo::raw).collect(),
        };
        serde_json::to_string(&raw).expect("BlockInfo index serialization cannot fail")
    }
}

impl BlockInfoStore for JsonInfoStore {
    fn block_count(&self) -> usize {
        self.blocks.len()
    }

    fn get(&self, index: usize) -> BlockInfo {
        self.blocks[index]
    }

    fn set(&mut self, index: usize, info: BlockInfo) {
        self.blocks[index] = info;
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl StateWriter for JsonInfoStore {
    fn write(&mut self) -> std::io::Result<()> {
        replace_file_atomically(&self.path, self.serialize().as_bytes())?;
        self.dirty = false;
        Ok(())
    }
}

/// `run_scrub` takes the info store and the state writer as two
/// independent `&mut dyn` parameters, but here they're backed by the
/// same [`JsonInfoStore`] (the autosave checkpoint *is* the info index).
/// These two thin handles share it through a `Rc<RefCell<_>>` so each
/// side gets its own `&mut dyn Trait` without aliasing the same
/// reference twice.
pub struct InfoStoreHandle(pub Rc<RefCell<JsonInfoStore>>);

impl BlockInfoStore for InfoStoreHandle {
    fn block_count(&self) -> usize {
        self.0.borrow().block_count()
    }
    fn get(&self, index: usize) -> BlockInfo {
        self.0.borrow().get(index)
    }
    fn set(&mut self, index: usize, info: BlockInfo) {
        self.0.borrow_mut().set(index, info)
    }
    fn mark_dirty(&mut self) {
        self.0.borrow_mut().mark_dirty()
    }
    fn is_dirty(&self) -> bool {
        self.0.borrow().is_dirty()
    }
}

pub struct StateWriterHandle(pub Rc<RefCell<JsonInfoStore>>);

impl StateWriter for StateWriterHandle {
    fn write(&mut self) -> std::io::Result<()> {
        self.0.borrow_mut().write()
    }
}

/// Writes `data` to `path` by first writing a sibling temp file, then
/// renaming it over the target, so a crash mid-write never leaves a
/// truncated index behind.
fn replace_file_atomically(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut tmp = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        tmp.write_all(data)?;
        tmp.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)
}
