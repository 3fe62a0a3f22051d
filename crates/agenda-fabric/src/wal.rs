use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{FabricError, Result};

/// Flush/sync strategy for the journal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// `fsync` after every write.
    EveryWrite,
    /// Flush to the OS and rely on its page cache.
    #[default]
    OsDefault,
}

impl std::str::FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "every-write" => Ok(Self::EveryWrite),
            "os-default" => Ok(Self::OsDefault),
            other => Err(format!("unknown sync mode '{other}'")),
        }
    }
}

/// Configuration for the write-ahead log.
#[derive(Clone, Debug)]
pub struct WalConfig {
    pub sync_mode: SyncMode,
    /// Largest payload accepted on append or trusted on recovery (default: 16 MiB).
    pub max_entry_size: u64,
}

impl Default for WalConfig {
    fn default() -> Self {
        Self {
            sync_mode: SyncMode::default(),
            max_entry_size: 16 * 1024 * 1024,
        }
    }
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: u64 = 8;

/// Where frames are written. Implemented by [`File`].
trait JournalFile: Write + Send {
    fn set_len(&self, len: u64) -> io::Result<()>;
    fn sync_all(&self) -> io::Result<()>;
}

impl JournalFile for File {
    fn set_len(&self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }

    fn sync_all(&self) -> io::Result<()> {
        File::sync_all(self)
    }
}

struct WalWriter {
    file: Box<dyn JournalFile>,
    /// End of the last complete frame.
    offset: u64,
    /// Set when a failed append could not be cut back; no further writes.
    wedged: bool,
}

impl WalWriter {
    fn write_frame(&mut self, frame: &[u8], sync_mode: SyncMode) -> io::Result<()> {
        self.file.write_all(frame)?;
        self.file.flush()?;
        if sync_mode == SyncMode::EveryWrite {
            self.file.sync_all()?;
        }
        Ok(())
    }
}

/// What a recovery scan found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recovery<T> {
    pub entries: Vec<T>,
    /// Frames that were complete but failed the CRC or did not decode.
    pub skipped: u64,
    /// Offset just past the last complete frame. Bytes beyond it are a torn
    /// tail.
    pub valid_len: u64,
    pub file_len: u64,
}

impl<T> Recovery<T> {
    pub fn has_torn_tail(&self) -> bool {
        self.valid_len < self.file_len
    }
}

/// Crash-recoverable write-ahead log of `T` values.
///
/// On-disk format, one frame per entry:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized T)]
/// ```
///
/// On recovery the file is read front to back. Frames that fail the CRC
/// check are skipped; a frame whose length runs past the end of the file
/// ends recovery, since it can only be a torn write from a crash.
pub struct WriteAheadLog<T> {
    path: PathBuf,
    writer: Mutex<WalWriter>,
    config: WalConfig,
    _entry: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> WriteAheadLog<T> {
    /// Open (or create) a journal file at the given path.
    pub fn open(path: &Path, config: WalConfig) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        Self::with_file(path, config, Box::new(file))
    }

    fn with_file(path: &Path, config: WalConfig, file: Box<dyn JournalFile>) -> Result<Self> {
        let offset = fs::metadata(path)?.len();
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(WalWriter {
                file,
                offset,
                wedged: false,
            }),
            config,
            _entry: PhantomData,
        })
    }

    /// Append a single entry. Returns the byte offset of its frame.
    ///
    /// A failed write or sync cuts the file back to where the frame began,
    /// so the entry is either fully journaled or absent.
    pub fn append(&self, entry: &T) -> Result<u64> {
        let payload =
            bincode::serialize(entry).map_err(|e| FabricError::Serialization(e.to_string()))?;
        if payload.len() as u64 > self.config.max_entry_size {
            return Err(FabricError::EntryTooLarge {
                length: payload.len() as u64,
                limit: self.config.max_entry_size,
            });
        }

        let length = payload.len() as u32;
        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(HEADER_SIZE as usize + payload.len());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&payload);

        let mut w = self.lock()?;
        let entry_offset = w.offset;
        if w.wedged {
            return Err(FabricError::Wedged {
                offset: entry_offset,
            });
        }

        if let Err(error) = w.write_frame(&frame, self.config.sync_mode) {
            warn!(offset = entry_offset, %error, "journal append failed; cutting frame");
            if let Err(cut) = w.file.set_len(entry_offset) {
                warn!(offset = entry_offset, error = %cut, "could not cut failed frame");
                w.wedged = true;
            }
            return Err(error.into());
        }

        w.offset += frame.len() as u64;

        debug!(offset = entry_offset, len = payload.len(), "journal append");
        Ok(entry_offset)
    }

    /// Recover all valid entries.
    pub fn recover(&self) -> Result<Vec<T>> {
        Ok(self.scan()?.entries)
    }

    /// Read the whole file, reporting what was kept and what was not.
    pub fn scan(&self) -> Result<Recovery<T>> {
        let mut file = BufReader::new(File::open(&self.path)?);
        let file_len = file.get_ref().metadata()?.len();
        let mut entries = Vec::new();
        let mut skipped = 0u64;
        let mut offset: u64 = 0;

        while offset + HEADER_SIZE <= file_len {
            file.seek(SeekFrom::Start(offset))?;

            let mut header = [0u8; HEADER_SIZE as usize];
            match file.read_exact(&mut header) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as u64;
            let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

            if length == 0
                || length > self.config.max_entry_size
                || offset + HEADER_SIZE + length > file_len
            {
                warn!(offset, length, file_len, "invalid journal frame length; stopping recovery");
                break;
            }

            let mut payload = vec![0u8; length as usize];
            match file.read_exact(&mut payload) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    warn!(offset, "truncated journal frame; stopping recovery");
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            let actual_crc = crc32fast::hash(&payload);
            if actual_crc != expected_crc {
                warn!(
                    offset,
                    expected = expected_crc,
                    actual = actual_crc,
                    "CRC mismatch; skipping frame"
                );
                skipped += 1;
            } else {
                match bincode::deserialize::<T>(&payload) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => {
                        warn!(offset, error = %e, "failed to decode journal frame; skipping");
                        skipped += 1;
                    }
                }
            }

            offset += HEADER_SIZE + length;
        }

        debug!(recovered = entries.len(), skipped, "journal recovery complete");
        Ok(Recovery {
            entries,
            skipped,
            valid_len: offset,
            file_len,
        })
    }

    /// Cut the file back to `len` bytes, dropping a torn tail so later
    /// appends start on a frame boundary.
    pub fn truncate_to(&self, len: u64) -> Result<()> {
        let mut w = self.lock()?;
        if len > w.offset {
            return Err(FabricError::InvalidTruncation {
                requested: len,
                current: w.offset,
            });
        }
        w.file.set_len(len)?;
        w.file.sync_all()?;
        w.offset = len;

        debug!(len, "journal truncated");
        Ok(())
    }

    /// Current write offset.
    pub fn offset(&self) -> Result<u64> {
        Ok(self.lock()?.offset)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, WalWriter>> {
        self.writer.lock().map_err(|_| FabricError::LockPoisoned)
    }
}
