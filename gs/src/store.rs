//! Core GalleryStore implementation

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::record::{GalleryRecord, LogEntry};
use crate::{LOCK_FILE, LOG_FILE};

/// Result of compacting the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactStats {
    /// Log lines before compaction
    pub entries_before: usize,
    /// Records written after compaction
    pub records: usize,
}

/// File-backed gallery store
///
/// Cheap to clone; every operation opens the files it needs.
#[derive(Debug, Clone)]
pub struct GalleryStore {
    base_path: PathBuf,
}

impl GalleryStore {
    /// Open or create a store at the given directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(base_path.join(LOG_FILE))?;
        debug!(?base_path, "Opened gallery store");
        Ok(Self { base_path })
    }

    /// Directory holding the store files
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    fn log_path(&self) -> PathBuf {
        self.base_path.join(LOG_FILE)
    }

    fn lock_file(&self) -> Result<File, StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.base_path.join(LOCK_FILE))?;
        Ok(file)
    }

    /// Insert or fully replace a record
    pub fn upsert(&self, record: &GalleryRecord) -> Result<(), StoreError> {
        debug!(id = %record.id, "upsert: called");
        let lock = self.lock_file()?;
        FileExt::lock_exclusive(&lock)?;
        let result = self.append(&LogEntry::Upsert { record: record.clone() });
        FileExt::unlock(&lock)?;
        result?;
        info!(id = %record.id, domain = %record.domain, "Upserted gallery record");
        Ok(())
    }

    /// Replace the image reference of an existing record
    pub fn set_image(&self, id: &str, image_url: &str) -> Result<(), StoreError> {
        debug!(%id, "set_image: called");
        let lock = self.lock_file()?;
        FileExt::lock_exclusive(&lock)?;
        let result = self.replay().and_then(|records| {
            if records.iter().any(|r| r.id == id) {
                self.append(&LogEntry::SetImage {
                    id: id.to_string(),
                    image_url: image_url.to_string(),
                })
            } else {
                Err(StoreError::NotFound(id.to_string()))
            }
        });
        FileExt::unlock(&lock)?;
        result?;
        info!(%id, "Updated gallery image");
        Ok(())
    }

    /// Full snapshot of all records, in first-insertion order
    pub fn snapshot(&self) -> Result<Vec<GalleryRecord>, StoreError> {
        let lock = self.lock_file()?;
        FileExt::lock_shared(&lock)?;
        let result = self.replay();
        FileExt::unlock(&lock)?;
        result
    }

    /// Look up a single record
    pub fn get(&self, id: &str) -> Result<Option<GalleryRecord>, StoreError> {
        Ok(self.snapshot()?.into_iter().find(|r| r.id == id))
    }

    /// Rewrite the log so it holds exactly one upsert per record
    pub fn compact(&self) -> Result<CompactStats, StoreError> {
        debug!("compact: called");
        let lock = self.lock_file()?;
        FileExt::lock_exclusive(&lock)?;
        let result = self.rewrite();
        FileExt::unlock(&lock)?;
        let stats = result?;
        info!(
            entries_before = stats.entries_before,
            records = stats.records,
            "Compacted gallery log"
        );
        Ok(stats)
    }

    fn rewrite(&self) -> Result<CompactStats, StoreError> {
        let entries_before = self.read_entries()?.len();
        let records = self.replay()?;

        let tmp_path = self.base_path.join(format!("{}.tmp", LOG_FILE));
        let mut tmp = File::create(&tmp_path)?;
        for record in &records {
            let line = serde_json::to_string(&LogEntry::Upsert { record: record.clone() })?;
            writeln!(tmp, "{}", line)?;
        }
        tmp.sync_all()?;
        fs::rename(&tmp_path, self.log_path())?;

        Ok(CompactStats {
            entries_before,
            records: records.len(),
        })
    }

    fn append(&self, entry: &LogEntry) -> Result<(), StoreError> {
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(self.log_path())?;
        if ends_with_torn_line(&mut file)? {
            warn!("Terminating torn gallery log line before append");
            writeln!(file)?;
        }
        writeln!(file, "{}", line)?;
        file.sync_data()?;
        Ok(())
    }

    fn read_entries(&self) -> Result<Vec<LogEntry>, StoreError> {
        let file = File::open(self.log_path())?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogEntry>(&line) {
                Ok(entry) => entries.push(entry),
                // A torn trailing write from a crashed writer is skipped, not fatal
                Err(e) => warn!(line = line_no + 1, error = %e, "Skipping unreadable gallery log line"),
            }
        }
        Ok(entries)
    }

    fn replay(&self) -> Result<Vec<GalleryRecord>, StoreError> {
        let mut records: Vec<GalleryRecord> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for entry in self.read_entries()? {
            match entry {
                LogEntry::Upsert { record } => match index.get(&record.id) {
                    Some(&pos) => records[pos] = record,
                    None => {
                        index.insert(record.id.clone(), records.len());
                        records.push(record);
                    }
                },
                LogEntry::SetImage { id, image_url } => {
                    if let Some(&pos) = index.get(&id) {
                        records[pos].image_url = image_url;
                    } else {
                        debug!(%id, "replay: set-image for unknown record");
                    }
                }
            }
        }

        Ok(records)
    }
}

/// True when the log is non-empty and its last byte is not a newline
fn ends_with_torn_line(file: &mut File) -> Result<bool, StoreError> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}
