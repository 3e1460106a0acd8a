//! Durable history of analysis runs.
//!
//! Records are appended as JSON Lines to a single file. Each line carries a
//! sequential `id` starting at 1; on open the store scans the file to pick up
//! where the previous process stopped.
//!
//! A final line without its newline is what an interrupted append leaves
//! behind. It is skipped with a warning, and `open` cuts it off so the next
//! append starts on a clean line. A bad line anywhere else is `Corrupt`.

use brightspot::pipeline::AnalysisRecord;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Error, Debug)]
pub enum RecordStoreError {
    #[error("record file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("record file line {line} is not a valid record: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("record could not be serialized: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// An `AnalysisRecord` as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: u64,
    #[serde(flatten)]
    pub record: AnalysisRecord,
}

/// Append-only JSON Lines file of analysis records.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    /// Next id to hand out. Held across each append so ids and lines stay in step.
    next_id: Mutex<u64>,
}

impl RecordStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RecordStoreError> {
        let path = path.into();
        let scanned = scan(&read_contents(&path).await?)?;
        repair_tail(&path, scanned.tail).await?;

        let last_id = scanned.records.iter().map(|r| r.id).max().unwrap_or(0);
        Ok(Self {
            path,
            next_id: Mutex::new(last_id + 1),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, record: AnalysisRecord) -> Result<StoredRecord, RecordStoreError> {
        let mut next_id = self.next_id.lock().await;
        let stored = StoredRecord {
            id: *next_id,
            record,
        };

        let mut line = serde_json::to_string(&stored).map_err(RecordStoreError::Serialize)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        *next_id += 1;
        Ok(stored)
    }

    /// All records in the order they were written.
    pub async fn list(&self) -> Result<Vec<StoredRecord>, RecordStoreError> {
        let _guard = self.next_id.lock().await;
        Ok(scan(&read_contents(&self.path).await?)?.records)
    }
}

struct Scan {
    records: Vec<StoredRecord>,
    tail: Tail,
}

/// What follows the last newline of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tail {
    Clean,
    /// A whole record missing only its newline.
    Unterminated,
    /// Partial bytes; the number is the length of the good prefix.
    Torn(u64),
}

async fn read_contents(path: &Path) -> Result<String, RecordStoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

fn scan(contents: &str) -> Result<Scan, RecordStoreError> {
    let complete_len = contents.rfind('\n').map_or(0, |i| i + 1);
    let (complete, tail) = contents.split_at(complete_len);

    let mut records = complete
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| RecordStoreError::Corrupt {
                line: index + 1,
                source,
            })
        })
        .collect::<Result<Vec<StoredRecord>, _>>()?;

    let tail = if tail.is_empty() {
        Tail::Clean
    } else {
        match serde_json::from_str::<StoredRecord>(tail) {
            Ok(record) => {
                records.push(record);
                Tail::Unterminated
            }
            Err(e) => {
                warn!(
                    line = complete.lines().count() + 1,
                    error = %e,
                    "Skipping torn record line"
                );
                Tail::Torn(complete_len as u64)
            }
        }
    };
    Ok(Scan { records, tail })
}

/// Terminates a complete trailing record, or drops a torn one.
async fn repair_tail(path: &Path, tail: Tail) -> Result<(), RecordStoreError> {
    if tail == Tail::Clean {
        return Ok(());
    }
    let mut file = tokio::fs::OpenOptions::new().write(true).open(path).await?;
    match tail {
        Tail::Unterminated => {
            file.seek(std::io::SeekFrom::End(0)).await?;
            file.write_all(b"\n").await?;
        }
        Tail::Torn(good_len) => file.set_len(good_len).await?,
        Tail::Clean => {}
    }
    file.sync_all().await?;
    Ok(())
}
