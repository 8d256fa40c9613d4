//! Rule audit logging
//!
//! Per RULES.md:
//! - R1: every state-changing rule operation MUST produce exactly one
//!   audit entry, carrying previous and new rule snapshots
//! - R2: entry append and rule mutation are one atomic unit; an append
//!   failure rolls the mutation back
//! - The log is append-only; entries are never rewritten or purged here
//!   (retention is an external concern)
//!
//! The file-backed log writes one JSON record per line, prefixed with a
//! CRC32 checksum of the record bytes. Any checksum mismatch on read is
//! corruption and fails the read.

use chrono::{DateTime, Utc};
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::core::ActorId;

/// Audit action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleAuditAction {
    Created,
    Modified,
    Activated,
    Deactivated,
    Superseded,
}

impl RuleAuditAction {
    /// Returns the action name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAuditAction::Created => "CREATED",
            RuleAuditAction::Modified => "MODIFIED",
            RuleAuditAction::Activated => "ACTIVATED",
            RuleAuditAction::Deactivated => "DEACTIVATED",
            RuleAuditAction::Superseded => "SUPERSEDED",
        }
    }
}

impl fmt::Display for RuleAuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit entry. Always carries previous/new state snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAuditEntry {
    /// Unique entry ID
    pub id: Uuid,
    /// The rule this entry describes
    pub rule_id: Uuid,
    pub action: RuleAuditAction,
    /// Who performed the mutation
    pub actor: ActorId,
    pub at: DateTime<Utc>,
    /// Snapshot before the mutation; None only for Created
    pub previous: Option<Value>,
    /// Snapshot after the mutation
    pub new: Value,
}

impl RuleAuditEntry {
    /// Create a new entry.
    pub fn new(
        rule_id: Uuid,
        action: RuleAuditAction,
        actor: ActorId,
        previous: Option<Value>,
        new: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            rule_id,
            action,
            actor,
            at: Utc::now(),
            previous,
            new,
        }
    }
}

/// Rule audit log trait.
///
/// Appends MUST be synchronous: the entry is durable and visible when
/// `append` returns. Readers see entries in append order.
pub trait RuleAuditLog: Send + Sync {
    /// Append an entry to the log.
    fn append(&self, entry: &RuleAuditEntry) -> io::Result<()>;

    /// Read entries in append order, optionally filtered to one rule.
    fn entries(&self, rule_id: Option<Uuid>) -> io::Result<Vec<RuleAuditEntry>>;
}

/// In-memory audit log, used by tests and embedded setups.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Arc<Mutex<Vec<RuleAuditEntry>>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries recorded.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl RuleAuditLog for MemoryAuditLog {
    fn append(&self, entry: &RuleAuditEntry) -> io::Result<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    fn entries(&self, rule_id: Option<Uuid>) -> io::Result<Vec<RuleAuditEntry>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|e| rule_id.map_or(true, |id| e.rule_id == id))
            .cloned()
            .collect())
    }
}

/// File-backed append-only audit log.
///
/// Line format: `<crc32 hex> <json record>`. fsync after each write.
pub struct FileAuditLog {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileAuditLog {
    /// Open or create an audit log file.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Get the audit log path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleAuditLog for FileAuditLog {
    fn append(&self, entry: &RuleAuditEntry) -> io::Result<()> {
        let json = serde_json::to_string(entry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let mut hasher = Hasher::new();
        hasher.update(json.as_bytes());
        let crc = hasher.finalize();

        let mut writer = self.writer.lock().unwrap();
        writeln!(writer, "{:08x} {}", crc, json)?;
        writer.flush()?;
        writer.get_ref().sync_all()
    }

    fn entries(&self, rule_id: Option<Uuid>) -> io::Result<Vec<RuleAuditEntry>> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let (crc_hex, json) = line.split_once(' ').ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("audit line {} malformed", line_no + 1),
                )
            })?;
            let expected = u32::from_str_radix(crc_hex, 16).map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("audit line {} checksum malformed", line_no + 1),
                )
            })?;

            let mut hasher = Hasher::new();
            hasher.update(json.as_bytes());
            if hasher.finalize() != expected {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("audit line {} checksum mismatch", line_no + 1),
                ));
            }

            let entry: RuleAuditEntry = serde_json::from_str(json)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            if rule_id.map_or(true, |id| entry.rule_id == id) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}

/// An audit log that always fails to append. Exists so rollback behavior
/// (R2) is testable; never wire it into a real repository.
#[derive(Debug, Default)]
pub struct FailingAuditLog;

impl RuleAuditLog for FailingAuditLog {
    fn append(&self, _entry: &RuleAuditEntry) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "append refused"))
    }

    fn entries(&self, _rule_id: Option<Uuid>) -> io::Result<Vec<RuleAuditEntry>> {
        Ok(Vec::new())
    }
}
