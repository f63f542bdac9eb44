use crate::error::{OrganizerError, WarnCode};
use crate::media::fsops::{ensure_dir, write_atomic};
use crate::media::util::local_timestamp;
use crate::media::warn::{self, WarnEvent};
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const LEDGER_FILE_NAME: &str = "file_hashes.json";
const LOCK_FILE_NAME: &str = "file_hashes.json.lock";

/// On-disk shape of `file_hashes.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    hashes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modified_at: Option<String>,
}

/// Content hashes already accepted into one destination root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    hashes: BTreeSet<String>,
    modified_at: Option<String>,
}

impl Ledger {
    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    /// Returns false when the hash was already recorded.
    pub fn insert(&mut self, hash: impl Into<String>) -> bool {
        self.hashes.insert(hash.into())
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn hashes(&self) -> impl Iterator<Item = &str> {
        self.hashes.iter().map(String::as_str)
    }

    pub fn modified_at(&self) -> Option<&str> {
        self.modified_at.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Missing,
    Loaded,
    Recovered { reason: String },
}

#[derive(Debug, Clone)]
pub struct LoadedLedger {
    pub ledger: Ledger,
    pub status: LoadStatus,
}

pub fn ledger_path(dest_dir: &Path) -> PathBuf {
    dest_dir.join(LEDGER_FILE_NAME)
}

pub fn load(path: &Path) -> Result<LoadedLedger> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Ok(LoadedLedger {
                ledger: Ledger::default(),
                status: LoadStatus::Missing,
            });
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    match serde_json::from_str::<LedgerFile>(&raw) {
        Ok(parsed) => Ok(LoadedLedger {
            ledger: Ledger {
                hashes: parsed.hashes.into_iter().collect(),
                modified_at: parsed.modified_at,
            },
            status: LoadStatus::Loaded,
        }),
        Err(err) => {
            let reason = err.to_string();
            warn::emit(WarnEvent {
                code: WarnCode::LedgerCorrupt,
                stage: "ledger-load",
                action: "reset-empty",
                path: &path.display().to_string(),
                reason: "parse-failed",
                err: &reason,
            });
            Ok(LoadedLedger {
                ledger: Ledger::default(),
                status: LoadStatus::Recovered { reason },
            })
        }
    }
}

/// Overwrite the ledger with the full hash set, stamped with the current
/// local time. Returns the stamp that was written.
pub fn save(path: &Path, ledger: &Ledger) -> Result<String> {
    let modified_at = local_timestamp();
    let file = LedgerFile {
        hashes: ledger.hashes().map(str::to_string).collect(),
        modified_at: Some(modified_at.clone()),
    };
    let data = serde_json::to_string_pretty(&file)?;
    write_atomic(path, format!("{data}\n").as_bytes())?;
    Ok(modified_at)
}

/// Exclusive advisory lock on a destination's ledger, released on drop.
#[derive(Debug)]
pub struct LedgerLock {
    file: File,
}

impl LedgerLock {
    pub fn acquire(dest_dir: &Path) -> Result<Self> {
        ensure_dir(dest_dir)?;
        let path = dest_dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        if file.try_lock_exclusive().is_err() {
            return Err(OrganizerError::LedgerLocked(path.display().to_string()).into());
        }
        Ok(Self { file })
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const H1: &str = "4b68ab3847feda7d6c62c1fbcbeebfa35eab7351ed5e78f4ddadea5df64b8015";
    const H2: &str = "0000000000000000000000000000000000000000000000000000000000000002";

    #[test]
    fn missing_file_loads_empty() {
        let tmp = tempdir().expect("tempdir");
        let loaded = load(&ledger_path(tmp.path())).expect("load");
        assert_eq!(loaded.ledger.len(), 0);
        assert_eq!(loaded.status, LoadStatus::Missing);
    }

    #[test]
    fn malformed_json_recovers_with_empty_ledger() {
        let tmp = tempdir().expect("tempdir");
        let path = ledger_path(tmp.path());
        fs::write(&path, "{\"hashes\": [\"abc\"").expect("write");

        let loaded = load(&path).expect("load");
        assert_eq!(loaded.ledger.len(), 0);
        assert!(matches!(loaded.status, LoadStatus::Recovered { .. }));
    }

    #[test]
    fn wrong_shape_is_treated_as_corrupt() {
        let tmp = tempdir().expect("tempdir");
        let path = ledger_path(tmp.path());
        fs::write(&path, "[1, 2, 3]").expect("write");

        let loaded = load(&path).expect("load");
        assert!(matches!(loaded.status, LoadStatus::Recovered { .. }));
    }

    #[test]
    fn object_without_hashes_field_is_empty_but_loaded() {
        let tmp = tempdir().expect("tempdir");
        let path = ledger_path(tmp.path());
        fs::write(&path, "{\"modified_at\": \"2024-06-12_10:00:00\"}").expect("write");

        let loaded = load(&path).expect("load");
        assert_eq!(loaded.ledger.len(), 0);
        assert_eq!(loaded.status, LoadStatus::Loaded);
        assert_eq!(loaded.ledger.modified_at(), Some("2024-06-12_10:00:00"));
    }

    #[test]
    fn duplicate_hashes_collapse_into_the_set() {
        let tmp = tempdir().expect("tempdir");
        let path = ledger_path(tmp.path());
        fs::write(&path, format!("{{\"hashes\": [\"{H1}\", \"{H1}\"]}}")).expect("write");

        let loaded = load(&path).expect("load");
        assert_eq!(loaded.ledger.len(), 1);
        assert!(loaded.ledger.contains(H1));
    }

    #[test]
    fn save_writes_sorted_hashes_and_timestamp() {
        let tmp = tempdir().expect("tempdir");
        let path = ledger_path(tmp.path());
        let mut ledger = Ledger::default();
        assert!(ledger.insert(H1));
        assert!(ledger.insert(H2));
        assert!(!ledger.insert(H1));

        let stamp = save(&path, &ledger).expect("save");

        let raw = fs::read_to_string(&path).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["hashes"], serde_json::json!([H2, H1]));
        assert_eq!(value["modified_at"], serde_json::json!(stamp));

        let reloaded = load(&path).expect("reload");
        assert_eq!(reloaded.status, LoadStatus::Loaded);
        assert_eq!(reloaded.ledger.hashes().collect::<Vec<_>>(), vec![H2, H1]);
    }

    #[test]
    fn second_lock_on_same_destination_is_refused() {
        let tmp = tempdir().expect("tempdir");
        let first = LedgerLock::acquire(tmp.path()).expect("first lock");
        assert!(tmp.path().join(LOCK_FILE_NAME).is_file());

        let err = LedgerLock::acquire(tmp.path()).expect_err("second lock must fail");
        assert!(matches!(
            err.downcast_ref::<OrganizerError>(),
            Some(OrganizerError::LedgerLocked(_))
        ));

        drop(first);
        LedgerLock::acquire(tmp.path()).expect("lock after release");
    }
}
