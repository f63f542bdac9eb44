use crate::error::{OrganizerError, WarnCode};
use crate::media::fsops::{ensure_dir, hash_file, move_file};
use crate::media::ledger::{self, Ledger, LedgerLock, LoadStatus};
use crate::media::warn::{self, WarnEvent};
use crate::media::week::bucket_name;
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizeSettings {
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct MovedFile {
    pub from: PathBuf,
    pub to: PathBuf,
    pub bucket: String,
}

#[derive(Debug, Clone)]
pub struct Collision {
    pub path: PathBuf,
    pub hash: String,
}

#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub ledger_path: PathBuf,
    pub ledger_status: LoadStatus,
    pub previous_modified_at: Option<String>,
    pub ledger_size: usize,
    pub ledger_saved_at: Option<String>,
    pub scanned: usize,
    pub moved: Vec<MovedFile>,
    pub collisions: Vec<Collision>,
    pub failures: Vec<FileFailure>,
    pub dry_run: bool,
}

impl PassOutcome {
    pub fn moved_count(&self) -> usize {
        self.moved.len()
    }
}

/// A pass that stopped early. `partial` holds what was done before the
/// error (moves, collisions, skipped files) when the scan had started.
#[derive(Debug, Error)]
#[error("{error:#}")]
pub struct PassFailure {
    pub partial: Option<Box<PassOutcome>>,
    pub error: anyhow::Error,
}

impl From<anyhow::Error> for PassFailure {
    fn from(error: anyhow::Error) -> Self {
        Self {
            partial: None,
            error,
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    path: PathBuf,
    ext: String,
}

fn validate_extensions(extensions: &[&str]) -> Result<()> {
    for ext in extensions {
        let bad = ext.is_empty() || ext.contains(['.', '/', '\\']);
        if bad {
            return Err(OrganizerError::InvalidExtension((*ext).to_string()).into());
        }
    }
    Ok(())
}

/// Entries directly under `source_dir`, sorted by name. A missing directory
/// has no entries.
fn list_source(source_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let read_dir = match fs::read_dir(source_dir) {
        Ok(read_dir) => read_dir,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", source_dir.display()));
        }
    };

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.with_context(|| format!("failed to read {}", source_dir.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push((name, entry.path()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Entries whose name ends in `.<ext>`, case-sensitive, grouped by extension
/// in the given order. A bare `.png` counts, as a shell glob `*.png` would.
fn select_candidates(entries: &[(String, PathBuf)], extensions: &[&str]) -> Vec<Candidate> {
    let mut out = Vec::new();
    for ext in extensions {
        let suffix = format!(".{ext}");
        for (name, path) in entries {
            if name.ends_with(&suffix) {
                out.push(Candidate {
                    path: path.clone(),
                    ext: (*ext).to_string(),
                });
            }
        }
    }
    out
}

fn skip_file(
    outcome: &mut PassOutcome,
    code: WarnCode,
    stage: &str,
    path: &Path,
    err: &anyhow::Error,
) {
    let path_str = path.display().to_string();
    let err_str = format!("{err:#}");
    warn::emit(WarnEvent {
        code,
        stage,
        action: "skip-file",
        path: &path_str,
        reason: "per-file-failure",
        err: &err_str,
    });
    outcome.failures.push(FileFailure {
        path: path.to_path_buf(),
        error: err_str,
    });
}

fn process_candidates(
    ledger: &mut Ledger,
    candidates: &[Candidate],
    dest_dir: &Path,
    settings: OrganizeSettings,
    outcome: &mut PassOutcome,
) -> Result<()> {
    for candidate in candidates {
        let meta = match fs::metadata(&candidate.path)
            .with_context(|| format!("failed to stat {}", candidate.path.display()))
        {
            Ok(meta) => meta,
            Err(err) => {
                skip_file(outcome, WarnCode::StatFailed, "stat", &candidate.path, &err);
                continue;
            }
        };
        if !meta.is_file() {
            continue;
        }

        let hash = match hash_file(&candidate.path) {
            Ok(hash) => hash,
            Err(err) => {
                skip_file(outcome, WarnCode::HashFailed, "hash", &candidate.path, &err);
                continue;
            }
        };

        if ledger.contains(&hash) {
            outcome.collisions.push(Collision {
                path: candidate.path.clone(),
                hash,
            });
            continue;
        }

        let modified = match meta
            .modified()
            .with_context(|| format!("failed to read mtime of {}", candidate.path.display()))
        {
            Ok(modified) => modified,
            Err(err) => {
                skip_file(outcome, WarnCode::MtimeFailed, "mtime", &candidate.path, &err);
                continue;
            }
        };

        let bucket = bucket_name(modified);
        let bucket_dir = dest_dir.join(&bucket);
        let target = bucket_dir.join(format!("{hash}.{}", candidate.ext));

        if !settings.dry_run {
            ensure_dir(&bucket_dir)?;
            move_file(&candidate.path, &target)?;
        }

        ledger.insert(hash);
        outcome.moved.push(MovedFile {
            from: candidate.path.clone(),
            to: target,
            bucket,
        });
    }
    Ok(())
}

/// Move every file in `source_dir` matching one of `extensions` into
/// `dest_dir/<week-monday>/<sha256>.<ext>`, skipping content already recorded
/// in the destination's ledger.
///
/// The ledger is written once at the end. If a move or directory creation
/// fails partway, the ledger is still flushed with the hashes moved so far
/// and the failure carries the partial outcome.
pub fn organize(
    extensions: &[&str],
    source_dir: &Path,
    dest_dir: &Path,
    settings: OrganizeSettings,
) -> Result<PassOutcome, PassFailure> {
    validate_extensions(extensions)?;

    let ledger_path = ledger::ledger_path(dest_dir);
    let _lock = if settings.dry_run {
        None
    } else {
        Some(LedgerLock::acquire(dest_dir)?)
    };

    let loaded = ledger::load(&ledger_path)?;
    let mut ledger = loaded.ledger;

    let candidates = select_candidates(&list_source(source_dir)?, extensions);
    let mut outcome = PassOutcome {
        ledger_path: ledger_path.clone(),
        ledger_status: loaded.status,
        previous_modified_at: ledger.modified_at().map(str::to_string),
        ledger_size: 0,
        ledger_saved_at: None,
        scanned: candidates.len(),
        moved: Vec::new(),
        collisions: Vec::new(),
        failures: Vec::new(),
        dry_run: settings.dry_run,
    };

    let result = process_candidates(&mut ledger, &candidates, dest_dir, settings, &mut outcome);

    if let Err(mut error) = result {
        if !settings.dry_run && !outcome.moved.is_empty() {
            match ledger::save(&ledger_path, &ledger) {
                Ok(stamp) => outcome.ledger_saved_at = Some(stamp),
                Err(save_err) => {
                    error = error.context(format!(
                        "ledger flush after partial pass also failed: {save_err:#}"
                    ));
                }
            }
        }
        outcome.ledger_size = ledger.len();
        return Err(PassFailure {
            partial: Some(Box::new(outcome)),
            error,
        });
    }

    if settings.dry_run {
        outcome.ledger_size = ledger.len();
        return Ok(outcome);
    }

    outcome.ledger_saved_at = Some(ledger::save(&ledger_path, &ledger)?);
    outcome.ledger_size = ledger.len();
    Ok(outcome)
}
