use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Lowercase hex SHA-256 of the full file contents, streamed from disk.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))
}

/// Rename `from` to `to`, falling back to copy + remove when the rename
/// cannot cross the filesystem boundary.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if from == to {
        return Ok(());
    }
    if let Some(parent) = to.parent() {
        ensure_dir(parent)?;
    }

    match fs::rename(from, to) {
        Ok(_) => Ok(()),
        Err(rename_err) if rename_err.kind() == ErrorKind::CrossesDevices => {
            copy_then_remove(from, to)
        }
        Err(rename_err) => Err(rename_err)
            .with_context(|| format!("failed to move {} to {}", from.display(), to.display())),
    }
}

/// Either both steps succeed or `to` is gone again, so a failed move never
/// leaves a second copy behind.
fn copy_then_remove(from: &Path, to: &Path) -> Result<()> {
    if let Err(err) = fs::copy(from, to) {
        let _ = fs::remove_file(to);
        return Err(err)
            .with_context(|| format!("failed to copy {} to {}", from.display(), to.display()));
    }
    if let Err(err) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(err).with_context(|| format!("failed to remove {}", from.display()));
    }
    Ok(())
}

/// Replace `path` with `contents` via a sibling temp file and rename, so
/// readers never observe a partial write.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    ensure_dir(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    tmp.write_all(contents)
        .with_context(|| format!("failed to write temp file for {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("failed to sync temp file for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
