use crate::media::util::now_epoch_secs;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const AUDIT_FILE_NAME: &str = "audit.log";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub at_epoch_secs: u64,
    pub pass: String,
    pub status: String,
    pub message: String,
}

pub fn audit_path(logs_dir: &Path) -> PathBuf {
    logs_dir.join(AUDIT_FILE_NAME)
}

pub fn append_event(logs_dir: &Path, pass: &str, status: &str, message: &str) -> Result<()> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create {}", logs_dir.display()))?;
    let event = AuditEvent {
        at_epoch_secs: now_epoch_secs()?,
        pass: pass.to_string(),
        status: status.to_string(),
        message: message.to_string(),
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    let path = audit_path(logs_dir);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("failed to append {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn events_are_appended_as_json_lines() {
        let tmp = tempdir().expect("tempdir");
        let logs = tmp.path().join("logs");

        append_event(&logs, "images", "ok", "moved=2").expect("first");
        append_event(&logs, "videos", "failed", "disk full").expect("second");

        let raw = fs::read_to_string(audit_path(&logs)).expect("read");
        let events = raw
            .lines()
            .map(|line| serde_json::from_str::<AuditEvent>(line).expect("parse"))
            .collect::<Vec<_>>();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].pass, "images");
        assert_eq!(events[1].status, "failed");
        assert_eq!(events[1].message, "disk full");
    }
}
