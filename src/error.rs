use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrganizerError {
    #[error("invalid extension `{0}`: must be non-empty and contain no `.` or path separators")]
    InvalidExtension(String),
    #[error("ledger is locked by another process: {0}")]
    LedgerLocked(String),
    #[error("HOME directory could not be resolved (needed for default {0})")]
    HomeDirUnavailable(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarnCode {
    LedgerCorrupt,
    StatFailed,
    HashFailed,
    MtimeFailed,
    AuditFailed,
}

impl WarnCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LedgerCorrupt => "LEDGER_CORRUPT",
            Self::StatFailed => "STAT_FAILED",
            Self::HashFailed => "HASH_FAILED",
            Self::MtimeFailed => "MTIME_FAILED",
            Self::AuditFailed => "AUDIT_FAILED",
        }
    }
}
