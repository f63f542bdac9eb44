use anyhow::{Context, Result};
use chrono::Local;
use std::time::{SystemTime, UNIX_EPOCH};

pub const LEDGER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

pub fn now_epoch_secs() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before UNIX_EPOCH")?
        .as_secs())
}

/// Current local time in the ledger's `modified_at` format.
pub fn local_timestamp() -> String {
    Local::now().format(LEDGER_TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn local_timestamp_round_trips_through_its_format() {
        let stamp = local_timestamp();
        assert_eq!(stamp.len(), 19);
        assert_eq!(&stamp[10..11], "_");
        NaiveDateTime::parse_from_str(&stamp, LEDGER_TIMESTAMP_FORMAT).expect("parse stamp");
    }
}
