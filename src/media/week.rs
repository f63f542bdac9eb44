use chrono::{DateTime, Datelike, Duration, Local, NaiveDate};
use std::time::SystemTime;

pub const BUCKET_FORMAT: &str = "%Y-%m-%d";

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn bucket_name_for_date(date: NaiveDate) -> String {
    week_start(date).format(BUCKET_FORMAT).to_string()
}

/// Bucket directory name for a file modification time, using the local
/// calendar date. Time of day is ignored.
pub fn bucket_name(modified: SystemTime) -> String {
    let local: DateTime<Local> = DateTime::from(modified);
    bucket_name_for_date(local.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn wednesday_maps_to_monday_of_same_week() {
        assert_eq!(bucket_name_for_date(date(2024, 6, 12)), "2024-06-10");
    }

    #[test]
    fn monday_maps_to_itself() {
        assert_eq!(week_start(date(2024, 6, 10)), date(2024, 6, 10));
    }

    #[test]
    fn sunday_belongs_to_the_preceding_monday() {
        assert_eq!(bucket_name_for_date(date(2024, 6, 16)), "2024-06-10");
    }

    #[test]
    fn week_can_start_in_previous_year() {
        assert_eq!(bucket_name_for_date(date(2025, 1, 1)), "2024-12-30");
    }

    #[test]
    fn system_time_uses_local_date_and_drops_time_of_day() {
        let late = Local
            .with_ymd_and_hms(2024, 6, 12, 23, 59, 30)
            .single()
            .expect("unambiguous local time");
        assert_eq!(bucket_name(SystemTime::from(late)), "2024-06-10");
    }
}
