// ABOUTME: Utilities for working with times and timestamps.
// ABOUTME: Provides the clock and upload-date path segments.
use ::time::{macros::format_description, OffsetDateTime};
use std::time::SystemTime;

/// Get the current system time
///
/// # Examples
///
/// ```
/// use adb_core::utc_now;
/// let now = utc_now();
/// assert!(now.duration_since(std::time::UNIX_EPOCH).is_ok());
/// ```
pub fn utc_now() -> SystemTime {
    SystemTime::now()
}

/// Format the UTC calendar date of `time` as `YYYYMMDD`, the directory
/// segment under which uploaded structure and PDB files are filed.
///
/// # Examples
///
/// ```
/// use adb_core::upload_date_segment;
/// use std::time::{UNIX_EPOCH, Duration};
///
/// let time = UNIX_EPOCH + Duration::from_secs(1_609_459_200 + 86_399);
/// assert_eq!(upload_date_segment(time), "20210101");
/// ```
pub fn upload_date_segment(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(format_description!("[year][month][day]"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_utc_now() {
        let since_epoch = utc_now().duration_since(UNIX_EPOCH).unwrap();
        assert!(since_epoch.as_secs() > 1_577_836_800); // 2020-01-01
    }

    #[test]
    fn test_upload_date_segment_pads_month_and_day() {
        // 2021-03-04T12:00:00Z
        let time = UNIX_EPOCH + Duration::from_secs(1_614_859_200);
        assert_eq!(upload_date_segment(time), "20210304");
    }

    #[test]
    fn test_upload_date_segment_rolls_over_at_midnight() {
        let last_second = UNIX_EPOCH + Duration::from_secs(1_609_459_200 - 1);
        let first_second = UNIX_EPOCH + Duration::from_secs(1_609_459_200);
        assert_eq!(upload_date_segment(last_second), "20201231");
        assert_eq!(upload_date_segment(first_second), "20210101");
    }
}
