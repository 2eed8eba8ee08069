//! Assignment and contact lifecycle.
//!
//! Every operation here runs in a single write transaction: it either applies
//! all of its customer, caller and request changes or none of them.

pub mod contact;
pub mod requests;
pub mod validation;
pub mod workload;

use chrono::{DateTime, Local, TimeZone};

/// Business date format stored on records and shown in reports.
pub const DATE_FORMAT: &str = "%d/%m/%Y";
/// Business timestamp format for sent/responded times.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

pub fn format_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(DATE_FORMAT).to_string()
}

pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Today's date in `DD/MM/YYYY`.
pub fn today() -> String {
    format_date(&Local::now())
}

/// The current local time in `DD/MM/YYYY HH:MM`.
pub fn now_stamp() -> String {
    format_timestamp(&Local::now())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::db::{init_database, Repository};

    /// A repository over a fresh on-disk database.
    pub async fn repo() -> (Arc<Repository>, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .expect("Failed to init DB");
        (Arc::new(Repository::new(pool)), temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_business_formats() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap();
        assert_eq!(format_date(&at), "07/03/2024");
        assert_eq!(format_timestamp(&at), "07/03/2024 09:05");
    }

    #[test]
    fn test_today_shape() {
        let date = today();
        assert_eq!(date.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(&date, DATE_FORMAT).is_ok());
    }
}
