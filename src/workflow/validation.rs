//! Input validation and transition guards shared by the workflow operations.

use chrono::NaiveDate;

use super::DATE_FORMAT;
use crate::errors::AppError;
use crate::models::{AssignmentRequest, CustomerSnapshot, ImportCustomer, RequestStatus};

/// Reject blank required text fields.
pub fn require_non_blank(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn require_non_negative(amount_overdue: f64, days_overdue: i64, account: &str) -> Result<(), AppError> {
    if !amount_overdue.is_finite() || amount_overdue < 0.0 {
        return Err(AppError::Validation(format!(
            "Amount overdue for account {} must be a non-negative number",
            account
        )));
    }
    if days_overdue < 0 {
        return Err(AppError::Validation(format!(
            "Days overdue for account {} must not be negative",
            account
        )));
    }
    Ok(())
}

/// Check the snapshot list carried by a new request.
pub fn validate_snapshots(snapshots: &[CustomerSnapshot]) -> Result<(), AppError> {
    if snapshots.is_empty() {
        return Err(AppError::Validation(
            "At least one customer is required".to_string(),
        ));
    }
    for snapshot in snapshots {
        require_non_blank(&snapshot.account_number, "Account number")?;
        require_non_blank(&snapshot.name, "Customer name")?;
        require_non_negative(
            snapshot.amount_overdue,
            snapshot.days_overdue,
            &snapshot.account_number,
        )?;
    }
    Ok(())
}

/// Check importer output before it touches the store.
pub fn validate_import(records: &[ImportCustomer]) -> Result<(), AppError> {
    if records.is_empty() {
        return Err(AppError::Validation("No customers provided".to_string()));
    }
    for record in records {
        require_non_blank(&record.account_number, "Account number")?;
        require_non_blank(&record.name, "Customer name")?;
        require_non_negative(record.amount_overdue, record.days_overdue, &record.account_number)?;
    }
    Ok(())
}

/// A promised payment date must be a real `DD/MM/YYYY` date.
pub fn validate_promised_date(value: Option<&str>) -> Result<Option<String>, AppError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(date) => NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map(|_| Some(date.to_string()))
            .map_err(|_| {
                AppError::Validation(format!(
                    "Promised date '{}' must use the DD/MM/YYYY format",
                    date
                ))
            }),
    }
}

pub fn validate_max_load(max_load: i64) -> Result<(), AppError> {
    if max_load <= 0 {
        return Err(AppError::Validation(
            "Max load must be a positive number".to_string(),
        ));
    }
    Ok(())
}

/// Optimistic concurrency check against a client-supplied version.
pub fn check_expected_version(current: i64, expected: Option<i64>) -> Result<(), AppError> {
    if let Some(expected) = expected {
        if current != expected {
            return Err(AppError::VersionMismatch {
                message: format!(
                    "Version mismatch: expected {}, current {}",
                    expected, current
                ),
                current_version: current,
            });
        }
    }
    Ok(())
}

/// Accept and decline only apply to requests still awaiting an answer.
pub fn ensure_pending(request: &AssignmentRequest, action: &str) -> Result<(), AppError> {
    if request.status != RequestStatus::Pending {
        return Err(AppError::Conflict(format!(
            "Cannot {} request {}: it is already {}",
            action,
            request.request_id,
            request.status.as_str()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(account: &str, name: &str) -> CustomerSnapshot {
        CustomerSnapshot {
            customer_id: None,
            account_number: account.to_string(),
            name: name.to_string(),
            contact_number: "0771234567".to_string(),
            amount_overdue: 1500.0,
            days_overdue: 30,
        }
    }

    #[test]
    fn test_snapshots_require_content() {
        assert!(matches!(
            validate_snapshots(&[]),
            Err(AppError::Validation(_))
        ));
        assert!(validate_snapshots(&[snapshot("1001", "Nimal Perera")]).is_ok());
        assert!(matches!(
            validate_snapshots(&[snapshot("  ", "Nimal Perera")]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_snapshots(&[snapshot("1001", "")]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_snapshots_reject_negative_balances() {
        let mut bad = snapshot("1001", "Nimal Perera");
        bad.amount_overdue = -1.0;
        assert!(validate_snapshots(&[bad]).is_err());

        let mut bad = snapshot("1001", "Nimal Perera");
        bad.days_overdue = -3;
        assert!(validate_snapshots(&[bad]).is_err());
    }

    #[test]
    fn test_promised_date() {
        assert_eq!(validate_promised_date(None).unwrap(), None);
        assert_eq!(validate_promised_date(Some("")).unwrap(), None);
        assert_eq!(
            validate_promised_date(Some("15/08/2024")).unwrap(),
            Some("15/08/2024".to_string())
        );
        assert!(validate_promised_date(Some("2024-08-15")).is_err());
        assert!(validate_promised_date(Some("31/02/2024")).is_err());
    }

    #[test]
    fn test_max_load_must_be_positive() {
        assert!(validate_max_load(1).is_ok());
        assert!(validate_max_load(0).is_err());
        assert!(validate_max_load(-5).is_err());
    }
}
