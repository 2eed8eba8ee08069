//! Customer model: an overdue account and its contact history.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Collection status of a customer account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerStatus {
    Unassigned,
    Overdue,
    Pending,
    Completed,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Unassigned => "UNASSIGNED",
            CustomerStatus::Overdue => "OVERDUE",
            CustomerStatus::Pending => "PENDING",
            CustomerStatus::Completed => "COMPLETED",
        }
    }
}

impl FromStr for CustomerStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNASSIGNED" => Ok(CustomerStatus::Unassigned),
            "OVERDUE" => Ok(CustomerStatus::Overdue),
            "PENDING" => Ok(CustomerStatus::Pending),
            "COMPLETED" => Ok(CustomerStatus::Completed),
            _ => Err(AppError::Validation(format!("Unknown customer status '{}'", s))),
        }
    }
}

/// Outcome of a single contact attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContactOutcome {
    #[serde(rename = "Spoke to Customer")]
    SpokeToCustomer,
    #[serde(rename = "Left Voicemail")]
    LeftVoicemail,
    #[serde(rename = "No Answer")]
    NoAnswer,
    #[serde(rename = "Wrong Number")]
    WrongNumber,
    #[serde(rename = "Customer Refused")]
    CustomerRefused,
}

impl ContactOutcome {
    pub const ALL: [ContactOutcome; 5] = [
        ContactOutcome::SpokeToCustomer,
        ContactOutcome::LeftVoicemail,
        ContactOutcome::NoAnswer,
        ContactOutcome::WrongNumber,
        ContactOutcome::CustomerRefused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactOutcome::SpokeToCustomer => "Spoke to Customer",
            ContactOutcome::LeftVoicemail => "Left Voicemail",
            ContactOutcome::NoAnswer => "No Answer",
            ContactOutcome::WrongNumber => "Wrong Number",
            ContactOutcome::CustomerRefused => "Customer Refused",
        }
    }
}

impl FromStr for ContactOutcome {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Unknown contact outcome '{}'; expected one of: {}",
                    s,
                    Self::ALL.map(|o| o.as_str()).join(", ")
                ))
            })
    }
}

/// One entry of a customer's append-only contact history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactAttempt {
    /// `DD/MM/YYYY`
    pub date: String,
    pub outcome: ContactOutcome,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promised_date: Option<String>,
    pub payment_made: bool,
}

/// An overdue account tracked by the CRM.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub account_number: String,
    pub name: String,
    pub contact_number: String,
    pub amount_overdue: f64,
    pub days_overdue: i64,
    pub status: CustomerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtom: Option<String>,
    /// Internal id of the owning caller.
    pub assigned_to: Option<String>,
    pub assigned_date: Option<String>,
    #[serde(default)]
    pub contact_history: Vec<ContactAttempt>,
    pub created_at: String,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

impl Customer {
    /// Whether the customer currently belongs to `caller_id` (internal id).
    pub fn is_assigned_to(&self, caller_id: &str) -> bool {
        self.assigned_to.as_deref() == Some(caller_id)
    }

    /// Return the customer to the unassigned pool. History is kept.
    pub fn release(&mut self) {
        self.assigned_to = None;
        self.assigned_date = None;
        self.status = CustomerStatus::Unassigned;
    }

    /// Hand the customer to `caller_id` as a fresh overdue account.
    pub fn assign(&mut self, caller_id: &str, date: &str) {
        self.assigned_to = Some(caller_id.to_string());
        self.assigned_date = Some(date.to_string());
        self.status = CustomerStatus::Overdue;
    }
}

/// A customer record as produced by the spreadsheet importer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCustomer {
    pub account_number: String,
    pub name: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub amount_overdue: f64,
    #[serde(default)]
    pub days_overdue: i64,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub rtom: Option<String>,
}

/// Request body for importing customers into the unassigned pool.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCustomersRequest {
    pub customers: Vec<ImportCustomer>,
}

/// Result of an import run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub customers: Vec<Customer>,
}

/// Request body for recording a contact attempt.
///
/// `outcome` stays a plain string here so an unknown value surfaces as a
/// validation error in the response envelope rather than a body rejection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordContactRequest {
    pub outcome: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub promised_date: Option<String>,
    #[serde(default)]
    pub payment_made: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_parses_only_known_labels() {
        for outcome in ContactOutcome::ALL {
            assert_eq!(outcome.as_str().parse::<ContactOutcome>().ok(), Some(outcome));
        }
        assert!(matches!(
            "spoke to customer".parse::<ContactOutcome>(),
            Err(AppError::Validation(_))
        ));
        assert!("Promised to pay".parse::<ContactOutcome>().is_err());
    }

    #[test]
    fn test_outcome_serializes_as_label() {
        let json = serde_json::to_string(&ContactOutcome::LeftVoicemail).unwrap();
        assert_eq!(json, "\"Left Voicemail\"");
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&CustomerStatus::Unassigned).unwrap();
        assert_eq!(json, "\"UNASSIGNED\"");
        assert_eq!(
            "COMPLETED".parse::<CustomerStatus>().ok(),
            Some(CustomerStatus::Completed)
        );
        assert!("completed".parse::<CustomerStatus>().is_err());
    }
}
