//! Assignment request model: a batch of customers offered to one caller.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Lifecycle status of an assignment request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
    Completed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Accepted => "ACCEPTED",
            RequestStatus::Declined => "DECLINED",
            RequestStatus::Completed => "COMPLETED",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(RequestStatus::Pending),
            "ACCEPTED" => Ok(RequestStatus::Accepted),
            "DECLINED" => Ok(RequestStatus::Declined),
            "COMPLETED" => Ok(RequestStatus::Completed),
            _ => Err(AppError::Validation(format!("Unknown request status '{}'", s))),
        }
    }
}

/// Customer data captured when the request was sent.
///
/// Snapshots are not live references and may drift from the stored customer
/// until the request is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub account_number: String,
    pub name: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub amount_overdue: f64,
    #[serde(default)]
    pub days_overdue: i64,
}

/// A proposed batch assignment awaiting the caller's answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequest {
    pub id: String,
    /// Business key, `REQ#####`.
    pub request_id: String,
    /// Internal id of the target caller.
    pub caller: String,
    /// Business id of the target caller at send time.
    pub caller_id: String,
    pub status: RequestStatus,
    pub customers_sent: i64,
    /// `DD/MM/YYYY HH:MM`
    pub sent_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decline_reason: Option<String>,
    pub sent_by: String,
    pub customers: Vec<CustomerSnapshot>,
    pub created_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

/// Request body for sending customers to a caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    /// Business id of the caller (`CALLER###`).
    pub caller_id: String,
    pub customers: Vec<CustomerSnapshot>,
}

/// Request body for declining a request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclineAssignmentRequest {
    #[serde(default)]
    pub reason: String,
}

/// Partial update of a request. A `status` change runs the matching
/// accept/decline side effects before the other fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentRequest {
    #[serde(default)]
    pub status: Option<RequestStatus>,
    #[serde(default)]
    pub decline_reason: Option<String>,
    #[serde(default)]
    pub sent_by: Option<String>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}
