//! Caller model: an agent working through a batch of overdue customers.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Presence status of a caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallerStatus {
    Available,
    Busy,
    Offline,
}

impl CallerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallerStatus::Available => "AVAILABLE",
            CallerStatus::Busy => "BUSY",
            CallerStatus::Offline => "OFFLINE",
        }
    }
}

impl FromStr for CallerStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(CallerStatus::Available),
            "BUSY" => Ok(CallerStatus::Busy),
            "OFFLINE" => Ok(CallerStatus::Offline),
            _ => Err(AppError::Validation(format!("Unknown caller status '{}'", s))),
        }
    }
}

/// Workload status, always derived from current and max load.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Idle,
    Ongoing,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Idle => "IDLE",
            TaskStatus::Ongoing => "ONGOING",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IDLE" => Ok(TaskStatus::Idle),
            "ONGOING" => Ok(TaskStatus::Ongoing),
            "COMPLETED" => Ok(TaskStatus::Completed),
            _ => Err(AppError::Validation(format!("Unknown task status '{}'", s))),
        }
    }
}

/// A caller and their current workload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub id: String,
    /// Business key, `CALLER###`.
    pub caller_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub status: CallerStatus,
    pub current_load: i64,
    pub max_load: i64,
    pub task_status: TaskStatus,
    /// Internal customer ids, in assignment order.
    pub assigned_customers: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

/// Request body for creating a new caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallerRequest {
    pub name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub status: Option<CallerStatus>,
    #[serde(default)]
    pub max_load: Option<i64>,
}

/// Request body for updating a caller's profile.
///
/// Load counters are not writable here; they follow the assignment list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCallerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub status: Option<CallerStatus>,
    #[serde(default)]
    pub max_load: Option<i64>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Request body for a manual workload edit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditWorkloadRequest {
    /// Complete replacement list of internal customer ids.
    pub assigned_customers: Vec<String>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}
