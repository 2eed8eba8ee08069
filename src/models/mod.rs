//! Data models for the collections CRM.
//!
//! Wire shapes use camelCase field names and upper-case status values so stored
//! records stay compatible with existing report consumers.

mod assignment;
mod caller;
mod customer;

pub use assignment::*;
pub use caller::*;
pub use customer::*;

use serde::{Deserialize, Serialize};

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
