use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A worker performing case work. This is the live record; payouts carry a
/// [`ResourceSnapshot`] instead of a reference to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceProfile {
    /// Identifier for the resource, as used in case logs and payouts.
    pub resource_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Home location or team, shown on exports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl ResourceProfile {
    pub fn new(resource_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            name: name.into(),
            email: None,
            location: None,
            active: true,
        }
    }

    /// Copies the fields a payout needs to stay readable on its own.
    pub fn snapshot(&self, captured_on: NaiveDate) -> ResourceSnapshot {
        ResourceSnapshot {
            resource_id: self.resource_id.clone(),
            name: self.name.clone(),
            location: self.location.clone(),
            captured_on,
        }
    }
}

/// Value copy of a [`ResourceProfile`] taken when a payout is produced.
///
/// Snapshots are never refreshed: if the profile is renamed or moved later,
/// payouts keep showing the values from `captured_on`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub resource_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub captured_on: NaiveDate,
}
