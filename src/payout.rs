use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::client::Client;
use crate::config::SlabBand;
use crate::period::PayPeriod;
use crate::resource::ResourceSnapshot;

/// Lifecycle of a payout record. The calculator only ever produces
/// `Calculated`; later transitions belong to the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Draft,
    Calculated,
    Approved,
    Paid,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Draft => "draft",
            PayoutStatus::Calculated => "calculated",
            PayoutStatus::Approved => "approved",
            PayoutStatus::Paid => "paid",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(PayoutStatus::Draft),
            "calculated" => Some(PayoutStatus::Calculated),
            "approved" => Some(PayoutStatus::Approved),
            "paid" => Some(PayoutStatus::Paid),
            _ => None,
        }
    }

    /// Approved and paid records are immutable.
    pub fn is_locked(&self) -> bool {
        matches!(self, PayoutStatus::Approved | PayoutStatus::Paid)
    }

    pub fn can_transition_to(&self, next: PayoutStatus) -> bool {
        matches!(
            (self, next),
            (PayoutStatus::Draft, PayoutStatus::Calculated)
                | (PayoutStatus::Calculated, PayoutStatus::Approved)
                | (PayoutStatus::Approved, PayoutStatus::Paid)
        )
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique key of a payout record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PayoutKey {
    pub resource_id: String,
    pub period: PayPeriod,
}

impl PayoutKey {
    pub fn new(resource_id: impl Into<String>, period: PayPeriod) -> Self {
        Self {
            resource_id: resource_id.into(),
            period,
        }
    }
}

impl fmt::Display for PayoutKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.resource_id, self.period)
    }
}

/// The slab band a resource landed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabSelection {
    pub min: Decimal,
    /// `None` for the top band.
    pub max: Option<Decimal>,
    pub rate: Decimal,
}

impl From<&SlabBand> for SlabSelection {
    fn from(band: &SlabBand) -> Self {
        Self {
            min: band.min,
            max: band.max,
            rate: band.rate,
        }
    }
}

impl SlabSelection {
    /// Human-readable band, e.g. `16-21` or `21+`.
    pub fn label(&self) -> String {
        match self.max {
            Some(max) => format!("{}-{}", self.min.normalize(), max.normalize()),
            None => format!("{}+", self.min.normalize()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingBreakdownEntry {
    pub location_id: String,
    pub location_name: String,
    pub cases: i64,
    pub rate: Decimal,
    pub amount: Decimal,
}

/// Processing work for one client: totals plus one entry per location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingTotals {
    pub cases: i64,
    pub amount: Decimal,
    pub breakdown: Vec<ProcessingBreakdownEntry>,
}

/// One row of the fixed-width day-wise grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBreakdown {
    pub date: NaiveDate,
    pub day_name: String,
    pub verisma_cases: i64,
    pub mro_cases: i64,
    pub datavant_cases: i64,
    pub hours: Decimal,
    pub total_cases: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePayout {
    pub resource_id: String,
    /// Serialized as top-level `year` and `month` fields.
    #[serde(flatten)]
    pub period: PayPeriod,
    pub status: PayoutStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceSnapshot>,

    pub verisma_processing: ProcessingTotals,
    pub mro_processing: ProcessingTotals,
    pub datavant_processing: ProcessingTotals,
    pub total_processing_cases: i64,
    pub total_processing_amount: Decimal,

    pub total_logging_cases: i64,
    pub total_logging_hours: Decimal,
    pub total_working_days: u32,
    pub avg_cases_per_hour: Decimal,
    pub slab: SlabSelection,
    pub base_logging_amount: Decimal,
    pub verisma_logging_cases: i64,
    pub mro_logging_cases: i64,
    pub datavant_logging_cases: i64,

    pub complete_logging_cases: i64,
    pub bonus_rate: Decimal,
    pub total_bonus_amount: Decimal,

    pub day_wise: Vec<DayBreakdown>,

    pub total_logging_amount: Decimal,
    pub grand_total_payout: Decimal,

    /// Set by whoever persists the record; never by the calculator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_at: Option<DateTime<Utc>>,
}

impl ResourcePayout {
    pub fn key(&self) -> PayoutKey {
        PayoutKey::new(self.resource_id.clone(), self.period)
    }

    pub fn processing_for(&self, client: Client) -> &ProcessingTotals {
        match client {
            Client::Verisma => &self.verisma_processing,
            Client::Mro => &self.mro_processing,
            Client::Datavant => &self.datavant_processing,
        }
    }

    pub fn logging_cases_for(&self, client: Client) -> i64 {
        match client {
            Client::Verisma => self.verisma_logging_cases,
            Client::Mro => self.mro_logging_cases,
            Client::Datavant => self.datavant_logging_cases,
        }
    }

    /// Name to show for the resource: the snapshot's, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.resource
            .as_ref()
            .map(|snapshot| snapshot.name.as_str())
            .unwrap_or(self.resource_id.as_str())
    }

    pub fn with_snapshot(mut self, snapshot: ResourceSnapshot) -> Self {
        self.resource = Some(snapshot);
        self
    }

    pub fn stamped(mut self, at: DateTime<Utc>) -> Self {
        self.calculated_at = Some(at);
        self
    }
}
