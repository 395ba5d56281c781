use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::period::PayPeriod;

/// Case counts split by client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCaseCounts {
    #[serde(default)]
    pub verisma: i64,
    #[serde(default)]
    pub mro: i64,
    #[serde(default)]
    pub datavant: i64,
}

impl ClientCaseCounts {
    pub fn new(verisma: i64, mro: i64, datavant: i64) -> Self {
        Self {
            verisma,
            mro,
            datavant,
        }
    }

    pub fn get(&self, client: Client) -> i64 {
        match client {
            Client::Verisma => self.verisma,
            Client::Mro => self.mro,
            Client::Datavant => self.datavant,
        }
    }

    /// Adds `cases` to `client`'s count; `None` on overflow, leaving the
    /// counts untouched.
    pub fn checked_add(&mut self, client: Client, cases: i64) -> Option<()> {
        let slot = match client {
            Client::Verisma => &mut self.verisma,
            Client::Mro => &mut self.mro,
            Client::Datavant => &mut self.datavant,
        };
        *slot = slot.checked_add(cases)?;
        Some(())
    }

    pub fn total(&self) -> Option<i64> {
        self.verisma.checked_add(self.mro)?.checked_add(self.datavant)
    }

    /// Sum over the clients `include` accepts.
    pub fn total_where<F>(&self, include: F) -> Option<i64>
    where
        F: Fn(Client) -> bool,
    {
        Client::ALL
            .iter()
            .filter(|client| include(**client))
            .try_fold(0i64, |sum, client| sum.checked_add(self.get(*client)))
    }

    pub fn is_zero(&self) -> bool {
        self.verisma == 0 && self.mro == 0 && self.datavant == 0
    }
}

/// Cases processed at one location (or subproject) of a client on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingCount {
    pub client: Client,
    pub location_id: String,
    #[serde(default)]
    pub location_name: String,
    pub cases: i64,
}

impl ProcessingCount {
    pub fn new(
        client: Client,
        location_id: impl Into<String>,
        location_name: impl Into<String>,
        cases: i64,
    ) -> Self {
        Self {
            client,
            location_id: location_id.into(),
            location_name: location_name.into(),
            cases,
        }
    }
}

/// A resource's recorded work for a single calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayActivity {
    pub date: NaiveDate,
    #[serde(default)]
    pub logging: ClientCaseCounts,
    #[serde(default)]
    pub hours: Decimal,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processing: Vec<ProcessingCount>,
}

impl DayActivity {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            logging: ClientCaseCounts::default(),
            hours: Decimal::ZERO,
            processing: Vec::new(),
        }
    }

    pub fn with_logging(mut self, verisma: i64, mro: i64, datavant: i64) -> Self {
        self.logging = ClientCaseCounts::new(verisma, mro, datavant);
        self
    }

    pub fn with_hours(mut self, hours: Decimal) -> Self {
        self.hours = hours;
        self
    }

    pub fn with_processing(mut self, count: ProcessingCount) -> Self {
        self.processing.push(count);
        self
    }

    pub fn has_activity(&self) -> bool {
        !self.logging.is_zero()
            || self.processing.iter().any(|p| p.cases != 0)
            || !self.hours.is_zero()
    }
}

/// Everything the calculator needs for one resource and one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub resource_id: String,
    pub period: PayPeriod,
    pub days: Vec<DayActivity>,
    /// Logging cases flagged as logged to full completion, per client. Only
    /// the clients that count toward logging earn the completion bonus.
    #[serde(default)]
    pub complete_logging: ClientCaseCounts,
}

impl PayoutRequest {
    pub fn new(resource_id: impl Into<String>, period: PayPeriod, days: Vec<DayActivity>) -> Self {
        Self {
            resource_id: resource_id.into(),
            period,
            days,
            complete_logging: ClientCaseCounts::default(),
        }
    }

    pub fn with_complete_logging(mut self, verisma: i64, mro: i64, datavant: i64) -> Self {
        self.complete_logging = ClientCaseCounts::new(verisma, mro, datavant);
        self
    }

    /// A request whose every calendar day is present with zero activity.
    ///
    /// This is how a month without work is expressed, as opposed to an empty
    /// `days` list which means the data is missing.
    pub fn idle_month(resource_id: impl Into<String>, period: PayPeriod) -> Self {
        let days = period.days().map(DayActivity::new).collect();
        Self::new(resource_id, period, days)
    }
}
