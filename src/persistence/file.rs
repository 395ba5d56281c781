use super::{PersistenceError, PersistenceResult};
use crate::activity::{ClientCaseCounts, DayActivity, PayoutRequest, ProcessingCount};
use crate::client::{ActivityKind, Client};
use crate::payout::ResourcePayout;
use crate::period::PayPeriod;
use crate::resource::ResourceProfile;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

#[derive(Serialize, Deserialize)]
struct PayoutSnapshot {
    payouts: Vec<ResourcePayout>,
}

pub fn save_payouts_to_json<P: AsRef<Path>>(
    payouts: &[ResourcePayout],
    path: P,
) -> PersistenceResult<()> {
    let snapshot = PayoutSnapshot {
        payouts: payouts.to_vec(),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_payouts_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<ResourcePayout>> {
    let file = File::open(path)?;
    let snapshot: PayoutSnapshot = serde_json::from_reader(file)?;
    let mut seen = std::collections::HashSet::with_capacity(snapshot.payouts.len());
    for payout in &snapshot.payouts {
        if !seen.insert(payout.key()) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate payout for {}",
                payout.key()
            )));
        }
    }
    Ok(snapshot.payouts)
}

pub fn load_resources_from_json<P: AsRef<Path>>(
    path: P,
) -> PersistenceResult<Vec<ResourceProfile>> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

/// One row of a case log export.
#[derive(Debug, Deserialize)]
struct CaseLogRecord {
    resource_id: String,
    date: String,
    #[serde(default)]
    client: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    location_id: String,
    #[serde(default)]
    location_name: String,
    #[serde(default)]
    cases: String,
    #[serde(default)]
    hours: String,
    #[serde(default)]
    complete_logging: String,
}

#[derive(Default)]
struct ResourceLog {
    days: BTreeMap<NaiveDate, DayActivity>,
    complete_logging: ClientCaseCounts,
}

fn too_large(resource_id: &str, date: NaiveDate, what: &str) -> PersistenceError {
    PersistenceError::InvalidData(format!("{resource_id}: {what} on {date} is too large"))
}

impl CaseLogRecord {
    fn apply(self, log: &mut ResourceLog, date: NaiveDate) -> PersistenceResult<()> {
        let cases = parse_i64(&self.cases)?.unwrap_or(0);
        let hours = parse_decimal(&self.hours)?.unwrap_or(Decimal::ZERO);
        let day = log
            .days
            .entry(date)
            .or_insert_with(|| DayActivity::new(date));
        day.hours = day
            .hours
            .checked_add(hours)
            .ok_or_else(|| too_large(&self.resource_id, date, "hours"))?;

        if self.client.trim().is_empty() {
            // Hours-only row.
            if cases != 0 {
                return Err(PersistenceError::InvalidData(format!(
                    "{}: row with {cases} cases has no client",
                    self.resource_id
                )));
            }
            return Ok(());
        }

        let client = Client::from_str(&self.client).ok_or_else(|| {
            PersistenceError::InvalidData(format!("invalid client '{}'", self.client))
        })?;
        let kind = ActivityKind::from_str(&self.kind).ok_or_else(|| {
            PersistenceError::InvalidData(format!("invalid activity kind '{}'", self.kind))
        })?;

        match kind {
            ActivityKind::Logging => {
                day.logging
                    .checked_add(client, cases)
                    .ok_or_else(|| too_large(&self.resource_id, date, "logging case count"))?;
                if parse_bool(&self.complete_logging)?.unwrap_or(false) {
                    log.complete_logging.checked_add(client, cases).ok_or_else(|| {
                        too_large(&self.resource_id, date, "complete logging count")
                    })?;
                }
            }
            ActivityKind::Processing => {
                if self.location_id.trim().is_empty() {
                    return Err(PersistenceError::InvalidData(format!(
                        "{}: processing row on {date} has no location_id",
                        self.resource_id
                    )));
                }
                day.processing.push(ProcessingCount::new(
                    client,
                    self.location_id.trim(),
                    self.location_name.trim(),
                    cases,
                ));
            }
        }
        Ok(())
    }
}

/// Groups case-log rows into one request per resource for `period`, sorted by
/// resource id. Rows outside the period are ignored.
///
/// Resources without rows in the period get no request at all: missing data
/// is not the same thing as a month without work.
pub fn read_case_log<R: Read>(reader: R, period: PayPeriod) -> PersistenceResult<Vec<PayoutRequest>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut logs: BTreeMap<String, ResourceLog> = BTreeMap::new();

    for record in reader.deserialize::<CaseLogRecord>() {
        let record: CaseLogRecord = record?;
        let resource_id = record.resource_id.trim().to_string();
        if resource_id.is_empty() {
            return Err(PersistenceError::InvalidData(
                "case log row without resource_id".into(),
            ));
        }
        let date = parse_date(&record.date)?.ok_or_else(|| {
            PersistenceError::InvalidData(format!("{resource_id}: case log row without date"))
        })?;
        if !period.contains(date) {
            continue;
        }
        record.apply(logs.entry(resource_id).or_default(), date)?;
    }

    Ok(logs
        .into_iter()
        .map(|(resource_id, log)| {
            let mut request =
                PayoutRequest::new(resource_id, period, log.days.into_values().collect());
            request.complete_logging = log.complete_logging;
            request
        })
        .collect())
}

pub fn load_case_log_from_csv<P: AsRef<Path>>(
    path: P,
    period: PayPeriod,
) -> PersistenceResult<Vec<PayoutRequest>> {
    let file = File::open(path)?;
    read_case_log(file, period)
}

fn parse_date(input: &str) -> PersistenceResult<Option<NaiveDate>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn parse_i64(input: &str) -> PersistenceResult<Option<i64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<i64>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid integer '{input}': {e}")))
}

fn parse_decimal(input: &str) -> PersistenceResult<Option<Decimal>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    Decimal::from_str(input.trim())
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid number '{input}': {e}")))
}

fn parse_bool(input: &str) -> PersistenceResult<Option<bool>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(Some(true)),
        "false" | "no" | "0" => Ok(Some(false)),
        other => Err(PersistenceError::InvalidData(format!(
            "invalid boolean '{other}'"
        ))),
    }
}
