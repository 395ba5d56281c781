//! Spreadsheet-style exports of computed payouts.
//!
//! One summary row per payout plus a `TOTAL` row, written as CSV or turned into
//! a polars `DataFrame` for console display. Amounts are rounded to cents here
//! and nowhere else.

use polars::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::calculator::average_cases_per_hour;
use crate::payout::ResourcePayout;
use crate::persistence::PersistenceResult;
use crate::resource::ResourceProfile;

pub const TOTAL_ROW_ID: &str = "TOTAL";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub resource_id: String,
    pub resource_name: String,
    pub working_days: u32,
    pub hours: Decimal,
    pub logging_cases: i64,
    pub avg_cases_per_hour: Decimal,
    /// Blank on the totals row.
    pub slab_rate: Option<Decimal>,
    pub processing_cases: i64,
    pub processing_amount: Decimal,
    pub logging_amount: Decimal,
    pub complete_logging_cases: i64,
    pub bonus_amount: Decimal,
    pub grand_total: Decimal,
}

fn cents(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    rounded
}

impl SummaryRow {
    fn from_payout(payout: &ResourcePayout, name: &str) -> Self {
        Self {
            resource_id: payout.resource_id.clone(),
            resource_name: name.to_string(),
            working_days: payout.total_working_days,
            hours: payout.total_logging_hours,
            logging_cases: payout.total_logging_cases,
            avg_cases_per_hour: cents(payout.avg_cases_per_hour),
            slab_rate: Some(payout.slab.rate),
            processing_cases: payout.total_processing_cases,
            processing_amount: cents(payout.total_processing_amount),
            logging_amount: cents(payout.total_logging_amount),
            complete_logging_cases: payout.complete_logging_cases,
            bonus_amount: cents(payout.total_bonus_amount),
            grand_total: cents(payout.grand_total_payout),
        }
    }

    fn totals(payouts: &[ResourcePayout]) -> Self {
        let mut row = Self {
            resource_id: TOTAL_ROW_ID.to_string(),
            resource_name: String::new(),
            working_days: 0,
            hours: Decimal::ZERO,
            logging_cases: 0,
            avg_cases_per_hour: Decimal::ZERO,
            slab_rate: None,
            processing_cases: 0,
            processing_amount: Decimal::ZERO,
            logging_amount: Decimal::ZERO,
            complete_logging_cases: 0,
            bonus_amount: Decimal::ZERO,
            grand_total: Decimal::ZERO,
        };
        for payout in payouts {
            row.working_days = row.working_days.saturating_add(payout.total_working_days);
            row.hours = row.hours.saturating_add(payout.total_logging_hours);
            row.logging_cases = row.logging_cases.saturating_add(payout.total_logging_cases);
            row.processing_cases = row
                .processing_cases
                .saturating_add(payout.total_processing_cases);
            row.processing_amount = row
                .processing_amount
                .saturating_add(payout.total_processing_amount);
            row.logging_amount = row.logging_amount.saturating_add(payout.total_logging_amount);
            row.complete_logging_cases = row
                .complete_logging_cases
                .saturating_add(payout.complete_logging_cases);
            row.bonus_amount = row.bonus_amount.saturating_add(payout.total_bonus_amount);
            row.grand_total = row.grand_total.saturating_add(payout.grand_total_payout);
        }
        // A combined average; summing per-resource averages means nothing.
        row.avg_cases_per_hour = cents(
            average_cases_per_hour(row.logging_cases, row.hours).unwrap_or(Decimal::ZERO),
        );
        row.processing_amount = cents(row.processing_amount);
        row.logging_amount = cents(row.logging_amount);
        row.bonus_amount = cents(row.bonus_amount);
        row.grand_total = cents(row.grand_total);
        row
    }

    pub fn is_total(&self) -> bool {
        self.resource_id == TOTAL_ROW_ID
    }
}

/// Summary rows for `payouts`, sorted by resource id, followed by the totals row.
///
/// Names come from the payout's snapshot, then from `profiles`, then fall back
/// to the resource id.
pub fn summary_rows(payouts: &[ResourcePayout], profiles: &[ResourceProfile]) -> Vec<SummaryRow> {
    let names: HashMap<&str, &str> = profiles
        .iter()
        .map(|p| (p.resource_id.as_str(), p.name.as_str()))
        .collect();

    let mut sorted: Vec<&ResourcePayout> = payouts.iter().collect();
    sorted.sort_by(|a, b| a.resource_id.cmp(&b.resource_id));

    let mut rows: Vec<SummaryRow> = sorted
        .into_iter()
        .map(|payout| {
            let name = match &payout.resource {
                Some(snapshot) => snapshot.name.as_str(),
                None => names
                    .get(payout.resource_id.as_str())
                    .copied()
                    .unwrap_or(payout.resource_id.as_str()),
            };
            SummaryRow::from_payout(payout, name)
        })
        .collect();
    rows.push(SummaryRow::totals(payouts));
    rows
}

pub fn write_summary_csv<P: AsRef<Path>>(rows: &[SummaryRow], path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    write_summary(rows, file)
}

pub fn write_summary<W: std::io::Write>(rows: &[SummaryRow], writer: W) -> PersistenceResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct DayCsvRecord<'a> {
    date: String,
    day: &'a str,
    verisma_cases: i64,
    mro_cases: i64,
    datavant_cases: i64,
    hours: Decimal,
    total_cases: i64,
}

/// Writes the fixed-width day-wise grid of one payout: one line per calendar day.
pub fn write_daywise_csv<P: AsRef<Path>>(payout: &ResourcePayout, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for day in &payout.day_wise {
        writer.serialize(DayCsvRecord {
            date: day.date.format("%Y-%m-%d").to_string(),
            day: &day.day_name,
            verisma_cases: day.verisma_cases,
            mro_cases: day.mro_cases,
            datavant_cases: day.datavant_cases,
            hours: day.hours,
            total_cases: day.total_cases,
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Builds a display frame from summary rows (including the totals row).
pub fn summary_frame(rows: &[SummaryRow]) -> PolarsResult<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(13);

    let ids: Vec<&str> = rows.iter().map(|r| r.resource_id.as_str()).collect();
    columns.push(Series::new(PlSmallStr::from_static("resource_id"), ids).into_column());

    let names: Vec<&str> = rows.iter().map(|r| r.resource_name.as_str()).collect();
    columns.push(Series::new(PlSmallStr::from_static("resource_name"), names).into_column());

    let days: Vec<u32> = rows.iter().map(|r| r.working_days).collect();
    columns.push(Series::new(PlSmallStr::from_static("working_days"), days).into_column());

    columns.push(decimal_column("hours", rows, |r| r.hours));

    let logging: Vec<i64> = rows.iter().map(|r| r.logging_cases).collect();
    columns.push(Series::new(PlSmallStr::from_static("logging_cases"), logging).into_column());

    columns.push(decimal_column("avg_cases_per_hour", rows, |r| r.avg_cases_per_hour));

    let slab: Vec<Option<f64>> = rows.iter().map(|r| r.slab_rate.map(to_f64)).collect();
    columns.push(Series::new(PlSmallStr::from_static("slab_rate"), slab).into_column());

    let processing: Vec<i64> = rows.iter().map(|r| r.processing_cases).collect();
    columns.push(
        Series::new(PlSmallStr::from_static("processing_cases"), processing).into_column(),
    );

    columns.push(decimal_column("processing_amount", rows, |r| r.processing_amount));
    columns.push(decimal_column("logging_amount", rows, |r| r.logging_amount));

    let complete: Vec<i64> = rows.iter().map(|r| r.complete_logging_cases).collect();
    columns.push(
        Series::new(PlSmallStr::from_static("complete_logging_cases"), complete).into_column(),
    );

    columns.push(decimal_column("bonus_amount", rows, |r| r.bonus_amount));
    columns.push(decimal_column("grand_total", rows, |r| r.grand_total));

    DataFrame::new(columns)
}

fn decimal_column<F>(name: &str, rows: &[SummaryRow], value: F) -> Column
where
    F: Fn(&SummaryRow) -> Decimal,
{
    let data: Vec<f64> = rows.iter().map(|r| to_f64(value(r))).collect();
    Series::new(name.into(), data).into_column()
}
