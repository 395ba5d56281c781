//! Monthly payout computation.
//!
//! A payout is a pure function of the request and the configuration:
//! processing is paid per case at a fixed location rate, logging is paid per
//! case at the slab rate selected by average throughput, and cases flagged as
//! complete logging are topped up to the top slab rate as a separate bonus.
//!
//! All arithmetic is checked. Input too large to compute is rejected with
//! [`InvariantViolation::ArithmeticOverflow`] instead of panicking.

use rayon::prelude::*;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::activity::{ClientCaseCounts, DayActivity, PayoutRequest};
use crate::activity_validation;
use crate::client::Client;
use crate::config::PayrollConfig;
use crate::error::{InvariantViolation, PayrollError, PayrollResult};
use crate::payout::{
    DayBreakdown, PayoutStatus, ProcessingBreakdownEntry, ProcessingTotals, ResourcePayout,
    SlabSelection,
};

#[derive(Debug, Clone, Default)]
pub struct PayrollCalculator {
    config: PayrollConfig,
}

impl PayrollCalculator {
    pub fn new(config: PayrollConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    pub fn compute(&self, request: &PayoutRequest) -> PayrollResult<ResourcePayout> {
        compute_payout(request, &self.config)
    }

    pub fn compute_batch(
        &self,
        requests: &[PayoutRequest],
    ) -> Vec<(String, PayrollResult<ResourcePayout>)> {
        compute_batch(requests, &self.config)
    }
}

fn overflow(quantity: &'static str) -> PayrollError {
    InvariantViolation::ArithmeticOverflow(quantity).into()
}

struct LoggingTotals {
    per_client: ClientCaseCounts,
    cases: i64,
    hours: Decimal,
    working_days: u32,
}

fn aggregate_processing(
    days: &[DayActivity],
    config: &PayrollConfig,
) -> PayrollResult<BTreeMap<Client, ProcessingTotals>> {
    // (client, location_id) -> (location_name, cases); BTreeMap keeps output order stable.
    let mut grouped: BTreeMap<(Client, &str), (&str, i64)> = BTreeMap::new();
    for day in days {
        for count in &day.processing {
            let entry = grouped
                .entry((count.client, count.location_id.as_str()))
                .or_insert((count.location_name.as_str(), 0));
            if entry.0.is_empty() {
                entry.0 = count.location_name.as_str();
            }
            entry.1 = entry
                .1
                .checked_add(count.cases)
                .ok_or_else(|| overflow("processing case count"))?;
        }
    }

    let mut totals: BTreeMap<Client, ProcessingTotals> = Client::ALL
        .iter()
        .map(|client| (*client, ProcessingTotals::default()))
        .collect();

    for ((client, location_id), (location_name, cases)) in grouped {
        let rated = match config.processing_rates.lookup(client, location_id) {
            Some(rated) => rated,
            None if cases == 0 => continue,
            None => {
                return Err(PayrollError::MissingRate {
                    client,
                    location_id: location_id.to_string(),
                    cases,
                });
            }
        };
        let location_name = if location_name.is_empty() {
            rated.location_name.as_str()
        } else {
            location_name
        };
        let amount = Decimal::from(cases)
            .checked_mul(rated.rate)
            .ok_or_else(|| overflow("processing amount"))?;
        let client_totals = totals.entry(client).or_default();
        client_totals.cases = client_totals
            .cases
            .checked_add(cases)
            .ok_or_else(|| overflow("processing case count"))?;
        client_totals.amount = client_totals
            .amount
            .checked_add(amount)
            .ok_or_else(|| overflow("processing amount"))?;
        client_totals.breakdown.push(ProcessingBreakdownEntry {
            location_id: location_id.to_string(),
            location_name: location_name.to_string(),
            cases,
            rate: rated.rate,
            amount,
        });
    }

    Ok(totals)
}

fn aggregate_logging(days: &[DayActivity], config: &PayrollConfig) -> PayrollResult<LoggingTotals> {
    let mut per_client = ClientCaseCounts::default();
    let mut hours = Decimal::ZERO;
    let mut working_days = 0u32;

    for day in days {
        for client in Client::ALL {
            per_client
                .checked_add(client, day.logging.get(client))
                .ok_or_else(|| overflow("logging case count"))?;
        }
        hours = hours
            .checked_add(day.hours)
            .ok_or_else(|| overflow("logging hours"))?;
        if day.has_activity() {
            working_days += 1;
        }
    }

    let cases = per_client
        .total_where(|client| config.logging.counts_toward_logging(client))
        .ok_or_else(|| overflow("logging case count"))?;

    Ok(LoggingTotals {
        per_client,
        cases,
        hours,
        working_days,
    })
}

/// Average logged cases per hour; zero when no hours were logged, `None` when
/// the quotient does not fit a `Decimal`.
pub fn average_cases_per_hour(cases: i64, hours: Decimal) -> Option<Decimal> {
    if hours > Decimal::ZERO {
        Decimal::from(cases).checked_div(hours)
    } else {
        Some(Decimal::ZERO)
    }
}

fn day_wise_breakdown(request: &PayoutRequest) -> PayrollResult<Vec<DayBreakdown>> {
    let by_date: HashMap<_, _> = request.days.iter().map(|day| (day.date, day)).collect();
    request
        .period
        .days()
        .map(|date| -> PayrollResult<DayBreakdown> {
            let (logging, hours) = by_date
                .get(&date)
                .map(|day| (day.logging, day.hours))
                .unwrap_or_default();
            Ok(DayBreakdown {
                date,
                day_name: date.format("%A").to_string(),
                verisma_cases: logging.verisma,
                mro_cases: logging.mro,
                datavant_cases: logging.datavant,
                hours,
                total_cases: logging
                    .total()
                    .ok_or_else(|| overflow("daily case count"))?,
            })
        })
        .collect()
}

fn sum_amounts(amounts: &[Decimal], quantity: &'static str) -> PayrollResult<Decimal> {
    amounts.iter().try_fold(Decimal::ZERO, |sum, amount| {
        sum.checked_add(*amount).ok_or_else(|| overflow(quantity))
    })
}

/// Computes the payout for one resource and month.
///
/// Fails without producing a partial record when a rate is missing, an input
/// invariant is broken, or no daily activity was supplied.
pub fn compute_payout(
    request: &PayoutRequest,
    config: &PayrollConfig,
) -> PayrollResult<ResourcePayout> {
    activity_validation::validate_request(request)?;

    let processing = aggregate_processing(&request.days, config)?;
    let logging = aggregate_logging(&request.days, config)?;

    // Complete cases of a client excluded from logging earn nothing.
    let complete_logging_cases = request
        .complete_logging
        .total_where(|client| config.logging.counts_toward_logging(client))
        .ok_or_else(|| overflow("complete logging case count"))?;
    if complete_logging_cases > logging.cases {
        return Err(InvariantViolation::CompleteLoggingExceedsTotal {
            complete: complete_logging_cases,
            total: logging.cases,
        }
        .into());
    }

    let avg_cases_per_hour = average_cases_per_hour(logging.cases, logging.hours)
        .ok_or_else(|| overflow("average cases per hour"))?;
    let band = config.slabs.lookup(avg_cases_per_hour);
    debug!(
        resource_id = %request.resource_id,
        period = %request.period,
        avg = %avg_cases_per_hour,
        rate = %band.rate,
        "selected logging slab"
    );

    let base_logging_amount = Decimal::from(logging.cases)
        .checked_mul(band.rate)
        .ok_or_else(|| overflow("logging amount"))?;
    let bonus_rate = config
        .slabs
        .top_rate()
        .checked_sub(band.rate)
        .ok_or_else(|| overflow("bonus rate"))?
        .max(Decimal::ZERO);
    let total_bonus_amount = bonus_rate
        .checked_mul(Decimal::from(complete_logging_cases))
        .ok_or_else(|| overflow("bonus amount"))?;

    let processing_for = |client: Client| processing.get(&client).cloned().unwrap_or_default();
    let verisma_processing = processing_for(Client::Verisma);
    let mro_processing = processing_for(Client::Mro);
    let datavant_processing = processing_for(Client::Datavant);

    let total_processing_cases = verisma_processing
        .cases
        .checked_add(mro_processing.cases)
        .and_then(|sum| sum.checked_add(datavant_processing.cases))
        .ok_or_else(|| overflow("processing case count"))?;
    let total_processing_amount = sum_amounts(
        &[
            verisma_processing.amount,
            mro_processing.amount,
            datavant_processing.amount,
        ],
        "processing amount",
    )?;
    let total_logging_amount = base_logging_amount;
    let grand_total_payout = sum_amounts(
        &[total_processing_amount, total_logging_amount, total_bonus_amount],
        "grand total",
    )?;

    let payout = ResourcePayout {
        resource_id: request.resource_id.clone(),
        period: request.period,
        status: PayoutStatus::Calculated,
        resource: None,
        verisma_processing,
        mro_processing,
        datavant_processing,
        total_processing_cases,
        total_processing_amount,
        total_logging_cases: logging.cases,
        total_logging_hours: logging.hours,
        total_working_days: logging.working_days,
        avg_cases_per_hour,
        slab: SlabSelection::from(band),
        base_logging_amount,
        verisma_logging_cases: logging.per_client.verisma,
        mro_logging_cases: logging.per_client.mro,
        datavant_logging_cases: logging.per_client.datavant,
        complete_logging_cases,
        bonus_rate,
        total_bonus_amount,
        day_wise: day_wise_breakdown(request)?,
        total_logging_amount,
        grand_total_payout,
        calculated_at: None,
    };

    info!(
        resource_id = %payout.resource_id,
        period = %payout.period,
        grand_total = %payout.grand_total_payout,
        "computed payout"
    );
    Ok(payout)
}

/// Computes independent requests in parallel. Results keep the input order.
pub fn compute_batch(
    requests: &[PayoutRequest],
    config: &PayrollConfig,
) -> Vec<(String, PayrollResult<ResourcePayout>)> {
    let results: Vec<_> = requests
        .par_iter()
        .map(|request| (request.resource_id.clone(), compute_payout(request, config)))
        .collect();

    let failed = results.iter().filter(|(_, result)| result.is_err()).count();
    for (resource_id, result) in &results {
        if let Err(err) = result {
            warn!(resource_id = %resource_id, code = err.code(), "payout rejected: {err}");
        }
    }
    info!(
        requested = requests.len(),
        failed, "computed payout batch"
    );
    results
}
