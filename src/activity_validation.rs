use crate::activity::{DayActivity, PayoutRequest};
use crate::client::Client;
use crate::error::{InvariantViolation, PayrollError, PayrollResult};
use rust_decimal::Decimal;

fn validate_day(day: &DayActivity) -> Result<(), InvariantViolation> {
    for client in Client::ALL {
        let cases = day.logging.get(client);
        if cases < 0 {
            return Err(InvariantViolation::NegativeCases {
                date: day.date,
                field: format!("{} logging", client.as_str()),
                value: cases,
            });
        }
    }

    for count in &day.processing {
        if count.cases < 0 {
            return Err(InvariantViolation::NegativeCases {
                date: day.date,
                field: format!("{} processing at '{}'", count.client.as_str(), count.location_id),
                value: count.cases,
            });
        }
    }

    if day.hours < Decimal::ZERO {
        return Err(InvariantViolation::NegativeHours {
            date: day.date,
            hours: day.hours.to_string(),
        });
    }

    Ok(())
}

/// Checks the structural invariants of a request before any arithmetic runs.
///
/// The complete-logging bound needs the logging total and is checked by the
/// calculator once that total is known.
pub fn validate_request(request: &PayoutRequest) -> PayrollResult<()> {
    if request.resource_id.trim().is_empty() {
        return Err(InvariantViolation::EmptyResourceId.into());
    }

    if request.days.is_empty() {
        return Err(PayrollError::EmptyPeriod {
            resource_id: request.resource_id.clone(),
            year: request.period.year(),
            month: request.period.month(),
        });
    }

    for client in Client::ALL {
        let complete = request.complete_logging.get(client);
        if complete < 0 {
            return Err(InvariantViolation::NegativeCompleteLogging(complete).into());
        }
    }

    let mut previous: Option<&DayActivity> = None;
    for day in &request.days {
        if !request.period.contains(day.date) {
            return Err(InvariantViolation::DateOutsidePeriod {
                date: day.date,
                year: request.period.year(),
                month: request.period.month(),
            }
            .into());
        }
        if let Some(prev) = previous {
            if prev.date == day.date {
                return Err(InvariantViolation::DuplicateDate(day.date).into());
            }
            if prev.date > day.date {
                return Err(InvariantViolation::DatesOutOfOrder {
                    later: prev.date,
                    earlier: day.date,
                }
                .into());
            }
        }
        validate_day(day)?;
        previous = Some(day);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ProcessingCount;
    use crate::period::PayPeriod;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn march() -> PayPeriod {
        PayPeriod::new(2025, 3).unwrap()
    }

    #[test]
    fn accepts_ordered_days_inside_period() {
        let request = PayoutRequest::new(
            "R-1",
            march(),
            vec![
                DayActivity::new(d(1)).with_logging(3, 2, 0),
                DayActivity::new(d(4)).with_hours(Decimal::new(75, 1)),
            ],
        );
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn rejects_empty_days_as_empty_period() {
        let request = PayoutRequest::new("R-1", march(), Vec::new());
        assert!(matches!(
            validate_request(&request),
            Err(PayrollError::EmptyPeriod { month: 3, .. })
        ));
    }

    #[test]
    fn rejects_duplicate_and_unordered_dates() {
        let dup = PayoutRequest::new(
            "R-1",
            march(),
            vec![DayActivity::new(d(2)), DayActivity::new(d(2))],
        );
        assert_eq!(
            validate_request(&dup),
            Err(InvariantViolation::DuplicateDate(d(2)).into())
        );

        let unordered = PayoutRequest::new(
            "R-1",
            march(),
            vec![DayActivity::new(d(5)), DayActivity::new(d(2))],
        );
        assert!(matches!(
            validate_request(&unordered),
            Err(PayrollError::InvariantViolation(
                InvariantViolation::DatesOutOfOrder { .. }
            ))
        ));
    }

    #[test]
    fn rejects_dates_outside_period() {
        let request = PayoutRequest::new(
            "R-1",
            march(),
            vec![DayActivity::new(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap())],
        );
        assert!(matches!(
            validate_request(&request),
            Err(PayrollError::InvariantViolation(
                InvariantViolation::DateOutsidePeriod { .. }
            ))
        ));
    }

    #[test]
    fn rejects_negative_counts_and_hours() {
        let negative_logging = PayoutRequest::new(
            "R-1",
            march(),
            vec![DayActivity::new(d(1)).with_logging(0, -1, 0)],
        );
        assert!(matches!(
            validate_request(&negative_logging),
            Err(PayrollError::InvariantViolation(
                InvariantViolation::NegativeCases { value: -1, .. }
            ))
        ));

        let negative_processing = PayoutRequest::new(
            "R-1",
            march(),
            vec![DayActivity::new(d(1)).with_processing(ProcessingCount::new(
                Client::Mro,
                "LOC-1",
                "North",
                -4,
            ))],
        );
        assert!(validate_request(&negative_processing).is_err());

        let negative_hours = PayoutRequest::new(
            "R-1",
            march(),
            vec![DayActivity::new(d(1)).with_hours(Decimal::new(-1, 0))],
        );
        assert!(matches!(
            validate_request(&negative_hours),
            Err(PayrollError::InvariantViolation(
                InvariantViolation::NegativeHours { .. }
            ))
        ));
    }

    #[test]
    fn rejects_negative_complete_logging() {
        let request = PayoutRequest::new("R-1", march(), vec![DayActivity::new(d(1))])
            .with_complete_logging(0, -2, 0);
        assert_eq!(
            validate_request(&request),
            Err(InvariantViolation::NegativeCompleteLogging(-2).into())
        );
    }
}
