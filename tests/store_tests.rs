use chrono::NaiveDate;
use resource_payroll::{
    DayActivity, MemoryPayoutStore, PayPeriod, PayoutKey, PayoutRequest, PayoutStatus,
    PayoutStore, PayrollCalculator, PersistenceError, ResourcePayout, load_payouts_from_json,
    save_payouts_to_json,
};
use rust_decimal::Decimal;
use tempfile::NamedTempFile;

fn payout(resource_id: &str, month: u32, cases: i64) -> ResourcePayout {
    let period = PayPeriod::new(2025, month).unwrap();
    PayrollCalculator::default()
        .compute(&PayoutRequest::new(
            resource_id,
            period,
            vec![
                DayActivity::new(period.first_day())
                    .with_logging(cases, 0, 0)
                    .with_hours(Decimal::from(4)),
            ],
        ))
        .unwrap()
}

fn exercise_store(store: &dyn PayoutStore) {
    let first = payout("R-1", 4, 40);
    store.save_payout(&first).unwrap();
    store.save_payout(&payout("R-2", 4, 20)).unwrap();
    store.save_payout(&payout("R-1", 5, 10)).unwrap();

    // Unlocked records are replaced.
    let replacement = payout("R-1", 4, 60);
    store.save_payout(&replacement).unwrap();
    let key = PayoutKey::new("R-1", PayPeriod::new(2025, 4).unwrap());
    assert_eq!(store.load_payout(&key).unwrap(), Some(replacement.clone()));

    let april = store.list_payouts(PayPeriod::new(2025, 4).unwrap()).unwrap();
    let ids: Vec<_> = april.iter().map(|p| p.resource_id.as_str()).collect();
    assert_eq!(ids, vec!["R-1", "R-2"]);

    let err = store.update_status(&key, PayoutStatus::Paid).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidTransition { .. }));

    let approved = store.update_status(&key, PayoutStatus::Approved).unwrap();
    assert_eq!(approved.status, PayoutStatus::Approved);

    let err = store.save_payout(&first).unwrap_err();
    assert!(matches!(
        err,
        PersistenceError::Locked {
            status: PayoutStatus::Approved,
            ..
        }
    ));
    assert_eq!(
        store.load_payout(&key).unwrap().unwrap().total_logging_cases,
        60
    );

    let missing = PayoutKey::new("R-404", PayPeriod::new(2025, 4).unwrap());
    assert!(store.load_payout(&missing).unwrap().is_none());
    assert!(matches!(
        store.update_status(&missing, PayoutStatus::Approved),
        Err(PersistenceError::NotFound(_))
    ));
}

#[test]
fn memory_store_semantics() {
    let store = MemoryPayoutStore::new();
    exercise_store(&store);
    assert_eq!(store.len(), 3);
}

#[cfg(feature = "sqlite")]
#[test]
fn sqlite_store_semantics() {
    let store = resource_payroll::SqlitePayoutStore::in_memory().unwrap();
    exercise_store(&store);
}

#[cfg(feature = "sqlite")]
#[test]
fn sqlite_store_survives_reopen() {
    let tmp = NamedTempFile::new().unwrap();
    let saved = payout("R-7", 8, 33).stamped(
        NaiveDate::from_ymd_opt(2025, 9, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
            .and_utc(),
    );
    {
        let store = resource_payroll::SqlitePayoutStore::new(tmp.path()).unwrap();
        store.save_payout(&saved).unwrap();
    }
    let store = resource_payroll::SqlitePayoutStore::new(tmp.path()).unwrap();
    let loaded = store.load_payout(&saved.key()).unwrap().unwrap();
    assert_eq!(loaded, saved);
}

#[test]
fn json_snapshot_round_trips_and_rejects_duplicates() {
    let tmp = NamedTempFile::new().unwrap();
    let payouts = vec![payout("R-1", 4, 40), payout("R-2", 4, 20)];
    save_payouts_to_json(&payouts, tmp.path()).unwrap();
    assert_eq!(load_payouts_from_json(tmp.path()).unwrap(), payouts);

    let dup = vec![payout("R-1", 4, 40), payout("R-1", 4, 41)];
    save_payouts_to_json(&dup, tmp.path()).unwrap();
    assert!(matches!(
        load_payouts_from_json(tmp.path()),
        Err(PersistenceError::InvalidData(_))
    ));
}

#[test]
fn serialized_payout_exposes_year_and_month() {
    let value = serde_json::to_value(payout("R-1", 4, 40)).unwrap();
    assert_eq!(value["year"], 2025);
    assert_eq!(value["month"], 4);
    assert_eq!(value["status"], "calculated");
}
