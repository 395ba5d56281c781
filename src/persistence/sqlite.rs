use super::{PayoutStore, PersistenceError, PersistenceResult};
use crate::payout::{PayoutKey, PayoutStatus, ResourcePayout};
use crate::period::PayPeriod;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Mutex;

pub struct SqlitePayoutStore {
    connection: Mutex<Connection>,
}

impl SqlitePayoutStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS payouts (
                resource_id TEXT NOT NULL,
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                status TEXT NOT NULL,
                payout_json TEXT NOT NULL,
                PRIMARY KEY (resource_id, year, month)
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.connection.lock().expect("sqlite mutex poisoned")
    }

    fn stored_status(
        conn: &Connection,
        key: &PayoutKey,
    ) -> PersistenceResult<Option<PayoutStatus>> {
        let status: Option<String> = conn
            .query_row(
                "SELECT status FROM payouts WHERE resource_id = ?1 AND year = ?2 AND month = ?3",
                params![key.resource_id, key.period.year(), key.period.month()],
                |row| row.get(0),
            )
            .optional()?;
        status
            .map(|s| {
                PayoutStatus::from_str(&s).ok_or_else(|| {
                    PersistenceError::InvalidData(format!("unknown payout status '{s}'"))
                })
            })
            .transpose()
    }

    fn write_payout(conn: &Connection, payout: &ResourcePayout) -> PersistenceResult<()> {
        let json = serde_json::to_string(payout)?;
        conn.execute(
            "INSERT INTO payouts (resource_id, year, month, status, payout_json)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (resource_id, year, month)
             DO UPDATE SET status = excluded.status, payout_json = excluded.payout_json",
            params![
                payout.resource_id,
                payout.period.year(),
                payout.period.month(),
                payout.status.as_str(),
                json
            ],
        )?;
        Ok(())
    }
}

impl PayoutStore for SqlitePayoutStore {
    fn save_payout(&self, payout: &ResourcePayout) -> PersistenceResult<()> {
        let key = payout.key();
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        super::ensure_replaceable(&key, Self::stored_status(&tx, &key)?)?;
        Self::write_payout(&tx, payout)?;
        tx.commit()?;
        Ok(())
    }

    fn load_payout(&self, key: &PayoutKey) -> PersistenceResult<Option<ResourcePayout>> {
        let conn = self.lock();
        let json: Option<String> = conn
            .query_row(
                "SELECT payout_json FROM payouts WHERE resource_id = ?1 AND year = ?2 AND month = ?3",
                params![key.resource_id, key.period.year(), key.period.month()],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn list_payouts(&self, period: PayPeriod) -> PersistenceResult<Vec<ResourcePayout>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT payout_json FROM payouts WHERE year = ?1 AND month = ?2 ORDER BY resource_id ASC",
        )?;
        let rows = stmt.query_map(params![period.year(), period.month()], |row| {
            row.get::<_, String>(0)
        })?;

        let mut payouts = Vec::new();
        for json in rows {
            let json = json?;
            payouts.push(serde_json::from_str(&json)?);
        }
        Ok(payouts)
    }

    fn update_status(
        &self,
        key: &PayoutKey,
        status: PayoutStatus,
    ) -> PersistenceResult<ResourcePayout> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let json: Option<String> = tx
            .query_row(
                "SELECT payout_json FROM payouts WHERE resource_id = ?1 AND year = ?2 AND month = ?3",
                params![key.resource_id, key.period.year(), key.period.month()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(json) = json else {
            return Err(PersistenceError::NotFound(key.clone()));
        };
        let mut payout: ResourcePayout = serde_json::from_str(&json)?;
        super::ensure_transition(key, payout.status, status)?;
        payout.status = status;
        Self::write_payout(&tx, &payout)?;
        tx.commit()?;
        Ok(payout)
    }
}
