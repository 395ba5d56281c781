//! Injectable payroll configuration.
//!
//! The slab table, the processing rate table and the logging policy live here
//! instead of being baked into the calculator, so alternate tables can be
//! tested and deployed without touching calculation logic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::client::Client;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid slab table: {0}")]
    InvalidSlabTable(String),

    #[error("invalid rate table: {0}")]
    InvalidRateTable(String),

    #[error("unsupported config format '{0}' (expected .toml or .json)")]
    UnsupportedFormat(String),
}

/// One band of the logging slab: `[min, max)` average cases per hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabBand {
    pub min: Decimal,
    /// `None` for the top band, which has no upper bound.
    #[serde(default)]
    pub max: Option<Decimal>,
    pub rate: Decimal,
}

impl SlabBand {
    pub fn new(min: Decimal, max: Option<Decimal>, rate: Decimal) -> Self {
        Self { min, max, rate }
    }

    pub fn contains(&self, avg_cases_per_hour: Decimal) -> bool {
        avg_cases_per_hour >= self.min && self.max.is_none_or(|max| avg_cases_per_hour < max)
    }
}

/// Ordered, contiguous partition of `[0, ∞)` into rate bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SlabBand>", into = "Vec<SlabBand>")]
pub struct SlabTable {
    bands: Vec<SlabBand>,
}

impl Default for SlabTable {
    fn default() -> Self {
        Self {
            bands: vec![
                SlabBand::new(Decimal::ZERO, Some(Decimal::new(13, 0)), Decimal::new(50, 2)),
                SlabBand::new(
                    Decimal::new(13, 0),
                    Some(Decimal::new(16, 0)),
                    Decimal::new(55, 2),
                ),
                SlabBand::new(
                    Decimal::new(16, 0),
                    Some(Decimal::new(21, 0)),
                    Decimal::new(60, 2),
                ),
                SlabBand::new(Decimal::new(21, 0), None, Decimal::new(65, 2)),
            ],
        }
    }
}

impl TryFrom<Vec<SlabBand>> for SlabTable {
    type Error = ConfigError;

    fn try_from(bands: Vec<SlabBand>) -> Result<Self, Self::Error> {
        Self::new(bands)
    }
}

impl From<SlabTable> for Vec<SlabBand> {
    fn from(table: SlabTable) -> Self {
        table.bands
    }
}

impl SlabTable {
    pub fn new(bands: Vec<SlabBand>) -> Result<Self, ConfigError> {
        let invalid = |msg: String| Err(ConfigError::InvalidSlabTable(msg));

        let Some(first) = bands.first() else {
            return invalid("at least one band is required".into());
        };
        if !first.min.is_zero() {
            return invalid(format!("first band must start at 0 (starts at {})", first.min));
        }

        let last_idx = bands.len() - 1;
        for (idx, band) in bands.iter().enumerate() {
            if band.rate < Decimal::ZERO {
                return invalid(format!("band #{idx} has negative rate {}", band.rate));
            }
            match band.max {
                Some(max) => {
                    if max <= band.min {
                        return invalid(format!(
                            "band #{idx} upper bound {max} must exceed lower bound {}",
                            band.min
                        ));
                    }
                    if idx == last_idx {
                        return invalid("last band must be unbounded".into());
                    }
                    let next = &bands[idx + 1];
                    if next.min != max {
                        return invalid(format!(
                            "band #{} starts at {} but band #{idx} ends at {max}",
                            idx + 1,
                            next.min
                        ));
                    }
                }
                None if idx != last_idx => {
                    return invalid(format!("only the last band may be unbounded (band #{idx})"));
                }
                None => {}
            }
        }

        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[SlabBand] {
        &self.bands
    }

    /// The band containing `avg_cases_per_hour`. Negative averages are parked
    /// at the bottom band.
    pub fn lookup(&self, avg_cases_per_hour: Decimal) -> &SlabBand {
        self.bands
            .iter()
            .find(|band| band.contains(avg_cases_per_hour))
            .unwrap_or(&self.bands[0])
    }

    /// Rate of the unbounded top band; complete-logging cases are topped up to it.
    pub fn top_rate(&self) -> Decimal {
        self.bands[self.bands.len() - 1].rate
    }
}

/// Fixed per-case processing rate for one client location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingRate {
    pub client: Client,
    pub location_id: String,
    #[serde(default)]
    pub location_name: String,
    pub rate: Decimal,
}

impl ProcessingRate {
    pub fn new(client: Client, location_id: impl Into<String>, rate: Decimal) -> Self {
        Self {
            client,
            location_id: location_id.into(),
            location_name: String::new(),
            rate,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ProcessingRate>", into = "Vec<ProcessingRate>")]
pub struct RateTable {
    entries: Vec<ProcessingRate>,
    index: HashMap<(Client, String), usize>,
}

impl TryFrom<Vec<ProcessingRate>> for RateTable {
    type Error = ConfigError;

    fn try_from(entries: Vec<ProcessingRate>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<RateTable> for Vec<ProcessingRate> {
    fn from(table: RateTable) -> Self {
        table.entries
    }
}

impl RateTable {
    pub fn new(entries: Vec<ProcessingRate>) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            if entry.location_id.trim().is_empty() {
                return Err(ConfigError::InvalidRateTable(format!(
                    "rate #{idx} requires a non-empty location_id"
                )));
            }
            if entry.rate < Decimal::ZERO {
                return Err(ConfigError::InvalidRateTable(format!(
                    "{} location '{}' has negative rate {}",
                    entry.client, entry.location_id, entry.rate
                )));
            }
            if index
                .insert((entry.client, entry.location_id.clone()), idx)
                .is_some()
            {
                return Err(ConfigError::InvalidRateTable(format!(
                    "duplicate rate for {} location '{}'",
                    entry.client, entry.location_id
                )));
            }
        }
        Ok(Self { entries, index })
    }

    pub fn lookup(&self, client: Client, location_id: &str) -> Option<&ProcessingRate> {
        self.index
            .get(&(client, location_id.to_string()))
            .map(|&idx| &self.entries[idx])
    }

    pub fn rate_for(&self, client: Client, location_id: &str) -> Option<Decimal> {
        self.lookup(client, location_id).map(|entry| entry.rate)
    }

    pub fn entries(&self) -> &[ProcessingRate] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingPolicy {
    /// Whether Datavant logging cases count toward the combined logging total
    /// and slab average.
    #[serde(default = "default_include_datavant")]
    pub include_datavant: bool,
}

fn default_include_datavant() -> bool {
    true
}

impl Default for LoggingPolicy {
    fn default() -> Self {
        Self {
            include_datavant: default_include_datavant(),
        }
    }
}

impl LoggingPolicy {
    pub fn counts_toward_logging(&self, client: Client) -> bool {
        client != Client::Datavant || self.include_datavant
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollConfig {
    #[serde(default)]
    pub slabs: SlabTable,
    #[serde(default)]
    pub processing_rates: RateTable,
    #[serde(default)]
    pub logging: LoggingPolicy,
}

impl PayrollConfig {
    pub fn with_rates(processing_rates: RateTable) -> Self {
        Self {
            processing_rates,
            ..Self::default()
        }
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Loads a config file, picking the format from its extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let config = match extension.as_str() {
            "toml" => Self::from_toml_str(&contents)?,
            "json" => Self::from_json_str(&contents)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        tracing::info!(
            path = %path.display(),
            slabs = config.slabs.bands().len(),
            rates = config.processing_rates.len(),
            "loaded payroll config"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn default_table_boundaries_are_closed_below() {
        let table = SlabTable::default();
        assert_eq!(table.lookup(dec("0")).rate, dec("0.50"));
        assert_eq!(table.lookup(dec("12.999")).rate, dec("0.50"));
        assert_eq!(table.lookup(dec("13.0")).rate, dec("0.55"));
        assert_eq!(table.lookup(dec("15.99")).rate, dec("0.55"));
        assert_eq!(table.lookup(dec("16")).rate, dec("0.60"));
        assert_eq!(table.lookup(dec("20.9999")).rate, dec("0.60"));
        assert_eq!(table.lookup(dec("21.0")).rate, dec("0.65"));
        assert_eq!(table.lookup(dec("400")).rate, dec("0.65"));
        assert_eq!(table.top_rate(), dec("0.65"));
    }

    #[test]
    fn exactly_one_band_matches_any_average() {
        let table = SlabTable::default();
        let mut avg = Decimal::ZERO;
        while avg < dec("30") {
            let matches = table.bands().iter().filter(|b| b.contains(avg)).count();
            assert_eq!(matches, 1, "avg {avg} matched {matches} bands");
            avg += dec("0.25");
        }
    }

    #[test]
    fn rejects_gapped_or_bounded_tables() {
        let gap = SlabTable::new(vec![
            SlabBand::new(dec("0"), Some(dec("10")), dec("0.5")),
            SlabBand::new(dec("11"), None, dec("0.6")),
        ]);
        assert!(matches!(gap, Err(ConfigError::InvalidSlabTable(_))));

        let bounded_top = SlabTable::new(vec![SlabBand::new(dec("0"), Some(dec("10")), dec("0.5"))]);
        assert!(bounded_top.is_err());

        let not_from_zero = SlabTable::new(vec![SlabBand::new(dec("1"), None, dec("0.5"))]);
        assert!(not_from_zero.is_err());

        assert!(SlabTable::new(Vec::new()).is_err());
    }

    #[test]
    fn rate_table_rejects_duplicates_and_negative_rates() {
        let dup = RateTable::new(vec![
            ProcessingRate::new(Client::Mro, "LOC-1", dec("1.00")),
            ProcessingRate::new(Client::Mro, "LOC-1", dec("2.00")),
        ]);
        assert!(matches!(dup, Err(ConfigError::InvalidRateTable(_))));

        let negative = RateTable::new(vec![ProcessingRate::new(Client::Mro, "LOC-1", dec("-1"))]);
        assert!(negative.is_err());

        let same_location_other_client = RateTable::new(vec![
            ProcessingRate::new(Client::Mro, "LOC-1", dec("1.00")),
            ProcessingRate::new(Client::Verisma, "LOC-1", dec("2.00")),
        ])
        .unwrap();
        assert_eq!(
            same_location_other_client.rate_for(Client::Verisma, "LOC-1"),
            Some(dec("2.00"))
        );
        assert_eq!(same_location_other_client.rate_for(Client::Datavant, "LOC-1"), None);
    }

    #[test]
    fn parses_toml_config() {
        let config = PayrollConfig::from_toml_str(
            r#"
            [logging]
            include_datavant = false

            [[slabs]]
            min = "0"
            max = "10"
            rate = "0.40"

            [[slabs]]
            min = "10"
            rate = "0.70"

            [[processing_rates]]
            client = "mro"
            location_id = "LOC-7"
            location_name = "Mercy General"
            rate = "1.25"
            "#,
        )
        .unwrap();

        assert!(!config.logging.include_datavant);
        assert_eq!(config.slabs.bands().len(), 2);
        assert_eq!(config.slabs.top_rate(), dec("0.70"));
        assert_eq!(config.processing_rates.rate_for(Client::Mro, "LOC-7"), Some(dec("1.25")));
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = PayrollConfig::from_toml_str("").unwrap();
        assert_eq!(config, PayrollConfig::default());
        assert!(config.logging.include_datavant);
    }

    #[test]
    fn invalid_slab_table_in_json_is_rejected() {
        let err = PayrollConfig::from_json_str(
            r#"{"slabs":[{"min":"0","max":"5","rate":"0.5"},{"min":"6","rate":"0.6"}]}"#,
        );
        assert!(err.is_err());
    }
}
