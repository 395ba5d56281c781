use serde::{Deserialize, Serialize};
use std::fmt;

/// Clients whose document-retrieval cases are worked by resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Client {
    Verisma,
    Mro,
    Datavant,
}

impl Client {
    pub const ALL: [Client; 3] = [Client::Verisma, Client::Mro, Client::Datavant];

    pub fn as_str(&self) -> &'static str {
        match self {
            Client::Verisma => "verisma",
            Client::Mro => "mro",
            Client::Datavant => "datavant",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Client::Verisma => "Verisma",
            Client::Mro => "MRO",
            Client::Datavant => "Datavant",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "verisma" => Some(Client::Verisma),
            "mro" => Some(Client::Mro),
            "datavant" => Some(Client::Datavant),
            _ => None,
        }
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Whether a case-log row records processing work (fixed per-location rate)
/// or logging work (slab rate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Logging,
    Processing,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Logging => "logging",
            ActivityKind::Processing => "processing",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "logging" => Some(ActivityKind::Logging),
            "processing" => Some(ActivityKind::Processing),
            _ => None,
        }
    }
}
