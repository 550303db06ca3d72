//! Store key and record types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::journey::JourneyState;

/// Identifier of one simulated vehicle.
///
/// Serialized as a bare string (e.g. `"KA-01-1234"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(String);

impl BusId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BusId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("bus id must not be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for BusId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One entry of the fleet view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusSnapshot {
    pub bus_number: BusId,
    pub state: JourneyState,
}

/// Change notification emitted by stores that support push.
pub type StoreUpdate = BusSnapshot;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_id_parse_trims() {
        let id: BusId = "  KA-01 ".parse().unwrap();
        assert_eq!(id.as_str(), "KA-01");
        assert_eq!(id.to_string(), "KA-01");
    }

    #[test]
    fn test_bus_id_parse_rejects_empty() {
        assert!("   ".parse::<BusId>().is_err());
    }

    #[test]
    fn test_bus_id_serializes_as_string() {
        let json = serde_json::to_string(&BusId::new("7")).unwrap();
        assert_eq!(json, "\"7\"");
    }

    #[test]
    fn test_snapshot_wire_names() {
        let snapshot = BusSnapshot {
            bus_number: BusId::new("7"),
            state: JourneyState::default(),
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["busNumber"], "7");
        assert_eq!(value["state"]["status"]["kind"], "idle");
    }
}
