//! Attendance and notification records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::roster::Person;
use crate::store::BusId;

/// Immutable snapshot of one stop's roster decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(rename = "date", default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    pub bus_number: BusId,

    pub stop_number: u32,

    /// Roster as it stood when the gate was resolved.
    #[serde(rename = "students")]
    pub roster: Vec<Person>,
}

impl AttendanceRecord {
    pub fn new(bus_number: BusId, stop_number: u32, roster: Vec<Person>) -> Self {
        Self {
            timestamp: Utc::now(),
            bus_number,
            stop_number,
            roster,
        }
    }

    /// People marked present.
    pub fn present(&self) -> impl Iterator<Item = &Person> {
        self.roster.iter().filter(|p| p.present)
    }
}

/// A message addressed to one person (or their guardians).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "time", default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    pub bus_number: BusId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_number: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<u32>,

    #[serde(default, rename = "studentName", skip_serializing_if = "Option::is_none")]
    pub person_name: Option<String>,

    pub message: String,
}

impl Notification {
    /// "`{name}` has boarded the bus".
    pub fn boarded(bus_number: BusId, stop_number: u32, person: &Person) -> Self {
        Self {
            timestamp: Utc::now(),
            bus_number,
            stop_number: Some(stop_number),
            person_id: Some(person.id),
            person_name: Some(person.name.clone()),
            message: format!("{} has boarded the bus", person.name),
        }
    }
}
