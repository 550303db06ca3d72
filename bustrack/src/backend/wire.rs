//! JSON bodies exchanged with the backend.

use serde::{Deserialize, Serialize};

use crate::journey::JourneyState;

/// Body of `POST /bus/update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusUpdate {
    #[serde(default)]
    pub bus_number: Option<String>,

    #[serde(default)]
    pub state: Option<JourneyState>,
}

/// Query of `GET /bus/status`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub bus_number: Option<String>,
}

/// `{ "message": ... }` acknowledgement or error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub const MSG_BUS_UPDATED: &str = "Bus location updated";
pub const MSG_MISSING_BUS_DATA: &str = "Missing bus data";
pub const MSG_BUS_NOT_STARTED: &str = "Bus not started";
pub const MSG_ATTENDANCE_SAVED: &str = "Attendance saved successfully";
pub const MSG_NOTIFICATION_SAVED: &str = "Notification saved";
