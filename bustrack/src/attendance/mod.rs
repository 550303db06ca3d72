//! Stop attendance.
//!
//! - [`Roster`] - who is expected at each stop (injected configuration)
//! - [`AttendanceGate`] - keeps a halted journey halted until the roster is decided
//! - [`AttendanceSink`] / [`NotificationSink`] - where decisions go

mod gate;
mod record;
mod roster;
mod sink;

pub use gate::{AttendanceGate, GateError};
pub use record::{AttendanceRecord, Notification};
pub use roster::{Person, Roster};
pub use sink::{
    AttendanceSink, InMemorySink, JsonFileSink, NotificationSink, SinkError, ATTENDANCE_FILE,
    NOTIFICATIONS_FILE,
};
