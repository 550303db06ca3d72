//! Attendance gate - holds a halted journey until the roster is decided.
//!
//! Protocol, once per stop:
//!
//! 1. [`AttendanceGate::open`] with the stop's roster (from the halt event)
//! 2. mark presence through [`AttendanceGate::mark`] / [`AttendanceGate::roster_mut`]
//! 3. [`AttendanceGate::resolve`]: append the record, notify each present
//!    person, resume the journey
//!
//! Out-of-order calls fail with [`GateError::InvalidGateState`].

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use super::record::{AttendanceRecord, Notification};
use super::roster::Person;
use super::sink::{AttendanceSink, NotificationSink, SinkError};
use crate::journey::{JourneyError, ResumeHandle};
use crate::store::BusId;

/// Errors raised by the attendance gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// Protocol misuse: resolve without open, open twice, and so on.
    #[error("Invalid gate state: {0}")]
    InvalidGateState(String),

    /// The person is not on the open stop's roster.
    #[error("Person {0} is not on the roster for this stop")]
    UnknownPerson(u32),

    /// The attendance record could not be stored. The gate stays open.
    #[error("Failed to store attendance: {0}")]
    Attendance(#[from] SinkError),

    /// The journey refused to resume.
    #[error("Failed to resume journey: {0}")]
    Resume(#[from] JourneyError),
}

#[derive(Debug)]
struct OpenStop {
    stop: u32,
    roster: Vec<Person>,
}

/// Stop-gated attendance for one bus.
pub struct AttendanceGate<A, N> {
    bus_id: BusId,
    attendance: Arc<A>,
    notifications: Arc<N>,
    resume: ResumeHandle,
    open: Option<OpenStop>,
    resolved: HashSet<u32>,
}

impl<A: AttendanceSink, N: NotificationSink> AttendanceGate<A, N> {
    pub fn new(bus_id: BusId, attendance: Arc<A>, notifications: Arc<N>, resume: ResumeHandle) -> Self {
        Self {
            bus_id,
            attendance,
            notifications,
            resume,
            open: None,
            resolved: HashSet::new(),
        }
    }

    /// Ordinal of the stop currently open, if any.
    pub fn open_stop(&self) -> Option<u32> {
        self.open.as_ref().map(|o| o.stop)
    }

    /// Open `stop` for roster decisions.
    pub fn open(&mut self, stop: u32, roster: Vec<Person>) -> Result<&mut [Person], GateError> {
        if let Some(current) = &self.open {
            return Err(GateError::InvalidGateState(format!(
                "stop {} opened while stop {} is still open",
                stop, current.stop
            )));
        }
        if self.resolved.contains(&stop) {
            return Err(GateError::InvalidGateState(format!(
                "stop {} was already resolved",
                stop
            )));
        }

        tracing::debug!(bus = %self.bus_id, stop, riders = roster.len(), "Attendance gate opened");
        let open = self.open.insert(OpenStop { stop, roster });
        Ok(&mut open.roster)
    }

    /// The open stop's roster.
    pub fn roster(&self) -> Option<&[Person]> {
        self.open.as_ref().map(|o| o.roster.as_slice())
    }

    /// Mutable access to the open stop's roster.
    pub fn roster_mut(&mut self) -> Result<&mut [Person], GateError> {
        match self.open.as_mut() {
            Some(open) => Ok(&mut open.roster),
            None => Err(GateError::InvalidGateState("no stop is open".to_string())),
        }
    }

    /// Set one person's presence flag.
    pub fn mark(&mut self, person_id: u32, present: bool) -> Result<(), GateError> {
        let person = self
            .roster_mut()?
            .iter_mut()
            .find(|p| p.id == person_id)
            .ok_or(GateError::UnknownPerson(person_id))?;
        person.present = present;
        Ok(())
    }

    /// Set every presence flag at once.
    pub fn mark_all(&mut self, present: bool) -> Result<(), GateError> {
        for person in self.roster_mut()? {
            person.present = present;
        }
        Ok(())
    }

    /// Finalize the open stop and resume the journey.
    ///
    /// If the attendance record cannot be stored, the gate stays open and
    /// the journey stays halted; calling `resolve` again retries.
    pub async fn resolve(&mut self) -> Result<AttendanceRecord, GateError> {
        let Some(open) = self.open.as_ref() else {
            return Err(GateError::InvalidGateState(
                "resolve called with no open stop".to_string(),
            ));
        };
        let stop = open.stop;
        let record = AttendanceRecord::new(self.bus_id.clone(), stop, open.roster.clone());

        if let Err(e) = self.attendance.append(&record).await {
            tracing::warn!(bus = %self.bus_id, stop, error = %e, "Failed to store attendance");
            return Err(e.into());
        }

        self.open = None;
        self.resolved.insert(stop);

        for person in record.present() {
            let notification = Notification::boarded(self.bus_id.clone(), stop, person);
            if let Err(e) = self.notifications.enqueue(&notification).await {
                tracing::warn!(
                    bus = %self.bus_id,
                    stop,
                    person = person.id,
                    error = %e,
                    "Failed to enqueue notification"
                );
            }
        }

        tracing::info!(
            bus = %self.bus_id,
            stop,
            present = record.present().count(),
            total = record.roster.len(),
            "Attendance recorded"
        );

        self.resume.resume(stop).await?;
        Ok(record)
    }
}
