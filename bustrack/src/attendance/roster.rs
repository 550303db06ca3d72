//! Rosters: who is expected at each stop.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A person on a stop's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub present: bool,
}

impl Person {
    /// A person not yet marked present.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            present: false,
        }
    }
}

/// Stop ordinal → people expected at that stop.
///
/// Injected from configuration; the simulator only ever reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    stops: BTreeMap<u32, Vec<Person>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_stop(mut self, stop: u32, people: Vec<Person>) -> Self {
        self.insert(stop, people);
        self
    }

    /// Replace the list for `stop`.
    pub fn insert(&mut self, stop: u32, people: Vec<Person>) {
        self.stops.insert(stop, people);
    }

    /// A fresh copy of the list for `stop`, with every presence flag cleared.
    ///
    /// Unknown stops yield an empty list.
    pub fn for_stop(&self, stop: u32) -> Vec<Person> {
        self.stops
            .get(&stop)
            .map(|people| {
                people
                    .iter()
                    .map(|p| Person::new(p.id, p.name.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Stop ordinals that have a roster, ascending.
    pub fn stops(&self) -> impl Iterator<Item = u32> + '_ {
        self.stops.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Iterate over `(stop, people)` pairs, ascending by stop.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[Person])> {
        self.stops.iter().map(|(k, v)| (*k, v.as_slice()))
    }
}
