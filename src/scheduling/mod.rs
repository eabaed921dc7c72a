//! Scheduling data owned by an external spaced-repetition scheduler.
//!
//! The engine only stores, looks up and forwards these records; due dates and
//! stability are always computed by a [`Scheduler`] implementation.

use std::collections::HashMap;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::core::{
    ItemType,
    PracticeMode,
};

pub mod source;

pub use source::{
    ScheduleFile,
    SchedulingSource,
    SnapshotSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardPhase {
    #[default]
    New,
    Learning,
    Review,
    Relearning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingState {
    pub due: DateTime<Utc>,
    pub stability: f64,
    pub difficulty: f64,
    #[serde(default)]
    pub elapsed_days: u32,
    #[serde(default)]
    pub scheduled_days: u32,
    #[serde(default)]
    pub reps: u32,
    #[serde(default)]
    pub lapses: u32,
    #[serde(default, rename = "state")]
    pub phase: CardPhase,
    #[serde(default)]
    pub last_review: Option<DateTime<Utc>>,
}

impl SchedulingState {
    fn is_well_formed(&self) -> bool {
        self.stability.is_finite()
            && self.stability >= 0.0
            && self.difficulty.is_finite()
            && self.difficulty >= 0.0
    }
}

/// State of a card that has never been reviewed, due immediately.
pub fn fresh_state(now: DateTime<Utc>) -> SchedulingState {
    SchedulingState {
        due: now,
        stability: 0.0,
        difficulty: 0.0,
        elapsed_days: 0,
        scheduled_days: 0,
        reps: 0,
        lapses: 0,
        phase: CardPhase::New,
        last_review: None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLog {
    pub rating: Rating,
    #[serde(default, rename = "state")]
    pub phase: CardPhase,
    pub due: DateTime<Utc>,
    pub stability: f64,
    pub difficulty: f64,
    pub review: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub state: SchedulingState,
    #[serde(default)]
    pub logs: Vec<ReviewLog>,
}

impl ScheduleRecord {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self { state: fresh_state(now), logs: Vec::new() }
    }

    /// Whether the learner has reviewed this item before.
    pub fn has_history(&self) -> bool {
        !self.logs.is_empty() || self.state.reps > 0 || self.state.last_review.is_some()
    }
}

/// Advances scheduling state on each answer. The algorithm lives outside this crate.
/// Cards without a record start from [`fresh_state`].
pub trait Scheduler {
    fn review(
        &self,
        state: &SchedulingState,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> (SchedulingState, ReviewLog);
}

/// Per-key scheduling records for one learner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleSnapshot {
    records: HashMap<String, ScheduleRecord>,
}

impl ScheduleSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses raw records, dropping any entry that does not deserialize or carries
    /// impossible values. Dropped keys behave as never reviewed.
    pub fn from_raw<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        let mut records = HashMap::new();
        let mut dropped = 0;

        for (key, value) in entries {
            match serde_json::from_value::<ScheduleRecord>(value) {
                Ok(record) if record.state.is_well_formed() => {
                    records.insert(key, record);
                }
                Ok(_) => {
                    tracing::warn!("Dropping schedule entry {} with invalid values", key);
                    dropped += 1;
                }
                Err(e) => {
                    tracing::warn!("Dropping malformed schedule entry {}: {}", key, e);
                    dropped += 1;
                }
            }
        }

        if dropped > 0 {
            tracing::debug!(kept = records.len(), dropped, "Parsed schedule snapshot");
        }

        Self { records }
    }

    pub fn insert(&mut self, key: String, record: ScheduleRecord) {
        self.records.insert(key, record);
    }

    pub fn get(&self, key: &str) -> Option<&ScheduleRecord> {
        self.records.get(key)
    }

    pub fn has_history(&self, key: &str) -> bool {
        self.records.get(key).is_some_and(ScheduleRecord::has_history)
    }

    pub fn extend(&mut self, other: ScheduleSnapshot) {
        self.records.extend(other.records);
    }

    pub fn filtered(&self, keys: &[String]) -> ScheduleSnapshot {
        let records = keys
            .iter()
            .filter_map(|key| self.records.get(key).map(|r| (key.clone(), r.clone())))
            .collect();
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// An item due for review somewhere in the learner's account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueItem {
    pub key: String,
    pub item_type: ItemType,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub mode: PracticeMode,
}

impl DueItem {
    /// Identifier part of the key, `食` for `kanji:食`.
    pub fn identifier(&self) -> &str {
        match self.key.split_once(':') {
            Some((_, identifier)) => identifier,
            None => &self.key,
        }
    }
}

/// Lenient counterpart of [`ScheduleSnapshot::from_raw`] for due lists.
pub fn parse_due_items(values: Vec<serde_json::Value>) -> Vec<DueItem> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<DueItem>(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("Dropping malformed due item: {}", e);
                None
            }
        })
        .collect()
}
