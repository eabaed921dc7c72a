use std::{
    fs,
    path::Path,
};

use async_trait::async_trait;
use serde::{
    Deserialize,
    Serialize,
};

use super::{
    parse_due_items,
    DueItem,
    ScheduleSnapshot,
};
use crate::core::KeikoError;

/// Where existing scheduling records come from. Keys it has no record for are
/// left out and treated as never reviewed.
#[async_trait]
pub trait SchedulingSource: Send + Sync {
    async fn fetch_records(
        &self,
        user_id: &str,
        keys: &[String],
    ) -> Result<ScheduleSnapshot, KeikoError>;

    /// Every item currently due anywhere in the learner's account.
    async fn fetch_due(&self, user_id: &str) -> Result<Vec<DueItem>, KeikoError>;
}

/// Raw schedule export. Entries are kept as JSON so one bad record cannot
/// reject the whole file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleFile {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub records: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub due: Vec<serde_json::Value>,
}

/// Serves records from a snapshot already in memory. When bound to a user, other
/// users see nothing.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    user_id: Option<String>,
    snapshot: ScheduleSnapshot,
    due: Vec<DueItem>,
}

impl SnapshotSource {
    pub fn new(user_id: Option<String>, snapshot: ScheduleSnapshot, due: Vec<DueItem>) -> Self {
        Self { user_id, snapshot, due }
    }

    pub fn from_file(file: ScheduleFile) -> Self {
        let snapshot = ScheduleSnapshot::from_raw(file.records);
        let due = parse_due_items(file.due);
        Self { user_id: file.user_id, snapshot, due }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, KeikoError> {
        let content = fs::read_to_string(path).map_err(|e| {
            KeikoError::FailedToLoadFile(format!("{}: {}", path.display(), e))
        })?;
        let file: ScheduleFile = serde_json::from_str(&content)?;
        let source = Self::from_file(file);
        tracing::debug!(
            records = source.snapshot.len(),
            due = source.due.len(),
            "Loaded schedule from {}",
            path.display()
        );
        Ok(source)
    }

    fn serves(&self, user_id: &str) -> bool {
        self.user_id.as_deref().map_or(true, |bound| bound == user_id)
    }
}

#[async_trait]
impl SchedulingSource for SnapshotSource {
    async fn fetch_records(
        &self,
        user_id: &str,
        keys: &[String],
    ) -> Result<ScheduleSnapshot, KeikoError> {
        if !self.serves(user_id) {
            return Ok(ScheduleSnapshot::new());
        }
        Ok(self.snapshot.filtered(keys))
    }

    async fn fetch_due(&self, user_id: &str) -> Result<Vec<DueItem>, KeikoError> {
        if !self.serves(user_id) {
            return Ok(Vec::new());
        }
        Ok(self.due.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_file() -> ScheduleFile {
        serde_json::from_value(json!({
            "userId": "learner-1",
            "records": {
                "vocabulary:日本": {
                    "state": { "due": "2026-01-05T00:00:00Z", "stability": 3.0, "difficulty": 5.0, "reps": 1 }
                },
                "kanji:日": { "state": "broken" }
            },
            "due": [
                { "key": "kanji:月", "itemType": "kanji", "dueDate": "2026-01-01T00:00:00Z" },
                { "key": 7 }
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_snapshot_source_serves_bound_user() {
        let source = SnapshotSource::from_file(sample_file());
        let keys = vec!["vocabulary:日本".to_string(), "kanji:日".to_string()];

        let records = source.fetch_records("learner-1", &keys).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records.has_history("vocabulary:日本"));

        let due = source.fetch_due("learner-1").await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].key, "kanji:月");
    }

    #[tokio::test]
    async fn test_snapshot_source_hides_other_users() {
        let source = SnapshotSource::from_file(sample_file());
        let keys = vec!["vocabulary:日本".to_string()];

        assert!(source.fetch_records("someone-else", &keys).await.unwrap().is_empty());
        assert!(source.fetch_due("someone-else").await.unwrap().is_empty());
    }
}
