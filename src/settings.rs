use std::path::Path;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    core::{
        KeikoError,
        PracticeMode,
    },
    persistence::{
        load_json_or_default,
        load_json_or_default_from,
        save_json,
        save_json_to,
    },
    session::SessionOptions,
};

pub const SETTINGS_FILE: &str = "session_settings.json";

fn default_true() -> bool {
    true
}

fn default_user() -> String {
    "local".to_string()
}

/// Session preferences kept between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub mode: PracticeMode,
    pub flip_vocab_qa: bool,
    pub flip_prereq_qa: bool,
    #[serde(default = "default_true")]
    pub prerequisites_enabled: bool,
    pub shuffle: bool,
    #[serde(default = "default_true")]
    pub local_scheduler: bool,
    #[serde(default = "default_user")]
    pub user_id: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            mode: PracticeMode::Meanings,
            flip_vocab_qa: false,
            flip_prereq_qa: false,
            prerequisites_enabled: true,
            shuffle: false,
            local_scheduler: true,
            user_id: default_user(),
        }
    }
}

impl SessionSettings {
    pub fn load() -> Self {
        load_json_or_default(SETTINGS_FILE)
    }

    pub fn save(&self) -> Result<(), KeikoError> {
        save_json(self, SETTINGS_FILE)
    }

    pub fn load_from(path: &Path) -> Self {
        load_json_or_default_from(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), KeikoError> {
        save_json_to(self, path)
    }

    pub fn to_options(&self, now: DateTime<Utc>) -> SessionOptions {
        SessionOptions {
            mode: self.mode,
            flip_vocab_qa: self.flip_vocab_qa,
            flip_prereq_qa: self.flip_prereq_qa,
            prerequisites_enabled: self.prerequisites_enabled,
            shuffle: self.shuffle,
            local_scheduler: self.local_scheduler,
            now,
        }
    }
}
