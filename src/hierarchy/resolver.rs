use std::{
    collections::HashMap,
    fs,
    path::Path,
};

use async_trait::async_trait;
use serde::{
    Deserialize,
    Serialize,
};

use crate::core::{
    Kanji,
    KeikoError,
    Radical,
};

/// Looks up kanji and radical records. Characters it does not know are simply
/// missing from the result; callers must not assume completeness.
#[async_trait]
pub trait CharacterResolver: Send + Sync {
    async fn resolve_kanji(&self, characters: &[String]) -> Result<Vec<Kanji>, KeikoError>;

    async fn resolve_radicals(&self, identifiers: &[String]) -> Result<Vec<Radical>, KeikoError>;
}

/// On-disk layout of a character dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DictionaryFile {
    #[serde(default)]
    pub kanji: Vec<Kanji>,
    #[serde(default)]
    pub radicals: Vec<Radical>,
}

/// Resolver over a character dictionary held in memory.
#[derive(Debug, Clone, Default)]
pub struct DictionaryResolver {
    kanji: HashMap<String, Kanji>,
    radicals: HashMap<String, Radical>,
}

impl DictionaryResolver {
    pub fn new(kanji: Vec<Kanji>, radicals: Vec<Radical>) -> Self {
        Self {
            kanji: kanji.into_iter().map(|k| (k.character.clone(), k)).collect(),
            radicals: radicals.into_iter().map(|r| (r.identifier(), r)).collect(),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, KeikoError> {
        let content = fs::read_to_string(path).map_err(|e| {
            KeikoError::FailedToLoadFile(format!("{}: {}", path.display(), e))
        })?;
        let dictionary: DictionaryFile = serde_json::from_str(&content)?;
        tracing::debug!(
            kanji = dictionary.kanji.len(),
            radicals = dictionary.radicals.len(),
            "Loaded character dictionary from {}",
            path.display()
        );
        Ok(Self::new(dictionary.kanji, dictionary.radicals))
    }

    pub fn len(&self) -> usize {
        self.kanji.len() + self.radicals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CharacterResolver for DictionaryResolver {
    async fn resolve_kanji(&self, characters: &[String]) -> Result<Vec<Kanji>, KeikoError> {
        Ok(characters.iter().filter_map(|c| self.kanji.get(c).cloned()).collect())
    }

    async fn resolve_radicals(&self, identifiers: &[String]) -> Result<Vec<Radical>, KeikoError> {
        Ok(identifiers.iter().filter_map(|id| self.radicals.get(id).cloned()).collect())
    }
}
