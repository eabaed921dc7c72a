use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

use super::utils::{
    furigana_to_reading,
    is_single_character,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Vocabulary,
    Kanji,
    Radical,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Vocabulary => "vocabulary",
            ItemType::Kanji => "kanji",
            ItemType::Radical => "radical",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value {
            "vocabulary" => Some(ItemType::Vocabulary),
            "kanji" => Some(ItemType::Kanji),
            "radical" => Some(ItemType::Radical),
            _ => None,
        }
    }

    /// Kanji and radicals sit below vocabulary in the hierarchy.
    pub fn is_prerequisite(&self) -> bool {
        !matches!(self, ItemType::Vocabulary)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PracticeMode {
    #[default]
    Meanings,
    Readings,
}

impl PracticeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PracticeMode::Meanings => "meanings",
            PracticeMode::Readings => "readings",
        }
    }
}

impl fmt::Display for PracticeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mnemonics {
    #[serde(default)]
    pub meaning: Option<String>,
    #[serde(default)]
    pub reading: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleSentence {
    pub japanese: String,
    #[serde(default)]
    pub english: Option<String>,
}

/// One blank in a sentence. Slots sharing a label draw from the same answer pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleSlot {
    pub particle: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl ParticleSlot {
    pub fn new(particle: &str) -> Self {
        Self { particle: particle.to_string(), label: None }
    }

    pub fn labeled(particle: &str, label: &str) -> Self {
        Self { particle: particle.to_string(), label: Some(label.to_string()) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyItem {
    pub word: String,
    /// Bracket annotation, e.g. `食[た]べる`
    #[serde(default)]
    pub furigana: String,
    #[serde(default)]
    pub translations: Vec<String>,
    #[serde(default)]
    pub part_of_speech: Option<String>,
    #[serde(default)]
    pub example_sentences: Option<Vec<ExampleSentence>>,
    #[serde(default)]
    pub particles: Option<Vec<ParticleSlot>>,
    #[serde(default)]
    pub mnemonics: Option<Mnemonics>,
}

impl VocabularyItem {
    pub fn new(word: &str, furigana: &str, translations: &[&str]) -> Self {
        Self {
            word: word.to_string(),
            furigana: furigana.to_string(),
            translations: translations.iter().map(|t| t.to_string()).collect(),
            part_of_speech: None,
            example_sentences: None,
            particles: None,
            mnemonics: None,
        }
    }

    /// Kana reading derived from the furigana, falling back to the word itself.
    pub fn reading(&self) -> String {
        if self.furigana.trim().is_empty() {
            return self.word.clone();
        }
        furigana_to_reading(&self.furigana)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kanji {
    pub character: String,
    #[serde(default)]
    pub meanings: Vec<String>,
    #[serde(default)]
    pub readings: Vec<String>,
    #[serde(default)]
    pub mnemonic: Option<String>,
    /// Radical identifiers, see [`Radical::identifier`]
    #[serde(default)]
    pub radicals: Vec<String>,
}

impl Kanji {
    pub fn placeholder(character: &str) -> Self {
        Self {
            character: character.to_string(),
            meanings: Vec::new(),
            readings: Vec::new(),
            mnemonic: None,
            radicals: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Radical {
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub meanings: Vec<String>,
    #[serde(default)]
    pub mnemonic: Option<String>,
    /// Identifier of a glyphless radical known only by name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Radical {
    /// Only a single character is taken as a glyph; anything longer is kept as a name.
    pub fn placeholder(identifier: &str) -> Self {
        let (character, name) = if is_single_character(identifier) {
            (Some(identifier.to_string()), None)
        } else {
            (None, Some(identifier.to_string()))
        };
        Self { character, meanings: Vec::new(), mnemonic: None, name }
    }

    /// The glyph when there is one, otherwise the name, otherwise the first
    /// meaning in lowercase.
    pub fn identifier(&self) -> String {
        match (&self.character, &self.name) {
            (Some(character), _) if !character.trim().is_empty() => character.clone(),
            (_, Some(name)) if !name.trim().is_empty() => name.trim().to_lowercase(),
            _ => self.meanings.first().map(|m| m.trim().to_lowercase()).unwrap_or_default(),
        }
    }
}
