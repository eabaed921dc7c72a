use std::fmt;

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
        ItemType,
        Kanji,
        KeikoError,
        ParticleSlot,
        PracticeMode,
        Radical,
        VocabularyItem,
    },
    scheduling::{
        fresh_state,
        ReviewLog,
        ScheduleRecord,
        SchedulingState,
    },
    validation::{
        validate_written,
        AcceptableAnswers,
        DEFAULT_CATEGORY,
    },
};

/// `"{itemType}:{identifier}"`, unique across a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardKey {
    pub item_type: ItemType,
    pub identifier: String,
}

impl CardKey {
    pub fn new(item_type: ItemType, identifier: &str) -> Self {
        Self { item_type, identifier: identifier.to_string() }
    }

    pub fn vocabulary(word: &str) -> Self {
        Self::new(ItemType::Vocabulary, word)
    }

    pub fn kanji(character: &str) -> Self {
        Self::new(ItemType::Kanji, character)
    }

    pub fn radical(identifier: &str) -> Self {
        Self::new(ItemType::Radical, identifier)
    }

    /// Splits on the first `:` so identifiers may themselves contain colons.
    pub fn parse(key: &str) -> Result<Self, KeikoError> {
        let (item_type, identifier) =
            key.split_once(':').ok_or_else(|| KeikoError::InvalidKey(key.to_string()))?;
        let item_type =
            ItemType::from_name(item_type).ok_or_else(|| KeikoError::InvalidKey(key.to_string()))?;
        if identifier.is_empty() {
            return Err(KeikoError::InvalidKey(key.to_string()));
        }
        Ok(Self::new(item_type, identifier))
    }
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.item_type, self.identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeCard {
    pub key: String,
    pub item_type: ItemType,
    pub prompt: String,
    pub answers: Vec<String>,
    pub mode: PracticeMode,
    /// Prompt and answer sides swapped
    pub flipped: bool,
    /// Hidden from the queue because the scheduler has it due later
    pub disabled: bool,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub particles: Option<Vec<ParticleSlot>>,
    pub schedule: SchedulingState,
    #[serde(default)]
    pub review_log: Vec<ReviewLog>,
}

impl PracticeCard {
    pub fn acceptable_answers(&self) -> AcceptableAnswers {
        AcceptableAnswers::uncategorized(&self.answers)
    }

    pub fn check(&self, input: &str) -> bool {
        validate_written(input, &self.acceptable_answers(), &[DEFAULT_CATEGORY])
    }

    pub fn has_history(&self) -> bool {
        !self.review_log.is_empty()
            || self.schedule.reps > 0
            || self.schedule.last_review.is_some()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.schedule.due <= now
    }
}

fn scheduling_for(
    record: Option<&ScheduleRecord>,
    now: DateTime<Utc>,
) -> (SchedulingState, Vec<ReviewLog>) {
    match record {
        Some(record) => (record.state.clone(), record.logs.clone()),
        None => (fresh_state(now), Vec::new()),
    }
}

fn joined(values: &[String]) -> String {
    values.join(", ")
}

pub(crate) fn vocabulary_card(
    item: &VocabularyItem,
    mode: PracticeMode,
    flipped: bool,
    record: Option<&ScheduleRecord>,
    now: DateTime<Utc>,
) -> PracticeCard {
    let reading = item.reading();
    let (prompt, answers) = match (mode, flipped) {
        (PracticeMode::Meanings, false) => (item.word.clone(), item.translations.clone()),
        (PracticeMode::Meanings, true) => {
            let mut answers = vec![item.word.clone()];
            if reading != item.word {
                answers.push(reading);
            }
            (joined(&item.translations), answers)
        }
        (PracticeMode::Readings, false) => (item.word.clone(), vec![reading]),
        (PracticeMode::Readings, true) => (reading, vec![item.word.clone()]),
    };

    let hint = item.mnemonics.as_ref().and_then(|m| match mode {
        PracticeMode::Meanings => m.meaning.clone(),
        PracticeMode::Readings => m.reading.clone().or_else(|| m.meaning.clone()),
    });

    let (schedule, review_log) = scheduling_for(record, now);

    PracticeCard {
        key: CardKey::vocabulary(&item.word).to_string(),
        item_type: ItemType::Vocabulary,
        prompt,
        answers,
        mode,
        flipped,
        disabled: false,
        hint,
        particles: item.particles.clone(),
        schedule,
        review_log,
    }
}

pub(crate) fn kanji_card(
    kanji: &Kanji,
    mode: PracticeMode,
    flipped: bool,
    record: Option<&ScheduleRecord>,
    now: DateTime<Utc>,
) -> PracticeCard {
    // Readings mode falls back to meanings for kanji without reading data
    let sides = match mode {
        PracticeMode::Readings if !kanji.readings.is_empty() => &kanji.readings,
        _ => &kanji.meanings,
    };
    let (prompt, answers) = if flipped {
        (joined(sides), vec![kanji.character.clone()])
    } else {
        (kanji.character.clone(), sides.clone())
    };
    let (schedule, review_log) = scheduling_for(record, now);

    PracticeCard {
        key: CardKey::kanji(&kanji.character).to_string(),
        item_type: ItemType::Kanji,
        prompt,
        answers,
        mode,
        flipped,
        disabled: false,
        hint: kanji.mnemonic.clone(),
        particles: None,
        schedule,
        review_log,
    }
}

pub(crate) fn radical_card(
    radical: &Radical,
    mode: PracticeMode,
    flipped: bool,
    record: Option<&ScheduleRecord>,
    now: DateTime<Utc>,
) -> PracticeCard {
    let identifier = radical.identifier();
    let glyph = radical.character.clone().unwrap_or_else(|| identifier.clone());
    let (prompt, answers) = if flipped {
        (joined(&radical.meanings), vec![glyph])
    } else {
        (glyph, radical.meanings.clone())
    };
    let (schedule, review_log) = scheduling_for(record, now);

    PracticeCard {
        key: CardKey::radical(&identifier).to_string(),
        item_type: ItemType::Radical,
        prompt,
        answers,
        mode,
        flipped,
        disabled: false,
        hint: radical.mnemonic.clone(),
        particles: None,
        schedule,
        review_log,
    }
}
