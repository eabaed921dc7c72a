pub mod errors;
pub mod models;
pub mod utils;

pub use errors::KeikoError;
pub use models::{
    ExampleSentence,
    ItemType,
    Kanji,
    Mnemonics,
    ParticleSlot,
    PracticeMode,
    Radical,
    VocabularyItem,
};
