pub mod core;
pub mod hierarchy;
pub mod persistence;
pub mod prefetch;
pub mod scheduling;
pub mod session;
pub mod settings;
pub mod validation;

pub use crate::core::{
    ItemType,
    KeikoError,
    PracticeMode,
    VocabularyItem,
};
pub use crate::hierarchy::{
    build_hierarchy,
    VocabHierarchy,
};
pub use crate::prefetch::{
    size_glyph_prefetch,
    GlyphPrefetch,
};
pub use crate::session::{
    initialize_session,
    SessionLoader,
    SessionOptions,
    SessionState,
};
pub use crate::validation::{
    validate_particles,
    validate_written,
};
