pub mod particles;
pub mod written;

pub use particles::{
    validate_particles,
    DEFAULT_LABEL,
};
pub use written::{
    validate_written,
    AcceptableAnswers,
    AnswerCategory,
    DEFAULT_CATEGORY,
};
