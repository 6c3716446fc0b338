//! Shared error types.

use thiserror::Error;

use crate::quiz::grade::GradeTableError;
use crate::store::StorageError;

/// Errors emitted by the quiz operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("respondent {0} is not enrolled")]
    NotEnrolled(i64),
    #[error("answers already submitted")]
    AlreadySubmitted,
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),
    #[error("no questions available")]
    NoQuestions,
    #[error("no respondents enrolled")]
    NoRespondents,
    #[error("the test was already finalized")]
    AlreadyFinalized,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Startup configuration problems; these are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error(transparent)]
    Grades(#[from] GradeTableError),
}
