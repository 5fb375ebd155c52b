//! Error types for event construction and explanation writes.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum InsightsError {
    #[error("event kind is required")]
    MissingKind,

    #[error("error details are required")]
    MissingError,

    #[error("no stored event with id {0}")]
    UnknownEvent(String),

    #[error("explanation already recorded for event {0}")]
    ExplanationAlreadySet(String),
}
