//! Guess form validation and the submission flow.

pub mod failure;
pub mod submission;
pub mod validation;

pub use failure::{classify_send_failure, SubmissionError};
pub use submission::{GuessSubmitter, SubmissionReceipt, SubmissionState};
pub use validation::{GuessForm, GuessRules, ValidGuess, ValidationError, DEFAULT_BET};
