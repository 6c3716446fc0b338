//! Open-form question wizard.
//!
//! Each step has its own transition function; invalid input keeps the step
//! and hands back a retry prompt. Completed drafts queue up until the author
//! commits the batch.

use std::fmt;

use thiserror::Error;

use super::{option_letter, OpenQuestion, Points};

const MAX_OPTIONS: usize = 26;

/// Typed at the image step to go on without a photo.
pub const SKIP_IMAGE: &str = "/skip";

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuestionDraft {
    pub image: Option<String>,
    pub text: String,
    pub options: Vec<String>,
    pub answer: String,
    pub points: Points,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AuthoringStep {
    #[default]
    AwaitingImage,
    AwaitingText,
    AwaitingOptions,
    AwaitingAnswer,
    AwaitingScore,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuthoringSession {
    pub base_number: Option<u32>,
    pub step: AuthoringStep,
    /// Question being filled in by the current steps.
    pub current: QuestionDraft,
    pub drafts: Vec<QuestionDraft>,
}

/// One message from the author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthoringInput<'a> {
    Text(&'a str),
    /// File id of the largest size of a sent photo.
    Photo(&'a str),
}

/// What the author is told after an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthoringPrompt {
    AskText { with_image: bool },
    AskOptions,
    AskAnswer { options: Vec<String> },
    AskScore,
    Queued { count: usize },
    ExpectedImage,
    BlankText,
    InvalidOptions,
    BlankAnswer,
    InvalidScore,
}

impl AuthoringPrompt {
    pub fn is_retry(&self) -> bool {
        matches!(
            self,
            AuthoringPrompt::ExpectedImage
                | AuthoringPrompt::BlankText
                | AuthoringPrompt::InvalidOptions
                | AuthoringPrompt::BlankAnswer
                | AuthoringPrompt::InvalidScore
        )
    }
}

impl fmt::Display for AuthoringPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthoringPrompt::AskText { with_image: true } => {
                write!(f, "✅ Photo received. Now send the question text:")
            }
            AuthoringPrompt::AskText { with_image: false } => {
                write!(f, "✅ No photo. Send the question text:")
            }
            AuthoringPrompt::AskOptions => write!(
                f,
                "🅰️ Send the options: a number 2-4 for plain letters, or a comma-separated list."
            ),
            AuthoringPrompt::AskAnswer { options } => {
                writeln!(f, "Options:")?;
                for (i, option) in options.iter().enumerate() {
                    let letter = option_letter(i).unwrap_or('?');
                    writeln!(f, "{letter}) {option}")?;
                }
                write!(f, "Send the correct answer (e.g. A):")
            }
            AuthoringPrompt::AskScore => write!(f, "🎯 Send the point value (a number):"),
            AuthoringPrompt::Queued { count } => write!(
                f,
                "➕ Question queued ({count} so far). Send the next photo ({SKIP_IMAGE} for none), \
                 or /done to save."
            ),
            AuthoringPrompt::ExpectedImage => {
                write!(f, "Send a photo, or {SKIP_IMAGE} if the question has none.")
            }
            AuthoringPrompt::BlankText => {
                write!(f, "The question text cannot be empty. Send it again:")
            }
            AuthoringPrompt::InvalidOptions => write!(
                f,
                "Send a number from 2 to 4, or at least 2 comma-separated options \
                 (at most {MAX_OPTIONS})."
            ),
            AuthoringPrompt::BlankAnswer => {
                write!(f, "The answer cannot be empty. Send it again:")
            }
            AuthoringPrompt::InvalidScore => write!(
                f,
                "The point value must be a non-negative number. Send it again:"
            ),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommitError {
    #[error("no questions were added")]
    Empty,
    #[error("numbering from {base} runs past the largest question number")]
    NumberOverflow { base: u32 },
}

/// Options step grammar: a bare `2`-`4` expands to letters, otherwise a
/// comma-separated list is taken verbatim.
pub fn parse_options(input: &str) -> Option<Vec<String>> {
    let input = input.trim();
    if let Ok(count) = input.parse::<usize>() {
        return (2..=4)
            .contains(&count)
            .then(|| (0..count).filter_map(option_letter).map(String::from).collect());
    }

    let options: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    (options.len() >= 2 && options.len() <= MAX_OPTIONS).then_some(options)
}

fn on_image(input: AuthoringInput<'_>) -> Result<Option<String>, AuthoringPrompt> {
    match input {
        AuthoringInput::Photo(id) => Ok(Some(id.to_string())),
        AuthoringInput::Text(text) if text.trim() == SKIP_IMAGE => Ok(None),
        AuthoringInput::Text(_) => Err(AuthoringPrompt::ExpectedImage),
    }
}

fn non_blank(input: AuthoringInput<'_>) -> Option<String> {
    match input {
        AuthoringInput::Text(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    }
}

fn on_score(input: AuthoringInput<'_>) -> Result<Points, AuthoringPrompt> {
    match input {
        AuthoringInput::Text(text) => text.parse().map_err(|_| AuthoringPrompt::InvalidScore),
        AuthoringInput::Photo(_) => Err(AuthoringPrompt::InvalidScore),
    }
}

impl AuthoringSession {
    pub fn new(base_number: Option<u32>) -> Self {
        Self {
            base_number,
            ..Self::default()
        }
    }

    /// Feeds one message to the current step. On a retry prompt nothing
    /// changes.
    pub fn advance(&mut self, input: AuthoringInput<'_>) -> AuthoringPrompt {
        match self.step {
            AuthoringStep::AwaitingImage => match on_image(input) {
                Ok(image) => {
                    let with_image = image.is_some();
                    self.current.image = image;
                    self.step = AuthoringStep::AwaitingText;
                    AuthoringPrompt::AskText { with_image }
                }
                Err(retry) => retry,
            },
            AuthoringStep::AwaitingText => match non_blank(input) {
                Some(text) => {
                    self.current.text = text;
                    self.step = AuthoringStep::AwaitingOptions;
                    AuthoringPrompt::AskOptions
                }
                None => AuthoringPrompt::BlankText,
            },
            AuthoringStep::AwaitingOptions => {
                let parsed = match input {
                    AuthoringInput::Text(text) => parse_options(text),
                    AuthoringInput::Photo(_) => None,
                };
                match parsed {
                    Some(options) => {
                        self.current.options = options.clone();
                        self.step = AuthoringStep::AwaitingAnswer;
                        AuthoringPrompt::AskAnswer { options }
                    }
                    None => AuthoringPrompt::InvalidOptions,
                }
            }
            AuthoringStep::AwaitingAnswer => match non_blank(input) {
                Some(answer) => {
                    self.current.answer = answer.to_uppercase();
                    self.step = AuthoringStep::AwaitingScore;
                    AuthoringPrompt::AskScore
                }
                None => AuthoringPrompt::BlankAnswer,
            },
            AuthoringStep::AwaitingScore => match on_score(input) {
                Ok(points) => {
                    let mut draft = std::mem::take(&mut self.current);
                    draft.points = points;
                    self.drafts.push(draft);
                    self.step = AuthoringStep::AwaitingImage;
                    AuthoringPrompt::Queued {
                        count: self.drafts.len(),
                    }
                }
                Err(retry) => retry,
            },
        }
    }

    /// Numbers the queued drafts from the explicit base, or from
    /// `existing + 1`, as one contiguous range.
    pub fn commit(self, existing: usize) -> Result<Vec<OpenQuestion>, CommitError> {
        if self.drafts.is_empty() {
            return Err(CommitError::Empty);
        }
        let base = match self.base_number {
            Some(base) => base,
            None => u32::try_from(existing)
                .ok()
                .and_then(|n| n.checked_add(1))
                .ok_or(CommitError::NumberOverflow { base: u32::MAX })?,
        };
        let span = u32::try_from(self.drafts.len() - 1)
            .map_err(|_| CommitError::NumberOverflow { base })?;
        base.checked_add(span)
            .ok_or(CommitError::NumberOverflow { base })?;

        Ok(self
            .drafts
            .into_iter()
            .zip(base..=u32::MAX)
            .map(|(draft, number)| OpenQuestion {
                number,
                text: draft.text,
                image: draft.image,
                options: draft.options,
                answer: draft.answer,
                points: draft.points,
            })
            .collect())
    }
}
