pub mod authoring;
pub mod bonus;
pub mod broadcast;
pub mod closed_authoring;
pub mod closed_submission;
pub mod finalize;
pub mod grade;
pub mod points;
pub mod scoring;
pub mod taker;

use std::collections::BTreeMap;
use std::fmt;

pub use points::Points;

/// Letter shown for the option at `index` (`0 -> A`).
pub fn option_letter(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| char::from(b'A' + i))
}

/// Single-choice question with lettered options.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OpenQuestion {
    pub number: u32,
    #[serde(default)]
    pub text: String,
    /// Telegram file id of the photo shown above the question.
    #[serde(default)]
    pub image: Option<String>,
    pub options: Vec<String>,
    /// Letter or raw numeric index, kept as typed by the author.
    pub answer: String,
    pub points: Points,
}

/// One half of a closed question.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubAnswer {
    pub expected: String,
    pub points: Points,
}

/// Two-part free-response question, each part scored on its own.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClosedQuestion {
    pub number: u32,
    pub a: SubAnswer,
    pub b: SubAnswer,
}

impl ClosedQuestion {
    pub fn points(&self) -> Points {
        self.a.points + self.b.points
    }
}

/// Identifies a question across both kinds; open and closed numbering are
/// independent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(tag = "kind", content = "number", rename_all = "lowercase")]
pub enum QuestionRef {
    Open(u32),
    Closed(u32),
}

impl fmt::Display for QuestionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionRef::Open(n) => write!(f, "#{n}"),
            QuestionRef::Closed(n) => write!(f, "closed #{n}"),
        }
    }
}

/// Last option a respondent tapped; cleared when the open stage finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Selection {
    pub question: u32,
    pub choice: usize,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Respondent {
    pub id: i64,
    pub score: Points,
    pub correct: Vec<QuestionRef>,
    pub wrong: Vec<QuestionRef>,
    /// Closed questions where exactly one sub-part matched.
    #[serde(default)]
    pub partial: Vec<u32>,
    pub finished: bool,
    pub closed_finished: bool,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub last_selection: Option<Selection>,
    /// Open question number -> chosen letter.
    #[serde(default)]
    pub answers: BTreeMap<u32, String>,
}

impl Respondent {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            score: Points::ZERO,
            correct: Vec::new(),
            wrong: Vec::new(),
            partial: Vec::new(),
            finished: false,
            closed_finished: false,
            degree: None,
            last_selection: None,
            answers: BTreeMap::new(),
        }
    }

    pub fn misses(&self, question: QuestionRef) -> bool {
        self.wrong.contains(&question)
    }

    /// Adds a scoring outcome on top of whatever is already recorded.
    pub fn apply(&mut self, outcome: &scoring::ScoreOutcome) {
        self.score += outcome.earned;
        for q in &outcome.correct {
            if !self.correct.contains(q) {
                self.correct.push(*q);
            }
        }
        for q in &outcome.wrong {
            if !self.wrong.contains(q) {
                self.wrong.push(*q);
            }
        }
        for n in &outcome.partial {
            if !self.partial.contains(n) {
                self.partial.push(*n);
            }
        }
    }

    pub fn degree_label(&self) -> &str {
        self.degree.as_deref().unwrap_or("—")
    }
}

/// Sum of every point value across both question kinds.
pub fn total_possible(open: &[OpenQuestion], closed: &[ClosedQuestion]) -> Points {
    open.iter().map(|q| q.points).sum::<Points>() + closed.iter().map(ClosedQuestion::points).sum()
}
