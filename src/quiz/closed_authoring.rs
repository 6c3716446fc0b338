//! Linear wizard for one two-part closed question.

use std::fmt;

use super::{ClosedQuestion, Points, SubAnswer};

/// Points used when the author skips a score step.
pub const DEFAULT_SUB_POINTS: Points = Points::ONE;

pub const SKIP: &str = "/skip";

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ClosedAuthoringSession {
    #[default]
    AwaitingNumber,
    AwaitingAnswerA {
        number: u32,
    },
    AwaitingScoreA {
        number: u32,
        expected: String,
    },
    AwaitingAnswerB {
        number: u32,
        a: SubAnswer,
    },
    AwaitingScoreB {
        number: u32,
        a: SubAnswer,
        expected: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosedPrompt {
    AskNumber,
    AskAnswerA { number: u32 },
    AskScoreA,
    AskAnswerB,
    AskScoreB,
    InvalidNumber,
    BlankAnswer,
    InvalidScore,
}

impl fmt::Display for ClosedPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClosedPrompt::AskNumber => write!(f, "Creating a closed question. Send its number:"),
            ClosedPrompt::AskAnswerA { number } => write!(
                f,
                "Closed question #{number}. Send the expected answer for part a:"
            ),
            ClosedPrompt::AskScoreA => {
                write!(f, "Points for part a ({SKIP} for {DEFAULT_SUB_POINTS}):")
            }
            ClosedPrompt::AskAnswerB => write!(f, "Send the expected answer for part b:"),
            ClosedPrompt::AskScoreB => {
                write!(f, "Points for part b ({SKIP} for {DEFAULT_SUB_POINTS}):")
            }
            ClosedPrompt::InvalidNumber => write!(
                f,
                "The question number must be a positive integer. Send it again:"
            ),
            ClosedPrompt::BlankAnswer => {
                write!(f, "The expected answer cannot be empty. Send it again:")
            }
            ClosedPrompt::InvalidScore => write!(
                f,
                "Points must be a non-negative number (or {SKIP}). Send them again:"
            ),
        }
    }
}

/// Result of feeding one message to the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosedStep {
    Next(ClosedAuthoringSession, ClosedPrompt),
    Retry(ClosedAuthoringSession, ClosedPrompt),
    Complete(ClosedQuestion),
}

fn parse_number(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

fn parse_sub_points(input: &str) -> Option<Points> {
    if input.trim() == SKIP {
        return Some(DEFAULT_SUB_POINTS);
    }
    input.parse().ok()
}

fn expected_text(input: &str) -> Option<String> {
    let text = input.trim();
    (!text.is_empty()).then(|| text.to_string())
}

impl ClosedAuthoringSession {
    /// What the wizard is waiting for in its current state.
    pub fn pending_prompt(&self) -> ClosedPrompt {
        match self {
            ClosedAuthoringSession::AwaitingNumber => ClosedPrompt::AskNumber,
            ClosedAuthoringSession::AwaitingAnswerA { number } => {
                ClosedPrompt::AskAnswerA { number: *number }
            }
            ClosedAuthoringSession::AwaitingScoreA { .. } => ClosedPrompt::AskScoreA,
            ClosedAuthoringSession::AwaitingAnswerB { .. } => ClosedPrompt::AskAnswerB,
            ClosedAuthoringSession::AwaitingScoreB { .. } => ClosedPrompt::AskScoreB,
        }
    }

    pub fn advance(self, input: &str) -> ClosedStep {
        use ClosedAuthoringSession::*;

        match self {
            AwaitingNumber => match parse_number(input) {
                Some(number) => ClosedStep::Next(
                    AwaitingAnswerA { number },
                    ClosedPrompt::AskAnswerA { number },
                ),
                None => ClosedStep::Retry(AwaitingNumber, ClosedPrompt::InvalidNumber),
            },
            AwaitingAnswerA { number } => match expected_text(input) {
                Some(expected) => {
                    ClosedStep::Next(AwaitingScoreA { number, expected }, ClosedPrompt::AskScoreA)
                }
                None => ClosedStep::Retry(AwaitingAnswerA { number }, ClosedPrompt::BlankAnswer),
            },
            AwaitingScoreA { number, expected } => match parse_sub_points(input) {
                Some(points) => ClosedStep::Next(
                    AwaitingAnswerB {
                        number,
                        a: SubAnswer { expected, points },
                    },
                    ClosedPrompt::AskAnswerB,
                ),
                None => ClosedStep::Retry(
                    AwaitingScoreA { number, expected },
                    ClosedPrompt::InvalidScore,
                ),
            },
            AwaitingAnswerB { number, a } => match expected_text(input) {
                Some(expected) => ClosedStep::Next(
                    AwaitingScoreB { number, a, expected },
                    ClosedPrompt::AskScoreB,
                ),
                None => ClosedStep::Retry(AwaitingAnswerB { number, a }, ClosedPrompt::BlankAnswer),
            },
            AwaitingScoreB { number, a, expected } => match parse_sub_points(input) {
                Some(points) => ClosedStep::Complete(ClosedQuestion {
                    number,
                    a,
                    b: SubAnswer { expected, points },
                }),
                None => ClosedStep::Retry(
                    AwaitingScoreB { number, a, expected },
                    ClosedPrompt::InvalidScore,
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(inputs: &[&str]) -> ClosedStep {
        let mut session = ClosedAuthoringSession::default();
        let mut last = None;
        for input in inputs {
            match session.clone().advance(input) {
                ClosedStep::Next(next, _) | ClosedStep::Retry(next, _) => session = next,
                done @ ClosedStep::Complete(_) => return done,
            }
            last = Some(session.clone());
        }
        ClosedStep::Retry(last.unwrap_or_default(), ClosedPrompt::InvalidNumber)
    }

    #[test]
    fn five_steps_produce_a_question() {
        let step = feed(&["7", " Paris ", "2", "France", "1.5"]);
        assert_eq!(
            step,
            ClosedStep::Complete(ClosedQuestion {
                number: 7,
                a: SubAnswer {
                    expected: "Paris".into(),
                    points: Points::whole(2),
                },
                b: SubAnswer {
                    expected: "France".into(),
                    points: Points::from_hundredths(150),
                },
            })
        );
    }

    #[test]
    fn skip_uses_default_points() {
        match feed(&["1", "x", SKIP, "y", SKIP]) {
            ClosedStep::Complete(q) => {
                assert_eq!(q.a.points, DEFAULT_SUB_POINTS);
                assert_eq!(q.b.points, DEFAULT_SUB_POINTS);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_numeric_input_does_not_advance() {
        let session = ClosedAuthoringSession::AwaitingNumber;
        assert_eq!(
            session.advance("seven"),
            ClosedStep::Retry(
                ClosedAuthoringSession::AwaitingNumber,
                ClosedPrompt::InvalidNumber
            )
        );

        let session = ClosedAuthoringSession::AwaitingScoreA {
            number: 3,
            expected: "x".into(),
        };
        assert_eq!(
            session.clone().advance("lots"),
            ClosedStep::Retry(session, ClosedPrompt::InvalidScore)
        );
    }

    #[test]
    fn negative_points_do_not_advance() {
        let session = ClosedAuthoringSession::AwaitingScoreA {
            number: 3,
            expected: "x".into(),
        };
        assert_eq!(
            session.clone().advance("-2"),
            ClosedStep::Retry(session, ClosedPrompt::InvalidScore)
        );
    }

    #[test]
    fn pending_prompt_follows_the_state() {
        assert_eq!(
            ClosedAuthoringSession::default().pending_prompt(),
            ClosedPrompt::AskNumber
        );
        let a = SubAnswer {
            expected: "x".into(),
            points: Points::ONE,
        };
        assert_eq!(
            ClosedAuthoringSession::AwaitingAnswerA { number: 4 }.pending_prompt(),
            ClosedPrompt::AskAnswerA { number: 4 }
        );
        assert_eq!(
            ClosedAuthoringSession::AwaitingScoreB {
                number: 4,
                a,
                expected: "y".into()
            }
            .pending_prompt(),
            ClosedPrompt::AskScoreB
        );
    }
}
