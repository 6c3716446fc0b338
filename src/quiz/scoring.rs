//! Correctness and points derived from stored answers.
//!
//! Both passes are pure: the same bank and answers always produce the same
//! outcome, so callers can recompute instead of tracking increments.

use std::collections::BTreeMap;

use super::{option_letter, ClosedQuestion, OpenQuestion, Points, QuestionRef};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub earned: Points,
    pub correct: Vec<QuestionRef>,
    pub wrong: Vec<QuestionRef>,
    /// Closed question numbers where exactly one sub-part matched.
    pub partial: Vec<u32>,
}

/// Index of the correct option as stored on the question.
///
/// A single letter `A`-`Z` maps to its zero-based position; anything else is
/// read as a raw numeric index. The index is not checked against the option
/// list, so an out-of-range value simply never matches.
pub fn parse_correct_index(answer: &str) -> Option<usize> {
    let answer = answer.trim();
    let mut chars = answer.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_uppercase() {
            return Some(usize::from(c as u8 - b'A'));
        }
    }
    answer.parse::<usize>().ok()
}

/// Index a stored choice letter stands for.
pub fn choice_index(letter: &str) -> Option<usize> {
    let mut chars = letter.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => Some(usize::from(c as u8 - b'A')),
        _ => None,
    }
}

pub fn choice_letter(index: usize) -> Option<String> {
    option_letter(index).map(String::from)
}

/// Scores the open stage over the full bank in ascending number order.
pub fn score_open(bank: &[OpenQuestion], answers: &BTreeMap<u32, String>) -> ScoreOutcome {
    let mut ordered: Vec<&OpenQuestion> = bank.iter().collect();
    ordered.sort_by_key(|q| q.number);

    let mut outcome = ScoreOutcome::default();
    for question in ordered {
        let key = QuestionRef::Open(question.number);
        let chosen = answers.get(&question.number).and_then(|l| choice_index(l));
        let matched = match (chosen, parse_correct_index(&question.answer)) {
            (Some(chosen), Some(correct)) => chosen == correct,
            _ => false,
        };
        if matched {
            outcome.earned += question.points;
            outcome.correct.push(key);
        } else {
            outcome.wrong.push(key);
        }
    }
    outcome
}

/// A respondent's two free-text sub-answers for one closed question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosedAnswer {
    pub a: String,
    pub b: String,
}

/// Scores the closed stage; a missing answer counts as empty text.
pub fn score_closed(
    bank: &[ClosedQuestion],
    answers: &BTreeMap<u32, ClosedAnswer>,
) -> ScoreOutcome {
    let mut ordered: Vec<&ClosedQuestion> = bank.iter().collect();
    ordered.sort_by_key(|q| q.number);

    let empty = ClosedAnswer::default();
    let mut outcome = ScoreOutcome::default();
    for question in ordered {
        let given = answers.get(&question.number).unwrap_or(&empty);
        let mut matched = 0;
        if given.a.trim() == question.a.expected.trim() {
            outcome.earned += question.a.points;
            matched += 1;
        }
        if given.b.trim() == question.b.expected.trim() {
            outcome.earned += question.b.points;
            matched += 1;
        }

        let key = QuestionRef::Closed(question.number);
        match matched {
            0 => outcome.wrong.push(key),
            1 => {
                outcome.correct.push(key);
                outcome.partial.push(question.number);
            }
            _ => outcome.correct.push(key),
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::SubAnswer;

    fn open(number: u32, answer: &str, points: i64) -> OpenQuestion {
        OpenQuestion {
            number,
            text: format!("Question {number}"),
            image: None,
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            answer: answer.into(),
            points: Points::whole(points),
        }
    }

    fn closed(number: u32, a: &str, b: &str) -> ClosedQuestion {
        ClosedQuestion {
            number,
            a: SubAnswer { expected: a.into(), points: Points::whole(2) },
            b: SubAnswer { expected: b.into(), points: Points::whole(3) },
        }
    }

    #[test]
    fn correct_index_accepts_letters_and_numbers() {
        assert_eq!(parse_correct_index("A"), Some(0));
        assert_eq!(parse_correct_index(" C "), Some(2));
        assert_eq!(parse_correct_index("3"), Some(3));
        assert_eq!(parse_correct_index("AB"), None);
        assert_eq!(parse_correct_index(""), None);
        assert_eq!(parse_correct_index("-1"), None);
        assert_eq!(parse_correct_index("b"), None);
    }

    #[test]
    fn single_question_scenario() {
        let bank = vec![open(1, "B", 2)];
        let answers = BTreeMap::from([(1, choice_letter(1).unwrap())]);
        let outcome = score_open(&bank, &answers);
        assert_eq!(outcome.correct, vec![QuestionRef::Open(1)]);
        assert!(outcome.wrong.is_empty());
        assert_eq!(outcome.earned, Points::whole(2));
        assert_eq!(outcome.earned.percent_of(Points::whole(2)), 100.0);
    }

    #[test]
    fn missing_and_unparsable_answers_are_wrong() {
        let bank = vec![open(2, "??", 1), open(1, "A", 1), open(3, "C", 1)];
        let answers = BTreeMap::from([(2, "A".to_string()), (1, "A".to_string())]);
        let outcome = score_open(&bank, &answers);
        assert_eq!(outcome.correct, vec![QuestionRef::Open(1)]);
        assert_eq!(outcome.wrong, vec![QuestionRef::Open(2), QuestionRef::Open(3)]);
        assert_eq!(outcome.earned, Points::whole(1));
    }

    #[test]
    fn numeric_answer_matches_by_index() {
        let bank = vec![open(1, "2", 1)];
        let answers = BTreeMap::from([(1, "C".to_string())]);
        assert_eq!(score_open(&bank, &answers).earned, Points::whole(1));
    }

    #[test]
    fn recomputation_is_idempotent() {
        let bank = vec![open(1, "B", 2), open(2, "D", 1), open(3, "A", 4)];
        let answers = BTreeMap::from([(1, "B".to_string()), (2, "A".to_string())]);
        let first = score_open(&bank, &answers);
        let second = score_open(&bank, &answers);
        assert_eq!(first, second);
    }

    #[test]
    fn closed_partial_credit_counts_one_part() {
        let bank = vec![closed(1, "Paris", "France"), closed(2, "x", "y"), closed(3, "1", "2")];
        let answers = BTreeMap::from([
            (1, ClosedAnswer { a: " Paris ".into(), b: "Italy".into() }),
            (2, ClosedAnswer { a: "no".into(), b: "no".into() }),
            (3, ClosedAnswer { a: "1".into(), b: "2".into() }),
        ]);
        let outcome = score_closed(&bank, &answers);
        assert_eq!(outcome.earned, Points::whole(2 + 5));
        assert_eq!(outcome.correct, vec![QuestionRef::Closed(1), QuestionRef::Closed(3)]);
        assert_eq!(outcome.wrong, vec![QuestionRef::Closed(2)]);
        assert_eq!(outcome.partial, vec![1]);
    }

    #[test]
    fn closed_missing_answer_is_wrong() {
        let outcome = score_closed(&[closed(4, "a", "b")], &BTreeMap::new());
        assert_eq!(outcome.wrong, vec![QuestionRef::Closed(4)]);
        assert_eq!(outcome.earned, Points::ZERO);
    }
}
