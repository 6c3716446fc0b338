//! One-shot handler for the closed-form batch of answers.

use std::collections::BTreeMap;

use log::{info, warn};

use super::points::round_percent;
use super::scoring::{score_closed, ClosedAnswer};
use super::{ClosedQuestion, Points};
use crate::error::QuizError;
use crate::store::Storage;

/// Body accepted by the form endpoint.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedSubmissionRequest {
    pub respondent_id: i64,
    #[serde(default)]
    pub answers: BTreeMap<u32, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedSubmissionSummary {
    pub earned: Points,
    pub total_possible: Points,
    pub percent: f64,
}

/// Maps the loosely-typed form answers onto the bank, rejecting unknown
/// questions and sub-part labels.
fn collect_answers(
    bank: &[ClosedQuestion],
    raw: &BTreeMap<u32, BTreeMap<String, String>>,
) -> Result<BTreeMap<u32, ClosedAnswer>, QuizError> {
    let mut answers = BTreeMap::new();
    for (number, parts) in raw {
        if !bank.iter().any(|q| q.number == *number) {
            return Err(QuizError::InvalidSubmission(format!("unknown closed question {number}")));
        }
        let mut answer = ClosedAnswer::default();
        for (label, text) in parts {
            match label.trim().to_ascii_lowercase().as_str() {
                "a" => answer.a = text.clone(),
                "b" => answer.b = text.clone(),
                other => {
                    return Err(QuizError::InvalidSubmission(format!(
                        "unknown sub-part {other:?} for question {number}"
                    )))
                }
            }
        }
        answers.insert(*number, answer);
    }
    Ok(answers)
}

pub async fn submit(
    storage: &Storage,
    request: &ClosedSubmissionRequest,
) -> Result<ClosedSubmissionSummary, QuizError> {
    let id = request.respondent_id;
    let mut respondent = storage
        .respondents
        .get(id)
        .await?
        .ok_or(QuizError::NotEnrolled(id))?;
    if respondent.closed_finished {
        warn!("{id}: closed answers resubmitted");
        return Err(QuizError::AlreadySubmitted);
    }

    let bank = storage.questions.list_closed().await?;
    if bank.is_empty() {
        return Err(QuizError::NoQuestions);
    }
    let answers = collect_answers(&bank, &request.answers)?;

    let outcome = score_closed(&bank, &answers);
    respondent.apply(&outcome);
    respondent.closed_finished = true;
    storage.respondents.save(&respondent).await?;

    let total_possible: Points = bank.iter().map(ClosedQuestion::points).sum();
    info!("{id}: closed stage earned {}/{}", outcome.earned, total_possible);
    Ok(ClosedSubmissionSummary {
        earned: outcome.earned,
        total_possible,
        percent: round_percent(outcome.earned.percent_of(total_possible), 1),
    })
}
