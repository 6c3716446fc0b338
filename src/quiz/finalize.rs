//! Admin-triggered terminal pass: close every open stage, apply the
//! fairness bonus, grade and notify.
//!
//! The pass runs once per round. It walks respondents one by one and is not
//! transactional; a crash part way leaves earlier respondents updated.

use std::time::Duration;

use log::{info, warn};

use super::bonus::{self, BonusAward, BONUS};
use super::grade::GradeTable;
use super::taker::close_open_stage;
use super::{total_possible, Points};
use crate::error::QuizError;
use crate::messenger::{name_or_placeholder, Messenger};
use crate::store::Storage;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizeReport {
    pub respondents: usize,
    /// Respondents whose open stage was closed by this pass.
    pub force_finished: usize,
    pub awards: Vec<BonusAward>,
    pub total_possible: Points,
    pub notified: usize,
    pub failed: usize,
}

pub async fn finalize(
    storage: &Storage,
    grades: &GradeTable,
    messenger: &dyn Messenger,
    pause: Duration,
) -> Result<FinalizeReport, QuizError> {
    if storage.round.is_finalized().await? {
        return Err(QuizError::AlreadyFinalized);
    }
    let respondents = storage.respondents.list().await?;
    if respondents.is_empty() {
        return Err(QuizError::NoRespondents);
    }
    let open = storage.questions.list_open().await?;
    let closed = storage.questions.list_closed().await?;

    let mut report = FinalizeReport {
        respondents: respondents.len(),
        total_possible: total_possible(&open, &closed),
        ..FinalizeReport::default()
    };

    let mut closed_stage = Vec::with_capacity(respondents.len());
    for mut respondent in respondents {
        if !respondent.finished {
            close_open_stage(&mut respondent, &open);
            storage.respondents.save(&respondent).await?;
            report.force_finished += 1;
        }
        closed_stage.push(respondent);
    }

    let plan = bonus::plan(&closed_stage);
    for award in &plan.awards {
        for id in &award.recipients {
            storage.respondents.increment_score(*id, BONUS).await?;
        }
    }
    if !plan.awards.is_empty() {
        info!("bonus applied for {} question(s)", plan.awards.len());
    }
    report.awards = plan.awards;
    storage.round.set_finalized(true).await?;

    for mut respondent in storage.respondents.list().await? {
        let percent = respondent.score.percent_of(report.total_possible);
        let degree = grades.grade(percent).to_string();
        respondent.degree = Some(degree.clone());
        storage.respondents.save(&respondent).await?;

        let name = name_or_placeholder(messenger, respondent.id).await;
        let text = format!(
            "📊 Final result:\n👤 {name}\n🆔 {}\n⭐ Score: {}/{}\n\
             📈 Percent: {percent:.2}%\n🎓 Grade: {degree}",
            respondent.id, respondent.score, report.total_possible
        );
        match messenger.send_text(respondent.id, &text).await {
            Ok(()) => report.notified += 1,
            Err(e) => {
                warn!("{e}");
                report.failed += 1;
            }
        }
        tokio::time::sleep(pause).await;
    }

    info!(
        "finalized {} respondents ({} notified, {} failed)",
        report.respondents, report.notified, report.failed
    );
    Ok(report)
}
