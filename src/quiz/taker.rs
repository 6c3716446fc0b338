//! Respondent side of the open stage: navigate, pick, finish.
//!
//! State lives on the stored [`Respondent`]; every event re-reads it, so the
//! handler itself holds nothing between interactions.

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, info};

use super::points::round_percent;
use super::scoring::{choice_index, choice_letter, score_open, ScoreOutcome};
use super::{option_letter, total_possible, OpenQuestion, Points, Respondent, Selection};
use crate::store::{StorageError, Storage};

const NAV_PREFIX: &str = "nav:";
const PICK_PREFIX: &str = "pick:";
const FINISH: &str = "finish";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakerEvent {
    Navigate(usize),
    Pick { question: u32, choice: usize },
    Finish,
}

impl TakerEvent {
    /// Parses button payloads such as `nav:2`, `pick:7:1` or `finish`.
    pub fn parse(data: &str) -> Option<Self> {
        if data == FINISH {
            return Some(TakerEvent::Finish);
        }
        if let Some(index) = data.strip_prefix(NAV_PREFIX) {
            return index.parse().ok().map(TakerEvent::Navigate);
        }
        let (question, choice) = data.strip_prefix(PICK_PREFIX)?.split_once(':')?;
        Some(TakerEvent::Pick {
            question: question.parse().ok()?,
            choice: choice.parse().ok()?,
        })
    }

    pub fn callback_data(&self) -> String {
        match self {
            TakerEvent::Navigate(index) => format!("{NAV_PREFIX}{index}"),
            TakerEvent::Pick { question, choice } => format!("{PICK_PREFIX}{question}:{choice}"),
            TakerEvent::Finish => FINISH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub event: TakerEvent,
}

/// Everything needed to render one question with its keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub index: usize,
    pub number: u32,
    pub text: String,
    /// Photo to show before the text, if the question has one.
    pub image: Option<String>,
    pub options: Vec<Button>,
    pub navigation: Vec<Button>,
}

impl QuestionView {
    /// View of the question at `index` in ascending-number order.
    pub fn build(
        bank: &[OpenQuestion],
        index: usize,
        answers: &BTreeMap<u32, String>,
    ) -> Option<Self> {
        let mut ordered: Vec<&OpenQuestion> = bank.iter().collect();
        ordered.sort_by_key(|q| q.number);
        let question = *ordered.get(index)?;
        let last = ordered.len() - 1;
        let chosen = answers.get(&question.number).and_then(|l| choice_index(l));

        let mut text = format!(
            "❓ Question {} ({}/{})\n{}\n\n",
            question.number,
            index + 1,
            ordered.len(),
            question.text
        );
        for (i, option) in question.options.iter().enumerate() {
            let letter = option_letter(i).unwrap_or('?');
            text.push_str(&format!("{letter}) {option}\n"));
        }
        if let Some(letter) = chosen.and_then(option_letter) {
            text.push_str(&format!("\nYour choice: {letter}"));
        }

        let options = (0..question.options.len())
            .filter_map(|choice| {
                let letter = option_letter(choice)?;
                let label = if chosen == Some(choice) {
                    format!("✅ {letter}")
                } else {
                    letter.to_string()
                };
                Some(Button {
                    label,
                    event: TakerEvent::Pick {
                        question: question.number,
                        choice,
                    },
                })
            })
            .collect();

        let mut navigation = Vec::new();
        if index > 0 {
            navigation.push(Button {
                label: "⬅️ Back".to_string(),
                event: TakerEvent::Navigate(index - 1),
            });
        }
        if index < last {
            navigation.push(Button {
                label: "Next ➡️".to_string(),
                event: TakerEvent::Navigate(index + 1),
            });
        } else {
            navigation.push(Button {
                label: "🏁 Finish".to_string(),
                event: TakerEvent::Finish,
            });
        }

        Some(Self {
            index,
            number: question.number,
            text,
            image: question.image.clone(),
            options,
            navigation,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinishSummary {
    pub correct: usize,
    pub wrong: usize,
    pub score: Points,
    pub total_possible: Points,
    pub percent: f64,
    /// Closed questions exist and the respondent has not submitted them yet.
    pub closed_pending: bool,
}

impl fmt::Display for FinishSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "📊 Test finished!\n✅ Correct: {}\n❌ Wrong: {}\n🎯 Score: {}/{}\n📈 Percent: {}%",
            self.correct, self.wrong, self.score, self.total_possible, self.percent
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TakerReply {
    Render(QuestionView),
    Finished(FinishSummary),
    AlreadyFinished,
    NotEnrolled,
    QuestionMissing,
    NoQuestions,
}

impl TakerReply {
    /// Short notice for replies that do not re-render anything.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            TakerReply::AlreadyFinished => Some("⚠️ You have already finished the test."),
            TakerReply::NotEnrolled => Some("⚠️ You are not registered for this test."),
            TakerReply::QuestionMissing => Some("⚠️ This question is no longer available."),
            TakerReply::NoQuestions => Some("⚠️ There are no questions yet."),
            TakerReply::Render(_) | TakerReply::Finished(_) => None,
        }
    }
}

/// Scores the stored open answers from scratch, adds them to the
/// respondent and closes the open stage.
pub fn close_open_stage(respondent: &mut Respondent, bank: &[OpenQuestion]) -> ScoreOutcome {
    let outcome = score_open(bank, &respondent.answers);
    respondent.apply(&outcome);
    respondent.finished = true;
    respondent.last_selection = None;
    outcome
}

pub struct TakerSession<'a> {
    storage: &'a Storage,
}

impl<'a> TakerSession<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn handle(
        &self,
        respondent_id: i64,
        event: TakerEvent,
    ) -> Result<TakerReply, StorageError> {
        let Some(mut respondent) = self.storage.respondents.get(respondent_id).await? else {
            return Ok(TakerReply::NotEnrolled);
        };
        if respondent.finished {
            debug!("{respondent_id}: {event:?} after finish ignored");
            return Ok(TakerReply::AlreadyFinished);
        }

        let bank = self.storage.questions.list_open().await?;
        if bank.is_empty() {
            return Ok(TakerReply::NoQuestions);
        }

        match event {
            TakerEvent::Navigate(index) => Ok(QuestionView::build(&bank, index, &respondent.answers)
                .map(TakerReply::Render)
                .unwrap_or(TakerReply::QuestionMissing)),
            TakerEvent::Pick { question, choice } => {
                let mut ordered: Vec<&OpenQuestion> = bank.iter().collect();
                ordered.sort_by_key(|q| q.number);
                let Some(index) = ordered.iter().position(|q| q.number == question) else {
                    return Ok(TakerReply::QuestionMissing);
                };
                let letter = match choice_letter(choice) {
                    Some(letter) if choice < ordered[index].options.len() => letter,
                    _ => return Ok(TakerReply::QuestionMissing),
                };

                debug!("{respondent_id}: question {question} -> {letter}");
                respondent.answers.insert(question, letter);
                respondent.last_selection = Some(Selection { question, choice });
                self.storage.respondents.save(&respondent).await?;

                Ok(QuestionView::build(&bank, index, &respondent.answers)
                    .map(TakerReply::Render)
                    .unwrap_or(TakerReply::QuestionMissing))
            }
            TakerEvent::Finish => {
                let closed = self.storage.questions.list_closed().await?;
                let outcome = close_open_stage(&mut respondent, &bank);
                self.storage.respondents.save(&respondent).await?;

                let total = total_possible(&bank, &closed);
                info!(
                    "{respondent_id} finished the open stage with {} ({} correct)",
                    respondent.score,
                    outcome.correct.len()
                );
                Ok(TakerReply::Finished(FinishSummary {
                    correct: respondent.correct.len(),
                    wrong: respondent.wrong.len(),
                    score: respondent.score,
                    total_possible: total,
                    percent: round_percent(respondent.score.percent_of(total), 1),
                    closed_pending: !closed.is_empty() && !respondent.closed_finished,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::QuestionRef;

    fn bank() -> Vec<OpenQuestion> {
        vec![
            OpenQuestion {
                number: 2,
                text: "Second".into(),
                image: Some("photo-2".into()),
                options: vec!["x".into(), "y".into()],
                answer: "A".into(),
                points: Points::whole(1),
            },
            OpenQuestion {
                number: 1,
                text: "First".into(),
                image: None,
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                answer: "B".into(),
                points: Points::whole(2),
            },
        ]
    }

    async fn storage_with(bank: &[OpenQuestion]) -> Storage {
        let storage = Storage::in_memory();
        for q in bank {
            storage.questions.upsert_open(q).await.unwrap();
        }
        storage.respondents.enroll(7).await.unwrap();
        storage
    }

    #[test]
    fn callback_payloads_round_trip() {
        for event in [
            TakerEvent::Navigate(3),
            TakerEvent::Pick { question: 12, choice: 1 },
            TakerEvent::Finish,
        ] {
            assert_eq!(TakerEvent::parse(&event.callback_data()), Some(event));
        }
        assert_eq!(TakerEvent::parse("pick:x:1"), None);
        assert_eq!(TakerEvent::parse("profile"), None);
    }

    #[test]
    fn navigation_row_depends_on_position() {
        let bank = bank();
        let first = QuestionView::build(&bank, 0, &BTreeMap::new()).unwrap();
        assert_eq!(first.number, 1);
        assert!(first.text.contains("First"));
        assert_eq!(first.image, None);
        assert_eq!(first.options.len(), 4);
        assert_eq!(
            first.navigation.iter().map(|b| b.event).collect::<Vec<_>>(),
            vec![TakerEvent::Navigate(1)]
        );

        let last = QuestionView::build(&bank, 1, &BTreeMap::from([(2, "B".to_string())])).unwrap();
        assert_eq!(
            last.navigation.iter().map(|b| b.event).collect::<Vec<_>>(),
            vec![TakerEvent::Navigate(0), TakerEvent::Finish]
        );
        assert_eq!(last.options[1].label, "✅ B");
        assert!(last.text.contains("Second"));
        assert_eq!(last.image.as_deref(), Some("photo-2"));
        assert!(QuestionView::build(&bank, 2, &BTreeMap::new()).is_none());
    }

    #[tokio::test]
    async fn pick_then_finish_scores_the_bank() {
        let single = vec![bank().remove(1)];
        let storage = storage_with(&single).await;
        let session = TakerSession::new(&storage);

        let reply = session
            .handle(7, TakerEvent::Pick { question: 1, choice: 1 })
            .await
            .unwrap();
        assert!(matches!(reply, TakerReply::Render(ref v) if v.options[1].label == "✅ B"));

        let reply = session.handle(7, TakerEvent::Finish).await.unwrap();
        let TakerReply::Finished(summary) = reply else {
            panic!("expected a summary");
        };
        assert_eq!(summary.score, Points::whole(2));
        assert_eq!(summary.percent, 100.0);
        assert!(!summary.closed_pending);

        let stored = storage.respondents.get(7).await.unwrap().unwrap();
        assert_eq!(stored.correct, vec![QuestionRef::Open(1)]);
        assert!(stored.wrong.is_empty());
        assert!(stored.finished);
        assert_eq!(stored.last_selection, None);
    }

    #[tokio::test]
    async fn repick_overwrites_the_answer() {
        let storage = storage_with(&bank()).await;
        let session = TakerSession::new(&storage);
        session.handle(7, TakerEvent::Pick { question: 1, choice: 0 }).await.unwrap();
        session.handle(7, TakerEvent::Pick { question: 1, choice: 3 }).await.unwrap();

        let stored = storage.respondents.get(7).await.unwrap().unwrap();
        assert_eq!(stored.answers.get(&1).map(String::as_str), Some("D"));
        assert_eq!(stored.last_selection, Some(Selection { question: 1, choice: 3 }));
    }

    #[tokio::test]
    async fn events_after_finish_are_rejected_without_mutation() {
        let storage = storage_with(&bank()).await;
        let session = TakerSession::new(&storage);
        session.handle(7, TakerEvent::Finish).await.unwrap();
        let before = storage.respondents.get(7).await.unwrap().unwrap();

        for event in [
            TakerEvent::Finish,
            TakerEvent::Pick { question: 1, choice: 1 },
            TakerEvent::Navigate(0),
        ] {
            assert_eq!(session.handle(7, event).await.unwrap(), TakerReply::AlreadyFinished);
        }
        assert_eq!(storage.respondents.get(7).await.unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn unknown_question_or_choice_is_dropped() {
        let storage = storage_with(&bank()).await;
        let session = TakerSession::new(&storage);
        assert_eq!(
            session.handle(7, TakerEvent::Pick { question: 9, choice: 0 }).await.unwrap(),
            TakerReply::QuestionMissing
        );
        assert_eq!(
            session.handle(7, TakerEvent::Pick { question: 2, choice: 2 }).await.unwrap(),
            TakerReply::QuestionMissing
        );
        assert!(storage.respondents.get(7).await.unwrap().unwrap().answers.is_empty());
        assert_eq!(session.handle(8, TakerEvent::Finish).await.unwrap(), TakerReply::NotEnrolled);
    }
}
