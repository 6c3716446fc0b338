//! Class-wide fairness bonus.
//!
//! Questions that nearly everyone missed reward the few who got them right.
//! Only the questions missed by the respondent with the most misses are
//! considered.

use std::collections::BTreeMap;

use super::{Points, QuestionRef, Respondent};

/// Share of respondents (in percent) that must miss a question.
pub const MISS_THRESHOLD_PERCENT: usize = 90;
pub const BONUS: Points = Points::HALF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BonusAward {
    pub question: QuestionRef,
    pub missed_by: usize,
    pub recipients: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BonusPlan {
    pub worst: Option<i64>,
    pub awards: Vec<BonusAward>,
}

impl BonusPlan {
    /// Total bonus per respondent; respondents without any bonus are absent.
    pub fn totals(&self) -> BTreeMap<i64, Points> {
        let mut totals = BTreeMap::new();
        for award in &self.awards {
            for id in &award.recipients {
                *totals.entry(*id).or_insert(Points::ZERO) += BONUS;
            }
        }
        totals
    }
}

/// Respondent with strictly the most misses; on ties the one seen first
/// wins, so callers pass respondents in ascending id order.
fn worst_respondent(respondents: &[Respondent]) -> Option<&Respondent> {
    respondents.iter().fold(None, |worst: Option<&Respondent>, r| match worst {
        Some(w) if r.wrong.len() <= w.wrong.len() => Some(w),
        _ => Some(r),
    })
}

pub fn plan(respondents: &[Respondent]) -> BonusPlan {
    let Some(worst) = worst_respondent(respondents).filter(|w| !w.wrong.is_empty()) else {
        return BonusPlan::default();
    };

    let total = respondents.len();
    let awards = worst
        .wrong
        .iter()
        .filter_map(|question| {
            let missed_by = respondents.iter().filter(|r| r.misses(*question)).count();
            if missed_by * 100 < total * MISS_THRESHOLD_PERCENT {
                return None;
            }
            let recipients = respondents
                .iter()
                .filter(|r| !r.misses(*question))
                .map(|r| r.id)
                .collect();
            Some(BonusAward {
                question: *question,
                missed_by,
                recipients,
            })
        })
        .collect();

    BonusPlan {
        worst: Some(worst.id),
        awards,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn respondent(id: i64, wrong: &[u32]) -> Respondent {
        let mut r = Respondent::new(id);
        r.wrong = wrong.iter().map(|n| QuestionRef::Open(*n)).collect();
        r
    }

    #[test]
    fn two_of_three_is_below_threshold() {
        let respondents = vec![respondent(1, &[7]), respondent(2, &[7]), respondent(3, &[])];
        let plan = plan(&respondents);
        assert_eq!(plan.worst, Some(1));
        assert!(plan.awards.is_empty());
        assert!(plan.totals().is_empty());
    }

    #[test]
    fn ninety_percent_rewards_the_rest() {
        let mut respondents: Vec<Respondent> = (1..=9).map(|id| respondent(id, &[3, 4])).collect();
        respondents.push(respondent(10, &[4]));

        let plan = plan(&respondents);
        assert_eq!(plan.awards.len(), 2);
        assert_eq!(plan.awards[0].question, QuestionRef::Open(3));
        assert_eq!(plan.awards[0].missed_by, 9);
        assert_eq!(plan.awards[0].recipients, vec![10]);
        assert!(plan.awards[1].recipients.is_empty());
        assert_eq!(plan.totals(), BTreeMap::from([(10, BONUS)]));
    }

    #[test]
    fn bonuses_accumulate_per_question() {
        let mut respondents: Vec<Respondent> =
            (1..=10).map(|id| respondent(id, &[1, 2, 3])).collect();
        respondents.push(respondent(11, &[]));
        let totals = plan(&respondents).totals();
        assert_eq!(totals.get(&11), Some(&Points::from_hundredths(150)));
        assert_eq!(totals.len(), 1);
    }

    #[test]
    fn ties_pick_the_first_respondent() {
        let respondents = vec![respondent(4, &[1]), respondent(9, &[2])];
        assert_eq!(plan(&respondents).worst, Some(4));
    }

    #[test]
    fn nobody_wrong_means_no_plan() {
        let respondents = vec![respondent(1, &[]), respondent(2, &[])];
        assert_eq!(plan(&respondents), BonusPlan::default());
    }
}
