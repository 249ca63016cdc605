//! Per-question-type aggregation strategies.
//!
//! Each strategy is a pure function `(&[&Answer], &[QuestionOption]) ->
//! QuestionResults`, selected by an explicit switch in the engine loop. The
//! same function serves the overall aggregate and every per-cohort variant.
//!
//! Accumulation runs at full `f64` precision; rounding happens only at the
//! final output values (1 decimal for percentages, 2 for rating means).

use std::collections::BTreeMap;

use crate::{
  response::{Answer, AnswerValue},
  survey::QuestionOption,
};

use super::{QuestionResults, RatingResult, ShareResult, VoteResult};

/// `percentage_distribution`: per option key, the arithmetic mean of the
/// submitted shares across the answers that included that key.
///
/// Keys that no longer resolve to an option surface verbatim under the raw
/// key rather than being dropped.
pub(super) fn shares(
  answers: &[&Answer],
  options: &[QuestionOption],
) -> QuestionResults {
  let mut acc: BTreeMap<String, (f64, u64)> = BTreeMap::new();
  for answer in answers {
    if let AnswerValue::PercentageDistribution(parts) = &answer.value {
      for (key, pct) in parts {
        let slot = acc.entry(key.clone()).or_insert((0.0, 0));
        slot.0 += pct;
        slot.1 += 1;
      }
    }
  }

  let out = acc
    .into_iter()
    .map(|(key, (sum, count))| {
      let label = options
        .iter()
        .find(|option| option.option_value == key)
        .map_or_else(|| key.clone(), |option| option.option_text.clone());
      let percentage = round1(sum / count as f64);
      (key, ShareResult { label, percentage })
    })
    .collect();

  QuestionResults::Shares(out)
}

/// `single_choice` / `multiple_choice`: votes per option, with each option's
/// percentage taken over this answer set's own vote total (not over the
/// survey's respondent count).
pub(super) fn votes(
  answers: &[&Answer],
  options: &[QuestionOption],
) -> QuestionResults {
  let mut counts: BTreeMap<String, (String, u64)> = BTreeMap::new();
  let mut total: u64 = 0;

  for answer in answers {
    let option_id = match answer.value {
      AnswerValue::SingleChoice(id) | AnswerValue::MultipleChoice(id) => id,
      _ => continue,
    };
    let (key, label) = match options.iter().find(|o| o.option_id == option_id)
    {
      Some(option) => {
        (option.option_value.clone(), option.option_text.clone())
      }
      // Votes for an option no longer in the set surface under the raw id.
      None => (option_id.to_string(), option_id.to_string()),
    };
    counts.entry(key).or_insert((label, 0)).1 += 1;
    total += 1;
  }

  let out = counts
    .into_iter()
    .map(|(key, (label, votes))| {
      let percentage = if total == 0 {
        0.0
      } else {
        round1(votes as f64 / total as f64 * 100.0)
      };
      (key, VoteResult { label, votes, percentage })
    })
    .collect();

  QuestionResults::Votes(out)
}

/// `rating`: mean of all ratings plus a 1..5 count histogram.
pub(super) fn ratings(
  answers: &[&Answer],
  _options: &[QuestionOption],
) -> QuestionResults {
  let mut distribution: BTreeMap<String, u64> =
    (1..=5).map(|value: i64| (value.to_string(), 0)).collect();
  let mut sum: i64 = 0;
  let mut count: u64 = 0;

  for answer in answers {
    if let AnswerValue::Rating(value) = answer.value {
      sum += value;
      count += 1;
      if let Some(slot) = distribution.get_mut(&value.to_string()) {
        *slot += 1;
      }
    }
  }

  let average = if count == 0 {
    0.0
  } else {
    round2(sum as f64 / count as f64)
  };

  QuestionResults::Rating(RatingResult {
    average,
    total_ratings: count,
    distribution,
  })
}

pub(super) fn round1(value: f64) -> f64 { (value * 10.0).round() / 10.0 }

pub(super) fn round2(value: f64) -> f64 { (value * 100.0).round() / 100.0 }
