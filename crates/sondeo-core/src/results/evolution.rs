//! Month-bucketed historical evolution series.
//!
//! Answers are bucketed by the calendar month (`YYYY-MM`) of their parent
//! response's `started_at`. The series cover at most the trailing 8 distinct
//! months with data, ascending, and every series is a parallel array over
//! that month axis. The whole structure is recomputed once per age cohort
//! under `by_age`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  classify,
  response::{Answer, AnswerValue},
  survey::{QuestionBundle, QuestionType},
};

use super::{
  ResponseMeta,
  summary::{round1, round2},
};

/// How many trailing months of history the series cover.
const MAX_MONTHS: usize = 8;

const MONTHS_ES: [&str; 12] = [
  "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct",
  "Nov", "Dic",
];

// ─── Output types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct EvolutionData {
  /// Short localised month labels, chronologically ascending, at most 8.
  pub months: Vec<String>,
  /// Option key → per-month mean share.
  pub percentage_distribution: BTreeMap<String, Vec<f64>>,
  /// Option key → per-month percentage of that month's own vote total.
  pub single_choice: BTreeMap<String, Vec<f64>>,
  /// Per-month mean rating; empty when the survey has no rating question.
  pub rating: Vec<f64>,
  /// The same three series recomputed per age cohort (fixed label set).
  pub by_age: BTreeMap<String, CohortEvolution>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CohortEvolution {
  pub percentage_distribution: BTreeMap<String, Vec<f64>>,
  pub single_choice: BTreeMap<String, Vec<f64>>,
  pub rating: Vec<f64>,
}

// ─── Samples ─────────────────────────────────────────────────────────────────

struct ShareSample<'a> {
  month:  String,
  cohort: &'static str,
  parts:  &'a BTreeMap<String, f64>,
}

struct VoteSample {
  month:  String,
  cohort: &'static str,
  key:    String,
}

struct RatingSample {
  month:  String,
  cohort: &'static str,
  value:  i64,
}

// ─── Builder ─────────────────────────────────────────────────────────────────

pub(super) fn build(
  questions: &[&QuestionBundle],
  per_question: &HashMap<Uuid, Vec<&Answer>>,
  meta: &HashMap<Uuid, ResponseMeta>,
  cohort_of: &HashMap<Uuid, &'static str>,
) -> EvolutionData {
  let mut share_samples: Vec<ShareSample<'_>> = Vec::new();
  let mut vote_samples: Vec<VoteSample> = Vec::new();
  let mut rating_samples: Vec<RatingSample> = Vec::new();
  let mut share_keys: BTreeSet<String> = BTreeSet::new();
  let mut vote_keys: BTreeSet<String> = BTreeSet::new();
  let mut has_rating = false;

  for bundle in questions {
    let question = &bundle.question;
    match question.question_type {
      QuestionType::PercentageDistribution => {
        share_keys
          .extend(bundle.options.iter().map(|o| o.option_value.clone()));
      }
      QuestionType::SingleChoice => {
        vote_keys.extend(bundle.options.iter().map(|o| o.option_value.clone()));
      }
      QuestionType::Rating => has_rating = true,
      // Multiple-choice and free-text questions carry no evolution series.
      QuestionType::MultipleChoice | QuestionType::OpenText => continue,
    }

    let Some(answers) = per_question.get(&question.question_id) else {
      continue;
    };

    for answer in answers.iter().copied() {
      let Some(m) = meta.get(&answer.response_id) else {
        continue;
      };
      let month = month_key(m.started_at);
      let cohort = cohort_of
        .get(&m.respondent_id)
        .copied()
        .unwrap_or(classify::UNSPECIFIED);

      match &answer.value {
        AnswerValue::PercentageDistribution(parts) => {
          // Stale keys still get a series, keyed verbatim.
          share_keys.extend(parts.keys().cloned());
          share_samples.push(ShareSample { month, cohort, parts });
        }
        AnswerValue::SingleChoice(option_id) => {
          let key = bundle
            .options
            .iter()
            .find(|o| o.option_id == *option_id)
            .map_or_else(
              || option_id.to_string(),
              |o| o.option_value.clone(),
            );
          vote_keys.insert(key.clone());
          vote_samples.push(VoteSample { month, cohort, key });
        }
        AnswerValue::Rating(value) => {
          rating_samples.push(RatingSample {
            month,
            cohort,
            value: *value,
          });
        }
        _ => {}
      }
    }
  }

  let mut all_months: BTreeSet<String> = BTreeSet::new();
  all_months.extend(share_samples.iter().map(|s| s.month.clone()));
  all_months.extend(vote_samples.iter().map(|s| s.month.clone()));
  all_months.extend(rating_samples.iter().map(|s| s.month.clone()));

  let month_keys: Vec<String> = all_months.into_iter().collect();
  let month_keys =
    month_keys[month_keys.len().saturating_sub(MAX_MONTHS)..].to_vec();

  if month_keys.is_empty() {
    return EvolutionData::default();
  }

  let (percentage_distribution, single_choice, rating) = series(
    &month_keys,
    &share_keys,
    &vote_keys,
    has_rating,
    &share_samples,
    &vote_samples,
    &rating_samples,
    None,
  );

  let mut by_age = BTreeMap::new();
  for cohort in classify::COHORT_LABELS {
    let (shares, choices, means) = series(
      &month_keys,
      &share_keys,
      &vote_keys,
      has_rating,
      &share_samples,
      &vote_samples,
      &rating_samples,
      Some(cohort),
    );
    by_age.insert(cohort.to_owned(), CohortEvolution {
      percentage_distribution: shares,
      single_choice: choices,
      rating: means,
    });
  }

  EvolutionData {
    months: month_keys.iter().map(|key| month_label(key)).collect(),
    percentage_distribution,
    single_choice,
    rating,
    by_age,
  }
}

/// Build the three per-type series over `month_keys`, optionally restricted
/// to one cohort. Each month's value is the same aggregate the summary
/// computes, restricted to that month's answers; empty buckets yield 0.
#[allow(clippy::too_many_arguments)]
fn series(
  month_keys: &[String],
  share_keys: &BTreeSet<String>,
  vote_keys: &BTreeSet<String>,
  has_rating: bool,
  share_samples: &[ShareSample<'_>],
  vote_samples: &[VoteSample],
  rating_samples: &[RatingSample],
  cohort: Option<&str>,
) -> (
  BTreeMap<String, Vec<f64>>,
  BTreeMap<String, Vec<f64>>,
  Vec<f64>,
) {
  let keep = |sample_cohort: &str| cohort.is_none_or(|c| c == sample_cohort);

  let mut shares: BTreeMap<String, Vec<f64>> = BTreeMap::new();
  for key in share_keys {
    let points = month_keys
      .iter()
      .map(|month| {
        let (mut sum, mut count) = (0.0_f64, 0_u64);
        for sample in share_samples {
          if sample.month == *month
            && keep(sample.cohort)
            && let Some(pct) = sample.parts.get(key)
          {
            sum += pct;
            count += 1;
          }
        }
        if count == 0 { 0.0 } else { round1(sum / count as f64) }
      })
      .collect();
    shares.insert(key.clone(), points);
  }

  let mut choices: BTreeMap<String, Vec<f64>> = BTreeMap::new();
  if !vote_keys.is_empty() {
    // Vote totals are per month (and per cohort when restricted): each
    // month normalises against its own 100% base.
    let totals: Vec<u64> = month_keys
      .iter()
      .map(|month| {
        vote_samples
          .iter()
          .filter(|s| s.month == *month && keep(s.cohort))
          .count() as u64
      })
      .collect();

    for key in vote_keys {
      let points = month_keys
        .iter()
        .zip(&totals)
        .map(|(month, total)| {
          if *total == 0 {
            return 0.0;
          }
          let votes = vote_samples
            .iter()
            .filter(|s| s.month == *month && keep(s.cohort) && s.key == *key)
            .count();
          round1(votes as f64 / *total as f64 * 100.0)
        })
        .collect();
      choices.insert(key.clone(), points);
    }
  }

  let rating: Vec<f64> = if has_rating {
    month_keys
      .iter()
      .map(|month| {
        let (mut sum, mut count) = (0_i64, 0_u64);
        for sample in rating_samples {
          if sample.month == *month && keep(sample.cohort) {
            sum += sample.value;
            count += 1;
          }
        }
        if count == 0 { 0.0 } else { round2(sum as f64 / count as f64) }
      })
      .collect()
  } else {
    Vec::new()
  };

  (shares, choices, rating)
}

// ─── Month helpers ───────────────────────────────────────────────────────────

fn month_key(at: DateTime<Utc>) -> String {
  format!("{:04}-{:02}", at.year(), at.month())
}

/// Short Spanish display label for a `YYYY-MM` key, e.g. `"Ene 2025"`.
fn month_label(key: &str) -> String {
  let (year, rest) = key.split_at(4);
  let index = rest[1..]
    .parse::<usize>()
    .ok()
    .and_then(|m| m.checked_sub(1))
    .unwrap_or(0)
    .min(11);
  format!("{} {}", MONTHS_ES[index], year)
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn month_keys_sort_chronologically() {
    let december = month_key(Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap());
    let january = month_key(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(december, "2024-12");
    assert_eq!(january, "2025-01");
    assert!(december < january);
  }

  #[test]
  fn month_labels_are_short_spanish() {
    assert_eq!(month_label("2025-01"), "Ene 2025");
    assert_eq!(month_label("2025-12"), "Dic 2025");
  }
}
