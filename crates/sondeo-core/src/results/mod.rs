//! The survey results aggregation engine.
//!
//! A pure, re-computable projection over the stored response log: it consumes
//! a consistent snapshot of one survey's completed responses and produces
//! demographic-segmented, time-bucketed statistical summaries. The engine
//! performs no writes and keeps no state between invocations; classification
//! maps are built once per call and threaded explicitly into the per-question
//! handlers.
//!
//! All output maps are `BTreeMap` so the serialised JSON is deterministic —
//! a content hash of the output is a valid cache key for downstream
//! consumers (e.g. the prose-summary caller).

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  classify,
  respondent::Respondent,
  response::{Answer, Response},
  survey::{QuestionBundle, QuestionOption, QuestionType, Survey},
};

mod evolution;
mod summary;

pub use evolution::{CohortEvolution, EvolutionData};

// ─── Input snapshot ──────────────────────────────────────────────────────────

/// A consistent read of everything the engine needs for one survey.
///
/// `responses` should hold the completed responses joined with their
/// respondents and `answers` the answers belonging to them; the engine
/// filters out in-progress responses defensively either way.
#[derive(Debug, Clone)]
pub struct ResultsSnapshot {
  pub survey:    Survey,
  pub questions: Vec<QuestionBundle>,
  pub responses: Vec<(Response, Respondent)>,
  pub answers:   Vec<Answer>,
}

// ─── Output types ────────────────────────────────────────────────────────────

/// The full aggregation output for one survey.
#[derive(Debug, Clone, Serialize)]
pub struct SurveyResults {
  pub survey_id:         Uuid,
  pub total_responses:   u64,
  /// Responses whose `started_at` falls within the calendar month of the
  /// `now` passed to [`compute`].
  pub monthly_responses: u64,
  pub demographics:      Demographics,
  pub questions_summary: Vec<QuestionSummary>,
  pub evolution_data:    EvolutionData,
}

/// Frequency tables over the completed-response set, bucket label → count.
#[derive(Debug, Clone, Serialize)]
pub struct Demographics {
  pub by_age_group:    BTreeMap<String, u64>,
  pub by_city:         BTreeMap<String, u64>,
  pub by_neighborhood: BTreeMap<String, u64>,
}

/// The aggregate for one question, overall and per age cohort.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionSummary {
  pub question_id:    Uuid,
  pub question_text:  String,
  pub question_type:  QuestionType,
  pub total_answers:  u64,
  pub results:        QuestionResults,
  /// The same aggregate recomputed independently per cohort; only cohorts
  /// with at least one answer for this question appear.
  pub results_by_age: BTreeMap<String, QuestionResults>,
}

/// Type-specific aggregate of one question's answers.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QuestionResults {
  /// `percentage_distribution`: option key → per-key mean share.
  Shares(BTreeMap<String, ShareResult>),
  /// `single_choice` / `multiple_choice`: option key → vote count and share
  /// of this question's votes.
  Votes(BTreeMap<String, VoteResult>),
  /// `rating`: mean, count, and a 1..5 histogram.
  Rating(RatingResult),
}

#[derive(Debug, Clone, Serialize)]
pub struct ShareResult {
  pub label:      String,
  /// Mean of the submitted shares for this key, over the answers that
  /// included the key. Rounded to 1 decimal.
  pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteResult {
  pub label:      String,
  pub votes:      u64,
  /// Share of this question's own vote total, rounded to 1 decimal.
  pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingResult {
  /// Mean rating rounded to 2 decimals; 0 when there are no ratings.
  pub average:       f64,
  pub total_ratings: u64,
  /// Counts per rating value, keyed `"1"` through `"5"`.
  pub distribution:  BTreeMap<String, u64>,
}

// ─── Shared per-invocation context ───────────────────────────────────────────

/// Attribution record for one completed response.
pub(super) struct ResponseMeta {
  pub(super) respondent_id: Uuid,
  pub(super) started_at:    DateTime<Utc>,
}

type SummaryFn = fn(&[&Answer], &[QuestionOption]) -> QuestionResults;

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Compute the full result set for one survey snapshot.
///
/// Never fails: an empty snapshot yields a well-formed zero-valued result,
/// and malformed demographic fields route to the "Sin especificar" bucket.
pub fn compute(snapshot: &ResultsSnapshot, now: DateTime<Utc>) -> SurveyResults {
  // Only completed responses are visible to the engine.
  let completed: Vec<&(Response, Respondent)> = snapshot
    .responses
    .iter()
    .filter(|(response, _)| response.completed)
    .collect();

  let total_responses = completed.len() as u64;
  let monthly_responses = completed
    .iter()
    .filter(|(response, _)| {
      response.started_at.year() == now.year()
        && response.started_at.month() == now.month()
    })
    .count() as u64;

  // Demographic frequency tables plus the respondent → cohort index reused
  // by the per-question breakdowns and the evolution series.
  let today = now.date_naive();
  let mut by_age_group: BTreeMap<String, u64> = BTreeMap::new();
  let mut by_city: BTreeMap<String, u64> = BTreeMap::new();
  let mut by_neighborhood: BTreeMap<String, u64> = BTreeMap::new();
  let mut cohort_of: HashMap<Uuid, &'static str> = HashMap::new();

  for (_, person) in &completed {
    let cohort = classify::age_cohort(person.birth_date, today);
    *by_age_group.entry(cohort.to_owned()).or_insert(0) += 1;
    *by_city
      .entry(classify::place_bucket(person.city.as_deref()))
      .or_insert(0) += 1;
    *by_neighborhood
      .entry(classify::place_bucket(person.neighborhood.as_deref()))
      .or_insert(0) += 1;
    cohort_of.insert(person.respondent_id, cohort);
  }

  let meta: HashMap<Uuid, ResponseMeta> = completed
    .iter()
    .map(|(response, _)| {
      (response.response_id, ResponseMeta {
        respondent_id: response.respondent_id,
        started_at:    response.started_at,
      })
    })
    .collect();

  // Answers of completed responses, grouped per question.
  let mut per_question: HashMap<Uuid, Vec<&Answer>> = HashMap::new();
  for answer in &snapshot.answers {
    if meta.contains_key(&answer.response_id) {
      per_question
        .entry(answer.question_id)
        .or_default()
        .push(answer);
    }
  }

  // Per-question summaries, in display order.
  let mut ordered: Vec<&QuestionBundle> = snapshot.questions.iter().collect();
  ordered.sort_by_key(|bundle| bundle.question.order_index);

  let no_answers: Vec<&Answer> = Vec::new();
  let mut questions_summary = Vec::new();

  for bundle in &ordered {
    let question = &bundle.question;

    let strategy: SummaryFn = match question.question_type {
      QuestionType::PercentageDistribution => summary::shares,
      QuestionType::SingleChoice | QuestionType::MultipleChoice => {
        summary::votes
      }
      QuestionType::Rating => summary::ratings,
      // Free text is captured only in the raw-detail view.
      QuestionType::OpenText => continue,
    };

    let q_answers = per_question
      .get(&question.question_id)
      .unwrap_or(&no_answers);

    let mut by_cohort: BTreeMap<&'static str, Vec<&Answer>> = BTreeMap::new();
    for answer in q_answers.iter().copied() {
      let Some(m) = meta.get(&answer.response_id) else {
        continue;
      };
      let cohort = cohort_of
        .get(&m.respondent_id)
        .copied()
        .unwrap_or(classify::UNSPECIFIED);
      by_cohort.entry(cohort).or_default().push(answer);
    }

    let results_by_age = by_cohort
      .into_iter()
      .map(|(cohort, answers)| {
        (cohort.to_owned(), strategy(&answers, &bundle.options))
      })
      .collect();

    questions_summary.push(QuestionSummary {
      question_id: question.question_id,
      question_text: question.question_text.clone(),
      question_type: question.question_type,
      total_answers: q_answers.len() as u64,
      results: strategy(q_answers, &bundle.options),
      results_by_age,
    });
  }

  let evolution_data =
    evolution::build(&ordered, &per_question, &meta, &cohort_of);

  SurveyResults {
    survey_id: snapshot.survey.survey_id,
    total_responses,
    monthly_responses,
    demographics: Demographics {
      by_age_group,
      by_city,
      by_neighborhood,
    },
    questions_summary,
    evolution_data,
  }
}
