//! Response and answer types — the append-only submission log.
//!
//! A response and its answers are created atomically as one unit and never
//! mutated afterward. The aggregation engine treats the response table as an
//! append-only, read-only log.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  survey::{QuestionBundle, QuestionType},
};

/// Tolerance when checking that distribution shares sum to their target.
pub const DISTRIBUTION_EPSILON: f64 = 0.01;

// ─── Response ────────────────────────────────────────────────────────────────

/// One attempt by one respondent on one survey.
///
/// Only `completed == true` responses are visible to the aggregation engine;
/// in-progress responses exist solely for the respondent's own history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
  pub response_id:   Uuid,
  pub survey_id:     Uuid,
  pub respondent_id: Uuid,
  pub completed:     bool,
  pub points_earned: i64,
  /// Server-assigned submission timestamp; also the evolution bucket key.
  pub started_at:    DateTime<Utc>,
  pub completed_at:  Option<DateTime<Utc>>,
}

// ─── AnswerValue ─────────────────────────────────────────────────────────────

/// The typed payload of an answer. The variant name serves as the
/// `answer_type` discriminant stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum AnswerValue {
  /// References one option of a single-choice question.
  SingleChoice(Uuid),
  /// One selected option of a multiple-choice question; a submission carries
  /// one answer per selected option.
  MultipleChoice(Uuid),
  /// A star rating in `[1, 5]`.
  Rating(i64),
  /// Percentages keyed by the option's stable value key; the values must sum
  /// to the question's target (100 by default) within
  /// [`DISTRIBUTION_EPSILON`].
  PercentageDistribution(BTreeMap<String, f64>),
  /// Free text; excluded from statistical aggregation.
  OpenText(String),
}

impl AnswerValue {
  /// The discriminant string stored in the `answer_type` column.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::SingleChoice(_) => "single_choice",
      Self::MultipleChoice(_) => "multiple_choice",
      Self::Rating(_) => "rating",
      Self::PercentageDistribution(_) => "percentage_distribution",
      Self::OpenText(_) => "open_text",
    }
  }

  /// The question kind this payload answers.
  pub fn question_type(&self) -> QuestionType {
    match self {
      Self::SingleChoice(_) => QuestionType::SingleChoice,
      Self::MultipleChoice(_) => QuestionType::MultipleChoice,
      Self::Rating(_) => QuestionType::Rating,
      Self::PercentageDistribution(_) => QuestionType::PercentageDistribution,
      Self::OpenText(_) => QuestionType::OpenText,
    }
  }

  /// Serialise the inner payload (without the type tag) for the
  /// `payload_json` database column.
  pub fn to_json(&self) -> Result<serde_json::Value> {
    // The full serialised form is `{"type": "...", "data": <payload>}`.
    // We want only the payload.
    let full = serde_json::to_value(self)?;
    Ok(full.get("data").cloned().unwrap_or(serde_json::Value::Null))
  }

  /// Deserialise from the discriminant string and JSON payload stored in the
  /// database.
  pub fn from_parts(
    discriminant: &str,
    data: serde_json::Value,
  ) -> Result<Self> {
    let wrapped = serde_json::json!({ "type": discriminant, "data": data });
    Ok(serde_json::from_value(wrapped)?)
  }
}

// ─── Answer ──────────────────────────────────────────────────────────────────

/// One answer of one response to one question. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
  pub answer_id:   Uuid,
  pub response_id: Uuid,
  pub question_id: Uuid,
  pub value:       AnswerValue,
}

// ─── Submission inputs ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewAnswer {
  pub question_id: Uuid,
  pub value:       AnswerValue,
}

/// Input to [`crate::store::SurveyStore::submit_response`].
/// `started_at` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewResponse {
  pub survey_id:     Uuid,
  pub respondent_id: Uuid,
  pub completed:     bool,
  pub answers:       Vec<NewAnswer>,
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Validate one submitted answer against its question definition.
///
/// Rejects payload/type mismatches, options that do not belong to the
/// question, ratings outside the `[1, 5]` scale (config may narrow it
/// further), and distribution shares that do not sum to the question's
/// target.
pub fn validate_answer(answer: &NewAnswer, bundle: &QuestionBundle) -> Result<()> {
  let question = &bundle.question;

  if answer.value.question_type() != question.question_type {
    return Err(invalid(
      question.question_id,
      format!(
        "payload of type {:?} does not answer a {:?} question",
        answer.value.discriminant(),
        question.question_type.discriminant(),
      ),
    ));
  }

  match &answer.value {
    AnswerValue::SingleChoice(option_id)
    | AnswerValue::MultipleChoice(option_id) => {
      if !bundle.options.iter().any(|o| o.option_id == *option_id) {
        return Err(invalid(
          question.question_id,
          format!("option {option_id} does not belong to this question"),
        ));
      }
    }

    AnswerValue::Rating(value) => {
      // Config may narrow the 1..=5 scale but never widen it.
      let min = config_i64(&question.config, "min", 1).max(1);
      let max = config_i64(&question.config, "max", 5).min(5);
      if *value < min || *value > max {
        return Err(invalid(
          question.question_id,
          format!("rating {value} outside [{min}, {max}]"),
        ));
      }
    }

    AnswerValue::PercentageDistribution(shares) => {
      let target = config_f64(&question.config, "must_sum_to", 100.0);
      for (key, pct) in shares {
        if !(0.0..=100.0).contains(pct) {
          return Err(invalid(
            question.question_id,
            format!("share {pct} for {key:?} outside [0, 100]"),
          ));
        }
      }
      let sum: f64 = shares.values().sum();
      if (sum - target).abs() > DISTRIBUTION_EPSILON {
        return Err(invalid(
          question.question_id,
          format!("shares sum to {sum}, expected {target}"),
        ));
      }
    }

    AnswerValue::OpenText(_) => {}
  }

  Ok(())
}

fn invalid(question_id: Uuid, reason: String) -> Error {
  Error::InvalidAnswer { question_id, reason }
}

fn config_i64(config: &serde_json::Value, key: &str, default: i64) -> i64 {
  config.get(key).and_then(serde_json::Value::as_i64).unwrap_or(default)
}

fn config_f64(config: &serde_json::Value, key: &str, default: f64) -> f64 {
  config.get(key).and_then(serde_json::Value::as_f64).unwrap_or(default)
}
