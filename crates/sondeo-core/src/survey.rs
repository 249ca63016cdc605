//! Survey, question, and option types.
//!
//! Surveys, questions, and options are created once by an owner and are
//! immutable for aggregation purposes. Responses reference them but never
//! modify them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Survey ──────────────────────────────────────────────────────────────────

/// Lifecycle label for a survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
  Active,
  Inactive,
  Archived,
}

/// A survey owned by a client organisation (or by the platform itself when
/// `owner_id` is `None`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Survey {
  pub survey_id:              Uuid,
  pub title:                  String,
  /// Owning client organisation; platform-owned surveys have none.
  pub owner_id:               Option<Uuid>,
  pub status:                 SurveyStatus,
  /// Points awarded per answered question.
  pub points_per_question:    i64,
  /// Extra points for completing all required questions.
  pub bonus_points:           i64,
  /// Completed-response cap per respondent; 0 means unlimited.
  pub max_responses_per_user: u32,
  pub created_at:             DateTime<Utc>,
  pub expires_at:             Option<DateTime<Utc>>,
}

impl Survey {
  /// Whether the survey currently accepts submissions: it must be active
  /// and, if an expiry is set, not yet expired.
  pub fn is_open(&self, now: DateTime<Utc>) -> bool {
    self.status == SurveyStatus::Active
      && self.expires_at.is_none_or(|at| at > now)
  }
}

// ─── Question ────────────────────────────────────────────────────────────────

/// The closed set of supported question kinds. The variant name serves as the
/// `question_type` discriminant stored in the database.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
  SingleChoice,
  MultipleChoice,
  PercentageDistribution,
  Rating,
  OpenText,
}

impl QuestionType {
  /// The discriminant string stored in the `question_type` column.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn discriminant(self) -> &'static str {
    match self {
      Self::SingleChoice => "single_choice",
      Self::MultipleChoice => "multiple_choice",
      Self::PercentageDistribution => "percentage_distribution",
      Self::Rating => "rating",
      Self::OpenText => "open_text",
    }
  }
}

/// A question belonging to exactly one survey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
  pub question_id:   Uuid,
  pub survey_id:     Uuid,
  pub question_text: String,
  pub question_type: QuestionType,
  /// Display and iteration order; unique within the survey.
  pub order_index:   i64,
  pub is_required:   bool,
  /// Type-specific configuration, e.g. `{"must_sum_to": 100}` for
  /// distribution questions or `{"min": 1, "max": 5}` for ratings.
  pub config:        serde_json::Value,
}

/// One selectable option of a choice or distribution question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
  pub option_id:    Uuid,
  pub question_id:  Uuid,
  /// Display text shown to respondents.
  pub option_text:  String,
  /// Stable internal key used as the aggregation bucket — distinct from the
  /// random row identity and from the display text.
  pub option_value: String,
  pub order_index:  i64,
}

/// A question bundled with its options, in display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBundle {
  pub question: Question,
  pub options:  Vec<QuestionOption>,
}

// ─── Creation inputs ─────────────────────────────────────────────────────────

/// Input to [`crate::store::SurveyStore::create_survey`].
#[derive(Debug, Clone)]
pub struct NewSurvey {
  pub title:                  String,
  pub owner_id:               Option<Uuid>,
  pub status:                 SurveyStatus,
  pub points_per_question:    i64,
  pub bonus_points:           i64,
  pub max_responses_per_user: u32,
  pub expires_at:             Option<DateTime<Utc>>,
  pub questions:              Vec<NewQuestion>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
  pub question_text: String,
  pub question_type: QuestionType,
  pub order_index:   i64,
  pub is_required:   bool,
  pub config:        serde_json::Value,
  pub options:       Vec<NewQuestionOption>,
}

#[derive(Debug, Clone)]
pub struct NewQuestionOption {
  pub option_text:  String,
  pub option_value: String,
  pub order_index:  i64,
}
