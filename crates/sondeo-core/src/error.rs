//! Error types for `sondeo-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("survey not found: {0}")]
  SurveyNotFound(Uuid),

  #[error("question not found: {0}")]
  QuestionNotFound(Uuid),

  #[error("respondent not found: {0}")]
  RespondentNotFound(Uuid),

  #[error("survey {0} is not open for responses")]
  SurveyInactive(Uuid),

  /// The respondent has reached the survey's response cap.
  #[error("respondent {respondent_id} reached the response cap for survey {survey_id}")]
  NotEligible {
    respondent_id: Uuid,
    survey_id:     Uuid,
  },

  #[error("invalid answer for question {question_id}: {reason}")]
  InvalidAnswer {
    question_id: Uuid,
    reason:      String,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
