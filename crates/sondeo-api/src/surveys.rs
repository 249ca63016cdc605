//! Handlers for `/surveys` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/surveys` | Body: survey definition with questions |
//! | `GET`  | `/surveys/:id` | Survey plus its question set; 404 if not found |
//! | `GET`  | `/surveys/:id/results` | Full aggregation, `ETag` header set |
//! | `GET`  | `/surveys/:id/can-respond/:respondent_id` | Advisory cap check |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sondeo_core::{
  results::{ResultsSnapshot, compute},
  store::SurveyStore,
  survey::{
    NewQuestion, NewQuestionOption, NewSurvey, QuestionBundle, QuestionType,
    Survey, SurveyStatus,
  },
};
use uuid::Uuid;

use crate::{error::ApiError, hash};

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateSurveyBody {
  pub title:                  String,
  pub owner_id:               Option<Uuid>,
  #[serde(default = "default_status")]
  pub status:                 SurveyStatus,
  #[serde(default)]
  pub points_per_question:    i64,
  #[serde(default)]
  pub bonus_points:           i64,
  #[serde(default = "default_cap")]
  pub max_responses_per_user: u32,
  pub expires_at:             Option<DateTime<Utc>>,
  #[serde(default)]
  pub questions:              Vec<QuestionBody>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionBody {
  pub question_text: String,
  pub question_type: QuestionType,
  pub order_index:   i64,
  #[serde(default = "default_required")]
  pub is_required:   bool,
  #[serde(default)]
  pub config:        serde_json::Value,
  #[serde(default)]
  pub options:       Vec<OptionBody>,
}

#[derive(Debug, Deserialize)]
pub struct OptionBody {
  pub option_text:  String,
  pub option_value: String,
  pub order_index:  i64,
}

fn default_status() -> SurveyStatus { SurveyStatus::Active }
fn default_cap() -> u32 { 1 }
fn default_required() -> bool { true }

/// `POST /surveys`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateSurveyBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SurveyStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let input = NewSurvey {
    title:                  body.title,
    owner_id:               body.owner_id,
    status:                 body.status,
    points_per_question:    body.points_per_question,
    bonus_points:           body.bonus_points,
    max_responses_per_user: body.max_responses_per_user,
    expires_at:             body.expires_at,
    questions:              body
      .questions
      .into_iter()
      .map(|q| NewQuestion {
        question_text: q.question_text,
        question_type: q.question_type,
        order_index:   q.order_index,
        is_required:   q.is_required,
        config:        q.config,
        options:       q
          .options
          .into_iter()
          .map(|o| NewQuestionOption {
            option_text:  o.option_text,
            option_value: o.option_value,
            order_index:  o.order_index,
          })
          .collect(),
      })
      .collect(),
  };

  let survey = store
    .create_survey(input)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(survey)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SurveyDetail {
  pub survey:    Survey,
  pub questions: Vec<QuestionBundle>,
}

/// `GET /surveys/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SurveyDetail>, ApiError>
where
  S: SurveyStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let survey = store
    .survey(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("survey {id} not found")))?;
  let questions = store.questions(id).await.map_err(ApiError::from_store)?;
  Ok(Json(SurveyDetail { survey, questions }))
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// `GET /surveys/:id/results`
///
/// Aggregates the survey's completed responses on the fly and tags the body
/// with a content-hash `ETag`, so clients (and any prose-summary pipeline
/// downstream) can detect unchanged results without diffing the JSON.
pub async fn results<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SurveyStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let survey = store
    .survey(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("survey {id} not found")))?;
  let questions = store.questions(id).await.map_err(ApiError::from_store)?;
  let responses = store
    .completed_responses(id)
    .await
    .map_err(ApiError::from_store)?;
  let answers = store
    .completed_answers(id)
    .await
    .map_err(ApiError::from_store)?;

  let results = compute(
    &ResultsSnapshot { survey, questions, responses, answers },
    Utc::now(),
  );
  let etag =
    hash::results_etag(&results).map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(([(header::ETAG, etag)], Json(results)))
}

// ─── Eligibility ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CanRespond {
  pub can_respond: bool,
}

/// `GET /surveys/:id/can-respond/:respondent_id`
///
/// Advisory: ingestion re-checks the cap inside its own transaction.
pub async fn can_respond<S>(
  State(store): State<Arc<S>>,
  Path((id, respondent_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CanRespond>, ApiError>
where
  S: SurveyStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let allowed = store
    .can_respond(respondent_id, id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(CanRespond { can_respond: allowed }))
}
