//! Handler for `/surveys/:id/responses` — submission ingestion.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use sondeo_core::{
  response::{AnswerValue, NewAnswer, NewResponse},
  store::SurveyStore,
};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  pub respondent_id: Uuid,
  #[serde(default = "default_completed")]
  pub completed:     bool,
  #[serde(default)]
  pub answers:       Vec<AnswerBody>,
}

/// One answer on the wire, e.g.
/// `{"question_id": "...", "type": "rating", "data": 4}`.
#[derive(Debug, Deserialize)]
pub struct AnswerBody {
  pub question_id: Uuid,
  #[serde(flatten)]
  pub value:       AnswerValue,
}

fn default_completed() -> bool { true }

/// `POST /surveys/:id/responses`
///
/// 201 with the persisted response (including earned points) on success;
/// 409 when the survey is closed or the respondent is at the cap; 400 for
/// answers that fail validation.
pub async fn submit<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<SubmitBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SurveyStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let input = NewResponse {
    survey_id:     id,
    respondent_id: body.respondent_id,
    completed:     body.completed,
    answers:       body
      .answers
      .into_iter()
      .map(|a| NewAnswer { question_id: a.question_id, value: a.value })
      .collect(),
  };

  let response = store
    .submit_response(input)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(response)))
}
