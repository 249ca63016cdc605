//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use sondeo_core::Error as CoreError;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The request conflicts with current state — a closed survey or a
  /// respondent at the response cap.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a store failure, surfacing domain rejections buried in its source
  /// chain as client errors instead of a blanket 500.
  pub fn from_store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(err);
    match map_domain(&*boxed) {
      Some(mapped) => mapped,
      None => Self::Store(boxed),
    }
  }
}

fn map_domain(err: &(dyn std::error::Error + 'static)) -> Option<ApiError> {
  let mut current = Some(err);
  while let Some(e) = current {
    if let Some(core) = e.downcast_ref::<CoreError>() {
      return Some(match core {
        CoreError::SurveyNotFound(_)
        | CoreError::QuestionNotFound(_)
        | CoreError::RespondentNotFound(_) => {
          ApiError::NotFound(core.to_string())
        }
        CoreError::SurveyInactive(_) | CoreError::NotEligible { .. } => {
          ApiError::Conflict(core.to_string())
        }
        CoreError::InvalidAnswer { .. } => {
          ApiError::BadRequest(core.to_string())
        }
        CoreError::Serialization(_) => return None,
      });
    }
    current = e.source();
  }
  None
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
