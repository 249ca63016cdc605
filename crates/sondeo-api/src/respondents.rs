//! Handlers for `/respondents` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/respondents` | All demographic fields optional |
//! | `GET`  | `/respondents/:id` | 404 if not found |
//! | `GET`  | `/respondents/:id/points` | Balance plus full ledger |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sondeo_core::{
  points::{LedgerEntry, PointBalance},
  respondent::{NewRespondent, Respondent},
  store::SurveyStore,
};
use uuid::Uuid;

use crate::error::ApiError;

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateRespondentBody {
  pub birth_date:   Option<NaiveDate>,
  pub city:         Option<String>,
  pub neighborhood: Option<String>,
}

/// `POST /respondents`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateRespondentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SurveyStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let respondent = store
    .add_respondent(NewRespondent {
      birth_date:   body.birth_date,
      city:         body.city,
      neighborhood: body.neighborhood,
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(respondent)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /respondents/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Respondent>, ApiError>
where
  S: SurveyStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let respondent = store
    .respondent(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("respondent {id} not found")))?;
  Ok(Json(respondent))
}

// ─── Points ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PointsView {
  /// `None` until the respondent earns their first points.
  pub balance: Option<PointBalance>,
  pub ledger:  Vec<LedgerEntry>,
}

/// `GET /respondents/:id/points`
pub async fn points<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<PointsView>, ApiError>
where
  S: SurveyStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  store
    .respondent(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("respondent {id} not found")))?;

  let balance = store.point_balance(id).await.map_err(ApiError::from_store)?;
  let ledger = store.ledger(id).await.map_err(ApiError::from_store)?;
  Ok(Json(PointsView { balance, ledger }))
}
