//! Respondent — a citizen account that submits survey responses.
//!
//! Only the demographic fields needed by the aggregation engine live here.
//! Authentication and account resolution happen outside the core; the core
//! only ever sees a respondent id.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A citizen respondent. All demographic fields are optional; missing values
/// route to the "Sin especificar" bucket during classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Respondent {
  pub respondent_id: Uuid,
  pub birth_date:    Option<NaiveDate>,
  pub city:          Option<String>,
  pub neighborhood:  Option<String>,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::SurveyStore::add_respondent`].
#[derive(Debug, Clone, Default)]
pub struct NewRespondent {
  pub birth_date:   Option<NaiveDate>,
  pub city:         Option<String>,
  pub neighborhood: Option<String>,
}
