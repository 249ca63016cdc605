//! JSON REST API for the Sondeo survey platform.
//!
//! Exposes an axum [`Router`] backed by any
//! [`sondeo_core::store::SurveyStore`]. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", sondeo_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod hash;
pub mod respondents;
pub mod responses;
pub mod surveys;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use sondeo_core::store::SurveyStore;

pub use error::ApiError;


// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: SurveyStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Surveys
    .route("/surveys", post(surveys::create::<S>))
    .route("/surveys/{id}", get(surveys::get_one::<S>))
    .route("/surveys/{id}/results", get(surveys::results::<S>))
    .route(
      "/surveys/{id}/can-respond/{respondent_id}",
      get(surveys::can_respond::<S>),
    )
    // Responses
    .route("/surveys/{id}/responses", post(responses::submit::<S>))
    // Respondents
    .route("/respondents", post(respondents::create::<S>))
    .route("/respondents/{id}", get(respondents::get_one::<S>))
    .route("/respondents/{id}/points", get(respondents::points::<S>))
    .with_state(store)
}
