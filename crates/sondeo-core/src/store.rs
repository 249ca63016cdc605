//! The `SurveyStore` trait — the persistence boundary of the platform.
//!
//! The trait is implemented by storage backends (e.g. `sondeo-store-sqlite`).
//! Higher layers (`sondeo-api`) depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  points::{LedgerEntry, PointBalance},
  respondent::{NewRespondent, Respondent},
  response::{Answer, NewResponse, Response},
  survey::{NewSurvey, QuestionBundle, Survey},
};

/// Abstraction over a Sondeo storage backend.
///
/// Responses, answers, and ledger rows are append-only. The only mutating
/// path is [`SurveyStore::submit_response`], which must persist the response,
/// its answers, the ledger entry, and the balance update as one atomic unit,
/// and must re-check the response cap under the same transaction so that two
/// concurrent submissions can never both slip under the cap.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SurveyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Surveys ───────────────────────────────────────────────────────────

  /// Create and persist a survey with its questions and options.
  fn create_survey(
    &self,
    input: NewSurvey,
  ) -> impl Future<Output = Result<Survey, Self::Error>> + Send + '_;

  /// Retrieve a survey by id. Returns `None` if not found.
  fn survey(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Survey>, Self::Error>> + Send + '_;

  /// All questions of a survey with their options, ordered by sequence
  /// index.
  fn questions(
    &self,
    survey_id: Uuid,
  ) -> impl Future<Output = Result<Vec<QuestionBundle>, Self::Error>> + Send + '_;

  // ── Respondents ───────────────────────────────────────────────────────

  /// Create and persist a respondent.
  fn add_respondent(
    &self,
    input: NewRespondent,
  ) -> impl Future<Output = Result<Respondent, Self::Error>> + Send + '_;

  /// Retrieve a respondent by id. Returns `None` if not found.
  fn respondent(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Respondent>, Self::Error>> + Send + '_;

  // ── Eligibility ───────────────────────────────────────────────────────

  /// Whether the respondent may submit another response to the survey.
  ///
  /// `false` when the survey does not exist or the respondent's completed
  /// responses have reached the survey's cap. Advisory only: ingestion
  /// re-validates inside its own transaction.
  fn can_respond(
    &self,
    respondent_id: Uuid,
    survey_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Ingestion — the only mutating path ────────────────────────────────

  /// Validate and persist one submission: the response row, its answers,
  /// and — for completed submissions — the earned-points ledger entry and
  /// balance update, all as a single transaction.
  fn submit_response(
    &self,
    input: NewResponse,
  ) -> impl Future<Output = Result<Response, Self::Error>> + Send + '_;

  // ── Aggregation reads ─────────────────────────────────────────────────

  /// All `completed == true` responses for a survey, joined with their
  /// respondents.
  fn completed_responses(
    &self,
    survey_id: Uuid,
  ) -> impl Future<Output = Result<Vec<(Response, Respondent)>, Self::Error>> + Send + '_;

  /// All answers belonging to the survey's completed responses.
  fn completed_answers(
    &self,
    survey_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Answer>, Self::Error>> + Send + '_;

  // ── Points ────────────────────────────────────────────────────────────

  /// The respondent's current balance; `None` if no points were ever
  /// recorded.
  fn point_balance(
    &self,
    respondent_id: Uuid,
  ) -> impl Future<Output = Result<Option<PointBalance>, Self::Error>> + Send + '_;

  /// The respondent's full ledger, oldest first.
  fn ledger(
    &self,
    respondent_id: Uuid,
  ) -> impl Future<Output = Result<Vec<LedgerEntry>, Self::Error>> + Send + '_;
}
