//! Point balances, the append-only point ledger, and the reward formula.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::survey::Survey;

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// The kind of a ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
  Earned,
  Redeemed,
  Expired,
}

impl LedgerKind {
  /// The discriminant string stored in the `kind` column.
  pub fn discriminant(self) -> &'static str {
    match self {
      Self::Earned => "earned",
      Self::Redeemed => "redeemed",
      Self::Expired => "expired",
    }
  }
}

/// One immutable movement in a respondent's point history. Ledger rows are
/// append-only and never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
  pub entry_id:      Uuid,
  pub respondent_id: Uuid,
  pub kind:          LedgerKind,
  pub amount:        i64,
  pub description:   Option<String>,
  /// The response that produced this movement, for `earned` entries.
  pub response_id:   Option<Uuid>,
  pub created_at:    DateTime<Utc>,
}

// ─── Balance ─────────────────────────────────────────────────────────────────

/// A respondent's current point totals, maintained by the store alongside the
/// ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointBalance {
  pub respondent_id:    Uuid,
  pub total_points:     i64,
  pub available_points: i64,
  pub redeemed_points:  i64,
  pub updated_at:       DateTime<Utc>,
}

// ─── Reward formula ──────────────────────────────────────────────────────────

/// Points earned by one submission: one reward per answered question, plus
/// the completion bonus when the submission is completed and covers at least
/// every required question.
pub fn earned_points(
  answered: usize,
  required: usize,
  completed: bool,
  survey: &Survey,
) -> i64 {
  let mut points = answered as i64 * survey.points_per_question;
  if completed && answered >= required {
    points += survey.bonus_points;
  }
  points
}
