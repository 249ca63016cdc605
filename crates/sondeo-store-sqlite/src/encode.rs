//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings and dates as ISO 8601
//! `YYYY-MM-DD`. Question configs and answer payloads are stored as compact
//! JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use sondeo_core::{
  points::{LedgerEntry, LedgerKind, PointBalance},
  respondent::Respondent,
  response::{Answer, AnswerValue, Response},
  survey::{Question, QuestionOption, QuestionType, Survey, SurveyStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── SurveyStatus ────────────────────────────────────────────────────────────

pub fn encode_status(status: SurveyStatus) -> &'static str {
  match status {
    SurveyStatus::Active => "active",
    SurveyStatus::Inactive => "inactive",
    SurveyStatus::Archived => "archived",
  }
}

pub fn decode_status(s: &str) -> Result<SurveyStatus> {
  match s {
    "active" => Ok(SurveyStatus::Active),
    "inactive" => Ok(SurveyStatus::Inactive),
    "archived" => Ok(SurveyStatus::Archived),
    other => Err(Error::DateParse(format!("unknown survey status: {other:?}"))),
  }
}

// ─── QuestionType ────────────────────────────────────────────────────────────

pub fn decode_question_type(s: &str) -> Result<QuestionType> {
  match s {
    "single_choice" => Ok(QuestionType::SingleChoice),
    "multiple_choice" => Ok(QuestionType::MultipleChoice),
    "percentage_distribution" => Ok(QuestionType::PercentageDistribution),
    "rating" => Ok(QuestionType::Rating),
    "open_text" => Ok(QuestionType::OpenText),
    other => Err(Error::DateParse(format!("unknown question type: {other:?}"))),
  }
}

// ─── LedgerKind ──────────────────────────────────────────────────────────────

pub fn decode_ledger_kind(s: &str) -> Result<LedgerKind> {
  match s {
    "earned" => Ok(LedgerKind::Earned),
    "redeemed" => Ok(LedgerKind::Redeemed),
    "expired" => Ok(LedgerKind::Expired),
    other => Err(Error::DateParse(format!("unknown ledger kind: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `surveys` row.
pub struct RawSurvey {
  pub survey_id:              String,
  pub title:                  String,
  pub owner_id:               Option<String>,
  pub status:                 String,
  pub points_per_question:    i64,
  pub bonus_points:           i64,
  pub max_responses_per_user: u32,
  pub created_at:             String,
  pub expires_at:             Option<String>,
}

impl RawSurvey {
  pub fn into_survey(self) -> Result<Survey> {
    Ok(Survey {
      survey_id:              decode_uuid(&self.survey_id)?,
      title:                  self.title,
      owner_id:               self
        .owner_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      status:                 decode_status(&self.status)?,
      points_per_question:    self.points_per_question,
      bonus_points:           self.bonus_points,
      max_responses_per_user: self.max_responses_per_user,
      created_at:             decode_dt(&self.created_at)?,
      expires_at:             self
        .expires_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
    })
  }
}

/// Raw strings read directly from a `questions` row.
pub struct RawQuestion {
  pub question_id:   String,
  pub survey_id:     String,
  pub question_text: String,
  pub question_type: String,
  pub order_index:   i64,
  pub is_required:   bool,
  pub config:        String,
}

impl RawQuestion {
  pub fn into_question(self) -> Result<Question> {
    Ok(Question {
      question_id:   decode_uuid(&self.question_id)?,
      survey_id:     decode_uuid(&self.survey_id)?,
      question_text: self.question_text,
      question_type: decode_question_type(&self.question_type)?,
      order_index:   self.order_index,
      is_required:   self.is_required,
      config:        serde_json::from_str(&self.config)?,
    })
  }
}

/// Raw strings read directly from a `question_options` row.
pub struct RawOption {
  pub option_id:    String,
  pub question_id:  String,
  pub option_text:  String,
  pub option_value: String,
  pub order_index:  i64,
}

impl RawOption {
  pub fn into_option(self) -> Result<QuestionOption> {
    Ok(QuestionOption {
      option_id:    decode_uuid(&self.option_id)?,
      question_id:  decode_uuid(&self.question_id)?,
      option_text:  self.option_text,
      option_value: self.option_value,
      order_index:  self.order_index,
    })
  }
}

/// Raw strings read directly from a `respondents` row.
pub struct RawRespondent {
  pub respondent_id: String,
  pub birth_date:    Option<String>,
  pub city:          Option<String>,
  pub neighborhood:  Option<String>,
  pub created_at:    String,
}

impl RawRespondent {
  pub fn into_respondent(self) -> Result<Respondent> {
    Ok(Respondent {
      respondent_id: decode_uuid(&self.respondent_id)?,
      birth_date:    self
        .birth_date
        .as_deref()
        .map(decode_date)
        .transpose()?,
      city:          self.city,
      neighborhood:  self.neighborhood,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `responses` row.
pub struct RawResponse {
  pub response_id:   String,
  pub survey_id:     String,
  pub respondent_id: String,
  pub completed:     bool,
  pub points_earned: i64,
  pub started_at:    String,
  pub completed_at:  Option<String>,
}

impl RawResponse {
  pub fn into_response(self) -> Result<Response> {
    Ok(Response {
      response_id:   decode_uuid(&self.response_id)?,
      survey_id:     decode_uuid(&self.survey_id)?,
      respondent_id: decode_uuid(&self.respondent_id)?,
      completed:     self.completed,
      points_earned: self.points_earned,
      started_at:    decode_dt(&self.started_at)?,
      completed_at:  self
        .completed_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
    })
  }
}

/// Raw strings read directly from an `answers` row.
pub struct RawAnswer {
  pub answer_id:    String,
  pub response_id:  String,
  pub question_id:  String,
  pub answer_type:  String,
  pub payload_json: String,
}

impl RawAnswer {
  pub fn into_answer(self) -> Result<Answer> {
    let payload: serde_json::Value = serde_json::from_str(&self.payload_json)?;
    let value = AnswerValue::from_parts(&self.answer_type, payload)
      .map_err(Error::Core)?;

    Ok(Answer {
      answer_id:   decode_uuid(&self.answer_id)?,
      response_id: decode_uuid(&self.response_id)?,
      question_id: decode_uuid(&self.question_id)?,
      value,
    })
  }
}

/// Raw strings read directly from a `point_balances` row.
pub struct RawBalance {
  pub respondent_id:    String,
  pub total_points:     i64,
  pub available_points: i64,
  pub redeemed_points:  i64,
  pub updated_at:       String,
}

impl RawBalance {
  pub fn into_balance(self) -> Result<PointBalance> {
    Ok(PointBalance {
      respondent_id:    decode_uuid(&self.respondent_id)?,
      total_points:     self.total_points,
      available_points: self.available_points,
      redeemed_points:  self.redeemed_points,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `point_ledger` row.
pub struct RawLedgerEntry {
  pub entry_id:      String,
  pub respondent_id: String,
  pub kind:          String,
  pub amount:        i64,
  pub description:   Option<String>,
  pub response_id:   Option<String>,
  pub created_at:    String,
}

impl RawLedgerEntry {
  pub fn into_entry(self) -> Result<LedgerEntry> {
    Ok(LedgerEntry {
      entry_id:      decode_uuid(&self.entry_id)?,
      respondent_id: decode_uuid(&self.respondent_id)?,
      kind:          decode_ledger_kind(&self.kind)?,
      amount:        self.amount,
      description:   self.description,
      response_id:   self
        .response_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
