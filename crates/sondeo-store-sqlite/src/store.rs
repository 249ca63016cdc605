//! [`SqliteStore`] — the SQLite implementation of [`SurveyStore`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use sondeo_core::{
  Error as CoreError, eligibility,
  points::{self, LedgerEntry, PointBalance},
  respondent::{NewRespondent, Respondent},
  response::{self, Answer, NewResponse, Response},
  store::SurveyStore,
  survey::{NewSurvey, QuestionBundle, Survey},
};

use crate::{
  Error, Result,
  encode::{
    RawAnswer, RawBalance, RawLedgerEntry, RawOption, RawQuestion,
    RawRespondent, RawResponse, RawSurvey, encode_date, encode_dt,
    encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Sondeo survey store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row builders used during ingestion ──────────────────────────────────────

struct QuestionInsert {
  question_id:   String,
  question_text: String,
  question_type: &'static str,
  order_index:   i64,
  is_required:   bool,
  config:        String,
  options:       Vec<OptionInsert>,
}

struct OptionInsert {
  option_id:    String,
  option_text:  String,
  option_value: String,
  order_index:  i64,
}

/// Load every question of a survey with its options, in display order.
///
/// Runs against whatever connection (or open transaction) the caller holds.
fn load_bundles(
  conn: &rusqlite::Connection,
  survey_id_str: &str,
) -> Result<Vec<QuestionBundle>> {
  let mut stmt = conn.prepare(
    "SELECT question_id, survey_id, question_text, question_type,
            order_index, is_required, config
     FROM questions WHERE survey_id = ?1
     ORDER BY order_index",
  )?;
  let raw_questions = stmt
    .query_map(rusqlite::params![survey_id_str], |row| {
      Ok(RawQuestion {
        question_id:   row.get(0)?,
        survey_id:     row.get(1)?,
        question_text: row.get(2)?,
        question_type: row.get(3)?,
        order_index:   row.get(4)?,
        is_required:   row.get(5)?,
        config:        row.get(6)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(
    "SELECT o.option_id, o.question_id, o.option_text, o.option_value,
            o.order_index
     FROM question_options o
     JOIN questions q ON q.question_id = o.question_id
     WHERE q.survey_id = ?1
     ORDER BY o.order_index",
  )?;
  let raw_options = stmt
    .query_map(rusqlite::params![survey_id_str], |row| {
      Ok(RawOption {
        option_id:    row.get(0)?,
        question_id:  row.get(1)?,
        option_text:  row.get(2)?,
        option_value: row.get(3)?,
        order_index:  row.get(4)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut options_by_question: HashMap<Uuid, Vec<_>> = HashMap::new();
  for raw in raw_options {
    let option = raw.into_option()?;
    options_by_question
      .entry(option.question_id)
      .or_default()
      .push(option);
  }

  raw_questions
    .into_iter()
    .map(|raw| {
      let question = raw.into_question()?;
      let options = options_by_question
        .remove(&question.question_id)
        .unwrap_or_default();
      Ok(QuestionBundle { question, options })
    })
    .collect()
}

fn query_survey(
  conn: &rusqlite::Connection,
  survey_id_str: &str,
) -> Result<Option<Survey>> {
  let raw = conn
    .query_row(
      "SELECT survey_id, title, owner_id, status, points_per_question,
              bonus_points, max_responses_per_user, created_at, expires_at
       FROM surveys WHERE survey_id = ?1",
      rusqlite::params![survey_id_str],
      |row| {
        Ok(RawSurvey {
          survey_id:              row.get(0)?,
          title:                  row.get(1)?,
          owner_id:               row.get(2)?,
          status:                 row.get(3)?,
          points_per_question:    row.get(4)?,
          bonus_points:           row.get(5)?,
          max_responses_per_user: row.get(6)?,
          created_at:             row.get(7)?,
          expires_at:             row.get(8)?,
        })
      },
    )
    .optional()?;

  raw.map(RawSurvey::into_survey).transpose()
}

fn count_completed(
  conn: &rusqlite::Connection,
  respondent_id_str: &str,
  survey_id_str: &str,
) -> Result<u64> {
  Ok(conn.query_row(
    "SELECT COUNT(*) FROM responses
     WHERE respondent_id = ?1 AND survey_id = ?2 AND completed = 1",
    rusqlite::params![respondent_id_str, survey_id_str],
    |row| row.get(0),
  )?)
}

// ─── SurveyStore impl ────────────────────────────────────────────────────────

impl SurveyStore for SqliteStore {
  type Error = Error;

  // ── Surveys ───────────────────────────────────────────────────────────────

  async fn create_survey(&self, input: NewSurvey) -> Result<Survey> {
    let survey = Survey {
      survey_id:              Uuid::new_v4(),
      title:                  input.title,
      owner_id:               input.owner_id,
      status:                 input.status,
      points_per_question:    input.points_per_question,
      bonus_points:           input.bonus_points,
      max_responses_per_user: input.max_responses_per_user,
      created_at:             Utc::now(),
      expires_at:             input.expires_at,
    };

    let survey_id_str = encode_uuid(survey.survey_id);
    let title = survey.title.clone();
    let owner_id_str = survey.owner_id.map(encode_uuid);
    let status_str = encode_status(survey.status).to_owned();
    let points_per_question = survey.points_per_question;
    let bonus_points = survey.bonus_points;
    let max_responses = survey.max_responses_per_user;
    let created_at_str = encode_dt(survey.created_at);
    let expires_at_str = survey.expires_at.map(encode_dt);

    let question_rows: Vec<QuestionInsert> = input
      .questions
      .into_iter()
      .map(|q| QuestionInsert {
        question_id:   encode_uuid(Uuid::new_v4()),
        question_text: q.question_text,
        question_type: q.question_type.discriminant(),
        order_index:   q.order_index,
        is_required:   q.is_required,
        config:        q.config.to_string(),
        options:       q
          .options
          .into_iter()
          .map(|o| OptionInsert {
            option_id:    encode_uuid(Uuid::new_v4()),
            option_text:  o.option_text,
            option_value: o.option_value,
            order_index:  o.order_index,
          })
          .collect(),
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.execute(
          "INSERT INTO surveys (
             survey_id, title, owner_id, status, points_per_question,
             bonus_points, max_responses_per_user, created_at, expires_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            survey_id_str,
            title,
            owner_id_str,
            status_str,
            points_per_question,
            bonus_points,
            max_responses,
            created_at_str,
            expires_at_str,
          ],
        )?;

        for q in &question_rows {
          tx.execute(
            "INSERT INTO questions (
               question_id, survey_id, question_text, question_type,
               order_index, is_required, config
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
              q.question_id,
              survey_id_str,
              q.question_text,
              q.question_type,
              q.order_index,
              q.is_required,
              q.config,
            ],
          )?;

          for o in &q.options {
            tx.execute(
              "INSERT INTO question_options (
                 option_id, question_id, option_text, option_value, order_index
               ) VALUES (?1, ?2, ?3, ?4, ?5)",
              rusqlite::params![
                o.option_id,
                q.question_id,
                o.option_text,
                o.option_value,
                o.order_index,
              ],
            )?;
          }
        }

        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(survey)
  }

  async fn survey(&self, id: Uuid) -> Result<Option<Survey>> {
    let id_str = encode_uuid(id);
    self.conn.call(move |conn| Ok(query_survey(conn, &id_str))).await?
  }

  async fn questions(&self, survey_id: Uuid) -> Result<Vec<QuestionBundle>> {
    let id_str = encode_uuid(survey_id);
    self.conn.call(move |conn| Ok(load_bundles(conn, &id_str))).await?
  }

  // ── Respondents ───────────────────────────────────────────────────────────

  async fn add_respondent(&self, input: NewRespondent) -> Result<Respondent> {
    let respondent = Respondent {
      respondent_id: Uuid::new_v4(),
      birth_date:    input.birth_date,
      city:          input.city,
      neighborhood:  input.neighborhood,
      created_at:    Utc::now(),
    };

    let id_str = encode_uuid(respondent.respondent_id);
    let birth_str = respondent.birth_date.map(encode_date);
    let city = respondent.city.clone();
    let neighborhood = respondent.neighborhood.clone();
    let at_str = encode_dt(respondent.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO respondents (
             respondent_id, birth_date, city, neighborhood, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, birth_str, city, neighborhood, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(respondent)
  }

  async fn respondent(&self, id: Uuid) -> Result<Option<Respondent>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawRespondent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT respondent_id, birth_date, city, neighborhood, created_at
               FROM respondents WHERE respondent_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawRespondent {
                  respondent_id: row.get(0)?,
                  birth_date:    row.get(1)?,
                  city:          row.get(2)?,
                  neighborhood:  row.get(3)?,
                  created_at:    row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRespondent::into_respondent).transpose()
  }

  // ── Eligibility ───────────────────────────────────────────────────────────

  async fn can_respond(
    &self,
    respondent_id: Uuid,
    survey_id: Uuid,
  ) -> Result<bool> {
    let rid_str = encode_uuid(respondent_id);
    let sid_str = encode_uuid(survey_id);

    let row: Option<(u32, u64)> = self
      .conn
      .call(move |conn| {
        let cap: Option<u32> = conn
          .query_row(
            "SELECT max_responses_per_user FROM surveys WHERE survey_id = ?1",
            rusqlite::params![sid_str],
            |row| row.get(0),
          )
          .optional()?;

        let Some(cap) = cap else {
          return Ok(None);
        };

        let count: u64 = conn.query_row(
          "SELECT COUNT(*) FROM responses
           WHERE respondent_id = ?1 AND survey_id = ?2 AND completed = 1",
          rusqlite::params![rid_str, sid_str],
          |row| row.get(0),
        )?;

        Ok(Some((cap, count)))
      })
      .await?;

    Ok(row.is_some_and(|(cap, count)| eligibility::under_cap(cap, count)))
  }

  // ── Ingestion — the only mutating path ────────────────────────────────────

  async fn submit_response(&self, input: NewResponse) -> Result<Response> {
    let now = Utc::now();
    let survey_id = input.survey_id;
    let respondent_id = input.respondent_id;
    let completed = input.completed;
    let answers = input.answers;

    let response_id = Uuid::new_v4();
    let response_id_str = encode_uuid(response_id);
    let survey_id_str = encode_uuid(survey_id);
    let respondent_id_str = encode_uuid(respondent_id);
    let started_at_str = encode_dt(now);
    let completed_at_str = completed.then(|| encode_dt(now));

    // The closure returns the domain outcome nested inside the database
    // result, so rule rejections roll the transaction back without being
    // shoehorned into a database error.
    let points_earned: i64 = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let survey = match query_survey(&tx, &survey_id_str) {
          Ok(Some(survey)) => survey,
          Ok(None) => {
            return Ok(Err(Error::Core(CoreError::SurveyNotFound(survey_id))));
          }
          Err(e) => return Ok(Err(e)),
        };

        if !survey.is_open(now) {
          return Ok(Err(Error::Core(CoreError::SurveyInactive(survey_id))));
        }

        let respondent_exists: bool = tx
          .query_row(
            "SELECT 1 FROM respondents WHERE respondent_id = ?1",
            rusqlite::params![respondent_id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !respondent_exists {
          return Ok(Err(Error::Core(CoreError::RespondentNotFound(
            respondent_id,
          ))));
        }

        // Cap re-check under the IMMEDIATE write lock. The advisory
        // `can_respond` answer may have gone stale by now.
        let completed_count =
          match count_completed(&tx, &respondent_id_str, &survey_id_str) {
            Ok(count) => count,
            Err(e) => return Ok(Err(e)),
          };
        if !eligibility::under_cap(
          survey.max_responses_per_user,
          completed_count,
        ) {
          return Ok(Err(Error::Core(CoreError::NotEligible {
            respondent_id,
            survey_id,
          })));
        }

        let bundles = match load_bundles(&tx, &survey_id_str) {
          Ok(bundles) => bundles,
          Err(e) => return Ok(Err(e)),
        };
        let by_id: HashMap<Uuid, &QuestionBundle> = bundles
          .iter()
          .map(|bundle| (bundle.question.question_id, bundle))
          .collect();

        for answer in &answers {
          let Some(bundle) = by_id.get(&answer.question_id) else {
            return Ok(Err(Error::Core(CoreError::QuestionNotFound(
              answer.question_id,
            ))));
          };
          if let Err(e) = response::validate_answer(answer, bundle) {
            return Ok(Err(Error::Core(e)));
          }
        }

        // Base points accrue per answered question even on an incomplete
        // submission; the completion bonus, the ledger entry, and the
        // balance update wait until the submission is completed.
        let required =
          bundles.iter().filter(|b| b.question.is_required).count();
        let points =
          points::earned_points(answers.len(), required, completed, &survey);

        tx.execute(
          "INSERT INTO responses (
             response_id, survey_id, respondent_id, completed,
             points_earned, started_at, completed_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            response_id_str,
            survey_id_str,
            respondent_id_str,
            completed,
            points,
            started_at_str,
            completed_at_str,
          ],
        )?;

        for answer in &answers {
          let payload = match answer.value.to_json() {
            Ok(value) => value.to_string(),
            Err(e) => return Ok(Err(Error::Core(e))),
          };
          tx.execute(
            "INSERT INTO answers (
               answer_id, response_id, question_id, answer_type, payload_json
             ) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
              encode_uuid(Uuid::new_v4()),
              response_id_str,
              encode_uuid(answer.question_id),
              answer.value.discriminant(),
              payload,
            ],
          )?;
        }

        if completed {
          let description = format!("completed survey \"{}\"", survey.title);
          tx.execute(
            "INSERT INTO point_ledger (
               entry_id, respondent_id, kind, amount, description,
               response_id, created_at
             ) VALUES (?1, ?2, 'earned', ?3, ?4, ?5, ?6)",
            rusqlite::params![
              encode_uuid(Uuid::new_v4()),
              respondent_id_str,
              points,
              description,
              response_id_str,
              started_at_str,
            ],
          )?;

          tx.execute(
            "INSERT INTO point_balances (
               respondent_id, total_points, available_points,
               redeemed_points, updated_at
             ) VALUES (?1, ?2, ?2, 0, ?3)
             ON CONFLICT(respondent_id) DO UPDATE SET
               total_points     = total_points + excluded.total_points,
               available_points = available_points + excluded.available_points,
               updated_at       = excluded.updated_at",
            rusqlite::params![respondent_id_str, points, started_at_str],
          )?;
        }

        tx.commit()?;
        Ok(Ok(points))
      })
      .await??;

    Ok(Response {
      response_id,
      survey_id,
      respondent_id,
      completed,
      points_earned,
      started_at: now,
      completed_at: completed.then_some(now),
    })
  }

  // ── Aggregation reads ─────────────────────────────────────────────────────

  async fn completed_responses(
    &self,
    survey_id: Uuid,
  ) -> Result<Vec<(Response, Respondent)>> {
    let id_str = encode_uuid(survey_id);

    let raws: Vec<(RawResponse, RawRespondent)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             r.response_id, r.survey_id, r.respondent_id, r.completed,
             r.points_earned, r.started_at, r.completed_at,
             p.respondent_id, p.birth_date, p.city, p.neighborhood,
             p.created_at
           FROM responses r
           JOIN respondents p ON p.respondent_id = r.respondent_id
           WHERE r.survey_id = ?1 AND r.completed = 1
           ORDER BY r.started_at",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok((
              RawResponse {
                response_id:   row.get(0)?,
                survey_id:     row.get(1)?,
                respondent_id: row.get(2)?,
                completed:     row.get(3)?,
                points_earned: row.get(4)?,
                started_at:    row.get(5)?,
                completed_at:  row.get(6)?,
              },
              RawRespondent {
                respondent_id: row.get(7)?,
                birth_date:    row.get(8)?,
                city:          row.get(9)?,
                neighborhood:  row.get(10)?,
                created_at:    row.get(11)?,
              },
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(response, respondent)| {
        Ok((response.into_response()?, respondent.into_respondent()?))
      })
      .collect()
  }

  async fn completed_answers(&self, survey_id: Uuid) -> Result<Vec<Answer>> {
    let id_str = encode_uuid(survey_id);

    let raws: Vec<RawAnswer> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT a.answer_id, a.response_id, a.question_id, a.answer_type,
                  a.payload_json
           FROM answers a
           JOIN responses r ON r.response_id = a.response_id
           WHERE r.survey_id = ?1 AND r.completed = 1",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawAnswer {
              answer_id:    row.get(0)?,
              response_id:  row.get(1)?,
              question_id:  row.get(2)?,
              answer_type:  row.get(3)?,
              payload_json: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAnswer::into_answer).collect()
  }

  // ── Points ────────────────────────────────────────────────────────────────

  async fn point_balance(
    &self,
    respondent_id: Uuid,
  ) -> Result<Option<PointBalance>> {
    let id_str = encode_uuid(respondent_id);

    let raw: Option<RawBalance> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT respondent_id, total_points, available_points,
                      redeemed_points, updated_at
               FROM point_balances WHERE respondent_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawBalance {
                  respondent_id:    row.get(0)?,
                  total_points:     row.get(1)?,
                  available_points: row.get(2)?,
                  redeemed_points:  row.get(3)?,
                  updated_at:       row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBalance::into_balance).transpose()
  }

  async fn ledger(&self, respondent_id: Uuid) -> Result<Vec<LedgerEntry>> {
    let id_str = encode_uuid(respondent_id);

    let raws: Vec<RawLedgerEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT entry_id, respondent_id, kind, amount, description,
                  response_id, created_at
           FROM point_ledger WHERE respondent_id = ?1
           ORDER BY created_at",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawLedgerEntry {
              entry_id:      row.get(0)?,
              respondent_id: row.get(1)?,
              kind:          row.get(2)?,
              amount:        row.get(3)?,
              description:   row.get(4)?,
              response_id:   row.get(5)?,
              created_at:    row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLedgerEntry::into_entry).collect()
  }
}
