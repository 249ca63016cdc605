//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, NaiveDate, Utc};
use sondeo_core::{
  Error as CoreError,
  points::LedgerKind,
  respondent::NewRespondent,
  response::{AnswerValue, NewAnswer, NewResponse},
  results::{self, ResultsSnapshot},
  store::SurveyStore,
  survey::{
    NewQuestion, NewQuestionOption, NewSurvey, QuestionType, SurveyStatus,
  },
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn option(value: &str, text: &str, order_index: i64) -> NewQuestionOption {
  NewQuestionOption {
    option_text: text.into(),
    option_value: value.into(),
    order_index,
  }
}

/// One single-choice question ("plazas" / "veredas"), 10 points per answer,
/// 50 bonus points.
fn survey_input(cap: u32) -> NewSurvey {
  NewSurvey {
    title:                  "Prioridades del barrio".into(),
    owner_id:               None,
    status:                 SurveyStatus::Active,
    points_per_question:    10,
    bonus_points:           50,
    max_responses_per_user: cap,
    expires_at:             None,
    questions:              vec![NewQuestion {
      question_text: "¿Qué mejorarías primero?".into(),
      question_type: QuestionType::SingleChoice,
      order_index:   0,
      is_required:   true,
      config:        serde_json::json!({}),
      options:       vec![
        option("plazas", "Mejorar plazas", 0),
        option("veredas", "Mejorar veredas", 1),
      ],
    }],
  }
}

fn respondent_input() -> NewRespondent {
  NewRespondent {
    birth_date:   NaiveDate::from_ymd_opt(1995, 4, 12),
    city:         Some("Rosario".into()),
    neighborhood: Some("Centro".into()),
  }
}

fn choice(question_id: Uuid, option_id: Uuid) -> NewAnswer {
  NewAnswer {
    question_id,
    value: AnswerValue::SingleChoice(option_id),
  }
}

// ─── Surveys ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_survey_and_fetch() {
  let s = store().await;

  let survey = s.create_survey(survey_input(1)).await.unwrap();
  assert_eq!(survey.title, "Prioridades del barrio");
  assert_eq!(survey.max_responses_per_user, 1);

  let fetched = s.survey(survey.survey_id).await.unwrap().unwrap();
  assert_eq!(fetched.survey_id, survey.survey_id);
  assert_eq!(fetched.points_per_question, 10);
  assert_eq!(fetched.bonus_points, 50);
  assert_eq!(fetched.status, SurveyStatus::Active);

  let bundles = s.questions(survey.survey_id).await.unwrap();
  assert_eq!(bundles.len(), 1);
  assert_eq!(bundles[0].question.question_type, QuestionType::SingleChoice);
  assert_eq!(bundles[0].options.len(), 2);
  assert_eq!(bundles[0].options[0].option_value, "plazas");
  assert_eq!(bundles[0].options[1].option_value, "veredas");
}

#[tokio::test]
async fn survey_missing_returns_none() {
  let s = store().await;
  assert!(s.survey(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.questions(Uuid::new_v4()).await.unwrap().is_empty());
}

// ─── Respondents ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_respondent() {
  let s = store().await;

  let respondent = s.add_respondent(respondent_input()).await.unwrap();
  let fetched = s
    .respondent(respondent.respondent_id)
    .await
    .unwrap()
    .unwrap();

  assert_eq!(fetched.respondent_id, respondent.respondent_id);
  assert_eq!(fetched.birth_date, NaiveDate::from_ymd_opt(1995, 4, 12));
  assert_eq!(fetched.city.as_deref(), Some("Rosario"));
  assert_eq!(fetched.neighborhood.as_deref(), Some("Centro"));
}

#[tokio::test]
async fn respondent_missing_returns_none() {
  let s = store().await;
  assert!(s.respondent(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Ingestion and points ────────────────────────────────────────────────────

#[tokio::test]
async fn completed_submission_awards_points_atomically() {
  let s = store().await;
  let survey = s.create_survey(survey_input(1)).await.unwrap();
  let person = s.add_respondent(respondent_input()).await.unwrap();
  let bundle = &s.questions(survey.survey_id).await.unwrap()[0];

  let response = s
    .submit_response(NewResponse {
      survey_id:     survey.survey_id,
      respondent_id: person.respondent_id,
      completed:     true,
      answers:       vec![choice(
        bundle.question.question_id,
        bundle.options[0].option_id,
      )],
    })
    .await
    .unwrap();

  // 1 answer * 10 + 50 completion bonus.
  assert!(response.completed);
  assert_eq!(response.points_earned, 60);
  assert!(response.completed_at.is_some());

  let balance = s
    .point_balance(person.respondent_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(balance.total_points, 60);
  assert_eq!(balance.available_points, 60);
  assert_eq!(balance.redeemed_points, 0);

  let ledger = s.ledger(person.respondent_id).await.unwrap();
  assert_eq!(ledger.len(), 1);
  assert_eq!(ledger[0].kind, LedgerKind::Earned);
  assert_eq!(ledger[0].amount, 60);
  assert_eq!(ledger[0].response_id, Some(response.response_id));
}

#[tokio::test]
async fn incomplete_submission_accrues_base_points_but_no_credit() {
  let s = store().await;
  let survey = s.create_survey(survey_input(1)).await.unwrap();
  let person = s.add_respondent(respondent_input()).await.unwrap();
  let bundle = &s.questions(survey.survey_id).await.unwrap()[0];

  let response = s
    .submit_response(NewResponse {
      survey_id:     survey.survey_id,
      respondent_id: person.respondent_id,
      completed:     false,
      answers:       vec![choice(
        bundle.question.question_id,
        bundle.options[0].option_id,
      )],
    })
    .await
    .unwrap();

  // 1 answer * 10, no completion bonus. The base points are recorded on the
  // response row, but nothing is credited until the submission completes.
  assert_eq!(response.points_earned, 10);
  assert!(response.completed_at.is_none());
  assert!(s.point_balance(person.respondent_id).await.unwrap().is_none());
  assert!(s.ledger(person.respondent_id).await.unwrap().is_empty());

  // In-progress responses never reach the aggregation reads.
  assert!(s.completed_responses(survey.survey_id).await.unwrap().is_empty());
  assert!(s.completed_answers(survey.survey_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn zero_point_surveys_still_record_completion_in_the_ledger() {
  let s = store().await;
  let mut input = survey_input(1);
  input.points_per_question = 0;
  input.bonus_points = 0;
  let survey = s.create_survey(input).await.unwrap();
  let person = s.add_respondent(respondent_input()).await.unwrap();
  let bundle = &s.questions(survey.survey_id).await.unwrap()[0];

  let response = s
    .submit_response(NewResponse {
      survey_id:     survey.survey_id,
      respondent_id: person.respondent_id,
      completed:     true,
      answers:       vec![choice(
        bundle.question.question_id,
        bundle.options[0].option_id,
      )],
    })
    .await
    .unwrap();

  assert_eq!(response.points_earned, 0);

  let ledger = s.ledger(person.respondent_id).await.unwrap();
  assert_eq!(ledger.len(), 1);
  assert_eq!(ledger[0].kind, LedgerKind::Earned);
  assert_eq!(ledger[0].amount, 0);
  assert_eq!(ledger[0].response_id, Some(response.response_id));

  let balance = s
    .point_balance(person.respondent_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(balance.total_points, 0);
}

#[tokio::test]
async fn balances_accumulate_across_surveys() {
  let s = store().await;
  let first = s.create_survey(survey_input(0)).await.unwrap();
  let second = s.create_survey(survey_input(0)).await.unwrap();
  let person = s.add_respondent(respondent_input()).await.unwrap();

  for survey_id in [first.survey_id, second.survey_id] {
    let bundle = &s.questions(survey_id).await.unwrap()[0];
    s.submit_response(NewResponse {
      survey_id,
      respondent_id: person.respondent_id,
      completed: true,
      answers: vec![choice(
        bundle.question.question_id,
        bundle.options[0].option_id,
      )],
    })
    .await
    .unwrap();
  }

  let balance = s
    .point_balance(person.respondent_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(balance.total_points, 120);

  let ledger = s.ledger(person.respondent_id).await.unwrap();
  assert_eq!(ledger.len(), 2);
}

// ─── Eligibility ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn response_cap_is_enforced_inside_the_transaction() {
  let s = store().await;
  let survey = s.create_survey(survey_input(1)).await.unwrap();
  let person = s.add_respondent(respondent_input()).await.unwrap();
  let bundle = s.questions(survey.survey_id).await.unwrap().remove(0);

  assert!(
    s.can_respond(person.respondent_id, survey.survey_id)
      .await
      .unwrap()
  );

  let submission = NewResponse {
    survey_id:     survey.survey_id,
    respondent_id: person.respondent_id,
    completed:     true,
    answers:       vec![choice(
      bundle.question.question_id,
      bundle.options[0].option_id,
    )],
  };

  s.submit_response(submission.clone()).await.unwrap();

  assert!(
    !s.can_respond(person.respondent_id, survey.survey_id)
      .await
      .unwrap()
  );

  let err = s.submit_response(submission).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::NotEligible { .. })));

  // The rejected submission left no trace: no second response, no second
  // ledger entry, the balance unchanged.
  assert_eq!(s.completed_responses(survey.survey_id).await.unwrap().len(), 1);
  assert_eq!(s.ledger(person.respondent_id).await.unwrap().len(), 1);
  let balance = s
    .point_balance(person.respondent_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(balance.total_points, 60);
}

#[tokio::test]
async fn zero_cap_means_unlimited() {
  let s = store().await;
  let survey = s.create_survey(survey_input(0)).await.unwrap();
  let person = s.add_respondent(respondent_input()).await.unwrap();
  let bundle = s.questions(survey.survey_id).await.unwrap().remove(0);

  for _ in 0..3 {
    s.submit_response(NewResponse {
      survey_id:     survey.survey_id,
      respondent_id: person.respondent_id,
      completed:     true,
      answers:       vec![choice(
        bundle.question.question_id,
        bundle.options[0].option_id,
      )],
    })
    .await
    .unwrap();
  }

  assert!(
    s.can_respond(person.respondent_id, survey.survey_id)
      .await
      .unwrap()
  );
  assert_eq!(s.completed_responses(survey.survey_id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn can_respond_is_false_for_unknown_survey() {
  let s = store().await;
  let person = s.add_respondent(respondent_input()).await.unwrap();
  assert!(
    !s.can_respond(person.respondent_id, Uuid::new_v4())
      .await
      .unwrap()
  );
}

// ─── Rejections ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn closed_surveys_reject_submissions() {
  let s = store().await;
  let person = s.add_respondent(respondent_input()).await.unwrap();

  let mut inactive = survey_input(0);
  inactive.status = SurveyStatus::Inactive;
  let inactive = s.create_survey(inactive).await.unwrap();

  let mut expired = survey_input(0);
  expired.expires_at = Some(Utc::now() - Duration::days(1));
  let expired = s.create_survey(expired).await.unwrap();

  for survey in [&inactive, &expired] {
    let bundle = s.questions(survey.survey_id).await.unwrap().remove(0);
    let err = s
      .submit_response(NewResponse {
        survey_id:     survey.survey_id,
        respondent_id: person.respondent_id,
        completed:     true,
        answers:       vec![choice(
          bundle.question.question_id,
          bundle.options[0].option_id,
        )],
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Core(CoreError::SurveyInactive(_))));
  }
}

#[tokio::test]
async fn unknown_ids_are_rejected() {
  let s = store().await;
  let survey = s.create_survey(survey_input(0)).await.unwrap();
  let person = s.add_respondent(respondent_input()).await.unwrap();
  let bundle = s.questions(survey.survey_id).await.unwrap().remove(0);

  let err = s
    .submit_response(NewResponse {
      survey_id:     Uuid::new_v4(),
      respondent_id: person.respondent_id,
      completed:     true,
      answers:       vec![],
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::SurveyNotFound(_))));

  let err = s
    .submit_response(NewResponse {
      survey_id:     survey.survey_id,
      respondent_id: Uuid::new_v4(),
      completed:     true,
      answers:       vec![],
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::RespondentNotFound(_))));

  let err = s
    .submit_response(NewResponse {
      survey_id:     survey.survey_id,
      respondent_id: person.respondent_id,
      completed:     true,
      answers:       vec![choice(Uuid::new_v4(), bundle.options[0].option_id)],
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::QuestionNotFound(_))));
}

#[tokio::test]
async fn invalid_answer_rolls_back_the_whole_submission() {
  let s = store().await;
  let survey = s.create_survey(survey_input(0)).await.unwrap();
  let person = s.add_respondent(respondent_input()).await.unwrap();
  let bundle = s.questions(survey.survey_id).await.unwrap().remove(0);

  // The second answer references an option of a different question.
  let err = s
    .submit_response(NewResponse {
      survey_id:     survey.survey_id,
      respondent_id: person.respondent_id,
      completed:     true,
      answers:       vec![
        choice(bundle.question.question_id, bundle.options[0].option_id),
        choice(bundle.question.question_id, Uuid::new_v4()),
      ],
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::InvalidAnswer { .. })));

  assert!(s.completed_responses(survey.survey_id).await.unwrap().is_empty());
  assert!(s.completed_answers(survey.survey_id).await.unwrap().is_empty());
  assert!(s.point_balance(person.respondent_id).await.unwrap().is_none());
}

// ─── Aggregation reads ───────────────────────────────────────────────────────

#[tokio::test]
async fn stored_submissions_feed_the_results_engine() {
  let s = store().await;
  let survey = s.create_survey(survey_input(0)).await.unwrap();
  let bundle = s.questions(survey.survey_id).await.unwrap().remove(0);

  for option_index in [0, 0, 1] {
    let person = s.add_respondent(respondent_input()).await.unwrap();
    s.submit_response(NewResponse {
      survey_id:     survey.survey_id,
      respondent_id: person.respondent_id,
      completed:     true,
      answers:       vec![choice(
        bundle.question.question_id,
        bundle.options[option_index].option_id,
      )],
    })
    .await
    .unwrap();
  }

  let responses = s.completed_responses(survey.survey_id).await.unwrap();
  let answers = s.completed_answers(survey.survey_id).await.unwrap();
  assert_eq!(responses.len(), 3);
  assert_eq!(answers.len(), 3);

  let results = results::compute(
    &ResultsSnapshot {
      survey,
      questions: vec![bundle],
      responses,
      answers,
    },
    Utc::now(),
  );

  assert_eq!(results.total_responses, 3);
  assert_eq!(results.monthly_responses, 3);
  let summary = &results.questions_summary[0];
  assert_eq!(summary.total_answers, 3);
  match &summary.results {
    sondeo_core::results::QuestionResults::Votes(votes) => {
      assert_eq!(votes["plazas"].votes, 2);
      assert_eq!(votes["plazas"].percentage, 66.7);
      assert_eq!(votes["veredas"].votes, 1);
      assert_eq!(votes["veredas"].percentage, 33.3);
    }
    other => panic!("expected vote results, got {other:?}"),
  }
}
