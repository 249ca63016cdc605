//! SQL schema for the Sondeo SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS surveys (
    survey_id              TEXT PRIMARY KEY,
    title                  TEXT NOT NULL,
    owner_id               TEXT,
    status                 TEXT NOT NULL,   -- 'active' | 'inactive' | 'archived'
    points_per_question    INTEGER NOT NULL DEFAULT 0,
    bonus_points           INTEGER NOT NULL DEFAULT 0,
    max_responses_per_user INTEGER NOT NULL DEFAULT 1,  -- 0 = unlimited
    created_at             TEXT NOT NULL,   -- ISO 8601 UTC
    expires_at             TEXT
);

CREATE TABLE IF NOT EXISTS questions (
    question_id   TEXT PRIMARY KEY,
    survey_id     TEXT NOT NULL REFERENCES surveys(survey_id),
    question_text TEXT NOT NULL,
    question_type TEXT NOT NULL,   -- discriminant of QuestionType
    order_index   INTEGER NOT NULL,
    is_required   INTEGER NOT NULL DEFAULT 1,
    config        TEXT NOT NULL DEFAULT '{}',
    UNIQUE (survey_id, order_index)
);

CREATE TABLE IF NOT EXISTS question_options (
    option_id    TEXT PRIMARY KEY,
    question_id  TEXT NOT NULL REFERENCES questions(question_id),
    option_text  TEXT NOT NULL,
    option_value TEXT NOT NULL,   -- stable aggregation key
    order_index  INTEGER NOT NULL,
    UNIQUE (question_id, option_value)
);

CREATE TABLE IF NOT EXISTS respondents (
    respondent_id TEXT PRIMARY KEY,
    birth_date    TEXT,            -- ISO 8601 date
    city          TEXT,
    neighborhood  TEXT,
    created_at    TEXT NOT NULL
);

-- Responses and answers are strictly append-only.
-- No UPDATE or DELETE is ever issued against these tables.
CREATE TABLE IF NOT EXISTS responses (
    response_id   TEXT PRIMARY KEY,
    survey_id     TEXT NOT NULL REFERENCES surveys(survey_id),
    respondent_id TEXT NOT NULL REFERENCES respondents(respondent_id),
    completed     INTEGER NOT NULL DEFAULT 0,
    points_earned INTEGER NOT NULL DEFAULT 0,
    started_at    TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    completed_at  TEXT
);

CREATE TABLE IF NOT EXISTS answers (
    answer_id    TEXT PRIMARY KEY,
    response_id  TEXT NOT NULL REFERENCES responses(response_id),
    question_id  TEXT NOT NULL REFERENCES questions(question_id),
    answer_type  TEXT NOT NULL,   -- discriminant of AnswerValue variant
    payload_json TEXT NOT NULL    -- JSON payload (inner data only)
);

-- The ledger is the source of truth; balances are a maintained summary.
CREATE TABLE IF NOT EXISTS point_ledger (
    entry_id      TEXT PRIMARY KEY,
    respondent_id TEXT NOT NULL REFERENCES respondents(respondent_id),
    kind          TEXT NOT NULL,   -- 'earned' | 'redeemed' | 'expired'
    amount        INTEGER NOT NULL,
    description   TEXT,
    response_id   TEXT REFERENCES responses(response_id),
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS point_balances (
    respondent_id    TEXT PRIMARY KEY REFERENCES respondents(respondent_id),
    total_points     INTEGER NOT NULL DEFAULT 0,
    available_points INTEGER NOT NULL DEFAULT 0,
    redeemed_points  INTEGER NOT NULL DEFAULT 0,
    updated_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS questions_survey_idx     ON questions(survey_id);
CREATE INDEX IF NOT EXISTS options_question_idx     ON question_options(question_id);
CREATE INDEX IF NOT EXISTS responses_survey_idx     ON responses(survey_id);
CREATE INDEX IF NOT EXISTS responses_respondent_idx ON responses(respondent_id);
CREATE INDEX IF NOT EXISTS answers_response_idx     ON answers(response_id);
CREATE INDEX IF NOT EXISTS answers_question_idx     ON answers(question_id);
CREATE INDEX IF NOT EXISTS ledger_respondent_idx    ON point_ledger(respondent_id);

PRAGMA user_version = 1;
";
