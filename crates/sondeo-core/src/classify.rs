//! Demographic classifier — maps respondent fields to aggregation buckets.
//!
//! The canonical age-cohort scheme uses the coarse boundaries 18/31/46/61.
//! It is applied uniformly across demographics, per-question breakdowns, and
//! evolution-by-age.

use chrono::{Datelike, NaiveDate};

/// Bucket label for any missing or empty demographic field.
pub const UNSPECIFIED: &str = "Sin especificar";

/// Every cohort label the classifier can produce, in ascending age order.
pub const COHORT_LABELS: [&str; 6] = [
  "Menor de 18",
  "18-30",
  "31-45",
  "46-60",
  "60+",
  UNSPECIFIED,
];

/// Map a birth date to its age-cohort label as of `today`.
pub fn age_cohort(birth_date: Option<NaiveDate>, today: NaiveDate) -> &'static str {
  let Some(born) = birth_date else {
    return UNSPECIFIED;
  };
  match age_in_years(born, today) {
    a if a < 18 => "Menor de 18",
    18..=30 => "18-30",
    31..=45 => "31-45",
    46..=60 => "46-60",
    _ => "60+",
  }
}

/// Map a raw city or neighborhood field to its bucket label: missing or empty
/// becomes [`UNSPECIFIED`], anything else passes through verbatim (no
/// normalisation; bucket keys are case-sensitive).
pub fn place_bucket(value: Option<&str>) -> String {
  match value {
    Some(v) if !v.is_empty() => v.to_owned(),
    _ => UNSPECIFIED.to_owned(),
  }
}

/// Whole years elapsed between `born` and `today`, clamped at zero.
fn age_in_years(born: NaiveDate, today: NaiveDate) -> i32 {
  let mut age = today.year() - born.year();
  if (today.month(), today.day()) < (born.month(), born.day()) {
    age -= 1;
  }
  age.max(0)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn missing_birth_date_is_unspecified() {
    assert_eq!(age_cohort(None, date(2025, 6, 1)), UNSPECIFIED);
  }

  #[test]
  fn cohort_boundaries() {
    let today = date(2025, 6, 1);
    assert_eq!(age_cohort(Some(date(2010, 1, 1)), today), "Menor de 18");
    assert_eq!(age_cohort(Some(date(2007, 6, 1)), today), "18-30"); // turns 18 today
    assert_eq!(age_cohort(Some(date(1995, 1, 1)), today), "18-30");
    assert_eq!(age_cohort(Some(date(1994, 6, 1)), today), "31-45");
    assert_eq!(age_cohort(Some(date(1979, 6, 1)), today), "46-60");
    assert_eq!(age_cohort(Some(date(1965, 6, 2)), today), "46-60"); // 60th birthday tomorrow... still 59
    assert_eq!(age_cohort(Some(date(1964, 6, 1)), today), "60+");
  }

  #[test]
  fn birthday_not_yet_reached_subtracts_a_year() {
    let today = date(2025, 6, 1);
    // Born 1994-06-02: turns 31 tomorrow, so still 30 today.
    assert_eq!(age_cohort(Some(date(1994, 6, 2)), today), "18-30");
  }

  #[test]
  fn place_buckets_pass_through_verbatim() {
    assert_eq!(place_bucket(Some("Alta Gracia")), "Alta Gracia");
    assert_eq!(place_bucket(Some("alta gracia")), "alta gracia");
    assert_eq!(place_bucket(Some("")), UNSPECIFIED);
    assert_eq!(place_bucket(None), UNSPECIFIED);
  }
}
