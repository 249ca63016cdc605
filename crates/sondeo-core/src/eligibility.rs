//! The response-cap eligibility rule.
//!
//! The pure rule lives here; counting a respondent's completed responses is
//! the store's job ([`crate::store::SurveyStore::can_respond`]), and the
//! ingestion transaction re-checks the rule under its write lock.

/// Whether a respondent with `completed_count` completed responses may submit
/// another one. A cap of 0 means unlimited.
pub fn under_cap(max_responses_per_user: u32, completed_count: u64) -> bool {
  max_responses_per_user == 0
    || completed_count < u64::from(max_responses_per_user)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_cap_is_unlimited() {
    assert!(under_cap(0, 0));
    assert!(under_cap(0, 10_000));
  }

  #[test]
  fn cap_is_a_strict_upper_bound() {
    assert!(under_cap(2, 0));
    assert!(under_cap(2, 1));
    assert!(!under_cap(2, 2));
    assert!(!under_cap(2, 3));
  }
}
