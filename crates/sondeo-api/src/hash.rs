//! Content hashing for aggregated survey results.
//!
//! The serialised results are deterministic (every map in the output is a
//! `BTreeMap`), so the SHA-256 of the JSON doubles as an HTTP ETag and as a
//! cache key for downstream consumers of the aggregation.

use sha2::{Digest, Sha256};
use sondeo_core::results::SurveyResults;

/// Compute a quoted ETag for the given results.
///
/// Stable: the same snapshot always hashes to the same tag.
pub fn results_etag(
  results: &SurveyResults,
) -> Result<String, serde_json::Error> {
  let canonical = serde_json::to_vec(results)?;
  let mut hasher = Sha256::new();
  hasher.update(&canonical);
  Ok(format!("\"{}\"", hex::encode(hasher.finalize())))
}
