//! Transform stage between extraction and loading.
//!
//! The warehouse keeps API payloads verbatim so downstream models can be
//! rebuilt without refetching. Transformation is therefore the identity
//! today; the stage exists so shaping can slot in without touching the
//! extract or load code.

use serde_json::Value;

/// Pass records through unchanged, preserving order.
#[must_use]
pub fn passthrough(records: Vec<Value>) -> Vec<Value> {
    records
}
