//! JSON encoding of snapshots for renderers and telemetry.
//!
//! Every snapshot leaving the crate goes through these functions, so the
//! wire format is defined in one place. `ArenaSim::snapshot_json` uses the
//! compact form; the pretty form is meant for humans.

use crate::world::Snapshot;

/// Compact JSON, one snapshot per string.
pub fn snapshot_to_json(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(snapshot)
}

/// Indented JSON for logs and debugging.
pub fn snapshot_to_json_pretty(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(snapshot)
}

/// Decode a snapshot produced by either encoder above.
pub fn snapshot_from_json(text: &str) -> Result<Snapshot, serde_json::Error> {
    serde_json::from_str(text)
}
