//! Output formatting utilities.

use eventhash_canonical::DigestResult;

/// Formats per-event results as a pretty JSON array of objects, keys in
/// request order.
pub fn format_results(results: &[DigestResult]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(results)
}
