//! Leaf formatting for pre-hash lines.
//!
//! Standard leaves go through an ordered rule list where the first matching
//! rule wins. User-extension leaves use the namespace-qualified
//! `{uri}local=value` form with no value rewriting.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::HashConfig;
use crate::errors::CanonicalError;
use crate::identifiers;
use crate::tree::{EventTree, Namespaces, NodeId};
use crate::vocabulary::{self, CbvDomain};

/// Fields whose entries are EPC identifiers, emitted as `epc=...`.
pub const IDENTIFIER_LISTS: &[&str] =
    &["epcList", "inputEPCList", "outputEPCList", "childEPCs"];

/// Top-level event element / `type` values.
pub const EVENT_TYPES: &[&str] = &[
    "ObjectEvent",
    "AggregationEvent",
    "TransactionEvent",
    "TransformationEvent",
    "AssociationEvent",
];

const TIME_FIELDS: &[&str] = &[
    "eventTime",
    "recordTime",
    "declarationTime",
    "startTime",
    "endTime",
    "time",
];

const SENSOR_REPORT: &str = "sensorReport";

static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("invalid regex"));

/// True for a known event type name.
pub fn is_event_type(value: &str) -> bool {
    EVENT_TYPES.contains(&value)
}

/// Maps `prefix:local` through the namespace table to `{uri}local`.
pub fn qualified_name(namespaces: &Namespaces, name: &str) -> String {
    match name.split_once(':') {
        Some((prefix, local)) => match namespaces.get(prefix) {
            Some(uri) => format!("{{{uri}}}{local}"),
            None => name.to_string(),
        },
        None => name.to_string(),
    }
}

/// Display string of a user-extension node, also its sort key.
pub fn extension_display(tree: &EventTree, id: NodeId) -> String {
    let name = tree
        .name(id)
        .map(|n| qualified_name(tree.namespaces(), n))
        .unwrap_or_default();
    match tree.value(id) {
        Some(value) if !value.is_empty() => format!("{name}={value}"),
        _ => name,
    }
}

/// Drops a trailing `.0` (and any trailing fractional zeros) from numbers.
pub fn normalize_number(value: &str) -> Option<String> {
    if !NUMERIC.is_match(value) {
        return None;
    }
    if value.contains('.') {
        Some(value.trim_end_matches('0').trim_end_matches('.').to_string())
    } else {
        Some(value.to_string())
    }
}

/// Reformats a timestamp as a millisecond-precision UTC instant.
pub fn format_instant(field: &str, value: &str) -> Result<String, CanonicalError> {
    let instant = match DateTime::parse_from_rfc3339(value.trim()) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(_) => NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(|_| CanonicalError::InvalidTimestamp {
                field: field.to_string(),
                value: value.to_string(),
            })?,
    };
    Ok(instant.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

/// Formats one standard leaf. `Ok(None)` means the leaf emits nothing.
pub fn format_standard_leaf(
    tree: &EventTree,
    id: NodeId,
    config: &HashConfig,
) -> Result<Option<String>, CanonicalError> {
    let Some(name) = tree.name(id) else {
        return Ok(None);
    };
    if config.is_excluded(name) {
        return Ok(None);
    }
    let value = tree.value(id).unwrap_or_default();
    let parent = tree.parent_field(id).unwrap_or_default();

    if IDENTIFIER_LISTS.contains(&parent) {
        return Ok(Some(format!("epc={}", identifiers::canonical_identifier(value))));
    }
    if identifiers::is_epc_urn(value) {
        return Ok(Some(format!("{name}={}", identifiers::canonical_identifier(value))));
    }
    if let Some(domain) = CbvDomain::for_short_name_field(name) {
        if vocabulary::is_bare(value) {
            return Ok(Some(format!("{name}={}", domain.web_uri(value))));
        }
    }
    if parent == SENSOR_REPORT && !value.is_empty() {
        let formatted = match name {
            "type" => Some(vocabulary::sensor_type(value)),
            "exception" => Some(vocabulary::sensor_exception(value)),
            "component" => Some(vocabulary::sensor_component(value)),
            _ => None,
        };
        if let Some(formatted) = formatted {
            return Ok(Some(format!("{name}={formatted}")));
        }
    }
    if TIME_FIELDS.contains(&name) && !value.is_empty() {
        return Ok(Some(format!("{name}={}", format_instant(name, value)?)));
    }
    if let Some(web) = vocabulary::cbv_urn_to_web(value) {
        return Ok(Some(format!("{name}={web}")));
    }
    if name == "type" && vocabulary::is_bare(value) {
        if let Some(domain) = CbvDomain::for_type_in(parent) {
            return Ok(Some(format!("{name}={}", domain.web_uri(value))));
        }
    }
    if let Some(stripped) = vocabulary::strip_gs1_prefix(value) {
        return Ok(Some(format!("{name}={stripped}")));
    }
    if is_event_type(value) {
        return Ok(Some(format!("eventType={value}")));
    }
    if value.is_empty() {
        return Ok(Some(name.to_string()));
    }
    if let Some(number) = normalize_number(value) {
        return Ok(Some(format!("{name}={number}")));
    }
    Ok(Some(format!("{name}={value}")))
}
