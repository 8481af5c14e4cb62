//! CBV and GS1 vocabulary rewriting.
//!
//! Standard vocabulary values reach the formatter as URNs
//! (`urn:epcglobal:cbv:bizstep:shipping`), bare short names (`shipping`) or
//! web URIs. All of them are brought to the web URI form.

/// Base of CBV web vocabulary URIs.
pub const CBV_WEB_BASE: &str = "https://ref.gs1.org/cbv/";

/// Base of GS1 web vocabulary terms (sensor measurement types, alerts).
pub const GS1_VOC_BASE: &str = "https://gs1.org/voc/";

const CBV_URN_PREFIX: &str = "urn:epcglobal:cbv:";

/// CBV vocabulary a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CbvDomain {
    /// Business steps.
    BizStep,
    /// Dispositions.
    Disposition,
    /// Business transaction types.
    BizTransactionType,
    /// Source/destination types.
    SourceDestType,
    /// Error declaration reasons.
    ErrorReason,
    /// Sensor report components.
    Component,
}

impl CbvDomain {
    /// Term prefix in the web vocabulary.
    pub fn web_prefix(&self) -> &'static str {
        match self {
            Self::BizStep => "BizStep-",
            Self::Disposition => "Disp-",
            Self::BizTransactionType => "BTT-",
            Self::SourceDestType => "SDT-",
            Self::ErrorReason => "ER-",
            Self::Component => "Comp-",
        }
    }

    fn from_urn_segment(segment: &str) -> Option<Self> {
        match segment {
            "bizstep" => Some(Self::BizStep),
            "disp" => Some(Self::Disposition),
            "btt" => Some(Self::BizTransactionType),
            "sdt" => Some(Self::SourceDestType),
            "er" => Some(Self::ErrorReason),
            _ => None,
        }
    }

    /// Domain of a short-name field (`bizStep`, `disposition`, `set`, `unset`, `reason`).
    pub fn for_short_name_field(field: &str) -> Option<Self> {
        match field {
            "bizStep" => Some(Self::BizStep),
            "disposition" | "set" | "unset" => Some(Self::Disposition),
            "reason" => Some(Self::ErrorReason),
            _ => None,
        }
    }

    /// Domain of a `type` field, keyed by the list that contains it.
    pub fn for_type_in(parent: &str) -> Option<Self> {
        match parent {
            "bizTransactionList" => Some(Self::BizTransactionType),
            "sourceList" | "destinationList" => Some(Self::SourceDestType),
            _ => None,
        }
    }

    /// Web URI of a bare term.
    pub fn web_uri(&self, term: &str) -> String {
        format!("{CBV_WEB_BASE}{}{term}", self.web_prefix())
    }
}

/// True when the value carries no scheme or prefix.
pub fn is_bare(value: &str) -> bool {
    !value.is_empty() && !value.contains(':')
}

/// `urn:epcglobal:cbv:<domain>:<term>` to its web URI.
pub fn cbv_urn_to_web(value: &str) -> Option<String> {
    let rest = value.strip_prefix(CBV_URN_PREFIX)?;
    let (segment, term) = rest.split_once(':')?;
    let domain = CbvDomain::from_urn_segment(segment)?;
    Some(domain.web_uri(term))
}

/// Drops a leading `gs1:` prefix.
pub fn strip_gs1_prefix(value: &str) -> Option<&str> {
    value.strip_prefix("gs1:")
}

fn strip_short_prefix(value: &str) -> &str {
    value
        .strip_prefix("gs1:")
        .or_else(|| value.strip_prefix("cbv:"))
        .unwrap_or(value)
}

fn is_absolute(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://") || value.starts_with("urn:")
}

/// Sensor measurement type (`Temperature`, `gs1:Temperature`) to its web URI.
pub fn sensor_type(value: &str) -> String {
    if is_absolute(value) {
        return value.to_string();
    }
    format!("{GS1_VOC_BASE}{}", strip_short_prefix(value))
}

/// Sensor alert (`ALARM_CONDITION`, `gs1:SensorAlertType-ALARM_CONDITION`) to its web URI.
pub fn sensor_exception(value: &str) -> String {
    if is_absolute(value) {
        return value.to_string();
    }
    let term = strip_short_prefix(value);
    let term = term.strip_prefix("SensorAlertType-").unwrap_or(term);
    format!("{GS1_VOC_BASE}SensorAlertType-{term}")
}

/// Sensor component (`x`, `cbv:Comp-x`) to its web URI.
pub fn sensor_component(value: &str) -> String {
    if is_absolute(value) {
        return value.to_string();
    }
    let term = strip_short_prefix(value);
    let term = term.strip_prefix("Comp-").unwrap_or(term);
    CbvDomain::Component.web_uri(term)
}
