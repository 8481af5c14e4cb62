//! EPC URN to GS1 Digital Link URI conversion.
//!
//! Pre-hash strings carry identifiers in Digital Link form
//! (`https://id.gs1.org/...`) whatever syntax the source used. URNs that are
//! not recognised, or whose components have the wrong length, are left as-is.

use once_cell::sync::Lazy;
use regex::Regex;

/// Resolver host used for every rewritten identifier.
pub const DIGITAL_LINK_BASE: &str = "https://id.gs1.org";

const INSTANCE_PREFIX: &str = "urn:epc:id:";
const CLASS_PREFIX: &str = "urn:epc:class:";
const PATTERN_PREFIX: &str = "urn:epc:idpat:";

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("invalid regex"));

/// True when the value is an instance-, class- or pattern-level EPC URN.
pub fn is_epc_urn(value: &str) -> bool {
    value.starts_with(INSTANCE_PREFIX)
        || value.starts_with(CLASS_PREFIX)
        || value.starts_with(PATTERN_PREFIX)
}

/// GS1 mod-10 check digit over a digit string.
pub fn check_digit(digits: &str) -> Option<char> {
    if !DIGITS.is_match(digits) {
        return None;
    }
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(idx, b)| {
            let d = u32::from(b - b'0');
            if idx % 2 == 0 {
                d * 3
            } else {
                d
            }
        })
        .sum();
    char::from_digit((10 - sum % 10) % 10, 10)
}

fn with_check(digits: String) -> Option<String> {
    let check = check_digit(&digits)?;
    Some(format!("{digits}{check}"))
}

fn numeric(parts: &[&str]) -> bool {
    parts.iter().all(|p| DIGITS.is_match(p))
}

/// GTIN-14 from company prefix and indicator-digit-led item reference.
fn gtin(company: &str, indicator_item: &str) -> Option<String> {
    if !numeric(&[company, indicator_item]) || company.len() + indicator_item.len() != 13 {
        return None;
    }
    let (indicator, item) = indicator_item.split_at(1);
    with_check(format!("{indicator}{company}{item}"))
}

/// Company prefix plus reference, check digit appended, at a fixed total length.
fn keyed(company: &str, reference: &str, len_without_check: usize) -> Option<String> {
    if !numeric(&[company, reference]) || company.len() + reference.len() != len_without_check {
        return None;
    }
    with_check(format!("{company}{reference}"))
}

fn link(path: &[(&str, &str)]) -> String {
    let mut uri = String::from(DIGITAL_LINK_BASE);
    for (ai, value) in path {
        uri.push('/');
        uri.push_str(ai);
        uri.push('/');
        uri.push_str(value);
    }
    uri
}

fn instance(scheme: &str, parts: &[&str]) -> Option<String> {
    let uri = match (scheme, parts) {
        ("sgtin", [company, item, serial]) => {
            let gtin = gtin(company, item)?;
            link(&[("01", gtin.as_str()), ("21", *serial)])
        }
        ("sscc", [company, serial_ref]) => {
            if !numeric(&[*company, *serial_ref]) || company.len() + serial_ref.len() != 17 {
                return None;
            }
            let (extension, rest) = serial_ref.split_at(1);
            let sscc = with_check(format!("{extension}{company}{rest}"))?;
            link(&[("00", sscc.as_str())])
        }
        ("sgln", [company, location, extension]) => {
            let gln = keyed(company, location, 12)?;
            if *extension == "0" || extension.is_empty() {
                link(&[("414", gln.as_str())])
            } else {
                link(&[("414", gln.as_str()), ("254", *extension)])
            }
        }
        ("pgln", [company, party]) => {
            let gln = keyed(company, party, 12)?;
            link(&[("417", gln.as_str())])
        }
        ("grai", [company, asset_type, serial]) => {
            let grai = format!("0{}{serial}", keyed(company, asset_type, 12)?);
            link(&[("8003", grai.as_str())])
        }
        ("giai", [company, asset]) => {
            let giai = format!("{company}{asset}");
            link(&[("8004", giai.as_str())])
        }
        ("gsrn", [company, service]) => {
            let gsrn = keyed(company, service, 17)?;
            link(&[("8018", gsrn.as_str())])
        }
        ("gsrnp", [company, service]) => {
            let gsrnp = keyed(company, service, 17)?;
            link(&[("8017", gsrnp.as_str())])
        }
        ("gdti", [company, doc_type, serial]) => {
            let gdti = format!("{}{serial}", keyed(company, doc_type, 12)?);
            link(&[("253", gdti.as_str())])
        }
        ("sgcn", [company, coupon, serial]) => {
            let gcn = format!("{}{serial}", keyed(company, coupon, 12)?);
            link(&[("255", gcn.as_str())])
        }
        ("cpi", [company, component, serial]) => {
            let cpi = format!("{company}{component}");
            link(&[("8010", cpi.as_str()), ("8011", *serial)])
        }
        ("ginc", [company, consignment]) => {
            let ginc = format!("{company}{consignment}");
            link(&[("401", ginc.as_str())])
        }
        ("gsin", [company, shipper]) => {
            let gsin = keyed(company, shipper, 16)?;
            link(&[("402", gsin.as_str())])
        }
        ("itip", [company, item, piece, total, serial]) => {
            if !numeric(&[*piece, *total]) {
                return None;
            }
            let itip = format!("{}{piece}{total}", gtin(company, item)?);
            link(&[("8006", itip.as_str()), ("21", *serial)])
        }
        ("upui", [company, item, tpx]) => {
            let gtin = gtin(company, item)?;
            link(&[("01", gtin.as_str()), ("235", *tpx)])
        }
        _ => return None,
    };
    Some(uri)
}

fn class(scheme: &str, parts: &[&str]) -> Option<String> {
    match (scheme, parts) {
        ("lgtin", [company, item, lot]) => {
            let gtin = gtin(company, item)?;
            Some(link(&[("01", gtin.as_str()), ("10", *lot)]))
        }
        _ => None,
    }
}

fn pattern(scheme: &str, parts: &[&str]) -> Option<String> {
    match (scheme, parts) {
        ("sgtin", [company, item, "*"]) => {
            let gtin = gtin(company, item)?;
            Some(link(&[("01", gtin.as_str())]))
        }
        _ => None,
    }
}

fn split_body(rest: &str) -> Option<(&str, Vec<&str>)> {
    let (scheme, body) = rest.split_once(':')?;
    Some((scheme, body.split('.').collect()))
}

/// Converts an EPC URN to its Digital Link URI, if it is a recognised scheme.
///
/// ```rust
/// use eventhash_canonical::identifiers::to_digital_link;
///
/// assert_eq!(
///     to_digital_link("urn:epc:id:sgtin:0614141.812345.6789").as_deref(),
///     Some("https://id.gs1.org/01/80614141123458/21/6789")
/// );
/// assert_eq!(to_digital_link("urn:example:other"), None);
/// ```
pub fn to_digital_link(urn: &str) -> Option<String> {
    if let Some(rest) = urn.strip_prefix(INSTANCE_PREFIX) {
        let (scheme, parts) = split_body(rest)?;
        instance(scheme, &parts)
    } else if let Some(rest) = urn.strip_prefix(CLASS_PREFIX) {
        let (scheme, parts) = split_body(rest)?;
        class(scheme, &parts)
    } else if let Some(rest) = urn.strip_prefix(PATTERN_PREFIX) {
        let (scheme, parts) = split_body(rest)?;
        pattern(scheme, &parts)
    } else {
        None
    }
}

/// Digital Link form of `value` when it is a convertible EPC URN, else `value`.
pub fn canonical_identifier(value: &str) -> String {
    to_digital_link(value).unwrap_or_else(|| value.to_string())
}
