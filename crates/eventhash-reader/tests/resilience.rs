use eventhash_canonical::{CanonicalError, HashConfig};
use eventhash_reader::{
    EventExtractor, EventHashGenerator, ExtractError, Extracted, ExtractorLimits, ReaderError,
};

fn document(events: usize) -> String {
    let list: Vec<String> = (0..events)
        .map(|i| {
            format!(
                r#"{{"type": "ObjectEvent", "action": "ADD", "eventTime": "2021-05-27T13:0{i}:00Z"}}"#
            )
        })
        .collect();
    format!(r#"{{"type": "EPCISDocument", "epcisBody": {{"eventList": [{}]}}}}"#, list.join(","))
}

#[test]
fn test_request_never_exceeds_demand() {
    let input = document(5);
    let mut extractor = EventExtractor::new(input.as_bytes());

    let first = extractor.request(2).unwrap();
    assert_eq!(first.items.len(), 2);
    assert!(!first.complete);

    let second = extractor.request(2).unwrap();
    assert_eq!(second.items.len(), 2);
    assert!(!second.complete);

    let third = extractor.request(2).unwrap();
    assert_eq!(third.items.len(), 1);
    assert!(third.complete);

    let after_end = extractor.request(3).unwrap();
    assert!(after_end.items.is_empty());
    assert!(after_end.complete);
}

#[test]
fn test_zero_and_negative_demand() {
    let input = document(1);
    let mut extractor = EventExtractor::new(input.as_bytes());

    let empty = extractor.request(0).unwrap();
    assert!(empty.items.is_empty());
    assert!(!empty.complete);

    assert!(matches!(
        extractor.request(-1),
        Err(ExtractError::NegativeDemand(-1))
    ));
}

#[test]
fn test_cancel_stops_extraction() {
    let input = document(4);
    let mut extractor = EventExtractor::new(input.as_bytes());
    assert_eq!(extractor.request(1).unwrap().items.len(), 1);

    extractor.cancel();
    let batch = extractor.request(10).unwrap();
    assert!(batch.items.is_empty());
    assert!(batch.complete);
}

#[test]
fn test_header_available_before_first_event() {
    let input = r#"{
        "@context": [{"example": "https://ns.example.com/epcis/"}],
        "type": "EPCISDocument",
        "schemaVersion": "2.0",
        "creationDate": "2021-06-01T08:00:00Z",
        "epcisBody": {"eventList": [{"type": "ObjectEvent"}]}
    }"#;
    let mut extractor = EventExtractor::new(input.as_bytes());
    let batch = extractor.request(1).unwrap();
    assert!(matches!(batch.items[0], Extracted::Event(_)));
    assert!(extractor.header().contains_key("@context"));

    let rest = extractor.request(5).unwrap();
    assert!(matches!(&rest.items[..], [Extracted::Header(_)]));
    assert!(rest.complete);
}

#[test]
fn test_oversized_event_is_rejected() {
    let input = document(2);
    let limits = ExtractorLimits { max_event_bytes: 32 };
    let results: Vec<_> = EventExtractor::with_limits(input.as_bytes(), limits).collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        Err(ExtractError::EventTooLarge { max: 32, .. })
    ));
}

#[test]
fn test_truncated_json_fails_after_complete_events() {
    let input = r#"{"eventList": [{"type": "ObjectEvent", "action": "ADD"}, {"type": "Obj"#;
    let generator = EventHashGenerator::new(HashConfig::default());
    let results: Vec<_> = generator.from_json(input.as_bytes()).collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(ReaderError::Extract(ExtractError::Syntax { .. }))
    ));
}

#[test]
fn test_invalid_json_value_is_fatal() {
    let input = r#"{"eventList": [{"type": "ObjectEvent", "action": }]}"#;
    let generator = EventHashGenerator::new(HashConfig::default());
    let results: Vec<_> = generator.from_json(input.as_bytes()).collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        Err(ReaderError::Extract(ExtractError::JsonParse(_)))
    ));
}

#[test]
fn test_scalar_document_is_rejected() {
    let generator = EventHashGenerator::new(HashConfig::default());
    let results: Vec<_> = generator.from_json(&b"\"ObjectEvent\""[..]).collect();
    assert!(matches!(
        results[..],
        [Err(ReaderError::Extract(ExtractError::UnexpectedTopLevel { .. }))]
    ));
}

#[test]
fn test_bad_timestamp_stops_the_stream() {
    let input = r#"[
        {"type": "ObjectEvent", "eventTime": "not a time"},
        {"type": "ObjectEvent", "eventTime": "2021-05-27T13:00:00Z"}
    ]"#;
    let generator = EventHashGenerator::new(HashConfig::default());
    let results: Vec<_> = generator.from_json(input.as_bytes()).collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        Err(ReaderError::Canonical(CanonicalError::InvalidTimestamp { .. }))
    ));
}

#[test]
fn test_malformed_xml_is_fatal() {
    let generator = EventHashGenerator::new(HashConfig::default());

    let unbalanced = "<EPCISBody><ObjectEvent><action>ADD</ObjectEvent></EPCISBody>";
    let results: Vec<_> = generator.from_xml(unbalanced.as_bytes()).collect();
    assert!(matches!(results[..], [Err(ReaderError::Xml { .. })]));

    let doctype = r#"<?xml version="1.0"?><!DOCTYPE lolz [<!ENTITY lol "lol">]><ObjectEvent/>"#;
    let results: Vec<_> = generator.from_xml(doctype.as_bytes()).collect();
    assert!(matches!(results[..], [Err(ReaderError::XmlRejected(_))]));

    let unclosed = "<EPCISBody><ObjectEvent><action>ADD</action>";
    let results: Vec<_> = generator.from_xml(unclosed.as_bytes()).collect();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_err());
}

#[test]
fn test_json_fed_to_xml_reader_is_rejected() {
    let generator = EventHashGenerator::new(HashConfig::default());
    let results: Vec<_> = generator
        .from_xml(&br#"{"type": "ObjectEvent"}"#[..])
        .collect();
    assert!(matches!(results[..], [Err(ReaderError::XmlRejected(_))]));
}
