//! Integration tests for CLI commands.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

const MINIMAL_PREHASH: &str = "eventType=ObjectEventeventTime=2021-05-27T13:00:00.000ZepcList\
     epc=https://id.gs1.org/01/10614141073464/21/2017action=OBSERVE";

const JSON_EVENTS: &str = r#"{
    "@context": ["https://ref.gs1.org/standards/epcis/epcis-context.jsonld"],
    "type": "EPCISDocument",
    "schemaVersion": "2.0",
    "creationDate": "2021-06-01T08:00:00Z",
    "epcisBody": {
        "eventList": [
            {
                "type": "ObjectEvent",
                "eventTime": "2021-05-27T13:00:00Z",
                "action": "OBSERVE",
                "epcList": ["urn:epc:id:sgtin:0614141.107346.2017"]
            },
            {
                "type": "ObjectEvent",
                "eventTime": "2021-05-27T13:00:00Z",
                "action": "DELETE",
                "epcList": ["urn:epc:id:sgtin:0614141.107346.2017"]
            }
        ]
    }
}"#;

const XML_EVENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<epcis:EPCISDocument xmlns:epcis="urn:epcglobal:epcis:xsd:2" schemaVersion="2.0" creationDate="2021-06-01T08:00:00Z">
  <EPCISBody>
    <EventList>
      <ObjectEvent>
        <eventTime>2021-05-27T13:00:00Z</eventTime>
        <epcList>
          <epc>urn:epc:id:sgtin:0614141.107346.2017</epc>
        </epcList>
        <action>OBSERVE</action>
      </ObjectEvent>
    </EventList>
  </EPCISBody>
</epcis:EPCISDocument>
"#;

fn write_input(name: &str, contents: &str) -> (TempDir, String) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(name);
    fs::write(&path, contents).unwrap();
    (temp_dir, path.to_string_lossy().to_string())
}

fn run_cli(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_eventhash"))
        .args(args)
        .output()
        .expect("Failed to execute CLI");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    let success = output.status.success();

    (success, stdout, stderr)
}

#[test]
fn test_hash_json_document() {
    let (_dir, path) = write_input("events.jsonld", JSON_EVENTS);
    let (success, stdout, _) = run_cli(&["hash", &path]);
    assert!(success);

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let results = parsed.as_array().unwrap();
    assert_eq!(results.len(), 2);
    for result in results {
        let id = result["sha-256"].as_str().unwrap();
        assert!(id.starts_with("ni:///sha-256;"));
        assert!(id.ends_with("?ver=CBV2.0"));
    }
    assert_ne!(results[0]["sha-256"], results[1]["sha-256"]);
}

#[test]
fn test_hash_xml_matches_json() {
    let (_xml_dir, xml_path) = write_input("event.xml", XML_EVENT);
    let (_json_dir, json_path) = write_input("events.jsonld", JSON_EVENTS);

    let (success, xml_out, _) = run_cli(&["hash", "--single", &xml_path]);
    assert!(success);
    let (success, json_out, _) = run_cli(&["hash", "--single", &json_path]);
    assert!(success);

    let xml_lines: Vec<&str> = xml_out.lines().collect();
    let json_lines: Vec<&str> = json_out.lines().collect();
    assert_eq!(xml_lines.len(), 1);
    assert_eq!(json_lines.len(), 2);
    assert_eq!(xml_lines[0], json_lines[0]);
}

#[test]
fn test_hash_with_prehash_keeps_request_order() {
    let (_dir, path) = write_input("event.xml", XML_EVENT);
    let (success, stdout, _) = run_cli(&["hash", "--prehash", "-a", "sha3-512,md5", &path]);
    assert!(success);

    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let result = parsed[0].as_object().unwrap();
    let keys: Vec<&str> = result.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["prehash", "sha3-512", "md5"]);
    assert_eq!(result["prehash"], MINIMAL_PREHASH);
    assert!(result["sha3-512"]
        .as_str()
        .unwrap()
        .starts_with("ni:///sha3-512;"));
}

#[test]
fn test_hash_cbv_21_tag() {
    let (_dir, path) = write_input("event.xml", XML_EVENT);
    let (success, stdout, _) = run_cli(&["hash", "--single", "--cbv", "2.1", &path]);
    assert!(success);
    assert!(stdout.trim().ends_with("?ver=CBV2.1"));
}

#[test]
fn test_single_rejects_multiple_outputs() {
    let (_dir, path) = write_input("event.xml", XML_EVENT);
    let (success, stdout, stderr) = run_cli(&["hash", "--single", "--prehash", &path]);
    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Error"));
}

#[test]
fn test_canonicalize_separates_events() {
    let (_dir, path) = write_input("events.jsonld", JSON_EVENTS);
    let (success, stdout, _) = run_cli(&["canonicalize", &path]);
    assert!(success);

    let blocks: Vec<&str> = stdout.trim_end().split("\n\n").collect();
    assert_eq!(blocks.len(), 2);
    assert_eq!(
        blocks[0].lines().collect::<Vec<_>>(),
        vec![
            "eventType=ObjectEvent",
            "eventTime=2021-05-27T13:00:00.000Z",
            "epcList",
            "epc=https://id.gs1.org/01/10614141073464/21/2017",
            "action=OBSERVE",
        ]
    );
    assert!(blocks[1].ends_with("action=DELETE"));
}

#[test]
fn test_invalid_cbv_version() {
    let (_dir, path) = write_input("event.xml", XML_EVENT);
    let (success, _, stderr) = run_cli(&["hash", "--cbv", "3.0", &path]);
    assert!(!success);
    assert!(stderr.contains("Error"));
}

#[test]
fn test_missing_input_file() {
    let (success, _, stderr) = run_cli(&["hash", "/nonexistent/events.xml"]);
    assert!(!success);
    assert!(stderr.contains("Error"));
    assert!(stderr.contains("/nonexistent/events.xml"));
}

#[test]
fn test_malformed_xml_fails() {
    let (_dir, path) = write_input(
        "broken.xml",
        "<epcis:EPCISDocument><ObjectEvent></epcis:EPCISDocument>",
    );
    let (success, _, stderr) = run_cli(&["hash", &path]);
    assert!(!success);
    assert!(stderr.contains("Error"));
}
