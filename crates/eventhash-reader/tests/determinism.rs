use eventhash_canonical::{DigestResult, HashConfig};
use eventhash_reader::EventHashGenerator;
use proptest::prelude::*;

fn json_event(action: &str, serial: &str, quantity: u32, lot: &str) -> String {
    format!(
        r#"{{
            "@context": [{{"example": "https://ns.example.com/epcis/"}}],
            "type": "ObjectEvent",
            "eventTime": "2021-05-27T13:00:00Z",
            "action": "{action}",
            "example:lot": "{lot}",
            "epcList": ["urn:epc:id:sgtin:0614141.107346.{serial}"],
            "quantityList": [{{"epcClass": "urn:epc:class:lgtin:4012345.012345.{lot}", "quantity": {quantity}}}]
        }}"#
    )
}

fn xml_event(action: &str, serial: &str, quantity: u32, lot: &str) -> String {
    format!(
        r#"<ObjectEvent xmlns:example="https://ns.example.com/epcis/">
             <example:lot>{lot}</example:lot>
             <quantityList><quantityElement>
               <quantity>{quantity}</quantity>
               <epcClass>urn:epc:class:lgtin:4012345.012345.{lot}</epcClass>
             </quantityElement></quantityList>
             <action>{action}</action>
             <epcList><epc>urn:epc:id:sgtin:0614141.107346.{serial}</epc></epcList>
             <eventTime>2021-05-27T13:00:00Z</eventTime>
           </ObjectEvent>"#
    )
}

fn run_json(generator: &EventHashGenerator, input: &str) -> Vec<DigestResult> {
    generator
        .from_json(input.as_bytes())
        .collect::<Result<_, _>>()
        .unwrap()
}

fn run_xml(generator: &EventHashGenerator, input: &str) -> Vec<DigestResult> {
    generator
        .from_xml(input.as_bytes())
        .collect::<Result<_, _>>()
        .unwrap()
}

proptest! {
    #[test]
    fn hashing_is_deterministic_and_format_independent(
        action in prop::sample::select(vec!["ADD", "OBSERVE", "DELETE"]),
        serial in "[0-9]{1,8}",
        quantity in 0u32..100_000,
        lot in "[A-Z0-9]{1,10}",
    ) {
        let config = HashConfig::builder()
            .outputs(["prehash", "sha-256", "sha3-256"])
            .build()
            .unwrap();
        let generator = EventHashGenerator::new(config);

        let json = json_event(action, &serial, quantity, &lot);
        let xml = xml_event(action, &serial, quantity, &lot);

        let first = run_json(&generator, &json);
        let second = run_json(&generator, &json);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&first, &run_xml(&generator, &xml));
    }
}
