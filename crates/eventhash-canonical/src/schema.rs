//! Field ordering catalog for canonical EPCIS pre-hash strings.
//!
//! The catalog lists, for every standard field, the order in which its
//! children appear in the pre-hash string. A field path that resolves in the
//! catalog is a standard field; anything else is a user extension.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::config::CbvVersion;

/// Static description of one catalog entry.
struct Field {
    name: &'static str,
    children: &'static [Field],
}

const fn leaf(name: &'static str) -> Field {
    Field {
        name,
        children: &[],
    }
}

const fn group(name: &'static str, children: &'static [Field]) -> Field {
    Field { name, children }
}

const EPC: &[Field] = &[leaf("epc")];

const QUANTITY_ELEMENT: &[Field] = &[group(
    "quantityElement",
    &[leaf("epcClass"), leaf("quantity"), leaf("uom")],
)];

const SENSOR_METADATA: &[Field] = &[
    leaf("time"),
    leaf("startTime"),
    leaf("endTime"),
    leaf("deviceID"),
    leaf("deviceMetadata"),
    leaf("rawData"),
    leaf("dataProcessingMethod"),
    leaf("bizRules"),
];

const SENSOR_REPORT: &[Field] = &[
    leaf("type"),
    leaf("exception"),
    leaf("deviceID"),
    leaf("deviceMetadata"),
    leaf("rawData"),
    leaf("dataProcessingMethod"),
    leaf("time"),
    leaf("microorganism"),
    leaf("chemicalSubstance"),
    leaf("value"),
    leaf("component"),
    leaf("stringValue"),
    leaf("booleanValue"),
    leaf("hexBinaryValue"),
    leaf("uriValue"),
    leaf("minValue"),
    leaf("maxValue"),
    leaf("meanValue"),
    leaf("sDev"),
    leaf("percRank"),
    leaf("percValue"),
    leaf("uom"),
    leaf("coordinateReferenceSystem"),
];

const EVENT_FIELDS: &[Field] = &[
    leaf("type"),
    leaf("eventTime"),
    leaf("eventTimeZoneOffset"),
    leaf("certificationInfo"),
    leaf("parentID"),
    group("epcList", EPC),
    group("inputEPCList", EPC),
    group("childEPCs", EPC),
    group("quantityList", QUANTITY_ELEMENT),
    group("childQuantityList", QUANTITY_ELEMENT),
    group("inputQuantityList", QUANTITY_ELEMENT),
    group("outputEPCList", EPC),
    group("outputQuantityList", QUANTITY_ELEMENT),
    leaf("action"),
    leaf("transformationID"),
    leaf("bizStep"),
    leaf("disposition"),
    group("persistentDisposition", &[leaf("set"), leaf("unset")]),
    group("readPoint", &[leaf("id")]),
    group("bizLocation", &[leaf("id")]),
    group(
        "bizTransactionList",
        &[leaf("bizTransaction"), leaf("type")],
    ),
    group("sourceList", &[leaf("source"), leaf("type")]),
    group("destinationList", &[leaf("destination"), leaf("type")]),
    group(
        "sensorElementList",
        &[group(
            "sensorElement",
            &[
                group("sensorMetadata", SENSOR_METADATA),
                group("sensorReport", SENSOR_REPORT),
            ],
        )],
    ),
    leaf("ilmd"),
    group(
        "errorDeclaration",
        &[
            leaf("declarationTime"),
            leaf("reason"),
            group("correctiveEventIDs", &[leaf("correctiveEventID")]),
        ],
    ),
    leaf("recordTime"),
    leaf("eventID"),
];

/// One resolved catalog entry: its position among siblings plus its own children.
#[derive(Debug, Default)]
pub struct SchemaNode {
    position: usize,
    children: BTreeMap<&'static str, SchemaNode>,
}

impl SchemaNode {
    fn from_fields(position: usize, fields: &'static [Field]) -> Self {
        let children = fields
            .iter()
            .enumerate()
            .map(|(idx, field)| (field.name, SchemaNode::from_fields(idx, field.children)))
            .collect();
        Self { position, children }
    }

    /// Position of this field among its siblings.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Looks up a direct child by field name.
    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        self.children.get(name)
    }
}

/// Immutable field ordering catalog for one CBV version.
#[derive(Debug)]
pub struct FieldSchema {
    version: CbvVersion,
    root: SchemaNode,
}

static CBV_2_0: Lazy<FieldSchema> = Lazy::new(|| FieldSchema::build(CbvVersion::V2_0));
static CBV_2_1: Lazy<FieldSchema> = Lazy::new(|| FieldSchema::build(CbvVersion::V2_1));

impl FieldSchema {
    fn build(version: CbvVersion) -> Self {
        Self {
            version,
            root: SchemaNode::from_fields(0, EVENT_FIELDS),
        }
    }

    /// Returns the process-wide catalog for a CBV version.
    pub fn for_version(version: CbvVersion) -> &'static FieldSchema {
        match version {
            CbvVersion::V2_0 => &CBV_2_0,
            CbvVersion::V2_1 => &CBV_2_1,
        }
    }

    /// Version this catalog belongs to.
    pub fn version(&self) -> CbvVersion {
        self.version
    }

    /// Resolves a field path (event-root relative) to its catalog entry.
    pub fn lookup<'a, I>(&self, path: I) -> Option<&SchemaNode>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut node = &self.root;
        for segment in path {
            node = node.child(segment)?;
        }
        Some(node)
    }

    /// Position of the last path segment among its siblings, if the path is standard.
    pub fn position<'a, I>(&self, path: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut iter = path.into_iter().peekable();
        iter.peek()?;
        self.lookup(iter).map(SchemaNode::position)
    }
}
