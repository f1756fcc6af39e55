//! Gemeinsame Typen fuer die Integrationstests.

#![allow(dead_code)]

use multiref::{
    decode_str_collecting, encode_to_string, CollectEvents, Decoded, DecodeOptions, EncodeOptions,
    EncodingStyle, FieldDef, Graph, NativeType, PrimitiveKind, QName, Registry, StructId, Value,
};

pub const TEST_NS: &str = "urn:multiref:test";

pub const STYLES: [EncodingStyle; 2] = [EncodingStyle::Soap11, EncodingStyle::Soap12];

pub struct Types {
    pub registry: Registry,
    /// `Node { value: int, next: Node }`
    pub node: StructId,
    /// `Special : Node { label: string }`
    pub special: StructId,
    /// `Holder { name: string, item: anyType, nodes: Node[], numbers: int[], node: Node }`
    pub holder: StructId,
}

pub fn types() -> Types {
    let mut registry = Registry::new();
    let node = registry.define_struct(QName::new(TEST_NS, "Node"), None, vec![]);
    registry.add_fields(
        node,
        vec![
            FieldDef::new("value", NativeType::Primitive(PrimitiveKind::Int)),
            FieldDef::new("next", NativeType::Struct(node)),
        ],
    );
    let special = registry.define_struct(
        QName::new(TEST_NS, "Special"),
        Some(node),
        vec![FieldDef::new("label", NativeType::Primitive(PrimitiveKind::String))],
    );
    let holder = registry.define_struct(
        QName::new(TEST_NS, "Holder"),
        None,
        vec![
            FieldDef::new("name", NativeType::Primitive(PrimitiveKind::String)),
            FieldDef::new("item", NativeType::Any),
            FieldDef::new("nodes", NativeType::array_of(NativeType::Struct(node))),
            FieldDef::new("numbers", NativeType::array_of(NativeType::Primitive(PrimitiveKind::Int))),
            FieldDef::new("node", NativeType::Struct(node)),
        ],
    );
    Types { registry, node, special, holder }
}

pub fn options(style: EncodingStyle) -> EncodeOptions {
    EncodeOptions::default().with_style(style)
}

/// Encode + Decode; Diagnosen werden mitgeliefert.
pub fn roundtrip(graph: &Graph, root: &Value, registry: &Registry, style: EncodingStyle) -> (String, Decoded, CollectEvents) {
    let xml = encode_to_string(graph, root, registry, &options(style)).unwrap();
    let (decoded, events) = decode_str_collecting(&xml, registry, &DecodeOptions::default().with_style(style))
        .unwrap_or_else(|e| panic!("decode failed: {e}\n{xml}"));
    (xml, decoded, events)
}

/// Container mit den ueblichen Prefixen um `inner`.
pub fn body(inner: &str) -> String {
    format!(
        r#"<soap:Body xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:soapenc="http://schemas.xmlsoap.org/soap/encoding/" xmlns:t="{TEST_NS}">{inner}</soap:Body>"#
    )
}
