use super::*;
use crate::decoder::decode_str_collecting;
use crate::graph::Object;
use crate::lexical::{EnumDef, Primitive, PrimitiveKind};
use crate::options::{DecodeOptions, EncodingStyle};
use crate::registry::{FieldDef, NativeType, StructDef, StructId};
use crate::Error;

struct Fixture {
    registry: Registry,
    node: StructId,
}

fn fixture() -> Fixture {
    let mut registry = Registry::new();
    let node = registry.define_struct(QName::new("urn:test", "Node"), None, vec![]);
    registry.add_fields(
        node,
        vec![
            FieldDef::new("value", NativeType::Primitive(PrimitiveKind::Int)),
            FieldDef::new("next", NativeType::Struct(node)),
            FieldDef::new("other", NativeType::Any),
        ],
    );
    Fixture { registry, node }
}

fn encode(graph: &Graph, root: &Value, registry: &Registry, options: &EncodeOptions) -> String {
    encode_to_string(graph, root, registry, options).unwrap()
}

fn soap12() -> EncodeOptions {
    EncodeOptions::default().with_style(EncodingStyle::Soap12)
}

// ============================================================================
// Wurzel
// ============================================================================

#[test]
fn primitive_root_document() {
    let xml = encode(&Graph::new(), &Value::from(42), &Registry::new(), &EncodeOptions::default());
    assert_eq!(
        xml,
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap:Body xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/""#,
            r#" xmlns:xsd="http://www.w3.org/2001/XMLSchema""#,
            r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#,
            r#" xmlns:soapenc="http://schemas.xmlsoap.org/soap/encoding/">"#,
            r#"<xsd:int xsi:type="xsd:int">42</xsd:int></soap:Body>"#,
        )
    );
}

#[test]
fn null_root_is_nil_any_type() {
    let xml = encode(&Graph::new(), &Value::Null, &Registry::new(), &EncodeOptions::default());
    assert!(xml.contains(r#"<xsd:anyType xsi:nil="true"/>"#));
}

#[test]
fn custom_container_and_id_base() {
    let f = fixture();
    let mut graph = Graph::new();
    let n = graph.add_struct(f.node, [("value", Value::from(1))]);
    let options = EncodeOptions::default()
        .with_container(QName::new("urn:c", "Result"))
        .with_id_base("r");
    let xml = encode(&graph, &Value::Object(n), &f.registry, &options);
    assert!(xml.contains(r#"<q1:Result xmlns:q1="urn:c""#));
    assert!(xml.contains(r#" id="rid1""#));
}

// ============================================================================
// Referenzen
// ============================================================================

#[test]
fn soap11_shared_object_is_written_once() {
    let f = fixture();
    let mut graph = Graph::new();
    let shared = graph.add_struct(f.node, [("value", Value::from(7))]);
    let root = graph.add_struct(
        f.node,
        [("value", Value::from(1)), ("next", Value::Object(shared)), ("other", Value::Object(shared))],
    );
    let xml = encode(&graph, &Value::Object(root), &f.registry, &EncodeOptions::default());

    assert_eq!(xml.matches(r##"href="#id2""##).count(), 2);
    assert_eq!(xml.matches(r#" id="id2""#).count(), 1);

    let (decoded, events) = decode_str_collecting(&xml, &f.registry, &DecodeOptions::default()).unwrap();
    assert!(events.diagnostics.is_empty());
    let r = decoded.root.as_object().unwrap();
    let next = decoded.graph.field(r, "next").unwrap();
    assert_eq!(next, decoded.graph.field(r, "other").unwrap());
    assert!(graph.is_isomorphic(&Value::Object(root), &decoded.graph, &decoded.root));
}

#[test]
fn soap12_cycle_is_written_inline_with_ref() {
    let f = fixture();
    let mut graph = Graph::new();
    let a = graph.add_struct(f.node, [("value", Value::from(1))]);
    let b = graph.add_struct(f.node, [("value", Value::from(2)), ("next", Value::Object(a))]);
    graph.set_field(a, "next", Value::Object(b));

    let xml = encode(&graph, &Value::Object(a), &f.registry, &soap12());
    assert!(!xml.contains("href"));
    assert!(xml.contains(r#"<next enc:id="id2">"#));
    assert!(xml.contains(r#"<next enc:ref="id1"/>"#));

    let (decoded, _) = decode_str_collecting(&xml, &f.registry, &DecodeOptions::default()).unwrap();
    let da = decoded.root.as_object().unwrap();
    let db = decoded.graph.field(da, "next").unwrap().as_object().unwrap();
    assert_ne!(da, db);
    assert_eq!(decoded.graph.field(db, "next"), Some(&Value::Object(da)));
}

#[test]
fn soap11_cycle_back_to_root_uses_root_id() {
    let f = fixture();
    let mut graph = Graph::new();
    let a = graph.add_struct(f.node, [("value", Value::from(1))]);
    let b = graph.add_struct(f.node, [("value", Value::from(2)), ("next", Value::Object(a))]);
    graph.set_field(a, "next", Value::Object(b));

    let xml = encode(&graph, &Value::Object(a), &f.registry, &EncodeOptions::default());
    assert!(xml.contains(r##"<next href="#id1"/>"##));
    assert_eq!(xml.matches(r#" id="id"#).count(), 2);
}

// ============================================================================
// Typen
// ============================================================================

#[test]
fn xsi_type_only_where_slot_type_differs() {
    let f = fixture();
    let mut graph = Graph::new();
    let n = graph.add_struct(f.node, [("value", Value::from(3)), ("other", Value::from(2.5))]);
    let xml = encode(&graph, &Value::Object(n), &f.registry, &EncodeOptions::default());
    assert!(xml.contains("<value>3</value>"));
    assert!(xml.contains(r#"<other xsi:type="xsd:double">2.5</other>"#));
    assert!(xml.contains(r#"<next xsi:nil="true"/>"#));
}

#[test]
fn enum_in_any_slot_declares_its_namespace() {
    let mut f = fixture();
    let color = f.registry.define_enum(EnumDef::new(QName::new("urn:colors", "Color"), [("Red", 0), ("Blue", 2)]));
    let mut graph = Graph::new();
    let n = graph.add_struct(f.node, [("other", Value::Enum(crate::graph::EnumValue { def: color, value: 2 }))]);
    let xml = encode(&graph, &Value::Object(n), &f.registry, &EncodeOptions::default());
    assert!(xml.contains(r#"<other xmlns:q2="urn:colors" xsi:type="q2:Color">Blue</other>"#));

    let (decoded, _) = decode_str_collecting(&xml, &f.registry, &DecodeOptions::default()).unwrap();
    let root = decoded.root.as_object().unwrap();
    assert_eq!(
        decoded.graph.field(root, "other"),
        Some(&Value::Enum(crate::graph::EnumValue { def: color, value: 2 }))
    );
}

#[test]
fn unregistered_enum_value_fails() {
    let mut registry = Registry::new();
    let e = registry.define_enum(EnumDef::new(QName::new("urn:e", "E"), [("A", 1)]));
    let root = Value::Enum(crate::graph::EnumValue { def: e, value: 5 });
    let err = encode_to_string(&Graph::new(), &root, &registry, &EncodeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnknownEnumValue { .. }));
}

#[test]
fn unregistered_derived_type_uses_base_name() {
    let mut f = fixture();
    let derived = f.registry.add_struct(StructDef {
        name: QName::new("urn:test", "Special"),
        base: Some(f.node),
        fields: vec![FieldDef::new("extra", NativeType::Primitive(PrimitiveKind::String))],
    });
    let mut graph = Graph::new();
    let d = graph.add_struct(derived, [("value", Value::from(1)), ("extra", Value::from("x"))]);
    let xml = encode(&graph, &Value::Object(d), &f.registry, &EncodeOptions::default());
    assert!(xml.contains(r#"<q1:Node xmlns:q1="urn:test" id="id1" xsi:type="q1:Node">"#));
    assert!(xml.contains("<extra>x</extra>"));
}

#[test]
fn qname_value_declares_prefix() {
    let root = Value::Primitive(Primitive::QName(QName::new("urn:names", "thing")));
    let xml = encode(&Graph::new(), &root, &Registry::new(), &EncodeOptions::default());
    assert!(xml.contains(r#"<xsd:QName xsi:type="xsd:QName" xmlns:q1="urn:names">q1:thing</xsd:QName>"#));
}

#[test]
fn untyped_object_is_written_back() {
    let f = fixture();
    let inner = r#"<Body xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:o="urn:other"><o:Thing id="x" o:flag="on">hi</o:Thing></Body>"#;
    let (decoded, _) = decode_str_collecting(inner, &f.registry, &DecodeOptions::default()).unwrap();
    let xml = encode(&decoded.graph, &decoded.root, &f.registry, &EncodeOptions::default());
    assert!(xml.contains(r#"<q1:Thing xmlns:q1="urn:other" id="id1" q1:flag="on">hi</q1:Thing>"#));
}

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn soap11_int_array() {
    let mut graph = Graph::new();
    let a = graph.add_array(
        NativeType::Primitive(PrimitiveKind::Int),
        vec![Value::from(1), Value::from(2), Value::from(3)],
    );
    let xml = encode(&graph, &Value::Object(a), &Registry::new(), &EncodeOptions::default());
    assert!(xml.contains(
        r#"<soapenc:Array id="id1" soapenc:arrayType="xsd:int[3]"><Item>1</Item><Item>2</Item><Item>3</Item></soapenc:Array>"#
    ));
}

#[test]
fn soap12_int_array() {
    let mut graph = Graph::new();
    let a = graph.add_array(NativeType::Primitive(PrimitiveKind::Int), vec![Value::from(1), Value::from(2)]);
    let xml = encode(&graph, &Value::Object(a), &Registry::new(), &soap12());
    assert!(xml.contains(r#"<env:Body xmlns:env="http://www.w3.org/2003/05/soap-envelope""#));
    assert!(xml.contains(
        r#"<enc:Array enc:id="id1" enc:itemType="xsd:int" enc:arraySize="2"><Item>1</Item><Item>2</Item></enc:Array>"#
    ));
}

#[test]
fn jagged_array_type() {
    let inner_ty = NativeType::Primitive(PrimitiveKind::String);
    let mut graph = Graph::new();
    let inner = graph.add_array(inner_ty.clone(), vec![Value::from("a")]);
    let outer = graph.add_array(NativeType::array_of(inner_ty), vec![Value::Object(inner)]);

    let xml = encode(&graph, &Value::Object(outer), &Registry::new(), &EncodeOptions::default());
    assert!(xml.contains(r#"soapenc:arrayType="xsd:string[][1]""#));
    assert!(xml.contains(r##"<Item href="#id2"/>"##));
    assert!(xml.contains(r#"<soapenc:Array id="id2" soapenc:arrayType="xsd:string[1]"><Item>a</Item></soapenc:Array>"#));

    let xml = encode(&graph, &Value::Object(outer), &Registry::new(), &soap12());
    assert!(xml.contains(r#"enc:itemType="xsd:string[]" enc:arraySize="1""#));
    assert!(xml.contains(r#"<Item enc:id="id2" enc:itemType="xsd:string" enc:arraySize="1">"#));
}

#[test]
fn unregistered_item_type() {
    let mut registry = Registry::new();
    let hidden = registry.add_struct(StructDef {
        name: QName::new("urn:test", "Hidden"),
        base: None,
        fields: vec![],
    });
    let mut graph = Graph::new();
    let a = graph.add_array(NativeType::Struct(hidden), vec![]);

    let err = encode_to_string(&graph, &Value::Object(a), &registry, &EncodeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnknownStructType(_)));

    let xml = encode(&graph, &Value::Object(a), &registry, &soap12());
    assert!(xml.contains(r#"enc:itemType="xsd:anyType" enc:arraySize="0"/>"#));
}

#[test]
fn any_array_items_carry_xsi_type() {
    let mut graph = Graph::new();
    let a = graph.add_array(NativeType::Any, vec![Value::from(1), Value::from("s"), Value::Null]);
    let xml = encode(&graph, &Value::Object(a), &Registry::new(), &EncodeOptions::default());
    assert!(xml.contains(r#"soapenc:arrayType="xsd:anyType[3]""#));
    assert!(xml.contains(r#"<Item xsi:type="xsd:int">1</Item><Item xsi:type="xsd:string">s</Item><Item xsi:nil="true"/>"#));
}

// ============================================================================
// Prefixe
// ============================================================================

#[test]
fn generated_prefixes_skip_caller_prefixes() {
    let mut registry = Registry::new();
    let e1 = registry.define_enum(EnumDef::new(QName::new("urn:e1", "E1"), [("On", 1)]));
    let e2 = registry.define_enum(EnumDef::new(QName::new("urn:e2", "E2"), [("Off", 0)]));
    let pair = registry.define_struct(
        QName::new("urn:x", "Pair"),
        None,
        vec![FieldDef::new("first", NativeType::Any), FieldDef::new("second", NativeType::Any)],
    );
    let mut graph = Graph::new();
    let p = graph.add_struct(
        pair,
        [
            ("first", Value::Enum(crate::graph::EnumValue { def: e1, value: 1 })),
            ("second", Value::Enum(crate::graph::EnumValue { def: e2, value: 0 })),
        ],
    );
    let options = EncodeOptions::default().with_namespace("q1", "urn:a").with_namespace("q2", "urn:b");
    let xml = encode(&graph, &Value::Object(p), &registry, &options);

    assert!(xml.contains(r#"xmlns:q3="urn:x""#));
    assert!(xml.contains(r#"<first xmlns:q4="urn:e1" xsi:type="q4:E1">On</first>"#));
    assert!(xml.contains(r#"<second xmlns:q5="urn:e2" xsi:type="q5:E2">Off</second>"#));
    assert_eq!(xml.matches("xmlns:q1=").count(), 1);
    assert_eq!(xml.matches("xmlns:q2=").count(), 1);
}

#[test]
fn caller_binding_for_type_namespace_is_reused() {
    let f = fixture();
    let mut graph = Graph::new();
    let n = graph.add_struct(f.node, [("value", Value::from(1))]);
    let options = EncodeOptions::default().with_namespace("t", "urn:test");
    let xml = encode(&graph, &Value::Object(n), &f.registry, &options);
    assert!(xml.contains(r#"<t:Node id="id1" xsi:type="t:Node">"#));
    assert!(!xml.contains("xmlns:q1"));
}

#[test]
fn without_standard_declarations() {
    let options = EncodeOptions::default().without_standard_declarations();
    let xml = encode(&Graph::new(), &Value::from(true), &Registry::new(), &options);
    assert!(xml.contains(r#"<q1:boolean xmlns:q1="http://www.w3.org/2001/XMLSchema" xmlns:q2="http://www.w3.org/2001/XMLSchema-instance" q2:type="q1:boolean">true</q1:boolean>"#));
}

// ============================================================================
// Sonstiges
// ============================================================================

#[test]
fn missing_fields_are_nil_and_extra_fields_dropped() {
    let f = fixture();
    let mut graph = Graph::new();
    let n = graph.add(Object::Struct {
        def: f.node,
        fields: [("bogus".to_string(), Value::from(1))].into_iter().collect(),
    });
    let xml = encode(&graph, &Value::Object(n), &f.registry, &EncodeOptions::default());
    assert!(xml.contains(r#"<value xsi:nil="true"/>"#));
    assert!(!xml.contains("bogus"));
}

#[test]
fn indented_output() {
    let options = EncodeOptions::default().with_indent(2).without_standard_declarations();
    let xml = encode(&Graph::new(), &Value::Null, &Registry::new(), &options);
    assert!(xml.contains("\n  <q1:anyType"));
    assert!(xml.ends_with("\n</soap:Body>"));
}
