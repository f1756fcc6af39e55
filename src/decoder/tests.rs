use super::*;
use crate::events::{CollectEvents, Diagnostic, IgnoreEvents};
use crate::graph::Object;
use crate::lexical::{EnumDef, Primitive, PrimitiveKind};
use crate::registry::FieldDef;

const NS: &str = r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:soapenc="http://schemas.xmlsoap.org/soap/encoding/" xmlns:enc="http://www.w3.org/2003/05/soap-encoding" xmlns:t="urn:test""#;

struct Fixture {
    registry: Registry,
    node: crate::registry::StructId,
}

fn fixture() -> Fixture {
    let mut registry = Registry::new();
    let node = registry.define_struct(QName::new("urn:test", "Node"), None, vec![]);
    // Node referenziert sich selbst: Felder erst nach der Id
    registry.add_fields(
        node,
        vec![
            FieldDef::new("value", NativeType::Primitive(PrimitiveKind::Int)),
            FieldDef::new("next", NativeType::Struct(node)),
        ],
    );
    let color = registry.define_enum(EnumDef::new(QName::new("urn:test", "Color"), [("Red", 0), ("Blue", 2)]));
    registry.define_struct(
        QName::new("urn:test", "Holder"),
        None,
        vec![
            FieldDef::new("item", NativeType::Any),
            FieldDef::new("items", NativeType::array_of(NativeType::Any)),
            FieldDef::new("numbers", NativeType::array_of(NativeType::Primitive(PrimitiveKind::Int))),
            FieldDef::new("color", NativeType::Enum(color)),
            FieldDef::new("node", NativeType::Struct(node)),
        ],
    );
    Fixture { registry, node }
}

fn body(inner: &str) -> String {
    format!("<Body {NS}>{inner}</Body>")
}

fn decode(f: &Fixture, inner: &str) -> Result<(Decoded, CollectEvents)> {
    decode_str_collecting(&body(inner), &f.registry, &DecodeOptions::default())
}

fn int(v: i32) -> Value {
    Value::Primitive(Primitive::Int(v))
}

// ============================================================================
// Wurzel und Primitive
// ============================================================================

#[test]
fn primitive_root() {
    let f = fixture();
    let (d, events) = decode(&f, r#"<v xsi:type="xsd:int"> 7 </v>"#).unwrap();
    assert_eq!(d.root, int(7));
    assert!(events.diagnostics.is_empty());
}

#[test]
fn empty_container_is_an_error() {
    let f = fixture();
    assert_eq!(decode(&f, "").unwrap_err(), Error::EmptyDocument);
    let mut sink = IgnoreEvents;
    assert_eq!(
        decode_str("  ", &f.registry, &DecodeOptions::default(), &mut sink).unwrap_err(),
        Error::EmptyDocument
    );
}

#[test]
fn nil_root_is_null() {
    let f = fixture();
    let (d, _) = decode(&f, r#"<t:Node xsi:nil="true"/>"#).unwrap();
    assert_eq!(d.root, Value::Null);
    let (d, _) = decode(&f, r#"<t:Node xmlns:x99="http://www.w3.org/1999/XMLSchema-instance" x99:null="1"/>"#).unwrap();
    assert_eq!(d.root, Value::Null);
}

// ============================================================================
// Referenzen
// ============================================================================

#[test]
fn forward_reference_in_permuted_soup() {
    let f = fixture();
    let doc = r##"
        <t:Node id="id2"><value>1</value><next href="#id1"/></t:Node>
        <t:Node id="id1"><value>5</value></t:Node>"##;
    let (d, events) = decode(&f, doc).unwrap();
    let b = d.root.as_object().unwrap();
    let a = d.graph.field(b, "next").unwrap().as_object().unwrap();
    assert_eq!(d.graph.field(a, "value"), Some(&int(5)));
    assert!(events.diagnostics.is_empty(), "{:?}", events.diagnostics);
}

#[test]
fn cycle_resolves_to_the_same_instances() {
    let f = fixture();
    let doc = r##"
        <t:Node id="a"><value>1</value><next href="#b"/></t:Node>
        <t:Node id="b"><value>2</value><next href="#a"/></t:Node>"##;
    let (d, events) = decode(&f, doc).unwrap();
    let a = d.root.as_object().unwrap();
    let b = d.graph.field(a, "next").unwrap().as_object().unwrap();
    assert_ne!(a, b);
    assert_eq!(d.graph.field(b, "next"), Some(&Value::Object(a)));
    assert!(events.unreferenced_ids().is_empty());
}

#[test]
fn missing_target_is_fatal() {
    let f = fixture();
    let doc = r##"<t:Node><next href="#missing"/></t:Node>"##;
    assert_eq!(decode(&f, doc).unwrap_err(), Error::UnresolvedReference("missing".into()));
}

#[test]
fn href_without_hash() {
    let f = fixture();
    let doc = r#"<t:Node><next href="id1"/></t:Node>"#;
    assert_eq!(decode(&f, doc).unwrap_err(), Error::MissingHref("id1".into()));
}

#[test]
fn root_reference_resolves_after_scan() {
    let f = fixture();
    let doc = r##"<root href="#n"/><t:Node id="n"><value>3</value></t:Node>"##;
    let (d, events) = decode(&f, doc).unwrap();
    let n = d.root.as_object().unwrap();
    assert_eq!(d.graph.field(n, "value"), Some(&int(3)));
    assert!(events.diagnostics.is_empty());
}

#[test]
fn field_reference_type_mismatch() {
    let f = fixture();
    let doc = r##"<t:Node><next href="#h"/></t:Node><t:Holder id="h"/>"##;
    assert!(matches!(decode(&f, doc).unwrap_err(), Error::ReferenceType { id, .. } if id == "h"));
}

#[test]
fn inline_value_of_wrong_type() {
    let f = fixture();
    let doc = r#"<t:Node><value xsi:type="xsd:string">abc</value></t:Node>"#;
    assert_eq!(
        decode(&f, doc).unwrap_err(),
        Error::SlotType { element: "value".into(), expected: "int".into(), actual: "string".into() }
    );

    // Array-Item und Feld mit Struct-Typ
    let doc = r#"<t:Holder><numbers soapenc:arrayType="xsd:int[1]"><Item xsi:type="xsd:boolean">true</Item></numbers></t:Holder>"#;
    assert!(matches!(decode(&f, doc).unwrap_err(), Error::SlotType { .. }));
    let doc = r#"<t:Holder><node xsi:type="t:Holder"/></t:Holder>"#;
    assert!(matches!(decode(&f, doc).unwrap_err(), Error::SlotType { .. }));
}

#[test]
fn open_array_type_takes_slot_item_type() {
    let f = fixture();
    let doc = r#"<t:Holder><numbers enc:arraySize="2"><Item>3</Item><Item>4</Item></numbers></t:Holder>"#;
    let (d, _) = decode(&f, doc).unwrap();
    let arr = d.graph.field(d.root.as_object().unwrap(), "numbers").unwrap().as_object().unwrap();
    assert_eq!(d.graph.items(arr).unwrap(), &[int(3), int(4)]);
}

#[test]
fn soap12_ref_and_id() {
    let f = fixture();
    let doc = r#"<t:Node><next enc:ref="x"/></t:Node><t:Node enc:id="x"><value>9</value></t:Node>"#;
    let (d, _) = decode(&f, doc).unwrap();
    let next = d.graph.field(d.root.as_object().unwrap(), "next").unwrap().as_object().unwrap();
    assert_eq!(d.graph.field(next, "value"), Some(&int(9)));
}

// ============================================================================
// Diagnosen
// ============================================================================

#[test]
fn exactly_one_unreferenced_diagnostic() {
    let f = fixture();
    let doc = r#"<t:Node><value>1</value></t:Node><t:Node id="lonely"><value>2</value></t:Node>"#;
    let (d, events) = decode(&f, doc).unwrap();
    assert_eq!(events.unreferenced_ids(), [Some("lonely")]);
    assert!(!d.references.is_referenced("lonely"));
}

#[test]
fn unknown_nodes_are_reported_and_skipped() {
    let f = fixture();
    let doc = "<t:Node extra=\"1\">\n<bogus><deep/></bogus><value>4</value></t:Node>";
    let (d, events) = decode(&f, doc).unwrap();
    assert_eq!(d.graph.field(d.root.as_object().unwrap(), "value"), Some(&int(4)));
    assert!(matches!(
        &events.diagnostics[0],
        Diagnostic::UnknownAttribute { name, value, .. } if &*name.local_name == "extra" && value == "1"
    ));
    assert!(matches!(
        &events.diagnostics[1],
        Diagnostic::UnknownElement { name, position } if &*name.local_name == "bogus" && position.line == 2
    ));
    assert_eq!(events.diagnostics.len(), 2);
}

// ============================================================================
// Typen
// ============================================================================

#[test]
fn unknown_xsi_type_in_any_slot_is_captured() {
    let f = fixture();
    let doc = r#"<t:Holder><item xsi:type="t:Mystery" a="b">text<x>1</x></item></t:Holder>"#;
    let (d, _) = decode(&f, doc).unwrap();
    let item = d.graph.field(d.root.as_object().unwrap(), "item").unwrap().as_object().unwrap();
    let Object::Untyped(u) = d.graph.get(item) else { panic!("expected capture") };
    assert_eq!(u.type_name, Some(QName::new("urn:test", "Mystery")));
    assert_eq!(u.text, "text");
    assert_eq!(u.children.len(), 1);
    assert_eq!(u.children[0].text, "1");
}

#[test]
fn unknown_xsi_type_in_typed_slot_fails() {
    let f = fixture();
    let doc = r#"<t:Holder><node xsi:type="t:Mystery"/></t:Holder>"#;
    assert!(matches!(decode(&f, doc).unwrap_err(), Error::UnknownType(_)));
    let doc = r#"<t:Holder><item xsi:type="xsd:nonsense">1</item></t:Holder>"#;
    assert!(matches!(decode(&f, doc).unwrap_err(), Error::UnknownType(_)));
}

#[test]
fn xsi_type_in_any_slot() {
    let f = fixture();
    let doc = r#"<t:Holder><item xsi:type="xsd:double">1.5E+20</item><color>Blue</color></t:Holder>"#;
    let (d, _) = decode(&f, doc).unwrap();
    let h = d.root.as_object().unwrap();
    assert_eq!(d.graph.field(h, "item"), Some(&Value::Primitive(Primitive::Double(1.5e20))));
    assert!(matches!(d.graph.field(h, "color"), Some(Value::Enum(e)) if e.value == 2));
}

#[test]
fn bad_lexical_form_aborts() {
    let f = fixture();
    let doc = r#"<t:Node><value>twelve</value></t:Node>"#;
    assert_eq!(decode(&f, doc).unwrap_err(), Error::format("int", "twelve"));
    let doc = r#"<t:Holder><color>Green</color></t:Holder>"#;
    assert!(matches!(decode(&f, doc).unwrap_err(), Error::UnknownEnumValue { .. }));
}

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn soap11_value_array() {
    let f = fixture();
    let doc = r#"<t:Holder><numbers soapenc:arrayType="xsd:int[3]"><Item>1</Item><Item>2</Item><Item>3</Item></numbers></t:Holder>"#;
    let (d, _) = decode(&f, doc).unwrap();
    let arr = d.graph.field(d.root.as_object().unwrap(), "numbers").unwrap().as_object().unwrap();
    assert_eq!(d.graph.items(arr).unwrap(), &[int(1), int(2), int(3)]);
}

#[test]
fn declared_length_is_advisory() {
    let f = fixture();
    let doc = r#"<a soapenc:arrayType="xsd:int[999999999]"><Item>1</Item></a>"#;
    let (d, _) = decode(&f, doc).unwrap();
    assert_eq!(d.graph.items(d.root.as_object().unwrap()).unwrap().len(), 1);
}

#[test]
fn reference_in_value_array_is_resolved() {
    let f = fixture();
    let doc = r##"<a soapenc:arrayType="xsd:int[2]"><Item>1</Item><Item href="#x"/></a><v id="x" xsi:type="xsd:int">5</v>"##;
    let (d, events) = decode(&f, doc).unwrap();
    assert_eq!(d.graph.items(d.root.as_object().unwrap()).unwrap(), &[int(1), int(5)]);
    assert!(events.diagnostics.is_empty());
}

#[test]
fn missing_reference_in_value_array_fails() {
    let f = fixture();
    let doc = r##"<a soapenc:arrayType="xsd:int[2]"><Item>1</Item><Item href="#missing"/></a>"##;
    assert_eq!(decode(&f, doc).unwrap_err(), Error::UnresolvedReference("missing".into()));

    let doc = r##"<a soapenc:arrayType="xsd:int[2]"><Item href="#s"/><Item>2</Item></a><v id="s" xsi:type="xsd:string">x</v>"##;
    assert!(matches!(
        decode(&f, doc).unwrap_err(),
        Error::ArrayElementType { id, index: 0, .. } if id == "s"
    ));
}

#[test]
fn multi_dimensional_array_rejected() {
    let f = fixture();
    let doc = r#"<a soapenc:arrayType="xsd:int[2,2]"/>"#;
    assert!(matches!(decode(&f, doc).unwrap_err(), Error::ArrayDimensions(_)));
}

#[test]
fn jagged_array() {
    let f = fixture();
    let doc = r##"<a soapenc:arrayType="xsd:int[][2]"><Item href="#r0"/><Item href="#r1"/></a>
        <b id="r0" soapenc:arrayType="xsd:int[1]"><Item>1</Item></b>
        <b id="r1" soapenc:arrayType="xsd:int[0]"/>"##;
    let (d, events) = decode(&f, doc).unwrap();
    let outer = d.root.as_object().unwrap();
    let rows = d.graph.items(outer).unwrap();
    assert_eq!(d.graph.items(rows[0].as_object().unwrap()).unwrap(), &[int(1)]);
    assert!(d.graph.items(rows[1].as_object().unwrap()).unwrap().is_empty());
    assert!(events.diagnostics.is_empty());
}

#[test]
fn referenced_item_of_wrong_type() {
    let f = fixture();
    let doc = r##"<a soapenc:arrayType="t:Node[2]"><Item xsi:nil="true"/><Item href="#h"/></a><t:Holder id="h"/>"##;
    assert!(matches!(
        decode(&f, doc).unwrap_err(),
        Error::ArrayElementType { id, index: 1, .. } if id == "h"
    ));
}

#[test]
fn soap11_unknown_item_type_fails() {
    let f = fixture();
    let doc = r#"<a soapenc:arrayType="t:Unknown[0]"/>"#;
    assert!(matches!(decode(&f, doc).unwrap_err(), Error::UnknownType(_)));
}

#[test]
fn soap12_array_narrows_to_common_type() {
    let f = fixture();
    let doc = r#"<a enc:arraySize="2"><Item xsi:type="t:Node"/><Item xsi:type="t:Node"/></a>"#;
    let (d, _) = decode(&f, doc).unwrap();
    let Object::Array { element_type, .. } = d.graph.get(d.root.as_object().unwrap()) else { panic!() };
    assert_eq!(element_type, &NativeType::Struct(f.node));

    let doc = r#"<a enc:arraySize="2"><Item xsi:type="t:Node"/><Item xsi:type="t:Holder"/></a>"#;
    let (d, _) = decode(&f, doc).unwrap();
    let Object::Array { element_type, .. } = d.graph.get(d.root.as_object().unwrap()) else { panic!() };
    assert_eq!(element_type, &NativeType::Any);

    let doc = r#"<a enc:itemType="xsd:anyType" enc:arraySize="*"><Item xsi:type="xsd:int">1</Item></a>"#;
    let (d, _) = decode(&f, doc).unwrap();
    let Object::Array { element_type, .. } = d.graph.get(d.root.as_object().unwrap()) else { panic!() };
    assert_eq!(element_type, &NativeType::Any);
}

#[test]
fn large_array_keeps_exact_length() {
    let f = fixture();
    let items: String = (0..1025).map(|i| format!("<Item>{i}</Item>")).collect();
    let doc = format!(r#"<a soapenc:arrayType="xsd:int[1025]">{items}</a>"#);
    let (d, _) = decode(&f, &doc).unwrap();
    let items = d.graph.items(d.root.as_object().unwrap()).unwrap();
    assert_eq!(items.len(), 1025);
    assert_eq!(items[1024], int(1024));
}

// ============================================================================
// Optionen
// ============================================================================

#[test]
fn root_attribute_selects_root() {
    let f = fixture();
    let doc = r#"<t:Node soapenc:root="0"><value>1</value></t:Node><t:Node soapenc:root="1"><value>2</value></t:Node>"#;
    let opts = DecodeOptions::default().with_root_attribute();
    let (d, events) = decode_str_collecting(&body(doc), &f.registry, &opts).unwrap();
    assert_eq!(d.graph.field(d.root.as_object().unwrap(), "value"), Some(&int(2)));
    // das erste Element ist nun anonymer Rest
    assert_eq!(events.unreferenced_ids(), [None]);
}

#[test]
fn strict_style_ignores_foreign_attributes() {
    let f = fixture();
    let doc = r#"<t:Node><next enc:ref="x"/></t:Node><t:Node enc:id="x"/>"#;
    let opts = DecodeOptions::default().with_strict_style();
    // SOAP 1.1 strikt: enc:ref ist nur ein unbekanntes Element-Attribut,
    // next wird als leerer Node gelesen
    let (d, _) = decode_str_collecting(&body(doc), &f.registry, &opts).unwrap();
    let next = d.graph.field(d.root.as_object().unwrap(), "next").unwrap();
    assert!(next.as_object().is_some());
}
