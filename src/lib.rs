//! multiref – SOAP multi-reference object graph encoding (SOAP 1.1 section 5
//! and SOAP 1.2 encoding)
//!
//! An object graph with shared references and cycles is written as a root
//! element plus a "soup" of top-level elements that point at each other via
//! `href="#id"` (SOAP 1.1) or `enc:ref="id"` (SOAP 1.2). Reading resolves
//! forward references with a fixup queue that is drained after the scan.
//!
//! # Beispiel
//!
//! ```
//! use multiref::{
//!     decode_str_collecting, encode_to_string, DecodeOptions, EncodeOptions, FieldDef, Graph,
//!     NativeType, PrimitiveKind, QName, Registry, Value,
//! };
//!
//! let mut registry = Registry::new();
//! let node = registry.define_struct(QName::new("urn:demo", "Node"), None, vec![]);
//! registry.add_fields(node, vec![
//!     FieldDef::new("value", NativeType::Primitive(PrimitiveKind::Int)),
//!     FieldDef::new("next", NativeType::Struct(node)),
//! ]);
//!
//! // Zyklus: a -> b -> a
//! let mut graph = Graph::new();
//! let a = graph.add_struct(node, [("value", Value::from(1))]);
//! let b = graph.add_struct(node, [("value", Value::from(2)), ("next", Value::Object(a))]);
//! graph.set_field(a, "next", Value::Object(b));
//!
//! let xml = encode_to_string(&graph, &Value::Object(a), &registry, &EncodeOptions::default()).unwrap();
//! let (decoded, diagnostics) = decode_str_collecting(&xml, &registry, &DecodeOptions::default()).unwrap();
//! assert!(diagnostics.diagnostics.is_empty());
//! assert!(graph.is_isomorphic(&Value::Object(a), &decoded.graph, &decoded.root));
//! ```

pub mod array;
pub mod cursor;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod events;
pub mod fixup;
pub mod graph;
pub mod lexical;
pub mod namespace;
pub mod options;
pub mod prefix;
pub mod qname;
pub mod reference;
pub mod registry;
pub mod writer;

pub use error::{Error, Result};

/// HashMap mit ahash (schneller, nicht DoS-resistent, für interne Datenstrukturen).
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// HashSet mit ahash.
pub(crate) type FastHashSet<K> = hashbrown::HashSet<K, ahash::RandomState>;

/// IndexMap mit ahash (deterministische Iteration + schnelles Hashing).
pub(crate) type FastIndexMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;

// Public API: Decode
pub use decoder::{decode_str, decode_str_collecting, Decoded, Decoder};
pub use events::{CollectEvents, DecodeEvents, Diagnostic, IgnoreEvents};

// Public API: Encode
pub use encoder::{encode_to_string, encode_to_writer, Encoder};

// Public API: Options
pub use options::{DecodeOptions, EncodeOptions, EncodingStyle};

// Public API: Typen und Graph
pub use graph::{EnumValue, Graph, Object, ObjectId, UntypedElement, Value};
pub use lexical::{EnumDef, Primitive, PrimitiveKind};
pub use qname::QName;
pub use registry::{EnumId, FieldDef, NativeType, Registry, StructDef, StructId, TypeDescriptor};

// Public API: Markup
pub use cursor::{MarkupCursor, Position, XmlCursor};
pub use writer::{MarkupWriter, XmlMarkupWriter};
