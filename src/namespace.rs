//! Well-known namespaces, protocol attribute names and the namespace scope
//! stack shared by the markup cursor and the markup writer.

use crate::qname::QName;
use crate::{Error, Result};

/// XML Schema namespace (primitive type names).
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
/// XML Schema instance namespace (`xsi:type`, `xsi:nil`).
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
/// Pre-recommendation instance namespaces, accepted on decode only.
pub const XSI_NS_2000: &str = "http://www.w3.org/2000/10/XMLSchema-instance";
pub const XSI_NS_1999: &str = "http://www.w3.org/1999/XMLSchema-instance";
/// Pre-recommendation schema namespaces, accepted on decode only.
pub const XSD_NS_2000: &str = "http://www.w3.org/2000/10/XMLSchema";
pub const XSD_NS_1999: &str = "http://www.w3.org/1999/XMLSchema";
/// SOAP 1.1 section 5 encoding namespace.
pub const SOAP_ENC_NS: &str = "http://schemas.xmlsoap.org/soap/encoding/";
/// SOAP 1.2 encoding namespace.
pub const SOAP12_ENC_NS: &str = "http://www.w3.org/2003/05/soap-encoding";
/// SOAP 1.1 envelope namespace (default container element).
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// SOAP 1.2 envelope namespace.
pub const SOAP12_ENV_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
/// Namespace for primitives without an XSD counterpart (`char`, `guid`).
pub const NON_XSD_TYPES_NS: &str = "http://microsoft.com/wsdl/types/";
/// The `xml` prefix namespace, always bound.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
/// The namespace of `xmlns` declarations themselves.
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";

/// Universal base type name (`xsd:anyType`).
pub const UR_TYPE: &str = "anyType";
/// Element name of SOAP 1.1 arrays (`soapenc:Array`).
pub const ARRAY_ELEMENT: &str = "Array";
/// Element name used for array items.
pub const ITEM_ELEMENT: &str = "Item";

/// Protocol attribute names.
pub mod attr {
    pub const ID: &str = "id";
    pub const HREF: &str = "href";
    pub const REF: &str = "ref";
    pub const TYPE: &str = "type";
    pub const NIL: &str = "nil";
    pub const NULL: &str = "null";
    pub const ARRAY_TYPE: &str = "arrayType";
    pub const ITEM_TYPE: &str = "itemType";
    pub const ARRAY_SIZE: &str = "arraySize";
    pub const ROOT: &str = "root";
}

/// True for namespaces whose type names denote primitives.
pub fn is_primitive_namespace(ns: &str) -> bool {
    matches!(
        ns,
        XSD_NS | SOAP_ENC_NS | SOAP12_ENC_NS | NON_XSD_TYPES_NS | XSD_NS_2000 | XSD_NS_1999
    )
}

/// True for the xsi namespaces (current and pre-recommendation).
pub fn is_instance_namespace(ns: &str) -> bool {
    matches!(ns, XSI_NS | XSI_NS_2000 | XSI_NS_1999)
}

/// Attributes that belong to the encoding itself: unqualified
/// `id`/`href`/`root` and everything in the xsi, encoding and envelope
/// namespaces.
pub fn is_protocol_attribute(name: &QName) -> bool {
    match &*name.uri {
        "" => matches!(&*name.local_name, attr::ID | attr::HREF | attr::ROOT),
        ns => is_instance_namespace(ns) || matches!(ns, SOAP_ENC_NS | SOAP12_ENC_NS | SOAP_ENV_NS | SOAP12_ENV_NS),
    }
}

/// One prefix binding.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    prefix: String,
    uri: String,
}

/// Stack of prefix bindings, one frame per open element.
///
/// A binding is visible in its frame and all descendants until the frame is
/// popped. Within one frame a prefix maps to at most one namespace. The empty
/// prefix is the default namespace.
#[derive(Debug, Clone, Default)]
pub struct NamespaceScope {
    bindings: Vec<Binding>,
    /// Start index into `bindings` per frame.
    frames: Vec<usize>,
}

impl NamespaceScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new (empty) frame.
    pub fn push_frame(&mut self) {
        self.frames.push(self.bindings.len());
    }

    /// Closes the innermost frame and drops its bindings.
    pub fn pop_frame(&mut self) {
        if let Some(start) = self.frames.pop() {
            self.bindings.truncate(start);
        }
    }

    fn current_frame(&self) -> &[Binding] {
        let start = self.frames.last().copied().unwrap_or(0);
        &self.bindings[start..]
    }

    /// Binds `prefix` to `uri` in the innermost frame.
    ///
    /// Rebinding to the same URI is a no-op; rebinding to another URI in the
    /// same frame is an error.
    pub fn bind(&mut self, prefix: &str, uri: &str) -> Result<()> {
        if let Some(existing) = self.current_frame().iter().find(|b| b.prefix == prefix) {
            if existing.uri == uri {
                return Ok(());
            }
            return Err(Error::DuplicateNamespace {
                prefix: prefix.to_string(),
                uri: uri.to_string(),
            });
        }
        self.bindings.push(Binding {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
        });
        Ok(())
    }

    /// Resolves a prefix. `xml` is always bound; the empty prefix resolves to
    /// the default namespace or `""` if none is declared.
    pub fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NS);
        }
        if let Some(b) = self.bindings.iter().rev().find(|b| b.prefix == prefix) {
            return Some(&b.uri);
        }
        if prefix.is_empty() { Some("") } else { None }
    }

    /// Finds the innermost prefix bound to `uri` that is not shadowed by a
    /// nearer binding of the same prefix.
    pub fn lookup_prefix(&self, uri: &str) -> Option<&str> {
        if uri == XML_NS {
            return Some("xml");
        }
        for (i, b) in self.bindings.iter().enumerate().rev() {
            if b.uri != uri {
                continue;
            }
            let shadowed = self.bindings[i + 1..].iter().any(|later| later.prefix == b.prefix);
            if !shadowed {
                return Some(&b.prefix);
            }
        }
        None
    }
}
