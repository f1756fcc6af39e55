//! Multi-ref decoder: markup -> object graph.
//!
//! Decoding runs in three phases:
//!
//! 1. **Scan**: every child of the container element is read once, in
//!    document order. Objects are built right away and registered under their
//!    id; every `href`/`ref` leaves `Null` in its slot and records a
//!    [`Fixup`](crate::fixup::Fixup).
//! 2. **Drain**: the fixups are resolved in registration order against the
//!    now complete id table.
//! 3. **Diagnostics**: every object that nothing referenced is reported to
//!    the [`DecodeEvents`] sink.
//!
//! # Beispiel
//!
//! ```
//! use multiref::{decode_str, DecodeOptions, IgnoreEvents, Registry, Value};
//!
//! let xml = r#"<Body xmlns:xsd="http://www.w3.org/2001/XMLSchema"
//!                    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
//!     <value xsi:type="xsd:int">42</value>
//! </Body>"#;
//! let decoded = decode_str(xml, &Registry::new(), &DecodeOptions::default(), &mut IgnoreEvents).unwrap();
//! assert_eq!(decoded.root, Value::from(42));
//! ```

mod api;
mod array;
mod value;

pub use api::{decode_str, decode_str_collecting};

use log::{debug, trace, warn};

use crate::cursor::{MarkupCursor, NodeKind, Position};
use crate::events::DecodeEvents;
use crate::fixup::{Fixup, FixupQueue};
use crate::graph::{Graph, Value};
use crate::lexical::parse_qname;
use crate::namespace::{
    SOAP12_ENC_NS, SOAP_ENC_NS, XSI_NS, XSI_NS_1999, XSI_NS_2000, attr, is_instance_namespace,
    is_protocol_attribute,
};
use crate::options::{DecodeOptions, EncodingStyle};
use crate::qname::QName;
use crate::reference::DecodeReferences;
use crate::registry::{NativeType, Registry};
use crate::{Error, Result};

/// Result of a decode.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub graph: Graph,
    pub root: Value,
    /// The id table after the drain, including the referenced flags.
    pub references: DecodeReferences,
}

/// What reading one element produced.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    Inline(Value),
    /// `href`/`ref` to an id; resolved in the drain phase.
    Reference(String),
}

/// One decode session over a markup cursor.
pub struct Decoder<'r, 'e, C: MarkupCursor> {
    cursor: C,
    registry: &'r Registry,
    options: DecodeOptions,
    events: &'e mut dyn DecodeEvents,
    graph: Graph,
    refs: DecodeReferences,
    fixups: FixupQueue,
}

impl<'r, 'e, C: MarkupCursor> Decoder<'r, 'e, C> {
    pub fn new(cursor: C, registry: &'r Registry, options: DecodeOptions, events: &'e mut dyn DecodeEvents) -> Self {
        Self {
            cursor,
            registry,
            options,
            events,
            graph: Graph::new(),
            refs: DecodeReferences::new(),
            fixups: FixupQueue::new(),
        }
    }

    /// Runs all three phases. The cursor must be positioned before the
    /// container element.
    pub fn decode(mut self) -> Result<Decoded> {
        debug!("scan phase");
        if self.cursor.move_to_content()? != NodeKind::StartElement {
            return Err(Error::EmptyDocument);
        }
        let container = self.cursor.name().clone();
        trace!("container {container}");
        self.cursor.read_start_element()?;

        let mut root: Option<Slot> = None;
        let mut first: Option<Slot> = None;
        loop {
            match self.cursor.move_to_content()? {
                NodeKind::StartElement => {
                    let is_root = root.is_none()
                        && (self.options.root_is_first_element() || self.has_root_marker());
                    let slot = self.read_slot(None)?;
                    match &slot {
                        // Root-Referenz: erst nach dem Scan aufloesbar
                        Slot::Reference(id) if is_root => self.fixups.push(Fixup::Root { id: id.clone() }),
                        Slot::Reference(id) if first.is_some() => {
                            warn!("top-level reference to '{id}' outside the root ignored");
                        }
                        _ => {}
                    }
                    if is_root {
                        root = Some(slot);
                    } else if first.is_none() {
                        first = Some(slot);
                    }
                }
                NodeKind::EndElement => {
                    self.cursor.advance()?;
                    break;
                }
                NodeKind::Text => self.cursor.advance()?,
                NodeKind::EndOfDocument => {
                    return Err(Error::Xml(format!("unexpected end of document inside {container}")));
                }
            }
        }
        // ohne root-Markierung ist das erste Element die Wurzel
        let root = root.or(first).ok_or(Error::EmptyDocument)?;

        debug!("drain phase: {} ids, {} fixups", self.refs.len(), self.fixups.len());
        let Self { registry, events, mut graph, mut refs, fixups, .. } = self;
        let resolved = fixups.drain(&mut graph, &mut refs, registry)?;
        let root = match (root, resolved) {
            (_, Some(value)) => value,
            (Slot::Inline(value), None) => value,
            (Slot::Reference(id), None) => refs.get_target(&id)?,
        };
        refs.mark_referenced(&root);

        debug!("diagnostics phase");
        for u in refs.unreferenced() {
            events.unreferenced_object(u.id, u.value, u.position);
        }
        Ok(Decoded { graph, root, references: refs })
    }

    // ========================================================================
    // Protocol attributes
    // ========================================================================

    fn soap11_enabled(&self) -> bool {
        self.options.accept_both_styles() || self.options.style() == EncodingStyle::Soap11
    }

    fn soap12_enabled(&self) -> bool {
        self.options.accept_both_styles() || self.options.style() == EncodingStyle::Soap12
    }

    /// Target id of an `href="#id"` or `enc:ref="id"`.
    fn reference_id(&self) -> Result<Option<String>> {
        if self.soap11_enabled()
            && let Some(href) = self.cursor.attribute(attr::HREF, "")
        {
            return match href.strip_prefix('#') {
                Some(id) => Ok(Some(id.to_string())),
                None => Err(Error::MissingHref(href.to_string())),
            };
        }
        if self.soap12_enabled()
            && let Some(id) = self.cursor.attribute(attr::REF, SOAP12_ENC_NS)
        {
            return Ok(Some(id.trim_start_matches('#').to_string()));
        }
        Ok(None)
    }

    fn declared_id(&self) -> Option<String> {
        let soap11 = self.soap11_enabled().then(|| self.cursor.attribute(attr::ID, "")).flatten();
        let soap12 = || self.soap12_enabled().then(|| self.cursor.attribute(attr::ID, SOAP12_ENC_NS)).flatten();
        soap11.or_else(soap12).map(str::to_string)
    }

    /// `xsi:nil` / `xsi:null` with a true value, in any instance namespace.
    fn is_nil(&self) -> bool {
        [XSI_NS, XSI_NS_2000, XSI_NS_1999].iter().any(|ns| {
            [attr::NIL, attr::NULL]
                .iter()
                .filter_map(|local| self.cursor.attribute(local, ns))
                .any(|v| matches!(v.trim(), "true" | "1"))
        })
    }

    fn xsi_type(&self) -> Result<Option<QName>> {
        let value = self
            .cursor
            .attributes()
            .iter()
            .find(|a| &*a.name.local_name == attr::TYPE && is_instance_namespace(&a.name.uri))
            .map(|a| a.value.as_str());
        value.map(|v| parse_qname(v, self.cursor.scope())).transpose()
    }

    fn has_root_marker(&self) -> bool {
        self.cursor
            .attributes()
            .iter()
            .filter(|a| &*a.name.local_name == attr::ROOT)
            .filter(|a| matches!(&*a.name.uri, "" | SOAP_ENC_NS | SOAP12_ENC_NS))
            .any(|a| matches!(a.value.trim(), "1" | "true"))
    }

    /// Namespace declarations never show up as attributes; everything in an
    /// instance, encoding or envelope namespace is protocol.
    fn report_unknown_attributes(&mut self) {
        let position = self.cursor.position();
        for a in self.cursor.attributes() {
            if !is_protocol_attribute(&a.name) {
                self.events.unknown_attribute(&a.name, &a.value, position);
            }
        }
    }

    // ========================================================================
    // Slots
    // ========================================================================

    /// Reads the element under the cursor into a slot of type `ambient`
    /// (`None` for top-level elements) and consumes it.
    ///
    /// Order of checks: reference, nil, id, array markers, `xsi:type`, then
    /// the ambient type or the element name.
    pub(crate) fn read_slot(&mut self, ambient: Option<&NativeType>) -> Result<Slot> {
        if let Some(id) = self.reference_id()? {
            trace!("reference to '{id}' at {}", self.cursor.position());
            self.cursor.skip()?;
            return Ok(Slot::Reference(id));
        }
        if self.is_nil() {
            self.cursor.skip()?;
            return Ok(Slot::Inline(Value::Null));
        }
        let id = self.declared_id();
        let position = self.cursor.position();
        let name = self.cursor.name().clone();
        let value = self.read_value(ambient)?;
        if let Some(slot) = ambient {
            self.check_slot_type(&name, slot, &value)?;
        }
        self.refs.add_target(id.as_deref(), value.clone(), Some(position));
        // eingebettete Objekte gelten als referenziert
        if ambient.is_some() {
            self.refs.mark_referenced(&value);
        }
        Ok(Slot::Inline(value))
    }

    fn read_value(&mut self, ambient: Option<&NativeType>) -> Result<Value> {
        if let Some((desc, style, tag)) = self.array_descriptor()? {
            return self.read_array(&desc, style, &tag, ambient.and_then(NativeType::element_type));
        }
        if let Some(type_name) = self.xsi_type()? {
            return match self.registry.lookup_by_name(&type_name) {
                Some(desc) => self.read_typed(&desc.native, Some(type_name)),
                None if self.is_encoding_array(&type_name) => {
                    let element_type = ambient.and_then(NativeType::element_type).cloned().unwrap_or(NativeType::Any);
                    self.read_array_items(element_type, EncodingStyle::Soap11)
                }
                None if matches!(ambient, None | Some(NativeType::Any))
                    && !crate::namespace::is_primitive_namespace(&type_name.uri) =>
                {
                    self.read_untyped(Some(type_name))
                }
                None => Err(Error::UnknownType(type_name.to_string())),
            };
        }
        match ambient {
            Some(NativeType::Any) | None => {
                let name = self.cursor.name().clone();
                // unqualifizierte Namen nur auf oberster Ebene
                let by_name = (ambient.is_none() || !name.uri.is_empty())
                    .then(|| self.registry.lookup_by_name(&name))
                    .flatten();
                match by_name {
                    Some(desc) => self.read_typed(&desc.native, None),
                    None => self.read_untyped(None),
                }
            }
            Some(ty) => self.read_typed(&ty.clone(), None),
        }
    }

    /// Inline values must fit their slot just like referenced ones do.
    fn check_slot_type(&self, element: &QName, slot: &NativeType, value: &Value) -> Result<()> {
        let Some(actual) = self.graph.type_of(value) else {
            return Ok(());
        };
        if self.registry.is_assignable(&actual, slot) {
            return Ok(());
        }
        Err(Error::SlotType {
            element: element.to_string(),
            expected: self.registry.display(slot),
            actual: self.registry.display(&actual),
        })
    }

    /// `xsi:type="soapenc:Array"` without array markers.
    fn is_encoding_array(&self, name: &QName) -> bool {
        &*name.local_name == crate::namespace::ARRAY_ELEMENT && matches!(&*name.uri, SOAP_ENC_NS | SOAP12_ENC_NS)
    }

    fn read_typed(&mut self, native: &NativeType, type_name: Option<QName>) -> Result<Value> {
        match native {
            NativeType::Any => self.read_untyped(type_name),
            NativeType::Primitive(kind) => Ok(Value::Primitive(self.read_primitive(*kind)?)),
            NativeType::Enum(def) => self.read_enum(*def),
            NativeType::Struct(def) => self.read_struct(*def),
            NativeType::Array(element) => self.read_array_items((**element).clone(), self.options.style()),
        }
    }

    fn position(&self) -> Position {
        self.cursor.position()
    }
}

#[cfg(test)]
mod tests;
