use log::{trace, warn};

use crate::encoder::Encoder;
use crate::graph::{Object, ObjectId, UntypedElement, Value};
use crate::lexical::{self, Primitive};
use crate::namespace::{SOAP12_ENC_NS, attr, is_instance_namespace, is_protocol_attribute};
use crate::options::EncodingStyle;
use crate::qname::QName;
use crate::registry::{NativeType, StructId, ur_type_name};
use crate::writer::MarkupWriter;
use crate::{FastIndexMap, Result};

const NULL: Value = Value::Null;

impl<W: MarkupWriter> Encoder<'_, W> {

    /// First child of the container. Objects get an id, scalars are named
    /// after their type and always carry `xsi:type`.
    pub(super) fn write_root(&mut self, root: &Value) -> Result<()> {
        match root {
            Value::Null => {
                self.start_qualified(&ur_type_name())?;
                self.write_nil()?;
                self.writer.end_element()
            }
            Value::Primitive(p) => {
                let type_name = p.kind().qname();
                self.start_qualified(&type_name)?;
                self.write_xsi_type(&type_name)?;
                self.write_primitive_text(p)?;
                self.writer.end_element()
            }
            Value::Enum(e) => {
                let registry = self.registry;
                let def = registry.enum_def(e.def);
                self.start_qualified(&def.name)?;
                self.write_xsi_type(&def.name)?;
                self.writer.write_text(&def.format(e.value)?)?;
                self.writer.end_element()
            }
            Value::Object(obj) => self.write_referenced_element(*obj, None, None),
        }
    }

    /// Writes an object in full, with its id. `name` overrides the element
    /// name; `ambient` is the static type of the slot, if any.
    pub(super) fn write_referenced_element(
        &mut self,
        obj: ObjectId,
        name: Option<QName>,
        ambient: Option<&NativeType>,
    ) -> Result<()> {
        let graph = self.graph;
        match graph.get(obj) {
            Object::Struct { def, fields } => self.write_struct(obj, *def, fields, name, ambient),
            Object::Array { element_type, items } => self.write_array(obj, element_type, items, name),
            Object::Untyped(element) => self.write_untyped(obj, element, name),
        }
    }

    /// Writes one slot: nil, an inline scalar, or a reference to an object.
    ///
    /// SOAP 1.2 writes an object inline on its first occurrence; SOAP 1.1
    /// always writes `href` and queues the object for the soup.
    pub(super) fn write_potentially_referencing(&mut self, name: &QName, slot_ty: &NativeType, value: &Value) -> Result<()> {
        match value {
            Value::Null => {
                self.start_qualified(name)?;
                self.write_nil()?;
            }
            Value::Primitive(p) => {
                self.start_qualified(name)?;
                if *slot_ty != NativeType::Primitive(p.kind()) {
                    self.write_xsi_type(&p.kind().qname())?;
                }
                self.write_primitive_text(p)?;
            }
            Value::Enum(e) => {
                let registry = self.registry;
                let def = registry.enum_def(e.def);
                self.start_qualified(name)?;
                self.write_xsi_type(&def.name)?;
                self.writer.write_text(&def.format(e.value)?)?;
            }
            Value::Object(obj) => {
                let style = self.options.style();
                if style.inline_first_occurrence() && !self.refs.is_declared(*obj) {
                    return self.write_referenced_element(*obj, Some(name.clone()), Some(slot_ty));
                }
                let id = self.refs.id_for(*obj, true);
                self.start_qualified(name)?;
                match style {
                    EncodingStyle::Soap11 => self.writer.write_attribute("", attr::HREF, "", &format!("#{id}"))?,
                    EncodingStyle::Soap12 => {
                        let prefix = self.prefix_for(SOAP12_ENC_NS);
                        self.writer.write_attribute(&prefix, attr::REF, SOAP12_ENC_NS, &id)?;
                    }
                }
            }
        }
        self.writer.end_element()
    }

    /// `id="..."` (SOAP 1.1) or `enc:id="..."` (SOAP 1.2) on the open element.
    pub(super) fn write_id(&mut self, obj: ObjectId) -> Result<()> {
        let id = self.refs.id_for(obj, false);
        match self.options.style() {
            EncodingStyle::Soap11 => self.writer.write_attribute("", attr::ID, "", &id),
            EncodingStyle::Soap12 => {
                let prefix = self.prefix_for(SOAP12_ENC_NS);
                self.writer.write_attribute(&prefix, attr::ID, SOAP12_ENC_NS, &id)
            }
        }
    }

    fn write_primitive_text(&mut self, value: &Primitive) -> Result<()> {
        let text = {
            let writer = &mut self.writer;
            let prefixes = &mut self.prefixes;
            lexical::format(value, &mut |ns| {
                if let Some(p) = writer.lookup_prefix(ns).filter(|p| !p.is_empty()).map(str::to_string) {
                    return Ok(p);
                }
                let p = prefixes.next_prefix();
                writer.write_namespace_declaration(&p, ns)?;
                Ok(p)
            })?
        };
        self.writer.write_text(&text)
    }

    // ========================================================================
    // Objekte
    // ========================================================================

    fn write_struct(
        &mut self,
        obj: ObjectId,
        def: StructId,
        fields: &FastIndexMap<String, Value>,
        name: Option<QName>,
        ambient: Option<&NativeType>,
    ) -> Result<()> {
        let registry = self.registry;
        let type_name = registry.type_name_for(&NativeType::Struct(def));
        let element = name.unwrap_or_else(|| type_name.clone());
        self.start_qualified(&element)?;
        self.write_id(obj)?;
        if ambient != Some(&NativeType::Struct(def)) {
            self.write_xsi_type(&type_name)?;
        }

        let defs = registry.fields(def);
        for field in &defs {
            let value = fields.get(&field.name).unwrap_or(&NULL);
            self.write_potentially_referencing(&QName::new("", field.name.as_str()), &field.ty, value)?;
        }
        for extra in fields.keys().filter(|k| !defs.iter().any(|f| &f.name == *k)) {
            warn!("field '{extra}' is not part of {} and is not written", registry.display(&NativeType::Struct(def)));
        }
        self.writer.end_element()
    }

    /// Writes a captured element back out. Protocol attributes of the
    /// capture are replaced by this document's id and `xsi:type`.
    fn write_untyped(&mut self, obj: ObjectId, element: &UntypedElement, name: Option<QName>) -> Result<()> {
        let element_name = name.unwrap_or_else(|| element.name.clone());
        self.start_qualified(&element_name)?;
        self.write_id(obj)?;
        if let Some(type_name) = &element.type_name {
            self.write_xsi_type(type_name)?;
        }
        for (name, value) in element.attributes.iter().filter(|(n, _)| !is_protocol_attribute(n)) {
            self.write_foreign_attribute(name, value)?;
        }
        self.write_captured_content(element)?;
        self.writer.end_element()
    }

    fn write_captured_child(&mut self, element: &UntypedElement) -> Result<()> {
        self.start_qualified(&element.name)?;
        if let Some(type_name) = &element.type_name {
            self.write_xsi_type(type_name)?;
        }
        for (name, value) in &element.attributes {
            // xsi:type wurde oben neu qualifiziert
            if &*name.local_name == attr::TYPE && is_instance_namespace(&name.uri) {
                continue;
            }
            self.write_foreign_attribute(name, value)?;
        }
        self.write_captured_content(element)?;
        self.writer.end_element()
    }

    fn write_captured_content(&mut self, element: &UntypedElement) -> Result<()> {
        if !element.text.is_empty() {
            self.writer.write_text(&element.text)?;
        }
        trace!("{} captured children of {}", element.children.len(), element.name);
        for child in &element.children {
            self.write_captured_child(child)?;
        }
        Ok(())
    }

    fn write_foreign_attribute(&mut self, name: &QName, value: &str) -> Result<()> {
        if name.uri.is_empty() {
            return self.writer.write_attribute("", &name.local_name, "", value);
        }
        let prefix = self.prefix_for(&name.uri);
        self.writer.write_attribute(&prefix, &name.local_name, &name.uri, value)
    }
}
