use crate::cursor::{MarkupCursor, NodeKind};
use crate::decoder::{Decoder, Slot};
use crate::fixup::Fixup;
use crate::graph::{EnumValue, Object, UntypedElement, Value};
use crate::lexical::{self, BinaryAccumulator, BinaryEncoding, Primitive, PrimitiveKind};
use crate::qname::QName;
use crate::registry::{EnumId, StructId};
use crate::{Error, FastIndexMap, Result};

impl<C: MarkupCursor> Decoder<'_, '_, C> {

    fn read_text(&mut self) -> Result<String> {
        let mut text = String::new();
        self.cursor.read_text_chunks(&mut |chunk| {
            text.push_str(chunk);
            Ok(())
        })?;
        Ok(text)
    }

    /// Reads and consumes a primitive element. Binary content is decoded
    /// chunk by chunk.
    pub(super) fn read_primitive(&mut self, kind: PrimitiveKind) -> Result<Primitive> {
        if let Some(encoding) = kind.binary_encoding() {
            let mut acc = BinaryAccumulator::new(encoding);
            self.cursor.read_text_chunks(&mut |chunk| acc.push_chunk(chunk))?;
            self.cursor.advance()?;
            let bytes = acc.finish()?;
            return Ok(match encoding {
                BinaryEncoding::Base64 => Primitive::Base64(bytes),
                BinaryEncoding::Hex => Primitive::Hex(bytes),
            });
        }
        let text = self.read_text()?;
        // QName-Werte brauchen den Scope des Elements: erst parsen, dann weiter
        let value = lexical::parse(&text, kind, self.cursor.scope());
        self.cursor.advance()?;
        value
    }

    pub(super) fn read_enum(&mut self, def: EnumId) -> Result<Value> {
        let text = self.read_text()?;
        self.cursor.advance()?;
        let value = self.registry.enum_def(def).parse(&text)?;
        Ok(Value::Enum(EnumValue { def, value }))
    }

    /// Reads a struct element. The object exists (all fields null) before
    /// its children are read, so field fixups can name it.
    pub(super) fn read_struct(&mut self, def: StructId) -> Result<Value> {
        self.report_unknown_attributes();
        let registry = self.registry;
        let fields: FastIndexMap<String, Value> = registry
            .fields(def)
            .into_iter()
            .map(|f| (f.name.clone(), Value::Null))
            .collect();
        let object = self.graph.add(Object::Struct { def, fields });

        self.cursor.read_start_element()?;
        loop {
            match self.cursor.move_to_content()? {
                NodeKind::StartElement => {
                    let local = self.cursor.name().local_name.clone();
                    let Some(field) = registry.field(def, &local) else {
                        let (name, position) = (self.cursor.name().clone(), self.position());
                        self.events.unknown_element(&name, position);
                        self.cursor.skip()?;
                        continue;
                    };
                    match self.read_slot(Some(&field.ty))? {
                        Slot::Inline(value) => self.graph.set_field(object, &field.name, value),
                        Slot::Reference(id) => self.fixups.push(Fixup::Field {
                            object,
                            field: field.name.clone(),
                            id,
                            expected: field.ty.clone(),
                        }),
                    }
                }
                NodeKind::EndElement => {
                    self.cursor.advance()?;
                    return Ok(Value::Object(object));
                }
                // gemischter Inhalt wird ignoriert
                NodeKind::Text => self.cursor.advance()?,
                NodeKind::EndOfDocument => {
                    return Err(Error::Xml("unexpected end of document inside struct".into()));
                }
            }
        }
    }

    /// Captures the element under the cursor without interpreting it.
    pub(super) fn read_untyped(&mut self, type_name: Option<QName>) -> Result<Value> {
        let element = self.capture(type_name)?;
        Ok(Value::Object(self.graph.add(Object::Untyped(element))))
    }

    fn capture(&mut self, type_name: Option<QName>) -> Result<UntypedElement> {
        let mut element = UntypedElement {
            name: self.cursor.name().clone(),
            type_name,
            attributes: self
                .cursor
                .attributes()
                .iter()
                .map(|a| (a.name.clone(), a.value.clone()))
                .collect(),
            text: String::new(),
            children: Vec::new(),
        };
        self.cursor.read_start_element()?;
        loop {
            match self.cursor.node_kind() {
                NodeKind::Text => {
                    element.text.push_str(self.cursor.text());
                    self.cursor.advance()?;
                }
                NodeKind::StartElement => {
                    // xsi:type der Kinder nur als Information, Fehler egal
                    let child_type = self.xsi_type().ok().flatten();
                    element.children.push(self.capture(child_type)?);
                }
                NodeKind::EndElement => {
                    self.cursor.advance()?;
                    return Ok(element);
                }
                NodeKind::EndOfDocument => {
                    return Err(Error::Xml(format!("unexpected end of document inside {}", element.name)));
                }
            }
        }
    }
}
