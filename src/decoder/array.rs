use log::trace;

use crate::array::{ArrayDescriptor, ItemBuffer, parse_array_type, parse_soap12_array_type, resolve_element_type};
use crate::cursor::{MarkupCursor, NodeKind};
use crate::decoder::{Decoder, Slot};
use crate::fixup::Fixup;
use crate::graph::Value;
use crate::namespace::{SOAP12_ENC_NS, SOAP_ENC_NS, attr};
use crate::options::EncodingStyle;
use crate::registry::NativeType;
use crate::{Error, Result};

impl<C: MarkupCursor> Decoder<'_, '_, C> {

    /// Array markers of the current element, with the style they were
    /// written in and the raw attribute text for diagnostics.
    pub(super) fn array_descriptor(&self) -> Result<Option<(ArrayDescriptor, EncodingStyle, String)>> {
        let scope = self.cursor.scope();
        if self.soap11_enabled()
            && let Some(value) = self.cursor.attribute(attr::ARRAY_TYPE, SOAP_ENC_NS)
        {
            let desc = parse_array_type(value, scope)?;
            return Ok(Some((desc, EncodingStyle::Soap11, value.to_string())));
        }
        if self.soap12_enabled() {
            let item_type = self.cursor.attribute(attr::ITEM_TYPE, SOAP12_ENC_NS);
            let array_size = self.cursor.attribute(attr::ARRAY_SIZE, SOAP12_ENC_NS);
            if item_type.is_some() || array_size.is_some() {
                let desc = parse_soap12_array_type(item_type, array_size, scope)?;
                let tag = format!("{} [{}]", item_type.unwrap_or_default(), array_size.unwrap_or_default());
                return Ok(Some((desc, EncodingStyle::Soap12, tag)));
            }
        }
        Ok(None)
    }

    /// Reads an element that carries array markers. `ambient` is the item
    /// type of the slot, used when the markers leave it open.
    pub(super) fn read_array(
        &mut self,
        desc: &ArrayDescriptor,
        style: EncodingStyle,
        tag: &str,
        ambient: Option<&NativeType>,
    ) -> Result<Value> {
        desc.require_single_dimension(tag)?;
        let element_type = resolve_element_type(desc, self.registry, style, ambient)?;
        if let Some(declared) = desc.declared_length {
            // nur Hinweis, nie zur Allokation verwenden
            trace!("array {tag} declares {declared} items");
        }
        self.read_array_items(element_type, style)
    }

    /// Reads the items of the array element under the cursor.
    ///
    /// Items are read inline or as references; all references of one array
    /// end up in a single fixup, whatever the item type.
    pub(super) fn read_array_items(&mut self, element_type: NativeType, style: EncodingStyle) -> Result<Value> {
        let mut items = ItemBuffer::new();
        let mut ids: Vec<Option<String>> = Vec::new();
        let mut has_references = false;

        self.cursor.read_start_element()?;
        loop {
            match self.cursor.move_to_content()? {
                NodeKind::StartElement => match self.read_slot(Some(&element_type))? {
                    Slot::Inline(value) => {
                        items.push(value);
                        ids.push(None);
                    }
                    Slot::Reference(id) => {
                        items.push(Value::Null);
                        ids.push(Some(id));
                        has_references = true;
                    }
                },
                NodeKind::EndElement => {
                    self.cursor.advance()?;
                    break;
                }
                NodeKind::Text => self.cursor.advance()?,
                NodeKind::EndOfDocument => {
                    return Err(Error::Xml("unexpected end of document inside array".into()));
                }
            }
        }
        let items = items.finish();

        // referenzierte Items sind erst nach dem Drain bekannt: nicht einengen
        let element_type = if style == EncodingStyle::Soap12 && element_type == NativeType::Any && !has_references {
            self.narrow_element_type(&items).unwrap_or(NativeType::Any)
        } else {
            element_type
        };
        let array = self.graph.add_array(element_type, items);
        if has_references {
            self.fixups.push(Fixup::ArrayItems { array, ids });
        }
        Ok(Value::Object(array))
    }

    /// Common type of the items of an `anyType` array, if there is one.
    /// Value-type items keep the array untyped.
    fn narrow_element_type(&self, items: &[Value]) -> Option<NativeType> {
        let mut narrowed: Option<NativeType> = None;
        for item in items {
            let Some(ty) = self.graph.type_of(item) else { continue };
            if ty.is_value_type() || ty == NativeType::Any {
                return None;
            }
            narrowed = match narrowed {
                None => Some(ty),
                Some(current) if self.registry.is_assignable(&ty, &current) => Some(current),
                // Basistyp des bisherigen Typs: verbreitern
                Some(current) if self.registry.is_assignable(&current, &ty) => Some(ty),
                Some(_) => return None,
            };
        }
        narrowed
    }
}
