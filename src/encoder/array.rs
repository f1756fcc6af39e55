use log::trace;

use crate::array::{element_type_name, format_array_type};
use crate::encoder::Encoder;
use crate::graph::{ObjectId, Value};
use crate::namespace::{ARRAY_ELEMENT, ITEM_ELEMENT, attr};
use crate::options::EncodingStyle;
use crate::qname::QName;
use crate::registry::NativeType;
use crate::writer::MarkupWriter;
use crate::Result;

impl<W: MarkupWriter> Encoder<'_, W> {

    /// Writes an array with its markers and one `Item` per element. The
    /// written length is always the real item count.
    pub(super) fn write_array(
        &mut self,
        obj: ObjectId,
        element_type: &NativeType,
        items: &[Value],
        name: Option<QName>,
    ) -> Result<()> {
        let style = self.options.style();
        let (type_name, jagged) = element_type_name(element_type, self.registry, style)?;
        let encoding = style.encoding_namespace();
        let element = name.unwrap_or_else(|| QName::new(encoding, ARRAY_ELEMENT));

        self.start_qualified(&element)?;
        self.write_id(obj)?;
        let item_type = self.qualified_value(&type_name)?;
        let prefix = self.prefix_for(encoding);
        match style {
            EncodingStyle::Soap11 => {
                let array_type = format_array_type(&item_type, jagged, items.len());
                self.writer.write_attribute(&prefix, attr::ARRAY_TYPE, encoding, &array_type)?;
            }
            EncodingStyle::Soap12 => {
                let item_type = format!("{item_type}{}", "[]".repeat(jagged));
                self.writer.write_attribute(&prefix, attr::ITEM_TYPE, encoding, &item_type)?;
                self.writer.write_attribute(&prefix, attr::ARRAY_SIZE, encoding, &items.len().to_string())?;
            }
        }
        trace!("array {} with {} items", self.registry.display(element_type), items.len());

        let item_name = QName::new("", ITEM_ELEMENT);
        for item in items {
            self.write_potentially_referencing(&item_name, element_type, item)?;
        }
        self.writer.end_element()
    }
}
