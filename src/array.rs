//! Array descriptors and the item buffer shared by the decoder and encoder.
//!
//! SOAP 1.1 writes the whole descriptor into one attribute,
//! `soapenc:arrayType="xsd:int[][3]"`: the last bracket group holds the
//! dimensions (and the advisory length), every `[]` before it adds one level
//! of jaggedness. SOAP 1.2 splits it into `enc:itemType="xsd:int"` and
//! `enc:arraySize="3"`, where `*` stands for an unspecified size.

use crate::lexical::parse_qname;
use crate::namespace::{NamespaceScope, UR_TYPE, XSD_NS};
use crate::options::EncodingStyle;
use crate::qname::QName;
use crate::registry::{NativeType, Registry};
use crate::{Error, Result};

/// Initial capacity of an item buffer.
pub const INITIAL_ITEM_CAPACITY: usize = 32;

/// Parsed array markers of one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayDescriptor {
    /// Item type name; `None` when the wire left it open.
    pub element_name: Option<QName>,
    pub dimensions: usize,
    /// Levels of `[]` between the item type and the dimension group.
    pub jagged: usize,
    /// Advisory only, never used for allocation.
    pub declared_length: Option<usize>,
}

impl ArrayDescriptor {
    /// Fails for true multi-dimensional arrays.
    pub fn require_single_dimension(&self, tag: &str) -> Result<()> {
        if self.dimensions != 1 {
            return Err(Error::ArrayDimensions(tag.to_string()));
        }
        Ok(())
    }
}

/// Parses `prefix:Type[]...[n]`.
pub fn parse_array_type(value: &str, scope: &NamespaceScope) -> Result<ArrayDescriptor> {
    let value = value.trim();
    let (type_part, groups) = split_bracket_groups(value)?;
    let Some((last, jagged_groups)) = groups.split_last() else {
        return Err(Error::InvalidArrayType(format!("'{value}' has no dimension")));
    };
    for group in jagged_groups {
        if !group.is_empty() {
            // [,] als innere Stufe waere mehrdimensional
            return Err(Error::ArrayDimensions(value.to_string()));
        }
    }
    let sizes: Vec<&str> = last.split(',').map(str::trim).collect();
    let declared_length = match sizes.as_slice() {
        [size] if !size.is_empty() => Some(parse_size(size, value)?),
        _ => None,
    };
    Ok(ArrayDescriptor {
        element_name: Some(parse_qname(type_part, scope)?),
        dimensions: sizes.len(),
        jagged: jagged_groups.len(),
        declared_length,
    })
}

/// Parses the SOAP 1.2 pair. A missing `itemType` leaves the type open.
pub fn parse_soap12_array_type(
    item_type: Option<&str>,
    array_size: Option<&str>,
    scope: &NamespaceScope,
) -> Result<ArrayDescriptor> {
    let (element_name, jagged) = match item_type.map(str::trim) {
        Some(item_type) if !item_type.is_empty() => {
            let (type_part, groups) = split_bracket_groups(item_type)?;
            if groups.iter().any(|g| !g.is_empty()) {
                return Err(Error::ArrayDimensions(item_type.to_string()));
            }
            (Some(parse_qname(type_part, scope)?), groups.len())
        }
        _ => (None, 0),
    };
    let sizes: Vec<&str> = array_size
        .map(|s| s.split_ascii_whitespace().collect())
        .unwrap_or_default();
    let mut declared_length = None;
    for size in &sizes {
        if *size != "*" {
            declared_length = Some(parse_size(size, array_size.unwrap_or_default())?);
        }
    }
    Ok(ArrayDescriptor {
        element_name,
        dimensions: sizes.len().max(1),
        jagged,
        declared_length: if sizes.len() == 1 { declared_length } else { None },
    })
}

fn parse_size(size: &str, value: &str) -> Result<usize> {
    size.parse()
        .map_err(|_| Error::InvalidArrayType(format!("'{size}' in '{value}' is not a valid length")))
}

/// Splits `T[a][b]` into `T` and the group contents `["a", "b"]`.
fn split_bracket_groups(value: &str) -> Result<(&str, Vec<&str>)> {
    let Some(open) = value.find('[') else {
        return Ok((value, Vec::new()));
    };
    let type_part = &value[..open];
    if type_part.is_empty() {
        return Err(Error::InvalidArrayType(format!("'{value}' has no item type")));
    }
    let mut groups = Vec::new();
    let mut rest = &value[open..];
    while !rest.is_empty() {
        let inner = rest
            .strip_prefix('[')
            .and_then(|r| r.split_once(']'))
            .ok_or_else(|| Error::InvalidArrayType(format!("unbalanced brackets in '{value}'")))?;
        groups.push(inner.0);
        rest = inner.1;
    }
    Ok((type_part, groups))
}

/// Resolves a descriptor's item type. Jagged levels wrap the result in
/// arrays.
///
/// SOAP 1.1 only knows registered and primitive names. When the wire leaves
/// the item type open (or SOAP 1.2 names an unknown type) the item type of
/// the slot, `ambient`, is used as is, else `anyType`.
pub fn resolve_element_type(
    desc: &ArrayDescriptor,
    registry: &Registry,
    style: EncodingStyle,
    ambient: Option<&NativeType>,
) -> Result<NativeType> {
    let resolved = match &desc.element_name {
        None => None,
        Some(name) => match registry.lookup_by_name(name) {
            Some(d) => Some(d.native),
            None if style == EncodingStyle::Soap12 => None,
            None => return Err(Error::UnknownType(name.to_string())),
        },
    };
    let Some(mut ty) = resolved else {
        return Ok(ambient.cloned().unwrap_or(NativeType::Any));
    };
    for _ in 0..desc.jagged {
        ty = NativeType::array_of(ty);
    }
    Ok(ty)
}

/// Item type name to write for `element_type`, and its jagged depth.
pub fn element_type_name(element_type: &NativeType, registry: &Registry, style: EncodingStyle) -> Result<(QName, usize)> {
    let mut ty = element_type;
    let mut jagged = 0;
    while let NativeType::Array(inner) = ty {
        ty = inner;
        jagged += 1;
    }
    let name = match ty {
        NativeType::Any => QName::new(XSD_NS, UR_TYPE),
        _ => match registry.lookup_by_type(ty) {
            Some(d) => d.name,
            None if style == EncodingStyle::Soap12 => registry.type_name_for(ty),
            None => return Err(Error::UnknownStructType(registry.display(ty))),
        },
    };
    Ok((name, jagged))
}

/// Lexical `arrayType` value: `q:T[][n]`.
pub fn format_array_type(prefixed_name: &str, jagged: usize, length: usize) -> String {
    let mut s = String::with_capacity(prefixed_name.len() + 2 * jagged + 8);
    s.push_str(prefixed_name);
    for _ in 0..jagged {
        s.push_str("[]");
    }
    s.push('[');
    s.push_str(&length.to_string());
    s.push(']');
    s
}

/// Item buffer that ignores the declared length: it starts small, doubles
/// when full and is shrunk to the real count at the end.
#[derive(Debug)]
pub struct ItemBuffer<T> {
    items: Vec<T>,
}

impl<T> Default for ItemBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ItemBuffer<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() == self.items.capacity() {
            let grow = self.items.capacity().max(INITIAL_ITEM_CAPACITY);
            self.items.reserve_exact(grow);
        }
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn finish(mut self) -> Vec<T> {
        self.items.shrink_to_fit();
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::PrimitiveKind;

    fn scope() -> NamespaceScope {
        let mut s = NamespaceScope::new();
        s.push_frame();
        s.bind("xsd", XSD_NS).unwrap();
        s
    }

    #[test]
    fn soap11_descriptor() {
        let d = parse_array_type("xsd:int[5]", &scope()).unwrap();
        assert_eq!(d.element_name, Some(QName::new(XSD_NS, "int")));
        assert_eq!((d.dimensions, d.jagged, d.declared_length), (1, 0, Some(5)));

        let d = parse_array_type("xsd:string[][]", &scope()).unwrap();
        assert_eq!((d.dimensions, d.jagged, d.declared_length), (1, 1, None));

        let d = parse_array_type("xsd:int[2,3]", &scope()).unwrap();
        assert_eq!(d.dimensions, 2);
        assert_eq!(d.require_single_dimension("xsd:int[2,3]"), Err(Error::ArrayDimensions("xsd:int[2,3]".into())));
    }

    #[test]
    fn soap11_descriptor_errors() {
        for bad in ["xsd:int", "xsd:int[", "[3]", "xsd:int[x]", "xsd:int[3]]"] {
            assert!(parse_array_type(bad, &scope()).is_err(), "{bad}");
        }
        assert!(matches!(parse_array_type("xsd:int[,][2]", &scope()), Err(Error::ArrayDimensions(_))));
        assert_eq!(parse_array_type("zz:int[1]", &scope()), Err(Error::UndefinedPrefix("zz".into())));
    }

    #[test]
    fn soap12_descriptor() {
        let d = parse_soap12_array_type(Some("xsd:int"), Some("3"), &scope()).unwrap();
        assert_eq!((d.dimensions, d.declared_length), (1, Some(3)));
        let d = parse_soap12_array_type(None, Some("* 4"), &scope()).unwrap();
        assert_eq!((d.element_name, d.dimensions, d.declared_length), (None, 2, None));
        let d = parse_soap12_array_type(Some("xsd:int[]"), None, &scope()).unwrap();
        assert_eq!((d.dimensions, d.jagged), (1, 1));
    }

    #[test]
    fn element_type_resolution() {
        let reg = Registry::new();
        let d = parse_array_type("xsd:int[][2]", &scope()).unwrap();
        assert_eq!(
            resolve_element_type(&d, &reg, EncodingStyle::Soap11, None).unwrap(),
            NativeType::array_of(NativeType::Primitive(PrimitiveKind::Int))
        );
        let unknown = ArrayDescriptor {
            element_name: Some(QName::new("urn:x", "Thing")),
            dimensions: 1,
            jagged: 0,
            declared_length: None,
        };
        assert!(matches!(resolve_element_type(&unknown, &reg, EncodingStyle::Soap11, None), Err(Error::UnknownType(_))));
        assert_eq!(resolve_element_type(&unknown, &reg, EncodingStyle::Soap12, None).unwrap(), NativeType::Any);

        // offener Typ: Elementtyp des Slots
        let int = NativeType::Primitive(PrimitiveKind::Int);
        assert_eq!(resolve_element_type(&unknown, &reg, EncodingStyle::Soap12, Some(&int)).unwrap(), int);
        let open = parse_soap12_array_type(None, Some("2"), &scope()).unwrap();
        assert_eq!(resolve_element_type(&open, &reg, EncodingStyle::Soap12, Some(&int)).unwrap(), int);
        assert_eq!(resolve_element_type(&open, &reg, EncodingStyle::Soap12, None).unwrap(), NativeType::Any);
    }

    #[test]
    fn array_type_formatting() {
        let reg = Registry::new();
        let ty = NativeType::array_of(NativeType::Primitive(PrimitiveKind::Double));
        let (name, jagged) = element_type_name(&ty, &reg, EncodingStyle::Soap11).unwrap();
        assert_eq!((name, jagged), (QName::new(XSD_NS, "double"), 1));
        assert_eq!(format_array_type("xsd:double", 1, 4), "xsd:double[][4]");
    }

    #[test]
    fn buffer_growth() {
        let mut buf = ItemBuffer::new();
        assert_eq!(buf.capacity(), 0);
        buf.push(0u32);
        assert_eq!(buf.capacity(), INITIAL_ITEM_CAPACITY);
        for i in 1..1025 {
            buf.push(i);
        }
        assert!(buf.capacity() >= 1025);
        let items = buf.finish();
        assert_eq!(items.len(), 1025);
        assert_eq!(items[1024], 1024);
    }
}
