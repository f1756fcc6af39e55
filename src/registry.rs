//! Type registry: qualified type names <-> native type descriptors.
//!
//! The registry holds the struct and enum definitions of one data contract
//! and the two lookup tables. Primitive kinds and `xsd:anyType` need no
//! registration; they resolve through the built-in table.

use crate::lexical::{EnumDef, PrimitiveKind};
use crate::namespace::{UR_TYPE, XSD_NS, XSD_NS_1999, XSD_NS_2000};
use crate::qname::QName;
use crate::FastHashMap;

/// Handle of a struct definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructId(pub(crate) u32);

/// Handle of an enum definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumId(pub(crate) u32);

/// Native (in-memory) type of a slot or value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeType {
    /// Dynamic slot: anything goes (`xsd:anyType`).
    Any,
    Primitive(PrimitiveKind),
    Enum(EnumId),
    Struct(StructId),
    Array(Box<NativeType>),
}

impl NativeType {
    pub fn array_of(element: NativeType) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn element_type(&self) -> Option<&NativeType> {
        match self {
            Self::Array(e) => Some(e),
            _ => None,
        }
    }

    /// Value types are read inline and never take part in fixups:
    /// primitives other than string, QName and byte arrays, and enums.
    pub fn is_value_type(&self) -> bool {
        match self {
            Self::Primitive(k) => !matches!(
                k,
                PrimitiveKind::String
                    | PrimitiveKind::QName
                    | PrimitiveKind::Base64Binary
                    | PrimitiveKind::HexBinary
            ),
            Self::Enum(_) => true,
            _ => false,
        }
    }
}

/// One field of a struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Element name (unqualified on the wire).
    pub name: String,
    pub ty: NativeType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: NativeType) -> Self {
        Self { name: name.into(), ty }
    }
}

/// A struct (reference type) definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    pub name: QName,
    pub base: Option<StructId>,
    /// Own fields, without the ones inherited from `base`.
    pub fields: Vec<FieldDef>,
}

/// Result of a registry lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: QName,
    pub native: NativeType,
    pub is_primitive: bool,
    pub element_type: Option<NativeType>,
}

impl TypeDescriptor {
    fn new(name: QName, native: NativeType) -> Self {
        Self {
            name,
            is_primitive: matches!(native, NativeType::Primitive(_)),
            element_type: native.element_type().cloned(),
            native,
        }
    }
}

/// `xsd:anyType`.
pub fn ur_type_name() -> QName {
    QName::new(XSD_NS, UR_TYPE)
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    structs: Vec<StructDef>,
    enums: Vec<EnumDef>,
    by_name: FastHashMap<QName, NativeType>,
    by_type: FastHashMap<NativeType, QName>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `name` to `native` in both directions. Last write wins.
    pub fn register(&mut self, name: QName, native: NativeType) {
        self.by_name.insert(name.clone(), native.clone());
        self.by_type.insert(native, name);
    }

    /// Adds a struct definition without registering its name. The encoder
    /// then falls back to the nearest registered base type.
    pub fn add_struct(&mut self, def: StructDef) -> StructId {
        let id = StructId(self.structs.len() as u32);
        self.structs.push(def);
        id
    }

    /// Adds and registers a struct.
    pub fn define_struct(&mut self, name: QName, base: Option<StructId>, fields: Vec<FieldDef>) -> StructId {
        let id = self.add_struct(StructDef { name: name.clone(), base, fields });
        self.register(name, NativeType::Struct(id));
        id
    }

    /// Appends fields to a struct; needed for self-referencing types.
    pub fn add_fields(&mut self, id: StructId, fields: Vec<FieldDef>) {
        self.structs[id.0 as usize].fields.extend(fields);
    }

    /// Adds and registers an enum.
    pub fn define_enum(&mut self, def: EnumDef) -> EnumId {
        let id = EnumId(self.enums.len() as u32);
        let name = def.name.clone();
        self.enums.push(def);
        self.register(name, NativeType::Enum(id));
        id
    }

    pub fn struct_def(&self, id: StructId) -> &StructDef {
        &self.structs[id.0 as usize]
    }

    pub fn enum_def(&self, id: EnumId) -> &EnumDef {
        &self.enums[id.0 as usize]
    }

    /// Decode-side lookup. Registered names win over the built-in table, so
    /// a data contract may shadow a primitive name.
    pub fn lookup_by_name(&self, name: &QName) -> Option<TypeDescriptor> {
        if let Some(native) = self.by_name.get(name) {
            return Some(TypeDescriptor::new(name.clone(), native.clone()));
        }
        if &*name.local_name == UR_TYPE && matches!(&*name.uri, XSD_NS | XSD_NS_2000 | XSD_NS_1999) {
            return Some(TypeDescriptor::new(ur_type_name(), NativeType::Any));
        }
        PrimitiveKind::from_type_name(name)
            .map(|k| TypeDescriptor::new(k.qname(), NativeType::Primitive(k)))
    }

    /// Encode-side lookup by exact native type.
    pub fn lookup_by_type(&self, native: &NativeType) -> Option<TypeDescriptor> {
        if let Some(name) = self.by_type.get(native) {
            return Some(TypeDescriptor::new(name.clone(), native.clone()));
        }
        match native {
            NativeType::Any => Some(TypeDescriptor::new(ur_type_name(), NativeType::Any)),
            NativeType::Primitive(k) => Some(TypeDescriptor::new(k.qname(), native.clone())),
            _ => None,
        }
    }

    /// Type name to write for `native`: the exact entry, else the nearest
    /// registered base type, else `xsd:anyType`.
    pub fn type_name_for(&self, native: &NativeType) -> QName {
        if let Some(desc) = self.lookup_by_type(native) {
            return desc.name;
        }
        if let NativeType::Struct(id) = native {
            let mut base = self.struct_def(*id).base;
            while let Some(b) = base {
                if let Some(name) = self.by_type.get(&NativeType::Struct(b)) {
                    return name.clone();
                }
                base = self.struct_def(b).base;
            }
        }
        ur_type_name()
    }

    /// True if `derived` is `base` or inherits from it.
    pub fn is_subtype(&self, derived: StructId, base: StructId) -> bool {
        let mut current = Some(derived);
        while let Some(id) = current {
            if id == base {
                return true;
            }
            current = self.struct_def(id).base;
        }
        false
    }

    /// Can a value of type `value` be stored in a slot of type `slot`?
    pub fn is_assignable(&self, value: &NativeType, slot: &NativeType) -> bool {
        match (value, slot) {
            (_, NativeType::Any) => true,
            (NativeType::Struct(v), NativeType::Struct(s)) => self.is_subtype(*v, *s),
            (NativeType::Array(v), NativeType::Array(s)) => v == s || (!v.is_value_type() && self.is_assignable(v, s)),
            (v, s) => v == s,
        }
    }

    /// All fields of a struct, inherited ones first.
    pub fn fields(&self, id: StructId) -> Vec<&FieldDef> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            chain.push(c);
            current = self.struct_def(c).base;
        }
        chain
            .into_iter()
            .rev()
            .flat_map(|c| self.struct_def(c).fields.iter())
            .collect()
    }

    /// Field by element name, searching the base chain as well.
    pub fn field(&self, id: StructId, name: &str) -> Option<&FieldDef> {
        let mut current = Some(id);
        while let Some(c) = current {
            let def = self.struct_def(c);
            if let Some(f) = def.fields.iter().find(|f| f.name == name) {
                return Some(f);
            }
            current = def.base;
        }
        None
    }

    /// Readable type name for diagnostics.
    pub fn display(&self, native: &NativeType) -> String {
        match native {
            NativeType::Any => "anyType".to_string(),
            NativeType::Primitive(k) => k.type_name().to_string(),
            NativeType::Enum(id) => self.enum_def(*id).name.to_string(),
            NativeType::Struct(id) => self.struct_def(*id).name.to_string(),
            NativeType::Array(e) => format!("{}[]", self.display(e)),
        }
    }
}
