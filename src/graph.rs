//! In-memory object graph.
//!
//! Objects live in an arena and are addressed by [`ObjectId`] handles, so
//! shared references and cycles are plain handle copies. Object identity is
//! handle identity: two structurally equal objects with different handles are
//! two instances.

use crate::lexical::Primitive;
use crate::qname::QName;
use crate::registry::{EnumId, NativeType, StructId};
use crate::{FastHashMap, FastIndexMap};

/// Handle of an object in a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An enum value with its definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub def: EnumId,
    pub value: i64,
}

/// Contents of a slot: a field, an array item or the root.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Primitive(Primitive),
    Enum(EnumValue),
    Object(ObjectId),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Self::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Self::Primitive(p) => Some(p),
            _ => None,
        }
    }
}

impl From<Primitive> for Value {
    fn from(p: Primitive) -> Self {
        Self::Primitive(p)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Primitive(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Primitive(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Primitive(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Primitive(v.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Primitive(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Primitive(v.into())
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Self::Object(id)
    }
}

/// Raw capture of an element whose type is unknown, found in an `anyType`
/// slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UntypedElement {
    pub name: QName,
    /// The `xsi:type` the element carried, if any.
    pub type_name: Option<QName>,
    pub attributes: Vec<(QName, String)>,
    /// Concatenated character data directly inside the element.
    pub text: String,
    pub children: Vec<UntypedElement>,
}

/// A heap object.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Struct {
        def: StructId,
        fields: FastIndexMap<String, Value>,
    },
    Array {
        element_type: NativeType,
        items: Vec<Value>,
    },
    Untyped(UntypedElement),
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    objects: Vec<Object>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: Object) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(object);
        id
    }

    /// Adds a struct object with the given field values.
    pub fn add_struct<K: Into<String>>(&mut self, def: StructId, fields: impl IntoIterator<Item = (K, Value)>) -> ObjectId {
        self.add(Object::Struct {
            def,
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    pub fn add_array(&mut self, element_type: NativeType, items: Vec<Value>) -> ObjectId {
        self.add(Object::Array { element_type, items })
    }

    pub fn get(&self, id: ObjectId) -> &Object {
        &self.objects[id.index()]
    }

    pub fn get_mut(&mut self, id: ObjectId) -> &mut Object {
        &mut self.objects[id.index()]
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.objects.iter().enumerate().map(|(i, o)| (ObjectId(i as u32), o))
    }

    /// Field value of a struct object; `None` for missing fields and
    /// non-struct objects.
    pub fn field(&self, id: ObjectId, name: &str) -> Option<&Value> {
        match self.get(id) {
            Object::Struct { fields, .. } => fields.get(name),
            _ => None,
        }
    }

    /// Sets a struct field. No-op on other objects.
    pub fn set_field(&mut self, id: ObjectId, name: &str, value: Value) {
        if let Object::Struct { fields, .. } = self.get_mut(id) {
            match fields.get_mut(name) {
                Some(slot) => *slot = value,
                None => {
                    fields.insert(name.to_string(), value);
                }
            }
        }
    }

    pub fn items(&self, id: ObjectId) -> Option<&[Value]> {
        match self.get(id) {
            Object::Array { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Runtime type of a value; `None` for null.
    pub fn type_of(&self, value: &Value) -> Option<NativeType> {
        match value {
            Value::Null => None,
            Value::Primitive(p) => Some(NativeType::Primitive(p.kind())),
            Value::Enum(e) => Some(NativeType::Enum(e.def)),
            Value::Object(id) => Some(match self.get(*id) {
                Object::Struct { def, .. } => NativeType::Struct(*def),
                Object::Array { element_type, .. } => NativeType::array_of(element_type.clone()),
                Object::Untyped(_) => NativeType::Any,
            }),
        }
    }

    /// Deep structural equality of `root` in `self` and `other_root` in
    /// `other`, including sharing: the handles reachable from both roots must
    /// correspond one to one.
    pub fn is_isomorphic(&self, root: &Value, other: &Graph, other_root: &Value) -> bool {
        let mut forward: FastHashMap<ObjectId, ObjectId> = FastHashMap::default();
        let mut backward: FastHashMap<ObjectId, ObjectId> = FastHashMap::default();
        let mut pending = vec![(root.clone(), other_root.clone())];
        while let Some((a, b)) = pending.pop() {
            match (&a, &b) {
                (Value::Null, Value::Null) => {}
                (Value::Primitive(x), Value::Primitive(y)) => {
                    if !x.same_value(y) {
                        return false;
                    }
                }
                (Value::Enum(x), Value::Enum(y)) => {
                    if x != y {
                        return false;
                    }
                }
                (Value::Object(x), Value::Object(y)) => {
                    match (forward.get(x), backward.get(y)) {
                        (Some(mx), Some(my)) if mx == y && my == x => continue,
                        (None, None) => {
                            forward.insert(*x, *y);
                            backward.insert(*y, *x);
                        }
                        _ => return false,
                    }
                    match (self.get(*x), other.get(*y)) {
                        (Object::Struct { def: d1, fields: f1 }, Object::Struct { def: d2, fields: f2 }) => {
                            if d1 != d2 {
                                return false;
                            }
                            // fehlende Felder zaehlen als null
                            for (name, v1) in f1 {
                                pending.push((v1.clone(), f2.get(name).cloned().unwrap_or_default()));
                            }
                            for (name, v2) in f2 {
                                if !f1.contains_key(name) {
                                    pending.push((Value::Null, v2.clone()));
                                }
                            }
                        }
                        (
                            Object::Array { element_type: t1, items: i1 },
                            Object::Array { element_type: t2, items: i2 },
                        ) => {
                            if t1 != t2 || i1.len() != i2.len() {
                                return false;
                            }
                            pending.extend(i1.iter().cloned().zip(i2.iter().cloned()));
                        }
                        (Object::Untyped(u1), Object::Untyped(u2)) => {
                            if u1 != u2 {
                                return false;
                            }
                        }
                        _ => return false,
                    }
                }
                _ => return false,
            }
        }
        true
    }
}
