//! Deferred reference resolution.
//!
//! The scan phase leaves `Null` in every slot that holds an `href`/`ref` and
//! records a [`Fixup`] naming the slot by handle. Once the whole document has
//! been scanned every id is known, and [`FixupQueue::drain`] patches the
//! slots in registration order.

use log::{debug, trace};

use crate::graph::{Graph, Object, ObjectId, Value};
use crate::reference::DecodeReferences;
use crate::registry::{NativeType, Registry};
use crate::{Error, Result};

/// One pending patch.
#[derive(Debug, Clone, PartialEq)]
pub enum Fixup {
    /// The root element was itself a reference.
    Root { id: String },
    /// A struct field.
    Field {
        object: ObjectId,
        field: String,
        id: String,
        expected: NativeType,
    },
    /// All referencing items of one array; `None` marks items that were
    /// read inline.
    ArrayItems {
        array: ObjectId,
        ids: Vec<Option<String>>,
    },
}

/// Append-only fixup list of one decode session.
#[derive(Debug, Clone, Default)]
pub struct FixupQueue {
    fixups: Vec<Fixup>,
}

impl FixupQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fixup: Fixup) {
        self.fixups.push(fixup);
    }

    pub fn len(&self) -> usize {
        self.fixups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixups.is_empty()
    }

    /// Resolves every fixup once, in registration order. Returns the root
    /// value if the root was a reference.
    ///
    /// The first unresolved id or type mismatch aborts the whole drain.
    pub fn drain(self, graph: &mut Graph, refs: &mut DecodeReferences, registry: &Registry) -> Result<Option<Value>> {
        debug!("draining {} fixups", self.fixups.len());
        let mut root = None;
        for fixup in self.fixups {
            match fixup {
                Fixup::Root { id } => {
                    trace!("root <- '{id}'");
                    root = Some(refs.get_target(&id)?);
                }
                Fixup::Field { object, field, id, expected } => {
                    let value = refs.get_target(&id)?;
                    if let Some(actual) = graph.type_of(&value)
                        && !registry.is_assignable(&actual, &expected)
                    {
                        return Err(Error::ReferenceType {
                            id,
                            expected: registry.display(&expected),
                            actual: registry.display(&actual),
                        });
                    }
                    trace!("field {field} of object {} <- '{id}'", object.index());
                    graph.set_field(object, &field, value);
                }
                Fixup::ArrayItems { array, ids } => {
                    let element_type = match graph.get(array) {
                        Object::Array { element_type, .. } => element_type.clone(),
                        _ => continue,
                    };
                    for (index, id) in ids.into_iter().enumerate() {
                        let Some(id) = id else { continue };
                        let value = refs.get_target(&id)?;
                        if let Some(actual) = graph.type_of(&value)
                            && !registry.is_assignable(&actual, &element_type)
                        {
                            return Err(Error::ArrayElementType {
                                id,
                                actual: registry.display(&actual),
                                index,
                            });
                        }
                        if let Object::Array { items, .. } = graph.get_mut(array) {
                            items[index] = value;
                        }
                    }
                }
            }
        }
        Ok(root)
    }
}
