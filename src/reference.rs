//! Reference tables: id bookkeeping for one decode or encode session.

use std::collections::VecDeque;

use log::{trace, warn};

use crate::cursor::Position;
use crate::graph::{ObjectId, Value};
use crate::{Error, FastHashMap, FastHashSet, FastIndexMap, Result};

// ============================================================================
// Decode
// ============================================================================

/// A value declared under an id.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub value: Value,
    /// Set by [`DecodeReferences::get_target`].
    pub referenced: bool,
    pub position: Option<Position>,
}

/// An object that nothing referenced, see [`DecodeReferences::unreferenced`].
#[derive(Debug, Clone, PartialEq)]
pub struct Unreferenced<'a> {
    pub id: Option<&'a str>,
    pub value: &'a Value,
    pub position: Option<Position>,
}

/// Decode-side table: id -> value, plus the anonymous objects.
///
/// Ids keep their declaration order, so diagnostics come out in document
/// order.
#[derive(Debug, Clone, Default)]
pub struct DecodeReferences {
    targets: FastIndexMap<String, Target>,
    anonymous: Vec<(Value, Option<Position>)>,
    referenced_objects: FastHashSet<ObjectId>,
}

impl DecodeReferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a just constructed value. Without an id, objects go to the
    /// anonymous bucket (primitives are not tracked). A second declaration
    /// of the same id is ignored.
    pub fn add_target(&mut self, id: Option<&str>, value: Value, position: Option<Position>) {
        match id {
            Some(id) => {
                if self.targets.contains_key(id) {
                    warn!("duplicate id '{id}' ignored");
                    return;
                }
                trace!("target '{id}' declared");
                self.targets.insert(
                    id.to_string(),
                    Target {
                        value,
                        referenced: false,
                        position,
                    },
                );
            }
            None => {
                if value.as_object().is_some() {
                    self.anonymous.push((value, position));
                }
            }
        }
    }

    /// Value declared under `id`; marks it referenced.
    pub fn get_target(&mut self, id: &str) -> Result<Value> {
        let target = self
            .targets
            .get_mut(id)
            .ok_or_else(|| Error::UnresolvedReference(id.to_string()))?;
        target.referenced = true;
        let value = target.value.clone();
        self.mark_referenced(&value);
        Ok(value)
    }

    /// Idempotent. Only objects carry identity; other values are ignored.
    pub fn mark_referenced(&mut self, value: &Value) {
        if let Some(obj) = value.as_object() {
            self.referenced_objects.insert(obj);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.targets.contains_key(id)
    }

    pub fn is_referenced(&self, id: &str) -> bool {
        self.targets.get(id).is_some_and(|t| self.target_referenced(t))
    }

    fn target_referenced(&self, target: &Target) -> bool {
        target.referenced
            || target
                .value
                .as_object()
                .is_some_and(|o| self.referenced_objects.contains(&o))
    }

    /// All declared ids in declaration order.
    pub fn targets(&self) -> impl Iterator<Item = (&str, &Target)> {
        self.targets.iter().map(|(id, t)| (id.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Everything never marked referenced: id-keyed targets first, then the
    /// anonymous objects.
    pub fn unreferenced(&self) -> Vec<Unreferenced<'_>> {
        let by_id = self
            .targets
            .iter()
            .filter(|(_, t)| !self.target_referenced(t))
            .map(|(id, t)| Unreferenced {
                id: Some(id.as_str()),
                value: &t.value,
                position: t.position,
            });
        let anonymous = self
            .anonymous
            .iter()
            .filter(|(v, _)| {
                v.as_object()
                    .is_some_and(|o| !self.referenced_objects.contains(&o))
            })
            .map(|(v, position)| Unreferenced {
                id: None,
                value: v,
                position: *position,
            });
        by_id.chain(anonymous).collect()
    }
}

// ============================================================================
// Encode
// ============================================================================

/// Encode-side table: object handle -> assigned id, plus the queue of
/// objects that were referenced but not yet written.
#[derive(Debug, Clone, Default)]
pub struct EncodeReferences {
    id_base: String,
    next_id: u32,
    ids: FastHashMap<ObjectId, String>,
    to_write: VecDeque<ObjectId>,
}

impl EncodeReferences {
    pub fn new(id_base: impl Into<String>) -> Self {
        Self {
            id_base: id_base.into(),
            ..Self::default()
        }
    }

    /// Id of `obj`, allocated on first use as `{base}id{n}`. A newly
    /// allocated object is queued for a top-level element if `queue` is set.
    pub fn id_for(&mut self, obj: ObjectId, queue: bool) -> String {
        if let Some(id) = self.ids.get(&obj) {
            return id.clone();
        }
        self.next_id += 1;
        let id = format!("{}id{}", self.id_base, self.next_id);
        trace!("object {} gets id '{id}'", obj.index());
        self.ids.insert(obj, id.clone());
        if queue {
            self.to_write.push_back(obj);
        }
        id
    }

    /// True once `obj` has an id.
    pub fn is_declared(&self, obj: ObjectId) -> bool {
        self.ids.contains_key(&obj)
    }

    /// Next queued object, in queue order.
    pub fn next_pending(&mut self) -> Option<ObjectId> {
        self.to_write.pop_front()
    }

    /// Number of ids handed out.
    pub fn assigned(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::registry::NativeType;

    fn objects(n: usize) -> Vec<ObjectId> {
        let mut g = Graph::new();
        (0..n).map(|_| g.add_array(NativeType::Any, vec![])).collect()
    }

    #[test]
    fn missing_id_is_unresolved() {
        let mut refs = DecodeReferences::new();
        assert_eq!(refs.get_target("missing"), Err(Error::UnresolvedReference("missing".into())));
    }

    #[test]
    fn get_target_marks_referenced() {
        let o = objects(2);
        let mut refs = DecodeReferences::new();
        refs.add_target(Some("id1"), Value::Object(o[0]), None);
        refs.add_target(Some("id2"), Value::Object(o[1]), None);
        assert_eq!(refs.get_target("id2").unwrap(), Value::Object(o[1]));
        let left: Vec<_> = refs.unreferenced().iter().map(|u| u.id).collect();
        assert_eq!(left, [Some("id1")]);
        assert!(refs.is_referenced("id2"));
    }

    #[test]
    fn anonymous_objects_are_reported_after_ids() {
        let o = objects(3);
        let mut refs = DecodeReferences::new();
        refs.add_target(None, Value::Object(o[0]), None);
        refs.add_target(None, Value::from(5), None);
        refs.add_target(Some("x"), Value::Object(o[1]), None);
        refs.add_target(None, Value::Object(o[2]), None);
        refs.mark_referenced(&Value::Object(o[2]));
        let left: Vec<_> = refs.unreferenced().iter().map(|u| (u.id, u.value.clone())).collect();
        assert_eq!(left, [(Some("x"), Value::Object(o[1])), (None, Value::Object(o[0]))]);
    }

    #[test]
    fn duplicate_id_keeps_first() {
        let o = objects(2);
        let mut refs = DecodeReferences::new();
        refs.add_target(Some("a"), Value::Object(o[0]), None);
        refs.add_target(Some("a"), Value::Object(o[1]), None);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs.get_target("a").unwrap(), Value::Object(o[0]));
    }

    #[test]
    fn encode_ids_are_per_instance() {
        let o = objects(2);
        let mut refs = EncodeReferences::new("b");
        assert!(!refs.is_declared(o[0]));
        assert_eq!(refs.id_for(o[0], true), "bid1");
        assert_eq!(refs.id_for(o[1], false), "bid2");
        assert_eq!(refs.id_for(o[0], true), "bid1");
        assert_eq!(refs.next_pending(), Some(o[0]));
        assert_eq!(refs.next_pending(), None);
        assert_eq!(refs.assigned(), 2);
    }
}
