//! Diagnostic sink for conditions that never abort a decode.

use crate::cursor::Position;
use crate::graph::Value;
use crate::qname::QName;

/// Observer for decode diagnostics. All methods default to doing nothing.
pub trait DecodeEvents {
    /// A child element that the struct being read has no field for. The
    /// element is skipped.
    fn unknown_element(&mut self, name: &QName, position: Position) {
        let _ = (name, position);
    }

    /// An attribute that is neither a namespace declaration, an xsi
    /// attribute nor a protocol attribute.
    fn unknown_attribute(&mut self, name: &QName, value: &str, position: Position) {
        let _ = (name, value, position);
    }

    /// An object that was declared (with or without id) but never
    /// referenced. Reported after all fixups have run.
    fn unreferenced_object(&mut self, id: Option<&str>, value: &Value, position: Option<Position>) {
        let _ = (id, value, position);
    }
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreEvents;

impl DecodeEvents for IgnoreEvents {}

/// One collected diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    UnknownElement {
        name: QName,
        position: Position,
    },
    UnknownAttribute {
        name: QName,
        value: String,
        position: Position,
    },
    UnreferencedObject {
        id: Option<String>,
        value: Value,
        position: Option<Position>,
    },
}

/// Sink that records every diagnostic in order.
#[derive(Debug, Clone, Default)]
pub struct CollectEvents {
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of all unreferenced-object diagnostics (`None` for anonymous
    /// objects).
    pub fn unreferenced_ids(&self) -> Vec<Option<&str>> {
        self.diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::UnreferencedObject { id, .. } => Some(id.as_deref()),
                _ => None,
            })
            .collect()
    }
}

impl DecodeEvents for CollectEvents {
    fn unknown_element(&mut self, name: &QName, position: Position) {
        self.diagnostics.push(Diagnostic::UnknownElement {
            name: name.clone(),
            position,
        });
    }

    fn unknown_attribute(&mut self, name: &QName, value: &str, position: Position) {
        self.diagnostics.push(Diagnostic::UnknownAttribute {
            name: name.clone(),
            value: value.to_string(),
            position,
        });
    }

    fn unreferenced_object(&mut self, id: Option<&str>, value: &Value, position: Option<Position>) {
        self.diagnostics.push(Diagnostic::UnreferencedObject {
            id: id.map(str::to_string),
            value: value.clone(),
            position,
        });
    }
}
