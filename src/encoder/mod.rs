//! Multi-ref encoder: object graph -> markup.
//!
//! The root is written first, inline, as the first child of the container
//! element. Every object that is written as a reference (`href="#id"` or
//! `enc:ref="id"`) is queued and later written as a top-level element of its
//! own, until the queue is empty.
//!
//! # Beispiel
//!
//! ```
//! use multiref::{encode_to_string, EncodeOptions, Graph, Registry, Value};
//!
//! let xml = encode_to_string(&Graph::new(), &Value::from(42), &Registry::new(), &EncodeOptions::default()).unwrap();
//! assert!(xml.contains(r#"xsi:type="xsd:int">42<"#));
//! ```

mod api;
mod array;
mod value;

pub use api::{encode_to_string, encode_to_writer};

use log::debug;

use crate::graph::{Graph, Value};
use crate::namespace::XSI_NS;
use crate::options::EncodeOptions;
use crate::prefix::PrefixAllocator;
use crate::qname::QName;
use crate::reference::EncodeReferences;
use crate::registry::Registry;
use crate::writer::MarkupWriter;
use crate::Result;

/// One encode session over a markup writer.
pub struct Encoder<'g, W: MarkupWriter> {
    writer: W,
    graph: &'g Graph,
    registry: &'g Registry,
    options: EncodeOptions,
    refs: EncodeReferences,
    prefixes: PrefixAllocator,
}

impl<'g, W: MarkupWriter> Encoder<'g, W> {
    pub fn new(writer: W, graph: &'g Graph, registry: &'g Registry, options: EncodeOptions) -> Self {
        let prefixes = PrefixAllocator::new(
            options.alias_stem(),
            options.caller_namespaces().iter().map(|(p, _)| p.as_str()),
        );
        Self {
            writer,
            graph,
            registry,
            refs: EncodeReferences::new(options.id_base()),
            options,
            prefixes,
        }
    }

    /// Writes the container, the root and all queued objects. Returns the
    /// writer.
    pub fn encode(mut self, root: &Value) -> Result<W> {
        let container = self.options.container();
        let prefix = self.container_prefix(&container);
        self.writer.start_element(&prefix, &container.local_name, &container.uri)?;
        for (p, uri) in self.options.container_declarations() {
            if self.writer.lookup_namespace(&p) != Some(uri.as_str()) {
                self.writer.write_namespace_declaration(&p, &uri)?;
            }
        }

        debug!("writing root");
        self.write_root(root)?;
        let mut written = 0usize;
        while let Some(obj) = self.refs.next_pending() {
            self.write_referenced_element(obj, None, None)?;
            written += 1;
        }
        debug!("{written} referenced elements written, {} ids assigned", self.refs.assigned());

        self.writer.end_element()?;
        Ok(self.writer)
    }

    /// Caller binding for the container namespace, else the style's envelope
    /// prefix for the envelope namespace, else a generated one.
    fn container_prefix(&mut self, container: &QName) -> String {
        if container.uri.is_empty() {
            return String::new();
        }
        if let Some((p, _)) = self
            .options
            .caller_namespaces()
            .iter()
            .find(|(_, uri)| uri.as_str() == &*container.uri)
        {
            return p.clone();
        }
        let style = self.options.style();
        if &*container.uri == style.envelope_namespace() {
            return style.envelope_prefix().to_string();
        }
        self.prefixes.next_prefix()
    }

    // ========================================================================
    // Prefixe
    // ========================================================================

    /// Prefix bound to `namespace` in scope, or a fresh one. The writer
    /// declares a fresh prefix on the element it is used on.
    fn prefix_for(&mut self, namespace: &str) -> String {
        match self.writer.lookup_prefix(namespace) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => self.prefixes.next_prefix(),
        }
    }

    /// `prefix:local` for an attribute or text value, declaring the prefix
    /// on the open element if needed.
    fn qualified_value(&mut self, name: &QName) -> Result<String> {
        if name.uri.is_empty() {
            return Ok(name.local_name.to_string());
        }
        if let Some(p) = self.writer.lookup_prefix(&name.uri) {
            return Ok(if p.is_empty() {
                name.local_name.to_string()
            } else {
                format!("{p}:{}", name.local_name)
            });
        }
        let p = self.prefixes.next_prefix();
        self.writer.write_namespace_declaration(&p, &name.uri)?;
        Ok(format!("{p}:{}", name.local_name))
    }

    /// Opens a namespace-qualified element.
    fn start_qualified(&mut self, name: &QName) -> Result<()> {
        let prefix = if name.uri.is_empty() { String::new() } else { self.prefix_for(&name.uri) };
        self.writer.start_element(&prefix, &name.local_name, &name.uri)
    }

    fn write_xsi_type(&mut self, type_name: &QName) -> Result<()> {
        let value = self.qualified_value(type_name)?;
        let prefix = self.prefix_for(XSI_NS);
        self.writer.write_attribute(&prefix, crate::namespace::attr::TYPE, XSI_NS, &value)
    }

    fn write_nil(&mut self) -> Result<()> {
        let prefix = self.prefix_for(XSI_NS);
        self.writer.write_attribute(&prefix, crate::namespace::attr::NIL, XSI_NS, "true")
    }
}

#[cfg(test)]
mod tests;
