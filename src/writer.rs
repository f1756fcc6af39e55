//! Markup writer: the push interface the encoder writes to.
//!
//! The writer is namespace aware. Starting an element or writing a qualified
//! attribute declares the prefix on the spot when it is not yet bound to the
//! namespace in scope, and every binding disappears with its element.

use std::io::Write;

use memchr::{memchr3, memchr3_iter};

use crate::namespace::{NamespaceScope, XML_NS};
use crate::{Error, Result};

pub trait MarkupWriter {
    /// Opens `<prefix:local_name`. Attributes may follow until content is
    /// written.
    fn start_element(&mut self, prefix: &str, local_name: &str, namespace: &str) -> Result<()>;

    /// Writes an attribute on the open start tag.
    fn write_attribute(&mut self, prefix: &str, local_name: &str, namespace: &str, value: &str) -> Result<()>;

    /// Binds `prefix` to `namespace` on the open start tag.
    fn write_namespace_declaration(&mut self, prefix: &str, namespace: &str) -> Result<()>;

    fn write_text(&mut self, text: &str) -> Result<()>;

    fn end_element(&mut self) -> Result<()>;

    /// Innermost prefix bound to `namespace`.
    fn lookup_prefix(&self, namespace: &str) -> Option<&str>;

    fn lookup_namespace(&self, prefix: &str) -> Option<&str>;
}

/// Streaming XML writer over any `std::io::Write`.
pub struct XmlMarkupWriter<W: Write> {
    writer: W,
    scope: NamespaceScope,
    /// Qualified names of the open elements, for the end tags.
    stack: Vec<String>,
    /// Per open element: whether it has element children (indentation).
    has_children: Vec<bool>,
    start_open: bool,
    indent: Option<usize>,
}

fn io_err(e: std::io::Error) -> Error {
    Error::Io(e.to_string())
}

impl<W: Write> XmlMarkupWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            scope: NamespaceScope::new(),
            stack: Vec::new(),
            has_children: Vec::new(),
            start_open: false,
            indent: None,
        }
    }

    /// Pretty-prints element-only content with `width` spaces per level.
    pub fn with_indent(mut self, width: usize) -> Self {
        self.indent = Some(width);
        self
    }

    /// Writes the XML declaration. Must come first.
    pub fn write_declaration(&mut self) -> Result<()> {
        self.writer
            .write_all(b"<?xml version=\"1.0\" encoding=\"utf-8\"?>")
            .map_err(io_err)?;
        if self.indent.is_some() {
            self.writer.write_all(b"\n").map_err(io_err)?;
        }
        Ok(())
    }

    /// Flushes and returns the sink. Open elements are an error.
    pub fn into_inner(mut self) -> Result<W> {
        if !self.stack.is_empty() {
            return Err(Error::Xml(format!("{} element(s) still open", self.stack.len())));
        }
        self.writer.flush().map_err(io_err)?;
        Ok(self.writer)
    }

    fn close_start_tag(&mut self) -> Result<()> {
        if self.start_open {
            self.writer.write_all(b">").map_err(io_err)?;
            self.start_open = false;
        }
        Ok(())
    }

    fn newline_indent(&mut self, depth: usize) -> Result<()> {
        if let Some(width) = self.indent {
            self.writer.write_all(b"\n").map_err(io_err)?;
            for _ in 0..depth * width {
                self.writer.write_all(b" ").map_err(io_err)?;
            }
        }
        Ok(())
    }

    fn write_raw_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        write!(self.writer, " {name}=\"").map_err(io_err)?;
        write_escaped_attr(&mut self.writer, value)?;
        self.writer.write_all(b"\"").map_err(io_err)
    }

    /// Declares `prefix` for `namespace` if the scope does not already map it.
    fn ensure_bound(&mut self, prefix: &str, namespace: &str) -> Result<()> {
        if self.scope.lookup_namespace(prefix) != Some(namespace) {
            self.write_namespace_declaration(prefix, namespace)?;
        }
        Ok(())
    }
}

impl<W: Write> MarkupWriter for XmlMarkupWriter<W> {
    fn start_element(&mut self, prefix: &str, local_name: &str, namespace: &str) -> Result<()> {
        self.close_start_tag()?;
        if let Some(parent) = self.has_children.last_mut() {
            *parent = true;
        }
        if !self.stack.is_empty() {
            self.newline_indent(self.stack.len())?;
        }
        let qualified = if prefix.is_empty() {
            local_name.to_string()
        } else {
            format!("{prefix}:{local_name}")
        };
        write!(self.writer, "<{qualified}").map_err(io_err)?;
        self.stack.push(qualified);
        self.has_children.push(false);
        self.scope.push_frame();
        self.start_open = true;
        self.ensure_bound(prefix, namespace)
    }

    fn write_attribute(&mut self, prefix: &str, local_name: &str, namespace: &str, value: &str) -> Result<()> {
        if !self.start_open {
            return Err(Error::Xml(format!("attribute {local_name} written outside a start tag")));
        }
        if namespace.is_empty() {
            return self.write_raw_attribute(local_name, value);
        }
        let prefix = if prefix.is_empty() {
            // unqualifizierte Attribute haben keinen Namespace: Prefix noetig
            self.scope
                .lookup_prefix(namespace)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .ok_or_else(|| Error::Xml(format!("no prefix for attribute namespace {namespace}")))?
        } else {
            if namespace != XML_NS {
                self.ensure_bound(prefix, namespace)?;
            }
            prefix.to_string()
        };
        self.write_raw_attribute(&format!("{prefix}:{local_name}"), value)
    }

    fn write_namespace_declaration(&mut self, prefix: &str, namespace: &str) -> Result<()> {
        if !self.start_open {
            return Err(Error::Xml(format!("namespace declaration for '{prefix}' outside a start tag")));
        }
        if prefix == "xml" {
            return Ok(());
        }
        self.scope.bind(prefix, namespace)?;
        if prefix.is_empty() {
            self.write_raw_attribute("xmlns", namespace)
        } else {
            self.write_raw_attribute(&format!("xmlns:{prefix}"), namespace)
        }
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.close_start_tag()?;
        write_escaped_text(&mut self.writer, text)
    }

    fn end_element(&mut self) -> Result<()> {
        let qualified = self
            .stack
            .pop()
            .ok_or_else(|| Error::Xml("end element without open element".into()))?;
        let had_children = self.has_children.pop().unwrap_or(false);
        if self.start_open {
            self.writer.write_all(b"/>").map_err(io_err)?;
            self.start_open = false;
        } else {
            if had_children {
                self.newline_indent(self.stack.len())?;
            }
            write!(self.writer, "</{qualified}>").map_err(io_err)?;
        }
        self.scope.pop_frame();
        Ok(())
    }

    fn lookup_prefix(&self, namespace: &str) -> Option<&str> {
        self.scope.lookup_prefix(namespace)
    }

    fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        self.scope.lookup_namespace(prefix)
    }
}

// ============================================================================
// Escaping
// ============================================================================

/// XML-Escaping mit memchr3: grosse Bloecke ohne Escape-Zeichen werden in
/// einem Stueck geschrieben.
fn write_escaped_memchr3(w: &mut impl Write, s: &str, needle: [u8; 3], replacement: [&[u8]; 3]) -> Result<()> {
    let bytes = s.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        match memchr3(needle[0], needle[1], needle[2], &bytes[start..]) {
            Some(offset) => {
                let pos = start + offset;
                w.write_all(&bytes[start..pos]).map_err(io_err)?;
                let idx = if bytes[pos] == needle[0] {
                    0
                } else if bytes[pos] == needle[1] {
                    1
                } else {
                    2
                };
                w.write_all(replacement[idx]).map_err(io_err)?;
                start = pos + 1;
            }
            None => {
                w.write_all(&bytes[start..]).map_err(io_err)?;
                break;
            }
        }
    }
    Ok(())
}

/// Text: & < > escaped, CR as character reference so it survives line-end
/// normalization.
fn write_escaped_text(w: &mut impl Write, s: &str) -> Result<()> {
    let mut start = 0;
    for cr in memchr::memchr_iter(b'\r', s.as_bytes()) {
        write_escaped_memchr3(w, &s[start..cr], [b'&', b'<', b'>'], [b"&amp;", b"&lt;", b"&gt;"])?;
        w.write_all(b"&#xD;").map_err(io_err)?;
        start = cr + 1;
    }
    write_escaped_memchr3(w, &s[start..], [b'&', b'<', b'>'], [b"&amp;", b"&lt;", b"&gt;"])
}

/// Attribute: & < " escaped, TAB/LF/CR as character references so attribute
/// value normalization keeps them.
fn write_escaped_attr(w: &mut impl Write, s: &str) -> Result<()> {
    let bytes = s.as_bytes();
    let mut start = 0;
    for pos in memchr3_iter(b'\t', b'\n', b'\r', bytes) {
        write_escaped_memchr3(w, &s[start..pos], [b'&', b'<', b'"'], [b"&amp;", b"&lt;", b"&quot;"])?;
        let reference: &[u8] = match bytes[pos] {
            b'\t' => b"&#x9;",
            b'\n' => b"&#xA;",
            _ => b"&#xD;",
        };
        w.write_all(reference).map_err(io_err)?;
        start = pos + 1;
    }
    write_escaped_memchr3(w, &s[start..], [b'&', b'<', b'"'], [b"&amp;", b"&lt;", b"&quot;"])
}
