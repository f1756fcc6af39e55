//! Markup cursor: the pull interface the decoder reads from.
//!
//! The cursor sits on one node at a time. Empty elements (`<a/>`) show up as a
//! start node followed by an end node, so the decoder never needs a separate
//! code path for them. Character data may arrive in several text nodes
//! (plain text, CDATA sections and entity references are separate chunks).
//!
//! [`XmlCursor`] is the quick-xml backed implementation. It keeps its own
//! [`NamespaceScope`]: while the cursor is on a start or end node the scope
//! contains that element's declarations.

use memchr::{memchr, memchr_iter};
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::namespace::{NamespaceScope, XMLNS_NS};
use crate::qname::QName;
use crate::{Error, Result};

/// Kind of the node the cursor is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    StartElement,
    EndElement,
    Text,
    EndOfDocument,
}

/// One (non-`xmlns`) attribute of a start element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

/// 1-based line and column of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u64,
    pub column: u64,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

pub trait MarkupCursor {
    fn node_kind(&self) -> NodeKind;

    /// Name of the current start or end element.
    fn name(&self) -> &QName;

    /// Attributes of the current start element; namespace declarations are
    /// not included.
    fn attributes(&self) -> &[Attribute];

    /// True if the current start element was written as `<a/>`.
    fn is_empty_element(&self) -> bool;

    /// Content of the current text node.
    fn text(&self) -> &str;

    /// Moves to the next node.
    fn advance(&mut self) -> Result<()>;

    /// Prefix bindings in effect at the current node.
    fn scope(&self) -> &NamespaceScope;

    fn position(&self) -> Position;

    /// Attribute value by local name and namespace URI (`""` = unqualified).
    fn attribute(&self, local_name: &str, namespace: &str) -> Option<&str> {
        self.attributes()
            .iter()
            .find(|a| &*a.name.local_name == local_name && &*a.name.uri == namespace)
            .map(|a| a.value.as_str())
    }

    /// Skips whitespace-only text and returns the kind of the next
    /// significant node.
    fn move_to_content(&mut self) -> Result<NodeKind> {
        while self.node_kind() == NodeKind::Text && self.text().trim().is_empty() {
            self.advance()?;
        }
        Ok(self.node_kind())
    }

    /// Skips the current element including its subtree, or the current node
    /// if it is not a start element.
    fn skip(&mut self) -> Result<()> {
        if self.node_kind() != NodeKind::StartElement {
            return self.advance();
        }
        let mut depth = 0usize;
        loop {
            match self.node_kind() {
                NodeKind::StartElement => depth += 1,
                NodeKind::EndElement => depth -= 1,
                NodeKind::EndOfDocument => {
                    return Err(Error::Xml("unexpected end of document".into()));
                }
                NodeKind::Text => {}
            }
            self.advance()?;
            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// Consumes the current start element.
    fn read_start_element(&mut self) -> Result<()> {
        if self.move_to_content()? != NodeKind::StartElement {
            return Err(Error::Xml(format!("expected start element at {}", self.position())));
        }
        self.advance()
    }

    /// Consumes the current start element and feeds its text chunks to
    /// `sink`. Stops on the end node without consuming it, so the element's
    /// scope is still active. Child elements are an error.
    fn read_text_chunks(&mut self, sink: &mut dyn FnMut(&str) -> Result<()>) -> Result<()> {
        let name = self.name().clone();
        self.read_start_element()?;
        loop {
            match self.node_kind() {
                NodeKind::Text => {
                    sink(self.text())?;
                    self.advance()?;
                }
                NodeKind::EndElement => return Ok(()),
                NodeKind::StartElement => {
                    return Err(Error::Xml(format!(
                        "element {name} must only contain text, found {} at {}",
                        self.name(),
                        self.position()
                    )));
                }
                NodeKind::EndOfDocument => {
                    return Err(Error::Xml(format!("unexpected end of document inside {name}")));
                }
            }
        }
    }
}

// ============================================================================
// quick-xml backed cursor
// ============================================================================

#[derive(Debug)]
enum Current {
    Start { name: QName, attributes: Vec<Attribute>, empty: bool },
    End { name: QName },
    Text(String),
    Eof,
}

/// Cursor over an in-memory XML document.
pub struct XmlCursor<'a> {
    source: &'a str,
    reader: Reader<&'a [u8]>,
    scope: NamespaceScope,
    current: Current,
    /// The end node of the current element has been left; its frame goes.
    pop_on_advance: bool,
    depth: usize,
    /// Names of the open (non-empty) elements; quick-xml already checks
    /// that end tags match.
    open: Vec<QName>,
    position: Position,
    /// Incremental line counting: byte offset and line number of the last
    /// computed position.
    line_offset: usize,
    line: u64,
    line_start: usize,
    empty_name: QName,
}

impl<'a> XmlCursor<'a> {
    /// Creates a cursor and moves it to the first node.
    pub fn new(source: &'a str) -> Result<Self> {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(false);
        let mut cursor = Self {
            source,
            reader,
            scope: NamespaceScope::new(),
            current: Current::Eof,
            pop_on_advance: false,
            depth: 0,
            open: Vec::new(),
            position: Position { line: 1, column: 1 },
            line_offset: 0,
            line: 1,
            line_start: 0,
            empty_name: QName::default(),
        };
        cursor.current = cursor.read_next()?;
        Ok(cursor)
    }

    fn locate(&mut self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        if offset < self.line_offset {
            // rueckwaerts: von vorne zaehlen
            self.line_offset = 0;
            self.line = 1;
            self.line_start = 0;
        }
        let bytes = &self.source.as_bytes()[self.line_offset..offset];
        for nl in memchr_iter(b'\n', bytes) {
            self.line += 1;
            self.line_start = self.line_offset + nl + 1;
        }
        self.line_offset = offset;
        Position {
            line: self.line,
            column: (offset - self.line_start) as u64 + 1,
        }
    }

    fn xml_error(&self, msg: impl std::fmt::Display) -> Error {
        Error::Xml(format!("{msg} at {}", self.position))
    }

    fn read_next(&mut self) -> Result<Current> {
        loop {
            let before = self.reader.buffer_position() as usize;
            let event = self
                .reader
                .read_event()
                .map_err(|e| Error::Xml(format!("{e} at byte {}", self.reader.buffer_position())))?;
            match event {
                Event::Start(e) => {
                    let tag = before + memchr(b'<', &self.source.as_bytes()[before..]).unwrap_or(0);
                    self.position = self.locate(tag);
                    return self.start(&e, false);
                }
                Event::Empty(e) => {
                    let tag = before + memchr(b'<', &self.source.as_bytes()[before..]).unwrap_or(0);
                    self.position = self.locate(tag);
                    return self.start(&e, true);
                }
                Event::End(_) => {
                    self.position = self.locate(before);
                    let name = self
                        .open
                        .pop()
                        .ok_or_else(|| self.xml_error("unbalanced end element"))?;
                    return Ok(Current::End { name });
                }
                Event::Text(e) => {
                    if self.depth == 0 {
                        continue;
                    }
                    self.position = self.locate(before);
                    let raw = std::str::from_utf8(&e).map_err(|er| self.xml_error(er))?;
                    let text = unescape(raw).map_err(|er| self.xml_error(er))?;
                    if text.is_empty() {
                        continue;
                    }
                    return Ok(Current::Text(text.into_owned()));
                }
                Event::CData(e) => {
                    if self.depth == 0 {
                        continue;
                    }
                    self.position = self.locate(before);
                    let text = std::str::from_utf8(&e).map_err(|er| self.xml_error(er))?;
                    return Ok(Current::Text(text.to_string()));
                }
                Event::GeneralRef(e) => {
                    if self.depth == 0 {
                        continue;
                    }
                    self.position = self.locate(before);
                    let name = std::str::from_utf8(e.as_ref()).map_err(|er| self.xml_error(er))?;
                    return Ok(Current::Text(resolve_reference(name).ok_or_else(|| {
                        self.xml_error(format_args!("unknown entity reference '&{name};'"))
                    })?));
                }
                Event::Eof => {
                    if self.depth != 0 {
                        return Err(self.xml_error("unexpected end of document"));
                    }
                    return Ok(Current::Eof);
                }
                // Kommentare, PIs, Deklaration, DOCTYPE: nicht relevant
                _ => continue,
            }
        }
    }

    fn start(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<Current> {
        self.scope.push_frame();
        self.depth += 1;

        let mut raw_attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|er| self.xml_error(er))?;
            let key = std::str::from_utf8(attr.key.as_ref()).map_err(|er| self.xml_error(er))?;
            let raw = std::str::from_utf8(attr.value.as_ref()).map_err(|er| self.xml_error(er))?;
            let value = unescape(raw).map_err(|er| self.xml_error(er))?.into_owned();
            if key == "xmlns" {
                self.scope.bind("", &value)?;
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                if value.is_empty() {
                    return Err(self.xml_error(format_args!("prefix '{prefix}' bound to empty namespace")));
                }
                self.scope.bind(prefix, &value)?;
            } else {
                raw_attributes.push((key.to_string(), value));
            }
        }

        let raw_name = std::str::from_utf8(e.name().as_ref())
            .map_err(|er| self.xml_error(er))?
            .to_string();
        let name = self.resolve(&raw_name, true)?;
        if !empty {
            self.open.push(name.clone());
        }
        let mut attributes = Vec::with_capacity(raw_attributes.len());
        for (key, value) in raw_attributes {
            attributes.push(Attribute { name: self.resolve(&key, false)?, value });
        }
        Ok(Current::Start { name, attributes, empty })
    }

    /// Resolves `prefix:local`. Unprefixed attributes have no namespace;
    /// unprefixed elements take the default namespace.
    fn resolve(&self, raw: &str, is_element: bool) -> Result<QName> {
        match raw.split_once(':') {
            Some((prefix, local)) => {
                if prefix == "xmlns" {
                    return Ok(QName::new(XMLNS_NS, local));
                }
                let uri = self
                    .scope
                    .lookup_namespace(prefix)
                    .ok_or_else(|| Error::UndefinedPrefix(prefix.to_string()))?;
                Ok(QName::with_prefix(uri, local, prefix))
            }
            None if is_element => {
                let uri = self.scope.lookup_namespace("").unwrap_or("");
                Ok(QName::new(uri, raw))
            }
            None => Ok(QName::new("", raw)),
        }
    }
}

/// Character references and the five predefined entities.
fn resolve_reference(name: &str) -> Option<String> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    resolve_predefined_entity(name).map(str::to_string)
}

impl MarkupCursor for XmlCursor<'_> {
    fn node_kind(&self) -> NodeKind {
        match self.current {
            Current::Start { .. } => NodeKind::StartElement,
            Current::End { .. } => NodeKind::EndElement,
            Current::Text(_) => NodeKind::Text,
            Current::Eof => NodeKind::EndOfDocument,
        }
    }

    fn name(&self) -> &QName {
        match &self.current {
            Current::Start { name, .. } | Current::End { name } => name,
            _ => &self.empty_name,
        }
    }

    fn attributes(&self) -> &[Attribute] {
        match &self.current {
            Current::Start { attributes, .. } => attributes,
            _ => &[],
        }
    }

    fn is_empty_element(&self) -> bool {
        matches!(self.current, Current::Start { empty: true, .. })
    }

    fn text(&self) -> &str {
        match &self.current {
            Current::Text(t) => t,
            _ => "",
        }
    }

    fn advance(&mut self) -> Result<()> {
        if self.pop_on_advance {
            self.scope.pop_frame();
            self.depth -= 1;
            self.pop_on_advance = false;
        }
        let next = match &self.current {
            // <a/>: synthetisches Ende
            Current::Start { name, empty: true, .. } => Current::End { name: name.clone() },
            Current::Eof => return Ok(()),
            _ => self.read_next()?,
        };
        self.current = next;
        if let Current::End { .. } = self.current {
            self.pop_on_advance = true;
        }
        Ok(())
    }

    fn scope(&self) -> &NamespaceScope {
        &self.scope
    }

    fn position(&self) -> Position {
        self.position
    }
}
