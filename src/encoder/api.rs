use std::io::Write;

use crate::graph::{Graph, Value};
use crate::options::EncodeOptions;
use crate::registry::Registry;
use crate::writer::XmlMarkupWriter;
use crate::{Error, Result};

use super::Encoder;

/// Kodiert `root` als XML-Dokument in `sink` und gibt `sink` zurueck.
pub fn encode_to_writer<W: Write>(
    sink: W,
    graph: &Graph,
    root: &Value,
    registry: &Registry,
    options: &EncodeOptions,
) -> Result<W> {
    let mut writer = XmlMarkupWriter::new(sink);
    if let Some(width) = options.indent() {
        writer = writer.with_indent(width);
    }
    writer.write_declaration()?;
    let writer = Encoder::new(writer, graph, registry, options.clone()).encode(root)?;
    writer.into_inner()
}

/// Kodiert `root` als XML-String.
pub fn encode_to_string(graph: &Graph, root: &Value, registry: &Registry, options: &EncodeOptions) -> Result<String> {
    let bytes = encode_to_writer(Vec::new(), graph, root, registry, options)?;
    String::from_utf8(bytes).map_err(|e| Error::Io(e.to_string()))
}
