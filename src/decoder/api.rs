use crate::cursor::XmlCursor;
use crate::events::{CollectEvents, DecodeEvents};
use crate::options::DecodeOptions;
use crate::registry::Registry;
use crate::Result;

use super::{Decoded, Decoder};

/// Decodiert ein XML-Dokument (Container + Multi-Ref-Elemente).
pub fn decode_str(
    xml: &str,
    registry: &Registry,
    options: &DecodeOptions,
    events: &mut dyn DecodeEvents,
) -> Result<Decoded> {
    let cursor = XmlCursor::new(xml)?;
    Decoder::new(cursor, registry, options.clone(), events).decode()
}

/// Wie [`decode_str`], sammelt aber alle Diagnosen.
///
/// Returns: (Decoded, gesammelte Diagnosen)
pub fn decode_str_collecting(
    xml: &str,
    registry: &Registry,
    options: &DecodeOptions,
) -> Result<(Decoded, CollectEvents)> {
    let mut events = CollectEvents::new();
    let decoded = decode_str(xml, registry, options, &mut events)?;
    Ok((decoded, events))
}
