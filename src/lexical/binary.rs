//! `base64Binary` and `hexBinary` lexical forms.
//!
//! Decoding is chunked: the markup cursor may hand over the text of one element
//! in several pieces. [`BinaryAccumulator`] decodes every complete quantum of a
//! chunk right away and stores the bytes in blocks that start at 1 KiB and
//! double up to 64 KiB. The blocks are joined once at the end.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::{Error, Result};

const INITIAL_BLOCK_SIZE: usize = 1024;
const MAX_BLOCK_SIZE: usize = 64 * 1024;

/// Which binary lexical form an element carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryEncoding {
    Base64,
    Hex,
}

impl BinaryEncoding {
    pub fn xsd_name(self) -> &'static str {
        match self {
            Self::Base64 => "base64Binary",
            Self::Hex => "hexBinary",
        }
    }

    /// Characters per decodable unit.
    fn quantum(self) -> usize {
        match self {
            Self::Base64 => 4,
            Self::Hex => 2,
        }
    }
}

/// Encodes bytes as base64.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Encodes bytes as uppercase hex.
pub fn encode_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{:02X}", b);
    }
    s
}

/// One-shot decode of a complete lexical value.
pub fn decode(value: &str, encoding: BinaryEncoding) -> Result<Vec<u8>> {
    let mut acc = BinaryAccumulator::new(encoding);
    acc.push_chunk(value)?;
    acc.finish()
}

/// Streaming decoder for chunked binary content.
#[derive(Debug)]
pub struct BinaryAccumulator {
    encoding: BinaryEncoding,
    /// Characters of an incomplete quantum carried over to the next chunk.
    pending: String,
    blocks: Vec<Vec<u8>>,
    current: Vec<u8>,
    block_size: usize,
    total: usize,
}

impl BinaryAccumulator {
    pub fn new(encoding: BinaryEncoding) -> Self {
        Self {
            encoding,
            pending: String::new(),
            blocks: Vec::new(),
            current: Vec::with_capacity(INITIAL_BLOCK_SIZE),
            block_size: INITIAL_BLOCK_SIZE,
            total: 0,
        }
    }

    /// Decodes all complete quanta of `chunk` (plus what was carried over).
    pub fn push_chunk(&mut self, chunk: &str) -> Result<()> {
        if !chunk.is_ascii() {
            return Err(Error::format(self.encoding.xsd_name(), chunk));
        }
        self.pending
            .extend(chunk.chars().filter(|c| !c.is_ascii_whitespace()));
        let quantum = self.encoding.quantum();
        let usable = self.pending.len() - self.pending.len() % quantum;
        if usable == 0 {
            return Ok(());
        }
        let rest = self.pending.split_off(usable);
        let ready = std::mem::replace(&mut self.pending, rest);
        let bytes = match self.encoding {
            BinaryEncoding::Base64 => STANDARD
                .decode(ready.as_bytes())
                .map_err(|_| Error::format("base64Binary", ready.as_str()))?,
            BinaryEncoding::Hex => decode_hex(&ready)?,
        };
        self.append(&bytes);
        Ok(())
    }

    fn append(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            let room = self.block_size - self.current.len();
            let take = room.min(bytes.len());
            self.current.extend_from_slice(&bytes[..take]);
            self.total += take;
            bytes = &bytes[take..];
            if self.current.len() == self.block_size {
                self.block_size = (self.block_size * 2).min(MAX_BLOCK_SIZE);
                let full = std::mem::replace(&mut self.current, Vec::with_capacity(self.block_size));
                self.blocks.push(full);
            }
        }
    }

    /// Number of bytes decoded so far.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Joins all blocks. Fails if an incomplete quantum is left over.
    pub fn finish(self) -> Result<Vec<u8>> {
        if !self.pending.is_empty() {
            return Err(Error::format(self.encoding.xsd_name(), self.pending));
        }
        if self.blocks.is_empty() {
            return Ok(self.current);
        }
        let mut out = Vec::with_capacity(self.total);
        for block in &self.blocks {
            out.extend_from_slice(block);
        }
        out.extend_from_slice(&self.current);
        Ok(out)
    }
}

fn decode_hex(value: &str) -> Result<Vec<u8>> {
    fn nibble(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }
    value
        .as_bytes()
        .chunks_exact(2)
        .map(|pair| match (nibble(pair[0]), nibble(pair[1])) {
            (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
            _ => Err(Error::format("hexBinary", value)),
        })
        .collect()
}
