//! Lexical codec: primitive values and their canonical string forms.
//!
//! [`PrimitiveKind`] is the closed set of primitive wire types. Every kind has
//! exactly one canonical output form; the parsers accept the XSD lexical space
//! (surrounding whitespace collapsed, except for `string`).

pub mod binary;
pub mod datetime;
pub mod decimal;
pub mod enumeration;
pub mod float;

use std::fmt;

use uuid::Uuid;

use crate::namespace::{
    NON_XSD_TYPES_NS, SOAP12_ENC_NS, SOAP_ENC_NS, XSD_NS, XSD_NS_1999, XSD_NS_2000,
};
use crate::namespace::NamespaceScope;
use crate::qname::{QName, split_lexical};
use crate::{Error, Result};

pub use binary::{BinaryAccumulator, BinaryEncoding};
pub use datetime::{ClockTime, DateTime, DateTimeKind};
pub use decimal::Decimal;
pub use enumeration::EnumDef;

/// Primitive wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Int,
    Boolean,
    Short,
    Long,
    Float,
    Double,
    Decimal,
    DateTime,
    Date,
    Time,
    UnsignedByte,
    Byte,
    UnsignedShort,
    UnsignedInt,
    UnsignedLong,
    QName,
    Base64Binary,
    HexBinary,
    Char,
    Guid,
}

/// XSD names that carry no own value space here and decode as `string`.
const STRING_DERIVED: &[&str] = &[
    "anyURI", "normalizedString", "token", "language", "Name", "NCName", "NMTOKEN",
    "NMTOKENS", "ID", "IDREF", "IDREFS", "ENTITY", "ENTITIES", "NOTATION", "duration",
    "gYear", "gYearMonth", "gMonth", "gMonthDay", "gDay", "integer", "positiveInteger",
    "negativeInteger", "nonPositiveInteger", "nonNegativeInteger",
];

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 21] = [
        Self::String, Self::Int, Self::Boolean, Self::Short, Self::Long, Self::Float,
        Self::Double, Self::Decimal, Self::DateTime, Self::Date, Self::Time,
        Self::UnsignedByte, Self::Byte, Self::UnsignedShort, Self::UnsignedInt,
        Self::UnsignedLong, Self::QName, Self::Base64Binary, Self::HexBinary, Self::Char,
        Self::Guid,
    ];

    /// Local type name on the wire.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Boolean => "boolean",
            Self::Short => "short",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::DateTime => "dateTime",
            Self::Date => "date",
            Self::Time => "time",
            Self::UnsignedByte => "unsignedByte",
            Self::Byte => "byte",
            Self::UnsignedShort => "unsignedShort",
            Self::UnsignedInt => "unsignedInt",
            Self::UnsignedLong => "unsignedLong",
            Self::QName => "QName",
            Self::Base64Binary => "base64Binary",
            Self::HexBinary => "hexBinary",
            Self::Char => "char",
            Self::Guid => "guid",
        }
    }

    /// Namespace the type name is written in.
    pub fn namespace(self) -> &'static str {
        match self {
            Self::Char | Self::Guid => NON_XSD_TYPES_NS,
            _ => XSD_NS,
        }
    }

    pub fn qname(self) -> QName {
        QName::new(self.namespace(), self.type_name())
    }

    /// Maps a wire type name to a kind. Accepts the pre-recommendation XSD
    /// namespaces, the SOAP encoding aliases and the string-derived names.
    pub fn from_type_name(name: &QName) -> Option<Self> {
        let local = &*name.local_name;
        match &*name.uri {
            NON_XSD_TYPES_NS => match local {
                "char" => Some(Self::Char),
                "guid" => Some(Self::Guid),
                _ => None,
            },
            SOAP_ENC_NS | SOAP12_ENC_NS if local == "base64" => Some(Self::Base64Binary),
            XSD_NS | XSD_NS_2000 | XSD_NS_1999 | SOAP_ENC_NS | SOAP12_ENC_NS => {
                Self::ALL
                    .iter()
                    .copied()
                    .filter(|k| k.namespace() == XSD_NS)
                    .find(|k| k.type_name() == local)
                    .or_else(|| STRING_DERIVED.contains(&local).then_some(Self::String))
            }
            _ => None,
        }
    }

    /// Binary kinds decode chunk by chunk.
    pub fn binary_encoding(self) -> Option<BinaryEncoding> {
        match self {
            Self::Base64Binary => Some(BinaryEncoding::Base64),
            Self::HexBinary => Some(BinaryEncoding::Hex),
            _ => None,
        }
    }
}

/// A primitive value.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    String(String),
    Int(i32),
    Boolean(bool),
    Short(i16),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    /// `date`, `time` or `dateTime`, see [`DateTime::kind`].
    DateTime(DateTime),
    UnsignedByte(u8),
    Byte(i8),
    UnsignedShort(u16),
    UnsignedInt(u32),
    UnsignedLong(u64),
    QName(QName),
    Base64(Vec<u8>),
    Hex(Vec<u8>),
    Char(char),
    Guid(Uuid),
}

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Self::String(_) => PrimitiveKind::String,
            Self::Int(_) => PrimitiveKind::Int,
            Self::Boolean(_) => PrimitiveKind::Boolean,
            Self::Short(_) => PrimitiveKind::Short,
            Self::Long(_) => PrimitiveKind::Long,
            Self::Float(_) => PrimitiveKind::Float,
            Self::Double(_) => PrimitiveKind::Double,
            Self::Decimal(_) => PrimitiveKind::Decimal,
            Self::DateTime(dt) => match dt.kind() {
                DateTimeKind::Date => PrimitiveKind::Date,
                DateTimeKind::Time => PrimitiveKind::Time,
                DateTimeKind::DateTime => PrimitiveKind::DateTime,
            },
            Self::UnsignedByte(_) => PrimitiveKind::UnsignedByte,
            Self::Byte(_) => PrimitiveKind::Byte,
            Self::UnsignedShort(_) => PrimitiveKind::UnsignedShort,
            Self::UnsignedInt(_) => PrimitiveKind::UnsignedInt,
            Self::UnsignedLong(_) => PrimitiveKind::UnsignedLong,
            Self::QName(_) => PrimitiveKind::QName,
            Self::Base64(_) => PrimitiveKind::Base64Binary,
            Self::Hex(_) => PrimitiveKind::HexBinary,
            Self::Char(_) => PrimitiveKind::Char,
            Self::Guid(_) => PrimitiveKind::Guid,
        }
    }

    /// Value equality where `NaN` equals `NaN`; used for graph comparison.
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan()),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan()),
            _ => self == other,
        }
    }
}

impl From<&str> for Primitive {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Primitive {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i32> for Primitive {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Primitive {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<bool> for Primitive {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<f64> for Primitive {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

/// Lexical form; QNames are shown in Clark notation.
impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QName(q) => write!(f, "{q}"),
            other => f.write_str(&format_plain(other)),
        }
    }
}

// ============================================================================
// Encode
// ============================================================================

/// Canonical lexical form of `value`.
///
/// `prefix_for` maps a namespace URI to a bound prefix and is only called for
/// QName values (it may declare the namespace on the fly).
pub fn format(value: &Primitive, prefix_for: &mut dyn FnMut(&str) -> Result<String>) -> Result<String> {
    match value {
        Primitive::QName(q) => {
            if q.uri.is_empty() {
                return Ok(q.local_name.to_string());
            }
            let prefix = prefix_for(&q.uri)?;
            if prefix.is_empty() {
                Ok(q.local_name.to_string())
            } else {
                Ok(format!("{}:{}", prefix, q.local_name))
            }
        }
        other => Ok(format_plain(other)),
    }
}

/// Lexical form of everything but QName, which needs a prefix context.
fn format_plain(value: &Primitive) -> String {
    match value {
        Primitive::String(s) => s.clone(),
        Primitive::Int(v) => v.to_string(),
        Primitive::Boolean(v) => (if *v { "true" } else { "false" }).to_string(),
        Primitive::Short(v) => v.to_string(),
        Primitive::Long(v) => v.to_string(),
        Primitive::Float(v) => float::format_f32(*v),
        Primitive::Double(v) => float::format_f64(*v),
        Primitive::Decimal(d) => d.to_string(),
        Primitive::DateTime(dt) => dt.to_string(),
        Primitive::UnsignedByte(v) => v.to_string(),
        Primitive::Byte(v) => v.to_string(),
        Primitive::UnsignedShort(v) => v.to_string(),
        Primitive::UnsignedInt(v) => v.to_string(),
        Primitive::UnsignedLong(v) => v.to_string(),
        Primitive::QName(q) => q.to_string(),
        Primitive::Base64(b) => binary::encode_base64(b),
        Primitive::Hex(b) => binary::encode_hex(b),
        // char geht als Zahlencode ueber den Draht
        Primitive::Char(c) => (*c as u32).to_string(),
        Primitive::Guid(g) => g.hyphenated().to_string(),
    }
}

// ============================================================================
// Decode
// ============================================================================

/// Parses `value` as `kind`. QName prefixes are resolved against `scope`.
pub fn parse(value: &str, kind: PrimitiveKind, scope: &NamespaceScope) -> Result<Primitive> {
    let trimmed = value.trim();
    Ok(match kind {
        PrimitiveKind::String => Primitive::String(value.to_string()),
        PrimitiveKind::Int => Primitive::Int(parse_integer(trimmed, kind)?),
        PrimitiveKind::Boolean => Primitive::Boolean(parse_boolean(trimmed)?),
        PrimitiveKind::Short => Primitive::Short(parse_integer(trimmed, kind)?),
        PrimitiveKind::Long => Primitive::Long(parse_integer(trimmed, kind)?),
        PrimitiveKind::Float => Primitive::Float(float::parse_f32(trimmed)?),
        PrimitiveKind::Double => Primitive::Double(float::parse_f64(trimmed)?),
        PrimitiveKind::Decimal => Primitive::Decimal(trimmed.parse()?),
        PrimitiveKind::DateTime => Primitive::DateTime(datetime::parse(trimmed, DateTimeKind::DateTime)?),
        PrimitiveKind::Date => Primitive::DateTime(datetime::parse(trimmed, DateTimeKind::Date)?),
        PrimitiveKind::Time => Primitive::DateTime(datetime::parse(trimmed, DateTimeKind::Time)?),
        PrimitiveKind::UnsignedByte => Primitive::UnsignedByte(parse_integer(trimmed, kind)?),
        PrimitiveKind::Byte => Primitive::Byte(parse_integer(trimmed, kind)?),
        PrimitiveKind::UnsignedShort => Primitive::UnsignedShort(parse_integer(trimmed, kind)?),
        PrimitiveKind::UnsignedInt => Primitive::UnsignedInt(parse_integer(trimmed, kind)?),
        PrimitiveKind::UnsignedLong => Primitive::UnsignedLong(parse_integer(trimmed, kind)?),
        PrimitiveKind::QName => Primitive::QName(parse_qname(trimmed, scope)?),
        PrimitiveKind::Base64Binary => Primitive::Base64(binary::decode(trimmed, BinaryEncoding::Base64)?),
        PrimitiveKind::HexBinary => Primitive::Hex(binary::decode(trimmed, BinaryEncoding::Hex)?),
        PrimitiveKind::Char => Primitive::Char(parse_char(trimmed)?),
        PrimitiveKind::Guid => Primitive::Guid(
            Uuid::try_parse(trimmed).map_err(|_| Error::format("guid", value))?,
        ),
    })
}

fn parse_integer<T: std::str::FromStr>(value: &str, kind: PrimitiveKind) -> Result<T> {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::format(kind.type_name(), value));
    }
    value.parse().map_err(|_| Error::format(kind.type_name(), value))
}

fn parse_boolean(value: &str) -> Result<bool> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(Error::format("boolean", value)),
    }
}

fn parse_char(value: &str) -> Result<char> {
    let code: u32 = parse_integer(value, PrimitiveKind::Char)?;
    char::from_u32(code).ok_or_else(|| Error::format("char", value))
}

/// Resolves `prefix:local` against `scope`. An empty or missing prefix
/// resolves against the default namespace.
pub fn parse_qname(value: &str, scope: &NamespaceScope) -> Result<QName> {
    let (prefix, local) = split_lexical(value.trim());
    if local.is_empty() {
        return Err(Error::format("QName", value));
    }
    let prefix = prefix.unwrap_or("");
    let uri = scope
        .lookup_namespace(prefix)
        .ok_or_else(|| Error::UndefinedPrefix(prefix.to_string()))?;
    if prefix.is_empty() {
        Ok(QName::new(uri, local))
    } else {
        Ok(QName::with_prefix(uri, local, prefix))
    }
}
