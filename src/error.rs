//! Central error type for multi-ref encoding and decoding.
//!
//! Every structural problem aborts the current document. Conditions that are
//! only worth a diagnostic (unknown nodes, unreferenced objects) never show up
//! here; they go to [`crate::events::DecodeEvents`].

use core::fmt;
use std::borrow::Cow;

/// All errors raised by the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A primitive lexical form could not be parsed.
    Format {
        /// XSD name of the expected kind (e.g. `int`, `dateTime`).
        kind: Cow<'static, str>,
        /// The offending lexical value.
        value: String,
    },
    /// An enum token is not part of the enum's name table.
    UnknownEnumValue {
        /// The offending token.
        value: String,
        /// Declared name of the enum type.
        enum_name: String,
    },
    /// A QName value uses a prefix that is not bound in the current scope.
    UndefinedPrefix(String),
    /// A prefix is bound twice to different namespaces in one scope frame.
    DuplicateNamespace { prefix: String, uri: String },
    /// An id was referenced (`href`/`ref`) but never declared in the document.
    UnresolvedReference(String),
    /// A resolved reference does not fit the element type of its array.
    ArrayElementType {
        /// The id that was referenced.
        id: String,
        /// Type of the resolved value.
        actual: String,
        /// Array index of the slot.
        index: usize,
    },
    /// A resolved reference does not fit the declared type of its field.
    ReferenceType {
        /// The id that was referenced.
        id: String,
        /// Declared type of the slot.
        expected: String,
        /// Type of the resolved value.
        actual: String,
    },
    /// An inline value does not fit the declared type of the slot it was
    /// read into (e.g. `xsi:type="xsd:string"` in an `int` field).
    SlotType {
        /// Element name of the slot.
        element: String,
        /// Declared type of the slot.
        expected: String,
        /// Type of the value on the wire.
        actual: String,
    },
    /// No type descriptor exists for a required qualified name.
    UnknownType(String),
    /// The encoder was handed a value whose type is not registered.
    UnknownStructType(String),
    /// The array type attribute is malformed (brackets, length, empty value).
    InvalidArrayType(String),
    /// A multi-dimensional (non-jagged) array was found.
    ArrayDimensions(String),
    /// A SOAP 1.1 `href` does not start with `#`.
    MissingHref(String),
    /// The document does not contain a root element to decode.
    EmptyDocument,
    /// The markup cursor failed (malformed document, unexpected token).
    Xml(String),
    /// Writing the output failed.
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format { kind, value } => {
                write!(f, "the string '{value}' is not a valid {kind} value")
            }
            Self::UnknownEnumValue { value, enum_name } => {
                write!(f, "instance validation error: '{value}' is not a valid value for {enum_name}")
            }
            Self::UndefinedPrefix(prefix) => write!(f, "namespace prefix '{prefix}' is not defined"),
            Self::DuplicateNamespace { prefix, uri } => {
                write!(f, "prefix '{prefix}' is already bound in this scope, cannot rebind it to '{uri}'")
            }
            Self::UnresolvedReference(id) => {
                write!(f, "the referenced element with id '{id}' was not found in the document")
            }
            Self::ArrayElementType { id, actual, index } => write!(
                f,
                "element with id '{id}' of type {actual} cannot be stored at array index {index}"
            ),
            Self::ReferenceType { id, expected, actual } => write!(
                f,
                "element with id '{id}' of type {actual} cannot be assigned to a slot of type {expected}"
            ),
            Self::SlotType { element, expected, actual } => write!(
                f,
                "element {element} of type {actual} cannot be stored in a slot of type {expected}"
            ),
            Self::UnknownType(name) => write!(f, "the type {name} is not known"),
            Self::UnknownStructType(name) => write!(f, "the native type {name} was not registered for encoding"),
            Self::InvalidArrayType(reason) => write!(f, "invalid array type: {reason}"),
            Self::ArrayDimensions(tag) => {
                write!(f, "only single-dimensional arrays are supported ({tag})")
            }
            Self::MissingHref(href) => write!(f, "the href '{href}' is missing its leading '#'"),
            Self::EmptyDocument => write!(f, "the document contains no element to decode"),
            Self::Xml(msg) => write!(f, "markup error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Builds a `Format` error for the XSD kind `kind`.
    pub fn format(kind: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        Self::Format {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// True for errors that stem from the document contents rather than the
    /// caller's graph or the output sink.
    pub fn is_document_error(&self) -> bool {
        !matches!(self, Self::UnknownStructType(_) | Self::Io(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
