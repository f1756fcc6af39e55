//! Qualified names (namespace URI + local name).
//!
//! A [`QName`] identifies element names, attribute names and type names on the
//! wire. Equality and hashing only consider URI and local name; the prefix is a
//! purely lexical detail that is carried along for diagnostics.
//!
//! Die Identität (uri, local_name) wird einmal beim Erzeugen gehasht, damit
//! Registry- und Callback-Lookups nicht bei jedem Zugriff beide Strings hashen.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::AHasher;

/// A namespace-qualified name.
#[derive(Clone)]
pub struct QName {
    /// The namespace URI. Empty string means no namespace.
    pub uri: Arc<str>,
    /// The local name.
    pub local_name: Arc<str>,
    /// The prefix the name was written with, if known.
    pub prefix: Option<Arc<str>>,
    /// Vorberechneter Hash von (uri, local_name).
    identity: u64,
}

impl fmt::Debug for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QName")
            .field("uri", &self.uri)
            .field("local_name", &self.local_name)
            .field("prefix", &self.prefix)
            .finish()
    }
}

/// Hash of (uri, local_name), shared by `QName::new` and friends.
pub(crate) fn compute_identity(uri: &str, local_name: &str) -> u64 {
    let mut hasher = AHasher::default();
    uri.hash(&mut hasher);
    local_name.hash(&mut hasher);
    hasher.finish()
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.uri == other.uri
            && self.local_name == other.local_name
    }
}

impl Eq for QName {}

/// Ordering consistent with `PartialEq`: local name first, then URI.
impl PartialOrd for QName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.local_name
            .cmp(&other.local_name)
            .then_with(|| self.uri.cmp(&other.uri))
    }
}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

/// Clark notation: `{uri}local` or just `local` without namespace.
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.uri.is_empty() {
            f.write_str(&self.local_name)
        } else {
            write!(f, "{{{}}}{}", self.uri, self.local_name)
        }
    }
}

impl Default for QName {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl QName {
    /// Creates a new QName with the given URI and local name, without prefix.
    pub fn new(uri: impl Into<Arc<str>>, local_name: impl Into<Arc<str>>) -> Self {
        let uri = uri.into();
        let local_name = local_name.into();
        let identity = compute_identity(&uri, &local_name);
        Self {
            uri,
            local_name,
            prefix: None,
            identity,
        }
    }

    /// Creates a new QName with URI, local name and prefix.
    pub fn with_prefix(
        uri: impl Into<Arc<str>>,
        local_name: impl Into<Arc<str>>,
        prefix: impl Into<Arc<str>>,
    ) -> Self {
        let mut qname = Self::new(uri, local_name);
        qname.prefix = Some(prefix.into());
        qname
    }

    /// True for the empty name (`""`, `""`).
    pub fn is_empty(&self) -> bool {
        self.uri.is_empty() && self.local_name.is_empty()
    }

    /// Same name in another namespace (prefix dropped).
    pub fn in_namespace(&self, uri: impl Into<Arc<str>>) -> Self {
        Self::new(uri, Arc::clone(&self.local_name))
    }

    /// Vorberechneter Identity-Hash von (uri, local_name).
    #[inline]
    pub fn identity(&self) -> u64 {
        self.identity
    }
}

/// Splits a lexical `prefix:local` value on its *last* colon.
///
/// Returns `(None, value)` when there is no colon; an empty prefix (`":x"`) is
/// reported as `Some("")` and treated like "no prefix" by the resolvers.
pub fn split_lexical(value: &str) -> (Option<&str>, &str) {
    match value.rfind(':') {
        Some(pos) => (Some(&value[..pos]), &value[pos + 1..]),
        None => (None, value),
    }
}
