//! Encoding style and per-document options.
//!
//! # Beispiel
//!
//! ```
//! use multiref::options::{EncodeOptions, EncodingStyle};
//!
//! let opts = EncodeOptions::default()
//!     .with_style(EncodingStyle::Soap12)
//!     .with_id_base("doc1_");
//!
//! assert_eq!(opts.style(), EncodingStyle::Soap12);
//! assert_eq!(opts.id_base(), "doc1_");
//! ```

use crate::namespace::{
    SOAP12_ENC_NS, SOAP12_ENV_NS, SOAP_ENC_NS, SOAP_ENV_NS, XSD_NS, XSI_NS,
};
use crate::qname::QName;

/// Which SOAP encoding flavour is read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingStyle {
    /// SOAP 1.1 section 5: `id`/`href="#id"`, `soapenc:arrayType="t[n]"`.
    #[default]
    Soap11,
    /// SOAP 1.2 encoding: `enc:id`/`enc:ref`, `enc:itemType` + `enc:arraySize`.
    Soap12,
}

impl EncodingStyle {
    /// Namespace of the encoding attributes and array element.
    pub fn encoding_namespace(self) -> &'static str {
        match self {
            Self::Soap11 => SOAP_ENC_NS,
            Self::Soap12 => SOAP12_ENC_NS,
        }
    }

    /// Namespace of the default container element.
    pub fn envelope_namespace(self) -> &'static str {
        match self {
            Self::Soap11 => SOAP_ENV_NS,
            Self::Soap12 => SOAP12_ENV_NS,
        }
    }

    /// SOAP 1.2 writes the first occurrence of a shared object inline and
    /// only later occurrences as references. SOAP 1.1 writes every object
    /// out-of-line as a top-level element.
    pub fn inline_first_occurrence(self) -> bool {
        matches!(self, Self::Soap12)
    }

    /// Prefix of the default container element.
    pub fn envelope_prefix(self) -> &'static str {
        match self {
            Self::Soap11 => "soap",
            Self::Soap12 => "env",
        }
    }

    /// Prefix used for the encoding namespace in standard declarations.
    pub fn encoding_prefix(self) -> &'static str {
        match self {
            Self::Soap11 => "soapenc",
            Self::Soap12 => "enc",
        }
    }
}

/// Options for one decode session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    pub(crate) style: EncodingStyle,
    pub(crate) root_is_first_element: bool,
    pub(crate) accept_both_styles: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            style: EncodingStyle::Soap11,
            root_is_first_element: true,
            accept_both_styles: true,
        }
    }
}

impl DecodeOptions {
    /// Wire style expected by default.
    pub fn style(&self) -> EncodingStyle { self.style }
    /// The first child of the container is the root object.
    pub fn root_is_first_element(&self) -> bool { self.root_is_first_element }
    /// Accept SOAP 1.1 and SOAP 1.2 reference attributes in the same document.
    pub fn accept_both_styles(&self) -> bool { self.accept_both_styles }

    /// Setzt den Encoding-Stil.
    pub fn with_style(mut self, style: EncodingStyle) -> Self { self.style = style; self }
    /// Waehlt das Root-Element ueber `root="1"` statt ueber die Position.
    pub fn with_root_attribute(mut self) -> Self { self.root_is_first_element = false; self }
    /// Nur die Attribute des gewaehlten Stils akzeptieren.
    pub fn with_strict_style(mut self) -> Self { self.accept_both_styles = false; self }
}

/// Options for one encode session.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    pub(crate) style: EncodingStyle,
    pub(crate) id_base: String,
    pub(crate) caller_namespaces: Vec<(String, String)>,
    pub(crate) container: Option<QName>,
    pub(crate) standard_declarations: bool,
    pub(crate) alias_stem: String,
    pub(crate) indent: Option<usize>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            style: EncodingStyle::Soap11,
            id_base: String::new(),
            caller_namespaces: Vec::new(),
            container: None,
            standard_declarations: true,
            alias_stem: "q".to_string(),
            indent: None,
        }
    }
}

impl EncodeOptions {
    /// Wire style to write.
    pub fn style(&self) -> EncodingStyle { self.style }
    /// Prefix prepended to generated ids (`{base}id{n}`).
    pub fn id_base(&self) -> &str { &self.id_base }
    /// Prefix bindings declared by the caller on the container element.
    pub fn caller_namespaces(&self) -> &[(String, String)] { &self.caller_namespaces }
    /// Stem for generated prefixes (`q1`, `q2`, ...).
    pub fn alias_stem(&self) -> &str { &self.alias_stem }
    /// Declare xsd/xsi/encoding prefixes on the container.
    pub fn standard_declarations(&self) -> bool { self.standard_declarations }
    /// Indentation width, `None` for compact output.
    pub fn indent(&self) -> Option<usize> { self.indent }

    /// Container element name; defaults to the style's `Body` element.
    pub fn container(&self) -> QName {
        self.container
            .clone()
            .unwrap_or_else(|| QName::new(self.style.envelope_namespace(), "Body"))
    }

    /// Setzt den Encoding-Stil.
    pub fn with_style(mut self, style: EncodingStyle) -> Self { self.style = style; self }
    /// Setzt die Id-Basis.
    pub fn with_id_base(mut self, base: impl Into<String>) -> Self { self.id_base = base.into(); self }
    /// Fuegt eine Prefix-Bindung des Aufrufers hinzu.
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.caller_namespaces.push((prefix.into(), uri.into()));
        self
    }
    /// Setzt das Container-Element.
    pub fn with_container(mut self, name: QName) -> Self { self.container = Some(name); self }
    /// Keine Standard-Deklarationen (xsd, xsi, soapenc) am Container.
    pub fn without_standard_declarations(mut self) -> Self { self.standard_declarations = false; self }
    /// Setzt den Alias-Stamm fuer generierte Prefixe.
    pub fn with_alias_stem(mut self, stem: impl Into<String>) -> Self { self.alias_stem = stem.into(); self }
    /// Aktiviert eingerueckte Ausgabe.
    pub fn with_indent(mut self, width: usize) -> Self { self.indent = Some(width); self }

    /// Prefix bindings written on the container element: caller bindings
    /// first, then the standard ones whose prefix the caller did not take.
    pub(crate) fn container_declarations(&self) -> Vec<(String, String)> {
        let mut decls = self.caller_namespaces.clone();
        if self.standard_declarations {
            let standard = [
                ("xsd", XSD_NS),
                ("xsi", XSI_NS),
                (self.style.encoding_prefix(), self.style.encoding_namespace()),
            ];
            for (prefix, uri) in standard {
                if !decls.iter().any(|(p, u)| p == prefix || u == uri) {
                    decls.push((prefix.to_string(), uri.to_string()));
                }
            }
        }
        decls
    }
}
