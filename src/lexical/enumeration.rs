//! Enum lexical forms.
//!
//! An enum is a name table of `(token, value)` pairs. Flags enums write the
//! set bits as a space separated token list and OR the tokens on read.

use crate::qname::QName;
use crate::{Error, Result};

/// Name table of one enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    /// Type name on the wire.
    pub name: QName,
    pub values: Vec<(String, i64)>,
    pub is_flags: bool,
}

impl EnumDef {
    pub fn new(name: QName, values: impl IntoIterator<Item = (impl Into<String>, i64)>) -> Self {
        Self {
            name,
            values: values.into_iter().map(|(n, v)| (n.into(), v)).collect(),
            is_flags: false,
        }
    }

    /// Marks the enum as a flags enum.
    pub fn flags(mut self) -> Self {
        self.is_flags = true;
        self
    }

    fn value_of(&self, token: &str) -> Result<i64> {
        self.values
            .iter()
            .find(|(n, _)| n == token)
            .map(|(_, v)| *v)
            .ok_or_else(|| Error::UnknownEnumValue {
                value: token.to_string(),
                enum_name: self.name.to_string(),
            })
    }

    /// Parses a lexical token (or token list for flags).
    pub fn parse(&self, value: &str) -> Result<i64> {
        let value = value.trim();
        if !self.is_flags {
            return self.value_of(value);
        }
        value
            .split_ascii_whitespace()
            .try_fold(0i64, |acc, token| Ok(acc | self.value_of(token)?))
    }

    /// Canonical lexical form of `value`.
    ///
    /// Flags are written in table order; bits that no token covers make the
    /// value unrepresentable.
    pub fn format(&self, value: i64) -> Result<String> {
        let unknown = || Error::UnknownEnumValue {
            value: value.to_string(),
            enum_name: self.name.to_string(),
        };
        if !self.is_flags {
            return self
                .values
                .iter()
                .find(|(_, v)| *v == value)
                .map(|(n, _)| n.clone())
                .ok_or_else(unknown);
        }
        if value == 0 {
            // 0 nur ueber einen expliziten Eintrag, sonst leere Liste
            return Ok(self
                .values
                .iter()
                .find(|(_, v)| *v == 0)
                .map(|(n, _)| n.clone())
                .unwrap_or_default());
        }
        let mut covered = 0i64;
        let mut tokens = Vec::new();
        for (name, v) in &self.values {
            if *v != 0 && value & v == *v {
                tokens.push(name.as_str());
                covered |= v;
            }
        }
        if covered != value {
            return Err(unknown());
        }
        Ok(tokens.join(" "))
    }
}
