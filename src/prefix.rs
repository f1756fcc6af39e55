//! Generator for fresh namespace prefixes on the writer side.
//!
//! Prefixes have the form `{stem}{n}`. Numbers that the caller already uses
//! with the same stem are skipped, so generated prefixes never collide with
//! the caller's own bindings.

use crate::FastHashSet;

#[derive(Debug, Clone)]
pub struct PrefixAllocator {
    stem: String,
    next: u32,
    used: FastHashSet<u32>,
}

impl PrefixAllocator {
    /// Creates an allocator and pre-scans the caller's prefix list.
    pub fn new<'a>(stem: impl Into<String>, caller_prefixes: impl IntoIterator<Item = &'a str>) -> Self {
        let stem = stem.into();
        let used = caller_prefixes
            .into_iter()
            .filter_map(|p| numeric_suffix(&stem, p))
            .collect();
        Self { stem, next: 0, used }
    }

    /// Next prefix whose number is not in the caller's list.
    pub fn next_prefix(&mut self) -> String {
        loop {
            self.next += 1;
            if !self.used.contains(&self.next) {
                return format!("{}{}", self.stem, self.next);
            }
        }
    }
}

/// `q12` with stem `q` yields `Some(12)`. Only digits may follow the stem.
fn numeric_suffix(stem: &str, prefix: &str) -> Option<u32> {
    let rest = prefix.strip_prefix(stem)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}
