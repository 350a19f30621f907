//! Native column type descriptors.
//!
//! MySQL reports column types as strings such as `varchar(255)`,
//! `int(11) unsigned` or `text`. The first `word(digits)` match splits the
//! descriptor into a base type and an optional length.

use std::sync::LazyLock;

use regex::Regex;

static DESCRIPTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w+)(?:\((\d+)\))?").expect("type descriptor pattern is valid")
});

/// A parsed type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Base type, e.g. `varchar`.
    pub base: String,
    /// Parenthesized length, when present and representable.
    pub length: Option<u32>,
}

impl TypeDescriptor {
    /// Parses a descriptor. Without a match the raw descriptor becomes the
    /// base type and the length is `None`.
    pub fn parse(descriptor: &str) -> Self {
        match DESCRIPTOR_RE.captures(descriptor) {
            Some(caps) => Self {
                base: caps[1].to_string(),
                length: caps.get(2).and_then(|m| m.as_str().parse().ok()),
            },
            None => Self {
                base: descriptor.to_string(),
                length: None,
            },
        }
    }
}
