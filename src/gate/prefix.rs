//! Path prefix eligibility.
//!
//! # Design Decisions
//! - Normalized once at construction; matching never allocates
//! - Segment aligned: `/ab` matches `/ab` and `/ab/c`, never `/abc`
//! - ASCII case-insensitive, like the hosting pipeline's own path segments

use std::fmt;

/// Normalized path prefix, always starting with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefix {
    value: String,
    is_root: bool,
}

impl PathPrefix {
    /// Normalize `raw`: prepend `/` when absent, drop one trailing separator.
    ///
    /// Only `/` (or an empty prefix) is the root; `//` stays a literal prefix.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref();
        let mut value = if raw.starts_with('/') {
            raw.to_string()
        } else {
            format!("/{raw}")
        };
        if value.len() > 2 && value.ends_with('/') {
            value.pop();
        }

        let is_root = value == "/";
        Self { value, is_root }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The root prefix matches every request.
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Returns true if `path` starts with this prefix on a segment boundary.
    pub fn matches(&self, path: &str) -> bool {
        if self.is_root {
            return true;
        }

        let prefix = self.value.as_bytes();
        let path = path.as_bytes();
        if path.len() < prefix.len() || !path[..prefix.len()].eq_ignore_ascii_case(prefix) {
            return false;
        }

        path.len() == prefix.len() || path[prefix.len()] == b'/' || prefix.ends_with(b"/")
    }
}

impl fmt::Display for PathPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
