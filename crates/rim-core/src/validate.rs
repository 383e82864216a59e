//! Path shape validation for incoming redirect rows.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Shape enforced on `old_path` / `new_path` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathShape {
    /// `/` alone, or one-or-more `/`-separated segments of word characters
    /// and a fixed punctuation set, optionally ending with `/`.
    #[default]
    Strict,
    /// Historical variant: any non-empty value starting with `/`.
    Loose,
}

fn strict_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:/|(?:/[\w.,\-?+&=#:\]\[!@$%^*()~<>]+)+/?)$").unwrap())
}

impl PathShape {
    pub fn is_valid(self, path: &str) -> bool {
        match self {
            PathShape::Strict => strict_pattern().is_match(path),
            PathShape::Loose => path.starts_with('/'),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_accepts_root_and_segments() {
        let shape = PathShape::Strict;
        assert!(shape.is_valid("/"));
        assert!(shape.is_valid("/old"));
        assert!(shape.is_valid("/-old"));
        assert!(shape.is_valid("/foo/bar-1"));
        assert!(shape.is_valid("/foo/bar-1/"));
        assert!(shape.is_valid("/page?id=1&lang=en"));
        assert!(shape.is_valid("/a.b,c"));
    }

    #[test]
    fn strict_rejects_malformed_paths() {
        let shape = PathShape::Strict;
        assert!(!shape.is_valid(""));
        assert!(!shape.is_valid("old"));
        assert!(!shape.is_valid("http://example.com/old"));
        // Space is not in the allowed set.
        assert!(!shape.is_valid("/bad old"));
        // Empty segment.
        assert!(!shape.is_valid("//"));
        assert!(!shape.is_valid("/a//b"));
    }

    #[test]
    fn loose_only_requires_leading_slash() {
        let shape = PathShape::Loose;
        assert!(shape.is_valid("/bad old"));
        assert!(shape.is_valid("/anything at all"));
        assert!(!shape.is_valid(""));
        assert!(!shape.is_valid("old"));
    }
}
