//! Path patterns for identifier rules
//!
//! Grammar, dot separated:
//!
//! | token          | matches                               |
//! |----------------|---------------------------------------|
//! | `user`         | the object key `user`                 |
//! | `{user,author}`| any one of the listed keys            |
//! | `*`            | any single object key                 |
//! | `[]`           | any array index (may suffix a key)    |
//! | `**`           | zero or more segments of any kind     |
//!
//! `**.participants[].display_name` therefore matches
//! `topic.participants[3].display_name`.

use crate::anonymization::models::PathSegment;
use crate::domain::errors::AnonymizationError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    Key(String),
    OneOf(Vec<String>),
    AnyKey,
    AnyIndex,
    AnyDepth,
}

impl PatternSegment {
    fn matches(&self, segment: &PathSegment) -> bool {
        match (self, segment) {
            (Self::Key(expected), PathSegment::Key(key)) => expected == key,
            (Self::OneOf(options), PathSegment::Key(key)) => options.iter().any(|o| o == key),
            (Self::AnyKey, PathSegment::Key(_)) => true,
            (Self::AnyIndex, PathSegment::Index(_)) => true,
            _ => false,
        }
    }
}

/// Compiled path pattern
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    /// Parses a pattern
    ///
    /// # Errors
    ///
    /// Returns [`AnonymizationError::InvalidRule`] for empty patterns, empty
    /// segments, unbalanced braces and stray wildcard characters.
    pub fn parse(source: &str) -> Result<Self, AnonymizationError> {
        let source = source.trim();
        let invalid = |reason: &str| AnonymizationError::InvalidRule {
            pattern: source.to_string(),
            reason: reason.to_string(),
        };

        if source.is_empty() {
            return Err(invalid("pattern is empty"));
        }

        let mut segments = Vec::new();
        for token in split_top_level(source) {
            if token.is_empty() {
                return Err(invalid("pattern contains an empty segment"));
            }

            let mut name = token;
            let mut indexes = 0;
            while let Some(stripped) = name.strip_suffix("[]") {
                name = stripped;
                indexes += 1;
            }

            match name {
                "" => {}
                "*" => segments.push(PatternSegment::AnyKey),
                "**" => segments.push(PatternSegment::AnyDepth),
                alternatives if alternatives.starts_with('{') => {
                    let inner = alternatives
                        .strip_prefix('{')
                        .and_then(|s| s.strip_suffix('}'))
                        .ok_or_else(|| invalid("unbalanced braces"))?;
                    let options: Vec<String> =
                        inner.split(',').map(|o| o.trim().to_string()).collect();
                    if options.iter().any(|o| o.is_empty() || !is_plain_key(o)) {
                        return Err(invalid("alternatives must be plain keys"));
                    }
                    segments.push(PatternSegment::OneOf(options));
                }
                key if is_plain_key(key) => segments.push(PatternSegment::Key(key.to_string())),
                _ => return Err(invalid("unexpected wildcard or bracket")),
            }

            for _ in 0..indexes {
                segments.push(PatternSegment::AnyIndex);
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Pattern text as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern targets array elements explicitly
    pub fn ends_with_index(&self) -> bool {
        matches!(self.segments.last(), Some(PatternSegment::AnyIndex))
    }

    /// Whether two patterns are the same after parsing
    pub fn same_shape(&self, other: &PathPattern) -> bool {
        self.segments == other.segments
    }

    /// Tests a concrete path against the pattern
    pub fn matches(&self, path: &[PathSegment]) -> bool {
        match_from(&self.segments, path)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn match_from(pattern: &[PatternSegment], path: &[PathSegment]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((PatternSegment::AnyDepth, rest)) => {
            (0..=path.len()).any(|skip| match_from(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            Some((head, tail)) if segment.matches(head) => match_from(rest, tail),
            _ => false,
        },
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.contains(['*', '[', ']', '{', '}'])
}

/// Splits on dots that are not inside `{...}`
fn split_top_level(source: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in source.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => {
                parts.push(&source[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&source[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::models::FieldPath;
    use test_case::test_case;

    fn path(p: FieldPath) -> Vec<PathSegment> {
        p.segments().to_vec()
    }

    #[test_case("**.user.name", FieldPath::root().key("user").key("name"), true ; "any depth matches zero segments")]
    #[test_case("**.user.name", FieldPath::root().key("submissions").index(0).key("user").key("name"), true ; "any depth spans keys and indexes")]
    #[test_case("**.user.name", FieldPath::root().index(0).key("name"), false ; "assignment name is not a user name")]
    #[test_case("users[].name", FieldPath::root().key("users").index(2).key("name"), true ; "indexed key suffix")]
    #[test_case("users[].name", FieldPath::root().key("users").key("name"), false ; "index required")]
    #[test_case("*.email", FieldPath::root().key("author").key("email"), true ; "single key wildcard")]
    #[test_case("*.email", FieldPath::root().index(0).key("email"), false ; "key wildcard rejects index")]
    #[test_case("**.{user,author}.login_id", FieldPath::root().key("entry").key("author").key("login_id"), true ; "alternatives")]
    #[test_case("**.{user,author}.login_id", FieldPath::root().key("editor").key("login_id"), false ; "alternatives reject others")]
    fn test_pattern_matching(pattern: &str, field: FieldPath, expected: bool) {
        let pattern = PathPattern::parse(pattern).unwrap();
        assert_eq!(pattern.matches(&path(field)), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("user..name" ; "empty segment")]
    #[test_case("us*er.name" ; "embedded wildcard")]
    #[test_case("{user,author.name" ; "unbalanced brace")]
    #[test_case("{user,}.name" ; "empty alternative")]
    fn test_invalid_patterns(pattern: &str) {
        assert!(matches!(
            PathPattern::parse(pattern),
            Err(AnonymizationError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_same_shape_ignores_whitespace() {
        let a = PathPattern::parse(" **.user.name ").unwrap();
        let b = PathPattern::parse("**.user.name").unwrap();
        assert!(a.same_shape(&b));
        assert!(!a.ends_with_index());
        assert!(PathPattern::parse("members[]").unwrap().ends_with_index());
    }
}
