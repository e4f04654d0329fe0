//! Traversal engine
//!
//! Walks a decoded Canvas response and lazily yields every leaf the identifier
//! schema classifies. The walk uses an explicit stack, yields in document order
//! (object key order, then array order), and stops with
//! [`AnonymizationError::StructureTooDeep`] once a node lies deeper than the
//! configured bound.

use crate::anonymization::models::{FieldPath, IdentifierHit, PayloadKind};
use crate::anonymization::schema::IdentifierSchema;
use crate::domain::errors::AnonymizationError;
use serde_json::Value;
use std::iter::FusedIterator;

/// Default nesting bound for Canvas payloads
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Starts a scan over `value`
///
/// # Examples
///
/// ```
/// use canvas_shield::anonymization::schema::IdentifierSchema;
/// use canvas_shield::anonymization::models::{IdentifierTag, PayloadKind};
/// use canvas_shield::anonymization::traversal::scan;
/// use serde_json::json;
///
/// let schema = IdentifierSchema::canvas_default().unwrap();
/// let payload = json!({"user": {"name": "Alice Smith", "id": 7}, "score": 90});
///
/// let hits: Vec<_> = scan(&payload, &schema, PayloadKind::Generic, 64)
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].tag, IdentifierTag::Name);
/// assert_eq!(hits[0].path.to_string(), "user.name");
/// ```
pub fn scan<'a>(
    value: &'a Value,
    schema: &'a IdentifierSchema,
    kind: PayloadKind,
    max_depth: usize,
) -> Scanner<'a> {
    Scanner {
        schema,
        kind,
        max_depth,
        stack: vec![(FieldPath::root(), value)],
        leaves_visited: 0,
        finished: false,
    }
}

/// Lazy iterator over identifying leaves
pub struct Scanner<'a> {
    schema: &'a IdentifierSchema,
    kind: PayloadKind,
    max_depth: usize,
    stack: Vec<(FieldPath, &'a Value)>,
    leaves_visited: usize,
    finished: bool,
}

impl Scanner<'_> {
    /// Scalar leaves visited so far, identifying or not
    pub fn leaves_visited(&self) -> usize {
        self.leaves_visited
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<IdentifierHit<'a>, AnonymizationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        while let Some((path, value)) = self.stack.pop() {
            if path.depth() > self.max_depth {
                self.finished = true;
                self.stack.clear();
                return Some(Err(AnonymizationError::StructureTooDeep {
                    max_depth: self.max_depth,
                    path: path.to_string(),
                }));
            }

            match value {
                Value::Object(map) => {
                    for (key, child) in map.iter().rev() {
                        self.stack.push((path.key(key), child));
                    }
                }
                Value::Array(items) => {
                    for (idx, child) in items.iter().enumerate().rev() {
                        self.stack.push((path.index(idx), child));
                    }
                }
                leaf => {
                    self.leaves_visited += 1;
                    if !is_candidate(leaf) {
                        continue;
                    }
                    if let Some(tag) = self.schema.classify(self.kind, &path) {
                        return Some(Ok(IdentifierHit {
                            path,
                            value: leaf,
                            tag,
                        }));
                    }
                }
            }
        }

        self.finished = true;
        None
    }
}

impl FusedIterator for Scanner<'_> {}

/// Only non-blank strings and numbers can carry an identifier
fn is_candidate(leaf: &Value) -> bool {
    match leaf {
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::models::IdentifierTag;
    use serde_json::json;

    fn schema() -> IdentifierSchema {
        IdentifierSchema::canvas_default().unwrap()
    }

    fn collect(value: &Value, kind: PayloadKind) -> Vec<(String, IdentifierTag)> {
        let schema = schema();
        scan(value, &schema, kind, DEFAULT_MAX_DEPTH)
            .map(|hit| hit.map(|h| (h.path.to_string(), h.tag)))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_document_order() {
        let payload = json!({
            "submissions": [
                {"user": {"name": "Alice Smith", "email": "alice@x.edu"}, "score": 90},
                {"user": {"name": "Bob Lee", "email": "bob@x.edu"}, "score": 85}
            ]
        });

        let hits = collect(&payload, PayloadKind::Generic);
        let paths: Vec<&str> = hits.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "submissions[0].user.name",
                "submissions[0].user.email",
                "submissions[1].user.name",
                "submissions[1].user.email",
            ]
        );
    }

    #[test]
    fn test_counts_all_leaves() {
        let schema = schema();
        let payload = json!({"user": {"name": "Alice", "id": 1, "active": true}, "tags": [null, "x"]});
        let mut scanner = scan(&payload, &schema, PayloadKind::Generic, DEFAULT_MAX_DEPTH);
        let hits: Vec<_> = scanner.by_ref().collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(scanner.leaves_visited(), 5);
    }

    #[test]
    fn test_skips_null_bool_and_blank() {
        let payload = json!({"user": {"name": null, "email": "  ", "login_id": true}});
        assert!(collect(&payload, PayloadKind::Generic).is_empty());
    }

    #[test]
    fn test_numeric_sis_id_is_yielded() {
        let payload = json!([{"sis_user_id": 20481}]);
        let hits = collect(&payload, PayloadKind::Users);
        assert_eq!(hits, vec![("[0].sis_user_id".to_string(), IdentifierTag::SisId)]);
    }

    #[test]
    fn test_structure_too_deep() {
        let schema = schema();
        let mut payload = json!("leaf");
        for _ in 0..10 {
            payload = json!({ "nested": payload });
        }

        let result: Result<Vec<_>, _> = scan(&payload, &schema, PayloadKind::Generic, 5).collect();
        match result {
            Err(AnonymizationError::StructureTooDeep { max_depth, path }) => {
                assert_eq!(max_depth, 5);
                assert_eq!(path.matches("nested").count(), 6);
            }
            other => panic!("expected StructureTooDeep, got {other:?}"),
        }
    }

    #[test]
    fn test_depth_at_limit_is_accepted() {
        let schema = schema();
        let mut payload = json!("leaf");
        for _ in 0..5 {
            payload = json!({ "nested": payload });
        }
        let result: Result<Vec<_>, _> = scan(&payload, &schema, PayloadKind::Generic, 5).collect();
        assert!(result.is_ok());
    }

    #[test]
    fn test_scanner_is_fused_after_error() {
        let schema = schema();
        let payload = json!({"a": {"b": {"c": 1}}});
        let mut scanner = scan(&payload, &schema, PayloadKind::Generic, 1);
        assert!(matches!(scanner.next(), Some(Err(_))));
        assert!(scanner.next().is_none());
    }
}
