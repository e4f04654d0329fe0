//! Identifier schema for Canvas payloads
//!
//! Declarative, path-aware catalog of which fields carry student identifiers. The
//! built-in catalog lives in `rules/canvas_identifiers.toml`; operators can append
//! rules through configuration. The schema is built once and read-only afterwards.

pub mod pattern;

use crate::anonymization::models::{FieldPath, IdentifierTag, PathSegment, PayloadKind};
use crate::domain::errors::AnonymizationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use pattern::PathPattern;

/// What a rule says about the fields it matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Identifying field with the given tag
    Identifier(IdentifierTag),
    /// Non-identifying context; never anonymized
    Preserve,
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("preserve") {
            return Ok(Self::Preserve);
        }
        s.parse().map(Self::Identifier)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(tag) => write!(f, "{tag}"),
            Self::Preserve => f.write_str("preserve"),
        }
    }
}

/// Rule definition as written in TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    /// Path pattern, see [`pattern`] for the grammar
    pub pattern: String,
    /// Tag name or `preserve`
    pub tag: String,
}

#[derive(Debug, Deserialize)]
struct RuleLibrary {
    #[serde(default)]
    rules: Vec<RuleDefinition>,
}

/// Compiled identifier rule
#[derive(Debug, Clone)]
pub struct IdentifierRule {
    pattern: PathPattern,
    classification: Classification,
}

impl IdentifierRule {
    /// Creates a rule from a pattern and classification
    pub fn new(pattern: PathPattern, classification: Classification) -> Self {
        Self {
            pattern,
            classification,
        }
    }

    /// Compiles a TOML rule definition
    pub fn from_definition(def: &RuleDefinition) -> Result<Self, AnonymizationError> {
        let pattern = PathPattern::parse(&def.pattern)?;
        let classification = def.tag.parse::<Classification>().map_err(|reason| {
            AnonymizationError::InvalidRule {
                pattern: def.pattern.clone(),
                reason,
            }
        })?;
        Ok(Self::new(pattern, classification))
    }

    /// The rule's pattern
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// The rule's classification
    pub fn classification(&self) -> Classification {
        self.classification
    }

    fn matches(&self, logical: &[PathSegment], trimmed: &[PathSegment]) -> bool {
        if self.pattern.ends_with_index() {
            self.pattern.matches(logical)
        } else {
            self.pattern.matches(trimmed)
        }
    }
}

/// Path-aware identifier catalog
///
/// # Examples
///
/// ```
/// use canvas_shield::anonymization::schema::IdentifierSchema;
/// use canvas_shield::anonymization::models::{FieldPath, IdentifierTag, PayloadKind};
///
/// let schema = IdentifierSchema::canvas_default().unwrap();
///
/// let user_name = FieldPath::root().key("user").key("name");
/// assert_eq!(schema.classify(PayloadKind::Submissions, &user_name), Some(IdentifierTag::Name));
///
/// let assignment_name = FieldPath::root().index(0).key("name");
/// assert_eq!(schema.classify(PayloadKind::Generic, &assignment_name), None);
/// ```
#[derive(Debug, Clone)]
pub struct IdentifierSchema {
    rules: Vec<IdentifierRule>,
}

impl IdentifierSchema {
    /// Builds a schema, rejecting rules that classify the same pattern differently
    ///
    /// Exact duplicates with the same classification are collapsed.
    pub fn new(rules: Vec<IdentifierRule>) -> Result<Self, AnonymizationError> {
        let mut accepted: Vec<IdentifierRule> = Vec::with_capacity(rules.len());
        for rule in rules {
            match accepted
                .iter()
                .find(|existing| existing.pattern.same_shape(&rule.pattern))
            {
                Some(existing) if existing.classification == rule.classification => continue,
                Some(_) => {
                    return Err(AnonymizationError::OverlappingRules {
                        pattern: rule.pattern.as_str().to_string(),
                    })
                }
                None => accepted.push(rule),
            }
        }
        Ok(Self { rules: accepted })
    }

    /// Compiles a list of rule definitions
    pub fn from_definitions(defs: &[RuleDefinition]) -> Result<Self, AnonymizationError> {
        let rules = defs
            .iter()
            .map(IdentifierRule::from_definition)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(rules)
    }

    /// Parses a TOML rule library (`[[rules]]` tables)
    pub fn from_toml(content: &str) -> Result<Self, AnonymizationError> {
        let library: RuleLibrary =
            toml::from_str(content).map_err(|e| AnonymizationError::InvalidRule {
                pattern: "<rule library>".to_string(),
                reason: e.to_string(),
            })?;
        Self::from_definitions(&library.rules)
    }

    /// Built-in Canvas catalog
    pub fn canvas_default() -> Result<Self, AnonymizationError> {
        Self::from_toml(include_str!("../../../rules/canvas_identifiers.toml"))
    }

    /// Built-in catalog followed by operator-supplied rules
    pub fn canvas_with_extra_rules(extra: &[RuleDefinition]) -> Result<Self, AnonymizationError> {
        let mut rules = Self::canvas_default()?.rules;
        for def in extra {
            rules.push(IdentifierRule::from_definition(def)?);
        }
        Self::new(rules)
    }

    /// Classifies a payload path
    ///
    /// The payload kind's root key is prepended before matching. Trailing array
    /// indexes are ignored for patterns that do not end in `[]`, so arrays of
    /// identifiers are classified per element.
    pub fn classify(&self, kind: PayloadKind, path: &FieldPath) -> Option<IdentifierTag> {
        let mut logical = Vec::with_capacity(path.depth() + 1);
        if let Some(root) = kind.root_key() {
            logical.push(PathSegment::Key(root.to_string()));
        }
        logical.extend_from_slice(path.segments());

        let mut trimmed_len = logical.len();
        while trimmed_len > 0 && matches!(logical[trimmed_len - 1], PathSegment::Index(_)) {
            trimmed_len -= 1;
        }
        let trimmed = &logical[..trimmed_len];

        let matching = || self.rules.iter().filter(|r| r.matches(&logical, trimmed));

        if matching().any(|r| r.classification == Classification::Preserve) {
            return None;
        }

        matching().find_map(|r| match r.classification {
            Classification::Identifier(tag) => Some(tag),
            Classification::Preserve => None,
        })
    }

    /// All rules in evaluation order
    pub fn rules(&self) -> &[IdentifierRule] {
        &self.rules
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the schema has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
