//! Roster map builder
//!
//! Pre-populates a context's pseudonym map from a course roster so that every
//! enrolled student has a stable pseudonym before the first tool call, and returns
//! the assignments for the instructor to review. The map is returned, never
//! written to disk.

use crate::anonymization::engine::Anonymizer;
use crate::anonymization::models::{IdentifierTag, PayloadKind};
use crate::anonymization::registry::{PseudonymRegistry, SeedEntry, SeedRecord};
use crate::anonymization::schema::IdentifierSchema;
use crate::anonymization::traversal::{scan, DEFAULT_MAX_DEPTH};
use crate::domain::errors::AnonymizationError;
use crate::domain::ids::CourseIdentityContext;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// How a roster is applied to an existing map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    /// Keep existing pseudonyms, add new students
    #[default]
    Extend,
    /// Reset the context, then seed from the roster
    Rebuild,
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "extend" => Ok(Self::Extend),
            "rebuild" => Ok(Self::Rebuild),
            other => Err(format!("unknown build mode: {other}")),
        }
    }
}

/// One identifier and the pseudonym it maps to
#[derive(Clone, PartialEq, Eq, Serialize, Zeroize, ZeroizeOnDrop)]
pub struct RosterAssignment {
    /// Identifier tag
    #[zeroize(skip)]
    pub tag: IdentifierTag,
    /// Identifier as supplied in the roster
    pub identifier: String,
    /// Assigned pseudonym
    pub pseudonym: String,
}

impl fmt::Debug for RosterAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RosterAssignment")
            .field("tag", &self.tag)
            .field("identifier", &"<redacted>")
            .field("pseudonym", &self.pseudonym)
            .finish()
    }
}

/// Result of building a map
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterMap {
    /// Context the roster was applied to
    pub context: CourseIdentityContext,
    /// Mode used
    pub mode: BuildMode,
    /// Assignments in roster order
    pub assignments: Vec<RosterAssignment>,
    /// Students not previously in the map
    pub individuals_new: usize,
    /// Students already in the map
    pub individuals_known: usize,
}

impl RosterMap {
    /// Format the map for console review
    ///
    /// The output contains real student identifiers.
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("✅ Anonymization map for {}\n\n", self.context));
        output.push_str(&format!(
            "👥 Students: {} ({} new, {} already mapped)\n\n",
            self.individuals_new + self.individuals_known,
            self.individuals_new,
            self.individuals_known
        ));

        output.push_str(&format!("  {:<20} {:<14} {}\n", "PSEUDONYM", "TAG", "IDENTIFIER"));
        output.push_str("  ─────────────────────────────────────────────────────────────\n");
        for assignment in &self.assignments {
            output.push_str(&format!(
                "  {:<20} {:<14} {}\n",
                assignment.pseudonym,
                assignment.tag.as_str(),
                assignment.identifier
            ));
        }

        output.push_str("\n⚠️  SECURITY WARNING: this map identifies students.\n");
        output.push_str("   • Keep it secure and do not share it\n");
        output.push_str("   • Never commit it to version control\n");

        output
    }
}

/// Seeds pseudonym maps from course rosters
pub struct MapBuilder {
    registry: Arc<PseudonymRegistry>,
    schema: IdentifierSchema,
}

impl MapBuilder {
    /// Creates a builder
    pub fn new(registry: Arc<PseudonymRegistry>, schema: IdentifierSchema) -> Self {
        Self { registry, schema }
    }

    /// Builder sharing an anonymizer's registry and schema
    pub fn for_anonymizer(anonymizer: &Anonymizer) -> Self {
        Self::new(Arc::clone(anonymizer.registry()), anonymizer.schema().clone())
    }

    /// Applies a roster to a context
    ///
    /// `roster` is a JSON array whose entries are either names or Canvas user
    /// objects. The roster is parsed in full before the registry is touched.
    ///
    /// # Errors
    ///
    /// [`AnonymizationError::InvalidRoster`] when the roster is not an array, an
    /// entry is blank or has no identifying fields. Errors from
    /// [`PseudonymRegistry::seed`] are passed on.
    pub fn build_map(
        &self,
        context: &CourseIdentityContext,
        roster: &Value,
        mode: BuildMode,
    ) -> Result<RosterMap, AnonymizationError> {
        let items = roster.as_array().ok_or_else(|| {
            AnonymizationError::InvalidRoster("roster must be a JSON array".to_string())
        })?;

        let records = items
            .iter()
            .enumerate()
            .map(|(index, item)| self.parse_entry(index, item))
            .collect::<Result<Vec<_>, _>>()?;

        let resolutions = match mode {
            BuildMode::Extend => self.registry.seed(context, &records)?,
            BuildMode::Rebuild => self.registry.reseed(context, &records)?,
        };

        let mut map = RosterMap {
            context: context.clone(),
            mode,
            assignments: Vec::new(),
            individuals_new: 0,
            individuals_known: 0,
        };
        for (record, resolution) in records.iter().zip(resolutions) {
            if resolution.individual_created {
                map.individuals_new += 1;
            } else {
                map.individuals_known += 1;
            }
            for (entry, pseudonym) in record.entries.iter().zip(resolution.pseudonyms) {
                map.assignments.push(RosterAssignment {
                    tag: entry.tag,
                    identifier: entry.identifier.clone(),
                    pseudonym,
                });
            }
        }

        tracing::info!(
            context = %context,
            mode = ?mode,
            students = records.len(),
            new = map.individuals_new,
            "Roster map built"
        );

        Ok(map)
    }

    fn parse_entry(&self, index: usize, item: &Value) -> Result<SeedRecord, AnonymizationError> {
        match item {
            Value::String(name) if !name.trim().is_empty() => {
                Ok(SeedRecord::single(SeedEntry::new(name.clone(), IdentifierTag::Name)))
            }
            Value::String(_) => Err(AnonymizationError::InvalidRoster(format!(
                "entry {index} is blank"
            ))),
            Value::Object(_) => {
                let mut hits = scan(item, &self.schema, PayloadKind::Users, DEFAULT_MAX_DEPTH)
                    .filter(|hit| !matches!(hit, Ok(h) if h.path.depth() > 1))
                    .collect::<Result<Vec<_>, _>>()?;
                if hits.is_empty() {
                    return Err(AnonymizationError::InvalidRoster(format!(
                        "entry {index} has no identifying fields"
                    )));
                }
                hits.sort_by_key(|hit| hit.tag);
                Ok(SeedRecord {
                    entries: hits
                        .iter()
                        .map(|hit| SeedEntry::new(hit.raw_text(), hit.tag))
                        .collect(),
                })
            }
            _ => Err(AnonymizationError::InvalidRoster(format!(
                "entry {index} must be a name or a user object"
            ))),
        }
    }
}
