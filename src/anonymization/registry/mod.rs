//! Pseudonym registry
//!
//! Process-wide store mapping canonicalized raw identifiers to pseudonyms, keyed by
//! [`CourseIdentityContext`]. The registry is the only writer of mapping state.
//!
//! # Locking
//!
//! The outer map is behind a `RwLock` held only to find or create a context. All
//! mutation happens under that context's own `Mutex`, so unrelated courses never
//! contend, and concurrent resolves of equal identifiers see the first writer's
//! pseudonym.
//!
//! # Keys
//!
//! Entries are keyed by canonical form alone, not by tag. A value seen under two
//! tags keeps the pseudonym of its first sighting, so a login id that
//! canonicalizes to an already recorded name is replaced with that name's
//! `Student_NNN` pseudonym.
//!
//! `first_seen_order` follows the order identifiers reach the registry, which
//! for a sanitized payload is document order.
//!
//! # Memory hygiene
//!
//! Raw identifiers are zeroized when a context is reset and when the registry is
//! dropped. Nothing here is ever written to disk.

mod canonical;

pub use canonical::canonicalize;

use crate::anonymization::models::IdentifierTag;
use crate::domain::errors::AnonymizationError;
use crate::domain::ids::CourseIdentityContext;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// One recorded mapping
#[derive(Clone, PartialEq, Eq, Serialize, Zeroize, ZeroizeOnDrop)]
pub struct PseudonymEntry {
    /// Canonical form of the raw identifier
    pub raw_identifier: String,
    /// Tag the identifier was first seen under
    #[zeroize(skip)]
    pub tag: IdentifierTag,
    /// Assigned pseudonym
    pub pseudonym: String,
    /// Position in first-seen order within the context, starting at 1
    pub first_seen_order: u64,
}

impl fmt::Debug for PseudonymEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PseudonymEntry")
            .field("raw_identifier", &"<redacted>")
            .field("tag", &self.tag)
            .field("pseudonym", &self.pseudonym)
            .field("first_seen_order", &self.first_seen_order)
            .finish()
    }
}

/// Opaque handle for one individual within a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndividualId(u64);

/// Identifier supplied to [`PseudonymRegistry::seed`]
#[derive(Clone, PartialEq, Eq)]
pub struct SeedEntry {
    /// Raw identifier as supplied by the operator
    pub identifier: String,
    /// Tag to allocate under
    pub tag: IdentifierTag,
    /// Pseudonym to bind; allocated when `None`
    pub pseudonym: Option<String>,
}

impl SeedEntry {
    /// Seed entry whose pseudonym the registry allocates
    pub fn new(identifier: impl Into<String>, tag: IdentifierTag) -> Self {
        Self {
            identifier: identifier.into(),
            tag,
            pseudonym: None,
        }
    }

    /// Binds a specific pseudonym
    pub fn with_pseudonym(mut self, pseudonym: impl Into<String>) -> Self {
        self.pseudonym = Some(pseudonym.into());
        self
    }
}

impl fmt::Debug for SeedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedEntry")
            .field("identifier", &"<redacted>")
            .field("tag", &self.tag)
            .field("pseudonym", &self.pseudonym)
            .finish()
    }
}

/// Identifiers belonging to one individual
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedRecord {
    /// Identifiers of the individual
    pub entries: Vec<SeedEntry>,
}

impl SeedRecord {
    /// Record with a single identifier
    pub fn single(entry: SeedEntry) -> Self {
        Self {
            entries: vec![entry],
        }
    }
}

/// Outcome of resolving one identity record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordResolution {
    /// Pseudonyms in the order the identifiers were supplied
    pub pseudonyms: Vec<String>,
    /// Individual the record was linked to
    pub individual: IndividualId,
    /// Whether the individual was first seen in this call
    pub individual_created: bool,
    /// Number of identifiers that received a new entry
    pub entries_created: usize,
}

/// Aggregate counts for one context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextStats {
    /// Distinct canonical identifiers recorded
    pub identifiers: usize,
    /// Distinct individuals recorded
    pub individuals: usize,
    /// Entry count per tag
    pub by_tag: BTreeMap<IdentifierTag, usize>,
}

#[derive(Default)]
struct ContextMap {
    entries: Vec<PseudonymEntry>,
    individuals: Vec<IndividualId>,
    by_raw: HashMap<String, usize>,
    pseudonyms: HashSet<String>,
    reserved: HashSet<String>,
    counters: HashMap<IdentifierTag, u64>,
    individual_count: u64,
}

impl ContextMap {
    fn lookup(&self, canonical: &str) -> Option<usize> {
        self.by_raw.get(canonical).copied()
    }

    fn allocate(&mut self, tag: IdentifierTag) -> String {
        loop {
            let counter = self.counters.entry(tag).or_insert(0);
            *counter += 1;
            let candidate = format!("{}_{:03}", tag.label(), counter);
            if !self.pseudonyms.contains(&candidate) && !self.reserved.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn new_individual(&mut self) -> IndividualId {
        self.individual_count += 1;
        IndividualId(self.individual_count)
    }

    fn insert(
        &mut self,
        canonical: String,
        tag: IdentifierTag,
        pseudonym: String,
        individual: IndividualId,
    ) {
        let idx = self.entries.len();
        self.pseudonyms.insert(pseudonym.clone());
        self.by_raw.insert(canonical.clone(), idx);
        self.entries.push(PseudonymEntry {
            raw_identifier: canonical,
            tag,
            pseudonym,
            first_seen_order: idx as u64 + 1,
        });
        self.individuals.push(individual);
    }

    /// Resolves identifiers of one individual
    ///
    /// Existing entries keep their pseudonyms. New entries join the individual of
    /// the known identifier with the lowest tag, or a fresh individual. Claims are
    /// recorded in the order given.
    fn resolve_record(
        &mut self,
        claims: Vec<(String, IdentifierTag, Option<String>)>,
    ) -> RecordResolution {
        let known = claims
            .iter()
            .filter_map(|(canonical, tag, _)| self.lookup(canonical).map(|idx| (*tag, idx)))
            .min_by_key(|(tag, _)| *tag)
            .map(|(_, idx)| self.individuals[idx]);

        let (individual, individual_created) = match known {
            Some(individual) => (individual, false),
            None => (self.new_individual(), true),
        };

        let mut pseudonyms = Vec::with_capacity(claims.len());
        let mut entries_created = 0;
        for (canonical, tag, requested) in claims {
            if let Some(idx) = self.lookup(&canonical) {
                pseudonyms.push(self.entries[idx].pseudonym.clone());
                continue;
            }
            let pseudonym = match requested {
                Some(p) => p,
                None => self.allocate(tag),
            };
            self.insert(canonical, tag, pseudonym.clone(), individual);
            pseudonyms.push(pseudonym);
            entries_created += 1;
        }

        RecordResolution {
            pseudonyms,
            individual,
            individual_created: individual_created && entries_created > 0,
            entries_created,
        }
    }

    /// Applies a validated seed batch
    ///
    /// Requested pseudonyms are reserved up front so that entries allocated
    /// earlier in the batch can never take them.
    fn apply_seed(&mut self, records: &[SeedRecord]) -> Vec<RecordResolution> {
        let mut requested: HashMap<String, String> = records
            .iter()
            .flat_map(|r| r.entries.iter())
            .filter_map(|e| {
                e.pseudonym
                    .as_ref()
                    .map(|p| (canonicalize(&e.identifier), p.clone()))
            })
            .collect();
        self.reserved.extend(requested.values().cloned());

        let resolutions = records
            .iter()
            .filter(|record| !record.entries.is_empty())
            .map(|record| {
                let claims = record
                    .entries
                    .iter()
                    .map(|e| {
                        let canonical = canonicalize(&e.identifier);
                        let pseudonym = requested.get(&canonical).cloned();
                        (canonical, e.tag, pseudonym)
                    })
                    .collect();
                self.resolve_record(claims)
            })
            .collect();

        self.reserved.clear();
        for (mut canonical, _) in requested.drain() {
            canonical.zeroize();
        }
        resolutions
    }

    /// Checks a seed batch against current state and against itself
    fn validate_seed(&self, records: &[SeedRecord]) -> Result<(), AnonymizationError> {
        let mut batch_raw: HashMap<String, Option<&str>> = HashMap::new();
        let mut batch_pseudonyms: HashMap<&str, String> = HashMap::new();

        for entry in records.iter().flat_map(|r| r.entries.iter()) {
            let canonical = canonicalize(&entry.identifier);
            let Some(requested) = entry.pseudonym.as_deref() else {
                batch_raw.entry(canonical).or_insert(None);
                continue;
            };

            if let Some(idx) = self.lookup(&canonical) {
                let existing = &self.entries[idx].pseudonym;
                if existing != requested {
                    return Err(AnonymizationError::ConflictingMapping {
                        tag: entry.tag,
                        existing: existing.clone(),
                        requested: requested.to_string(),
                    });
                }
                continue;
            }

            if self.pseudonyms.contains(requested) {
                return Err(AnonymizationError::ConflictingMapping {
                    tag: entry.tag,
                    existing: format!("{requested} (held by another identifier)"),
                    requested: requested.to_string(),
                });
            }

            match batch_raw.get(&canonical) {
                Some(Some(earlier)) if *earlier != requested => {
                    return Err(AnonymizationError::ConflictingMapping {
                        tag: entry.tag,
                        existing: earlier.to_string(),
                        requested: requested.to_string(),
                    });
                }
                _ => {}
            }
            if let Some(holder) = batch_pseudonyms.get(requested) {
                if *holder != canonical {
                    return Err(AnonymizationError::ConflictingMapping {
                        tag: entry.tag,
                        existing: format!("{requested} (requested twice in seed)"),
                        requested: requested.to_string(),
                    });
                }
            }

            batch_pseudonyms.insert(requested, canonical.clone());
            batch_raw.insert(canonical, Some(requested));
        }

        for (_, mut holder) in batch_pseudonyms {
            holder.zeroize();
        }
        for (mut canonical, _) in batch_raw {
            canonical.zeroize();
        }
        Ok(())
    }

    fn stats(&self) -> ContextStats {
        let mut by_tag = BTreeMap::new();
        for entry in &self.entries {
            *by_tag.entry(entry.tag).or_insert(0) += 1;
        }
        let individuals: HashSet<_> = self.individuals.iter().collect();
        ContextStats {
            identifiers: self.entries.len(),
            individuals: individuals.len(),
            by_tag,
        }
    }

    fn wipe(&mut self) {
        for (mut canonical, _) in self.by_raw.drain() {
            canonical.zeroize();
        }
        self.entries.clear();
        self.individuals.clear();
        self.pseudonyms.clear();
        self.reserved.clear();
        self.counters.clear();
        self.individual_count = 0;
    }
}

impl Drop for ContextMap {
    fn drop(&mut self) {
        self.wipe();
    }
}

/// Per-context pseudonym store
///
/// Construct one per process and share it with `Arc`; tests build isolated
/// instances.
///
/// # Examples
///
/// ```
/// use canvas_shield::anonymization::registry::PseudonymRegistry;
/// use canvas_shield::anonymization::models::IdentifierTag;
/// use canvas_shield::domain::CourseIdentityContext;
///
/// let registry = PseudonymRegistry::new();
/// let ctx = CourseIdentityContext::for_course("course-101").unwrap();
///
/// let first = registry.resolve(&ctx, "Jane Doe", IdentifierTag::Name);
/// let again = registry.resolve(&ctx, "  jane doe  ", IdentifierTag::Name);
/// assert_eq!(first, "Student_001");
/// assert_eq!(first, again);
/// ```
#[derive(Default)]
pub struct PseudonymRegistry {
    contexts: RwLock<HashMap<CourseIdentityContext, Arc<Mutex<ContextMap>>>>,
}

impl PseudonymRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn context_map(&self, context: &CourseIdentityContext) -> Arc<Mutex<ContextMap>> {
        if let Some(map) = self.contexts.read().get(context) {
            return Arc::clone(map);
        }
        let mut contexts = self.contexts.write();
        let map = contexts.entry(context.clone()).or_insert_with(|| {
            tracing::debug!(context = %context, "Creating pseudonym map");
            Arc::new(Mutex::new(ContextMap::default()))
        });
        Arc::clone(map)
    }

    fn existing_map(&self, context: &CourseIdentityContext) -> Option<Arc<Mutex<ContextMap>>> {
        self.contexts.read().get(context).map(Arc::clone)
    }

    /// Returns the pseudonym for `raw`, allocating one on first sight
    ///
    /// Idempotent: equal canonical forms always yield the same pseudonym.
    pub fn resolve(&self, context: &CourseIdentityContext, raw: &str, tag: IdentifierTag) -> String {
        let mut resolution = self.resolve_record(context, &[(raw, tag)]);
        resolution.pseudonyms.swap_remove(0)
    }

    /// Resolves all identifiers of one individual in a single critical section
    pub fn resolve_record(
        &self,
        context: &CourseIdentityContext,
        identifiers: &[(&str, IdentifierTag)],
    ) -> RecordResolution {
        let claims = identifiers
            .iter()
            .map(|(raw, tag)| (canonicalize(raw), *tag, None))
            .collect();
        let map = self.context_map(context);
        let mut guard = map.lock();
        guard.resolve_record(claims)
    }

    /// Pre-populates a context, typically from a course roster
    ///
    /// The batch is validated in full before anything is written, so a conflict
    /// leaves the context untouched.
    ///
    /// # Errors
    ///
    /// [`AnonymizationError::ConflictingMapping`] when a requested pseudonym
    /// disagrees with a recorded one, is already held by another identifier, or is
    /// requested inconsistently within the batch.
    pub fn seed(
        &self,
        context: &CourseIdentityContext,
        records: &[SeedRecord],
    ) -> Result<Vec<RecordResolution>, AnonymizationError> {
        let map = self.context_map(context);
        let mut guard = map.lock();
        guard.validate_seed(records)?;
        let resolutions = guard.apply_seed(records);

        tracing::info!(
            context = %context,
            records = resolutions.len(),
            created = resolutions.iter().map(|r| r.entries_created).sum::<usize>(),
            "Seeded pseudonym map"
        );
        Ok(resolutions)
    }

    /// Clears a context and seeds it in one critical section
    ///
    /// The batch is validated as if the context were empty; on error the existing
    /// map is kept. No concurrent resolve can land between the wipe and the seed.
    pub fn reseed(
        &self,
        context: &CourseIdentityContext,
        records: &[SeedRecord],
    ) -> Result<Vec<RecordResolution>, AnonymizationError> {
        let map = self.context_map(context);
        let mut guard = map.lock();
        ContextMap::default().validate_seed(records)?;

        guard.wipe();
        let resolutions = guard.apply_seed(records);

        tracing::info!(
            context = %context,
            records = resolutions.len(),
            "Pseudonym map rebuilt"
        );
        Ok(resolutions)
    }

    /// Entries of a context in first-seen order
    pub fn snapshot(&self, context: &CourseIdentityContext) -> Vec<PseudonymEntry> {
        match self.existing_map(context) {
            Some(map) => map.lock().entries.clone(),
            None => Vec::new(),
        }
    }

    /// Aggregate counts for a context
    pub fn stats(&self, context: &CourseIdentityContext) -> ContextStats {
        match self.existing_map(context) {
            Some(map) => map.lock().stats(),
            None => ContextStats::default(),
        }
    }

    /// Clears every entry of a context
    ///
    /// Only called on explicit operator request.
    pub fn reset(&self, context: &CourseIdentityContext) {
        if let Some(map) = self.existing_map(context) {
            map.lock().wipe();
            tracing::info!(context = %context, "Pseudonym map reset");
        }
    }

    /// Contexts with a live map, sorted
    pub fn contexts(&self) -> Vec<CourseIdentityContext> {
        let mut contexts: Vec<_> = self.contexts.read().keys().cloned().collect();
        contexts.sort();
        contexts
    }
}

impl fmt::Debug for PseudonymRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PseudonymRegistry")
            .field("contexts", &self.contexts.read().len())
            .finish()
    }
}
