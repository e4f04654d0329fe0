//! Anonymizer
//!
//! The single entry point tool handlers call before a Canvas response leaves the
//! trust boundary.
//!
//! # Pipeline
//!
//! 1. **Scan**: the traversal engine yields every identifying leaf
//! 2. **Group**: leaves sharing a parent object form one identity record
//! 3. **Resolve**: each record is resolved against the pseudonym registry
//! 4. **Write back**: replacements are written into a copy of the payload
//!
//! Scanning finishes before the registry is touched, so a payload rejected for
//! depth leaves no trace in the mapping. Errors are always returned; the
//! unsanitized payload is never handed back in their place.
//!
//! # Examples
//!
//! ```
//! use canvas_shield::anonymization::{AnonymizationConfig, Anonymizer, PseudonymRegistry};
//! use canvas_shield::domain::CourseIdentityContext;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let config = AnonymizationConfig { enabled: true, ..Default::default() };
//! let anonymizer = Anonymizer::new(config, Arc::new(PseudonymRegistry::new())).unwrap();
//! let ctx = CourseIdentityContext::for_course("course-101").unwrap();
//!
//! let payload = json!({"user": {"name": "Alice Smith"}, "score": 90});
//! let (sanitized, report) = anonymizer.sanitize(&ctx, &payload).unwrap();
//!
//! assert_eq!(sanitized, json!({"user": {"name": "Student_001"}, "score": 90}));
//! assert_eq!(report.total_replacements, 1);
//! ```

use crate::anonymization::config::AnonymizationConfig;
use crate::anonymization::models::{
    FieldPath, IdentifierHit, IdentifierTag, PayloadKind, Replacement,
};
use crate::anonymization::registry::{IndividualId, PseudonymRegistry};
use crate::anonymization::report::{SanitizationNotice, SanitizationReport};
use crate::anonymization::schema::IdentifierSchema;
use crate::anonymization::traversal::scan;
use crate::domain::errors::{AnonymizationError, ShieldError};
use crate::domain::ids::CourseIdentityContext;
use crate::domain::Result;
use crate::log_sanitize_complete;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use zeroize::Zeroize;

/// Sanitizes Canvas payloads against a shared pseudonym registry
///
/// Cheap to share across tasks behind `Arc`; all mutable state lives in the
/// registry.
pub struct Anonymizer {
    config: AnonymizationConfig,
    schema: IdentifierSchema,
    registry: Arc<PseudonymRegistry>,
}

/// Per-payload result kept apart until the payload has fully succeeded
struct PayloadOutcome {
    sanitized: Value,
    leaves: usize,
    tags: Vec<IdentifierTag>,
    individuals: Vec<(IndividualId, bool)>,
}

impl Anonymizer {
    /// Creates an anonymizer with the built-in Canvas catalog plus configured rules
    ///
    /// # Errors
    ///
    /// [`ShieldError::Configuration`] for an invalid depth bound, and
    /// [`ShieldError::Anonymization`] when a rule fails to compile.
    pub fn new(config: AnonymizationConfig, registry: Arc<PseudonymRegistry>) -> Result<Self> {
        let schema = IdentifierSchema::canvas_with_extra_rules(&config.rules)?;
        Self::with_schema(config, schema, registry)
    }

    /// Creates an anonymizer with an explicit schema
    pub fn with_schema(
        config: AnonymizationConfig,
        schema: IdentifierSchema,
        registry: Arc<PseudonymRegistry>,
    ) -> Result<Self> {
        if config.max_depth == 0 {
            return Err(ShieldError::Configuration(
                "anonymization.max_depth must be greater than 0".to_string(),
            ));
        }

        if config.enabled && config.debug {
            tracing::warn!(
                "Anonymization debug mode is on: original values will be embedded in output. \
                 Never enable this outside local auditing"
            );
        }

        tracing::debug!(
            enabled = config.enabled,
            debug = config.debug,
            max_depth = config.max_depth,
            rules = schema.len(),
            "Anonymizer created"
        );

        Ok(Self {
            config,
            schema,
            registry,
        })
    }

    /// Sanitizes a payload with no payload-kind hint
    pub fn sanitize(
        &self,
        context: &CourseIdentityContext,
        payload: &Value,
    ) -> std::result::Result<(Value, SanitizationReport), AnonymizationError> {
        self.sanitize_as(context, PayloadKind::Generic, payload)
    }

    /// Sanitizes a payload declared to be of the given kind
    ///
    /// The input is never modified. When anonymization is disabled the payload is
    /// returned unchanged and the report carries
    /// [`SanitizationNotice::AnonymizationDisabled`].
    ///
    /// # Errors
    ///
    /// [`AnonymizationError::StructureTooDeep`] when the payload nests deeper than
    /// the configured bound. No mapping state is created in that case.
    pub fn sanitize_as(
        &self,
        context: &CourseIdentityContext,
        kind: PayloadKind,
        payload: &Value,
    ) -> std::result::Result<(Value, SanitizationReport), AnonymizationError> {
        let start = Instant::now();
        let mut report = self.new_report(context, kind);

        if !self.config.enabled {
            self.warn_disabled(context, &mut report);
            report.payloads = 1;
            return Ok((payload.clone(), report));
        }

        let outcome = self.sanitize_payload(context, kind, payload).map_err(|e| {
            tracing::error!(context = %context, kind = %kind, error = %e, "Sanitization refused");
            e
        })?;

        let mut individuals = HashMap::new();
        let sanitized = self.absorb(&mut report, &mut individuals, outcome);
        finish_individuals(&mut report, individuals);

        log_sanitize_complete!(
            context,
            report.total_replacements,
            report.individuals_found,
            start.elapsed()
        );

        Ok((sanitized, report))
    }

    /// Sanitizes several payloads under one context
    ///
    /// Payloads that fail are withheld from the output and recorded as
    /// [`SanitizationNotice::PayloadWithheld`]; they are never passed through.
    /// The returned vector holds only successfully sanitized payloads, in input
    /// order.
    pub fn sanitize_batch(
        &self,
        context: &CourseIdentityContext,
        kind: PayloadKind,
        payloads: &[Value],
    ) -> (Vec<Value>, SanitizationReport) {
        let start = Instant::now();
        let mut report = self.new_report(context, kind);

        if !self.config.enabled {
            self.warn_disabled(context, &mut report);
            report.payloads = payloads.len();
            return (payloads.to_vec(), report);
        }

        let mut results = Vec::with_capacity(payloads.len());
        let mut individuals = HashMap::new();

        for (index, payload) in payloads.iter().enumerate() {
            match self.sanitize_payload(context, kind, payload) {
                Ok(outcome) => {
                    results.push(self.absorb(&mut report, &mut individuals, outcome));
                }
                Err(e) => {
                    tracing::error!(
                        context = %context,
                        index,
                        error = %e,
                        "Failed to sanitize payload, withholding it"
                    );
                    report.add_notice(SanitizationNotice::PayloadWithheld {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }
        finish_individuals(&mut report, individuals);

        log_sanitize_complete!(
            context,
            report.total_replacements,
            report.individuals_found,
            start.elapsed()
        );

        (results, report)
    }

    /// Check if anonymization is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Check if debug composites are produced
    pub fn is_debug(&self) -> bool {
        self.config.debug
    }

    /// Active configuration
    pub fn config(&self) -> &AnonymizationConfig {
        &self.config
    }

    /// Shared registry
    pub fn registry(&self) -> &Arc<PseudonymRegistry> {
        &self.registry
    }

    /// Compiled identifier schema
    pub fn schema(&self) -> &IdentifierSchema {
        &self.schema
    }

    fn new_report(&self, context: &CourseIdentityContext, kind: PayloadKind) -> SanitizationReport {
        SanitizationReport::new(
            context.clone(),
            kind,
            self.config.enabled,
            self.config.enabled && self.config.debug,
        )
    }

    fn warn_disabled(&self, context: &CourseIdentityContext, report: &mut SanitizationReport) {
        let notice = SanitizationNotice::AnonymizationDisabled;
        tracing::warn!(context = %context, "{}", notice);
        report.add_notice(notice);
    }

    /// Folds a successful payload into the running report
    fn absorb(
        &self,
        report: &mut SanitizationReport,
        individuals: &mut HashMap<IndividualId, bool>,
        outcome: PayloadOutcome,
    ) -> Value {
        report.payloads += 1;
        report.leaves_scanned += outcome.leaves;
        for tag in outcome.tags {
            report.record_replacement(tag);
        }
        for (individual, created) in outcome.individuals {
            *individuals.entry(individual).or_insert(false) |= created;
        }
        if report.debug && report.total_replacements > 0 {
            report.add_notice(SanitizationNotice::DebugOriginalsEmbedded);
        }
        outcome.sanitized
    }

    fn sanitize_payload(
        &self,
        context: &CourseIdentityContext,
        kind: PayloadKind,
        payload: &Value,
    ) -> std::result::Result<PayloadOutcome, AnonymizationError> {
        let mut scanner = scan(payload, &self.schema, kind, self.config.max_depth);
        let hits: Vec<IdentifierHit<'_>> = scanner.by_ref().collect::<std::result::Result<_, _>>()?;
        let leaves = scanner.leaves_visited();

        let mut replacements: Vec<Option<String>> = vec![None; hits.len()];
        let mut individuals = Vec::new();

        for record in group_records(&hits) {
            let mut raws: Vec<String> = record.iter().map(|&i| hits[i].raw_text()).collect();
            let claims: Vec<(&str, IdentifierTag)> = record
                .iter()
                .zip(&raws)
                .map(|(&i, raw)| (raw.as_str(), hits[i].tag))
                .collect();

            let resolution = self.registry.resolve_record(context, &claims);
            drop(claims);
            for raw in raws.iter_mut() {
                raw.zeroize();
            }

            for (&i, pseudonym) in record.iter().zip(resolution.pseudonyms) {
                replacements[i] = Some(pseudonym);
            }
            individuals.push((resolution.individual, resolution.individual_created));
        }

        let mut sanitized = payload.clone();
        let mut tags = Vec::with_capacity(hits.len());
        for (hit, pseudonym) in hits.iter().zip(replacements) {
            let pseudonym = pseudonym.ok_or_else(|| AnonymizationError::WriteBackFailed {
                path: hit.path.to_string(),
            })?;
            let replacement = if self.config.debug {
                Replacement::PseudonymizedWithDebugOriginal {
                    pseudonym,
                    original: hit.value.clone(),
                }
            } else {
                Replacement::Pseudonymized(pseudonym)
            };

            write_back(&mut sanitized, &hit.path, replacement)?;
            tags.push(hit.tag);
            tracing::trace!(path = %hit.path, tag = %hit.tag, "Replaced identifier");
        }

        Ok(PayloadOutcome {
            sanitized,
            leaves,
            tags,
            individuals,
        })
    }
}

/// Writes a replacement at `path`, failing when the slot cannot be found
fn write_back(
    sanitized: &mut Value,
    path: &FieldPath,
    replacement: Replacement,
) -> std::result::Result<(), AnonymizationError> {
    let slot = sanitized
        .pointer_mut(&path.to_pointer())
        .ok_or_else(|| AnonymizationError::WriteBackFailed {
            path: path.to_string(),
        })?;
    *slot = replacement.into_value();
    Ok(())
}

/// Counts each distinct individual once, new if any record created it
fn finish_individuals(report: &mut SanitizationReport, individuals: HashMap<IndividualId, bool>) {
    for (_, created) in individuals {
        report.record_individual(created);
    }
}

/// Groups hit indexes into identity records
///
/// Hits whose parent is the same object form one record, kept in document
/// order. Hits that are array elements stand alone. Records are returned in
/// order of their first hit.
fn group_records(hits: &[IdentifierHit<'_>]) -> Vec<Vec<usize>> {
    let mut records: Vec<Vec<usize>> = Vec::new();
    let mut by_parent: HashMap<FieldPath, usize> = HashMap::new();

    for (i, hit) in hits.iter().enumerate() {
        if hit.path.is_array_element() {
            records.push(vec![i]);
            continue;
        }
        let parent = hit.path.parent().unwrap_or_default();
        match by_parent.get(&parent) {
            Some(&r) => records[r].push(i),
            None => {
                by_parent.insert(parent, records.len());
                records.push(vec![i]);
            }
        }
    }
    records
}
