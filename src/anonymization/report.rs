//! Sanitization reporting
//!
//! Every call to the anonymizer produces a [`SanitizationReport`] alongside the
//! sanitized payload. Reports carry counts, tags and pseudonym statistics only;
//! raw identifiers never appear in them.

use crate::anonymization::models::{IdentifierTag, PayloadKind};
use crate::domain::ids::CourseIdentityContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Non-fatal condition attached to a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum SanitizationNotice {
    /// Anonymization is turned off; the payload passed through unchanged
    AnonymizationDisabled,
    /// Debug composites with original values were written
    DebugOriginalsEmbedded,
    /// A batch member failed and was withheld
    PayloadWithheld {
        /// Position in the batch
        index: usize,
        /// Error description (never contains raw identifiers)
        reason: String,
    },
}

impl fmt::Display for SanitizationNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnonymizationDisabled => {
                f.write_str("Anonymization is disabled; student data was returned unchanged")
            }
            Self::DebugOriginalsEmbedded => {
                f.write_str("Debug mode: original values are embedded in the output")
            }
            Self::PayloadWithheld { index, reason } => {
                write!(f, "Payload #{index} was withheld: {reason}")
            }
        }
    }
}

/// Outcome of one sanitize call or batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizationReport {
    /// Context the payload was sanitized under
    pub context: CourseIdentityContext,

    /// Declared payload kind
    pub kind: PayloadKind,

    /// Whether anonymization was enabled
    pub enabled: bool,

    /// Whether debug composites were produced
    pub debug: bool,

    /// Payloads sanitized (1 for a single call)
    pub payloads: usize,

    /// Scalar leaves visited, identifying or not
    pub leaves_scanned: usize,

    /// Replacements per tag
    pub replacements_by_tag: BTreeMap<IdentifierTag, usize>,

    /// Total replacements
    pub total_replacements: usize,

    /// Distinct individuals encountered
    pub individuals_found: usize,

    /// Individuals first seen during this call
    pub individuals_new: usize,

    /// Individuals already in the registry
    pub individuals_known: usize,

    /// Non-fatal notices
    pub notices: Vec<SanitizationNotice>,

    /// When the report was produced
    pub generated_at: DateTime<Utc>,
}

impl SanitizationReport {
    /// Create an empty report
    pub fn new(context: CourseIdentityContext, kind: PayloadKind, enabled: bool, debug: bool) -> Self {
        Self {
            context,
            kind,
            enabled,
            debug,
            payloads: 0,
            leaves_scanned: 0,
            replacements_by_tag: BTreeMap::new(),
            total_replacements: 0,
            individuals_found: 0,
            individuals_new: 0,
            individuals_known: 0,
            notices: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// Count one replacement
    pub fn record_replacement(&mut self, tag: IdentifierTag) {
        *self.replacements_by_tag.entry(tag).or_insert(0) += 1;
        self.total_replacements += 1;
    }

    /// Count one distinct individual
    pub fn record_individual(&mut self, created: bool) {
        self.individuals_found += 1;
        if created {
            self.individuals_new += 1;
        } else {
            self.individuals_known += 1;
        }
    }

    /// Add a notice unless an equal one is already present
    pub fn add_notice(&mut self, notice: SanitizationNotice) {
        if !self.notices.contains(&notice) {
            self.notices.push(notice);
        }
    }

    /// Replacements recorded for one tag
    pub fn replacements_for(&self, tag: IdentifierTag) -> usize {
        self.replacements_by_tag.get(&tag).copied().unwrap_or(0)
    }

    /// Format report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                    SANITIZATION REPORT                        \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("📊 SUMMARY\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("  Context:                {}\n", self.context));
        output.push_str(&format!("  Payload Kind:           {}\n", self.kind));
        output.push_str(&format!(
            "  Anonymization:          {}\n",
            if self.enabled { "enabled" } else { "DISABLED" }
        ));
        output.push_str(&format!("  Payloads:               {}\n", self.payloads));
        output.push_str(&format!("  Leaves Scanned:         {}\n", self.leaves_scanned));
        output.push_str(&format!("  Total Replacements:     {}\n", self.total_replacements));
        output.push_str(&format!(
            "  Individuals:            {} ({} new, {} known)\n",
            self.individuals_found, self.individuals_new, self.individuals_known
        ));
        output.push('\n');

        if !self.replacements_by_tag.is_empty() {
            output.push_str("🔍 REPLACEMENTS BY TAG\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for (tag, count) in &self.replacements_by_tag {
                output.push_str(&format!("  {:30} {:>5}\n", tag.as_str(), count));
            }
            output.push('\n');
        }

        if !self.notices.is_empty() {
            output.push_str("⚠️  NOTICES\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for notice in &self.notices {
                output.push_str(&format!("  • {}\n", notice));
            }
            output.push('\n');
        }

        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output
    }

    /// Format report as JSON
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
