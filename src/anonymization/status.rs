//! Anonymization status reporting

use crate::anonymization::engine::Anonymizer;
use crate::anonymization::models::IdentifierTag;
use crate::anonymization::registry::PseudonymRegistry;
use crate::domain::ids::CourseIdentityContext;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Point-in-time view of anonymization state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnonymizationStatus {
    /// Context described, `None` for the all-contexts overview
    pub context: Option<CourseIdentityContext>,
    /// Whether anonymization is enabled
    pub enabled: bool,
    /// Whether debug composites are produced
    pub debug_mode: bool,
    /// Contexts covered
    pub contexts: usize,
    /// Distinct individuals with at least one mapping
    pub known_individual_count: usize,
    /// Distinct canonical identifiers mapped
    pub known_identifier_count: usize,
    /// Identifier count per tag
    pub tag_breakdown: BTreeMap<IdentifierTag, usize>,
}

impl AnonymizationStatus {
    /// Format status for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push_str("🔒 Data Anonymization Status\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        if let Some(ref context) = self.context {
            output.push_str(&format!("  Context: {}\n", context));
        }
        output.push('\n');

        if self.enabled {
            output.push_str("✅ ANONYMIZATION ENABLED - student data is protected\n\n");
            output.push_str("📊 Statistics:\n");
            if self.context.is_none() {
                output.push_str(&format!("  • Contexts:                {}\n", self.contexts));
            }
            output.push_str(&format!(
                "  • Known individuals:       {}\n",
                self.known_individual_count
            ));
            output.push_str(&format!(
                "  • Known identifiers:       {}\n",
                self.known_identifier_count
            ));
            for (tag, count) in &self.tag_breakdown {
                output.push_str(&format!("      {:22} {:>5}\n", tag.as_str(), count));
            }
            output.push_str(&format!(
                "  • Debug mode:              {}\n",
                if self.debug_mode { "ON" } else { "OFF" }
            ));
            if self.debug_mode {
                output.push_str("\n⚠️  Debug output embeds original values. Use for local auditing only.\n");
            }
        } else {
            output.push_str("⚠️  ANONYMIZATION DISABLED - student data is NOT protected\n\n");
            output.push_str("🚨 Real student identifiers are passed through unchanged\n");
            output.push_str("⚖️  This may violate FERPA requirements\n\n");
            output.push_str("💡 Recommendation: enable anonymization:\n");
            output.push_str("   ENABLE_DATA_ANONYMIZATION=true\n");
            output.push_str("   or set [anonymization] enabled = true in canvas-shield.toml\n");
        }

        output
    }
}

/// Reads configuration flags and registry counts; keeps no state of its own
#[derive(Debug, Clone)]
pub struct StatusReporter {
    enabled: bool,
    debug: bool,
    registry: Arc<PseudonymRegistry>,
}

impl StatusReporter {
    /// Creates a reporter over a registry
    pub fn new(enabled: bool, debug: bool, registry: Arc<PseudonymRegistry>) -> Self {
        Self {
            enabled,
            debug,
            registry,
        }
    }

    /// Reporter matching an anonymizer's configuration and registry
    pub fn for_anonymizer(anonymizer: &Anonymizer) -> Self {
        Self::new(
            anonymizer.is_enabled(),
            anonymizer.is_debug(),
            Arc::clone(anonymizer.registry()),
        )
    }

    /// Status of one context
    pub fn status(&self, context: &CourseIdentityContext) -> AnonymizationStatus {
        let stats = self.registry.stats(context);
        AnonymizationStatus {
            context: Some(context.clone()),
            enabled: self.enabled,
            debug_mode: self.debug,
            contexts: usize::from(stats.identifiers > 0),
            known_individual_count: stats.individuals,
            known_identifier_count: stats.identifiers,
            tag_breakdown: stats.by_tag,
        }
    }

    /// Totals across every live context
    pub fn overview(&self) -> AnonymizationStatus {
        let mut status = AnonymizationStatus {
            context: None,
            enabled: self.enabled,
            debug_mode: self.debug,
            contexts: 0,
            known_individual_count: 0,
            known_identifier_count: 0,
            tag_breakdown: BTreeMap::new(),
        };

        for context in self.registry.contexts() {
            let stats = self.registry.stats(&context);
            status.contexts += 1;
            status.known_individual_count += stats.individuals;
            status.known_identifier_count += stats.identifiers;
            for (tag, count) in stats.by_tag {
                *status.tag_breakdown.entry(tag).or_insert(0) += count;
            }
        }

        status
    }
}
