//! Error handling tests: every failure is reported, nothing leaks unsanitized

use canvas_shield::anonymization::schema::RuleDefinition;
use canvas_shield::anonymization::{
    AnonymizationConfig, Anonymizer, BuildMode, IdentifierSchema, IdentifierTag, MapBuilder,
    PayloadKind, PseudonymRegistry, SanitizationNotice, SeedEntry, SeedRecord,
};
use canvas_shield::domain::{AnonymizationError, CourseIdentityContext, ShieldError};
use serde_json::json;
use std::sync::Arc;

fn ctx() -> CourseIdentityContext {
    CourseIdentityContext::for_course("course-101").unwrap()
}

fn rule(pattern: &str, tag: &str) -> RuleDefinition {
    RuleDefinition {
        pattern: pattern.to_string(),
        tag: tag.to_string(),
    }
}

fn nested(levels: usize) -> serde_json::Value {
    let mut payload = json!({"user": {"name": "Alice Smith", "email": "alice@x.edu"}});
    for _ in 0..levels {
        payload = json!({ "wrapper": payload });
    }
    payload
}

#[test]
fn test_too_deep_payload_is_refused_not_passed_through() {
    let registry = Arc::new(PseudonymRegistry::new());
    let config = AnonymizationConfig {
        enabled: true,
        ..Default::default()
    };
    let anonymizer = Anonymizer::new(config, Arc::clone(&registry)).unwrap();

    let result = anonymizer.sanitize(&ctx(), &nested(80));

    match result {
        Err(AnonymizationError::StructureTooDeep { max_depth, path }) => {
            assert_eq!(max_depth, 64);
            assert!(path.starts_with("wrapper."));
            assert!(!path.contains("Alice"));
        }
        other => panic!("expected StructureTooDeep, got {other:?}"),
    }
    assert!(registry.contexts().is_empty());
}

#[test]
fn test_batch_never_returns_failed_payload() {
    let config = AnonymizationConfig {
        enabled: true,
        max_depth: 8,
        ..Default::default()
    };
    let anonymizer = Anonymizer::new(config, Arc::new(PseudonymRegistry::new())).unwrap();
    let payloads = vec![nested(0), nested(20), nested(1)];

    let (results, report) = anonymizer.sanitize_batch(&ctx(), PayloadKind::Generic, &payloads);

    assert_eq!(results.len(), 2);
    for result in &results {
        let text = result.to_string();
        assert!(!text.contains("Alice"));
        assert!(!text.contains("alice@x.edu"));
    }
    assert_eq!(report.payloads, 2);
    assert_eq!(report.individuals_found, 1);
    assert!(matches!(
        report.notices.as_slice(),
        [SanitizationNotice::PayloadWithheld { index: 1, reason }] if reason.contains("too deep")
    ));
}

#[test]
fn test_conflicting_seed_rejected_without_partial_apply() {
    let registry = PseudonymRegistry::new();
    let c = ctx();
    let alice = registry.resolve(&c, "Alice Smith", IdentifierTag::Name);
    assert_eq!(alice, "Student_001");

    let result = registry.seed(
        &c,
        &[
            SeedRecord::single(SeedEntry::new("Carol King", IdentifierTag::Name)),
            SeedRecord::single(
                SeedEntry::new("Alice Smith", IdentifierTag::Name).with_pseudonym("Student_009"),
            ),
        ],
    );

    match result {
        Err(AnonymizationError::ConflictingMapping {
            existing,
            requested,
            ..
        }) => {
            assert_eq!(existing, "Student_001");
            assert_eq!(requested, "Student_009");
        }
        other => panic!("expected ConflictingMapping, got {other:?}"),
    }
    assert_eq!(registry.snapshot(&c).len(), 1);
}

#[test]
fn test_seed_rejects_taken_pseudonym() {
    let registry = PseudonymRegistry::new();
    let c = ctx();
    registry.resolve(&c, "Alice Smith", IdentifierTag::Name);

    let result = registry.seed(
        &c,
        &[SeedRecord::single(
            SeedEntry::new("Bob Lee", IdentifierTag::Name).with_pseudonym("Student_001"),
        )],
    );

    assert!(matches!(result, Err(AnonymizationError::ConflictingMapping { .. })));
    assert_eq!(registry.snapshot(&c).len(), 1);
}

#[test]
fn test_conflict_message_has_no_raw_identifier() {
    let registry = PseudonymRegistry::new();
    let c = ctx();
    registry.resolve(&c, "Alice Smith", IdentifierTag::Name);

    let err = registry
        .seed(
            &c,
            &[SeedRecord::single(
                SeedEntry::new("Alice Smith", IdentifierTag::Name).with_pseudonym("Student_777"),
            )],
        )
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Student_777"));
    assert!(!message.to_lowercase().contains("alice"));
}

#[test]
fn test_invalid_rules_rejected() {
    let unknown_tag = IdentifierSchema::from_definitions(&[rule("**.nickname", "phone")]);
    assert!(matches!(unknown_tag, Err(AnonymizationError::InvalidRule { .. })));

    let bad_pattern = IdentifierSchema::from_definitions(&[rule("**.{user", "name")]);
    assert!(matches!(bad_pattern, Err(AnonymizationError::InvalidRule { .. })));

    let overlapping = IdentifierSchema::from_definitions(&[
        rule("**.nickname", "name"),
        rule("**.nickname", "login_id"),
    ]);
    assert!(matches!(
        overlapping,
        Err(AnonymizationError::OverlappingRules { .. })
    ));
}

#[test]
fn test_anonymizer_rejects_bad_config() {
    let bad_rule = AnonymizationConfig {
        enabled: true,
        rules: vec![rule("**.nickname", "phone")],
        ..Default::default()
    };
    assert!(matches!(
        Anonymizer::new(bad_rule, Arc::new(PseudonymRegistry::new())),
        Err(ShieldError::Anonymization(AnonymizationError::InvalidRule { .. }))
    ));

    let zero_depth = AnonymizationConfig {
        enabled: true,
        max_depth: 0,
        ..Default::default()
    };
    assert!(matches!(
        Anonymizer::new(zero_depth, Arc::new(PseudonymRegistry::new())),
        Err(ShieldError::Configuration(_))
    ));
}

#[test]
fn test_invalid_context() {
    assert!(matches!(
        CourseIdentityContext::for_course("  "),
        Err(AnonymizationError::InvalidContext(_))
    ));
    assert!(matches!(
        CourseIdentityContext::for_session("course-101", ""),
        Err(AnonymizationError::InvalidContext(_))
    ));
}

#[test]
fn test_invalid_roster_leaves_registry_untouched() {
    let registry = Arc::new(PseudonymRegistry::new());
    let builder = MapBuilder::new(
        Arc::clone(&registry),
        IdentifierSchema::canvas_default().unwrap(),
    );

    for roster in [
        json!({"students": ["Alice Smith"]}),
        json!(["Alice Smith", 42]),
        json!(["Alice Smith", "   "]),
        json!(["Alice Smith", {"id": 5, "enrollment_state": "active"}]),
    ] {
        let result = builder.build_map(&ctx(), &roster, BuildMode::Extend);
        assert!(matches!(result, Err(AnonymizationError::InvalidRoster(_))));
    }
    assert!(registry.snapshot(&ctx()).is_empty());
}

#[test]
fn test_rebuild_rejected_roster_keeps_existing_map() {
    let registry = Arc::new(PseudonymRegistry::new());
    let builder = MapBuilder::new(
        Arc::clone(&registry),
        IdentifierSchema::canvas_default().unwrap(),
    );
    registry.resolve(&ctx(), "Alice Smith", IdentifierTag::Name);

    let result = builder.build_map(&ctx(), &json!([null]), BuildMode::Rebuild);

    assert!(result.is_err());
    assert_eq!(registry.snapshot(&ctx()).len(), 1);
}
