//! FERPA compliance properties of the pseudonym registry and anonymizer

use canvas_shield::anonymization::registry::canonicalize;
use canvas_shield::anonymization::{
    AnonymizationConfig, Anonymizer, BuildMode, IdentifierTag, MapBuilder, PayloadKind,
    PseudonymRegistry, SeedEntry, SeedRecord,
};
use canvas_shield::domain::CourseIdentityContext;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

fn ctx(id: &str) -> CourseIdentityContext {
    CourseIdentityContext::for_course(id).unwrap()
}

fn anonymizer(enabled: bool, registry: Arc<PseudonymRegistry>) -> Anonymizer {
    let config = AnonymizationConfig {
        enabled,
        ..Default::default()
    };
    Anonymizer::new(config, registry).unwrap()
}

/// Canvas user objects with synthetic identities
fn synthetic_users(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            let name: String = Name().fake();
            let email: String = SafeEmail().fake();
            json!({
                "id": 1000 + i,
                "name": name,
                "email": email,
                "enrollment_state": "active",
                "last_activity_at": "2025-03-01T12:00:00Z"
            })
        })
        .collect()
}

#[test]
fn test_resolve_is_idempotent() {
    let registry = PseudonymRegistry::new();
    let c = ctx("course-101");

    let first = registry.resolve(&c, "Alice Smith", IdentifierTag::Name);
    for _ in 0..50 {
        assert_eq!(registry.resolve(&c, "Alice Smith", IdentifierTag::Name), first);
    }
    assert_eq!(registry.snapshot(&c).len(), 1);
}

#[test]
fn test_canonical_variants_collapse() {
    let registry = PseudonymRegistry::new();
    let c = ctx("course-101");

    let a = registry.resolve(&c, "Jane Doe", IdentifierTag::Name);
    let b = registry.resolve(&c, "  jane doe  ", IdentifierTag::Name);
    let d = registry.resolve(&c, "JANE\tDOE", IdentifierTag::Name);

    assert_eq!(a, b);
    assert_eq!(a, d);
}

#[test]
fn test_bijection_over_synthetic_roster() {
    let registry = PseudonymRegistry::new();
    let c = ctx("course-101");

    let mut by_canonical: HashMap<String, String> = HashMap::new();
    for _ in 0..300 {
        let name: String = Name().fake();
        let pseudonym = registry.resolve(&c, &name, IdentifierTag::Name);
        if let Some(previous) = by_canonical.insert(canonicalize(&name), pseudonym.clone()) {
            assert_eq!(previous, pseudonym, "identifier mapped to two pseudonyms");
        }
    }

    let distinct: HashSet<_> = by_canonical.values().collect();
    assert_eq!(distinct.len(), by_canonical.len(), "pseudonym shared by two identifiers");
    assert_eq!(registry.snapshot(&c).len(), by_canonical.len());
}

#[test]
fn test_bijection_with_seeded_pseudonyms() {
    let registry = PseudonymRegistry::new();
    let c = ctx("course-101");

    registry
        .seed(
            &c,
            &[
                SeedRecord::single(
                    SeedEntry::new("Carol King", IdentifierTag::Name).with_pseudonym("Student_002"),
                ),
                SeedRecord::single(
                    SeedEntry::new("Dan Brown", IdentifierTag::Name).with_pseudonym("Student_001"),
                ),
            ],
        )
        .unwrap();

    // Counter must skip numbers the seed already holds
    let fresh = registry.resolve(&c, "Erin Diaz", IdentifierTag::Name);
    assert_eq!(fresh, "Student_003");

    let pseudonyms: HashSet<_> = registry
        .snapshot(&c)
        .into_iter()
        .map(|e| e.pseudonym.clone())
        .collect();
    assert_eq!(pseudonyms.len(), 3);
}

#[test]
fn test_disabled_is_pass_through() {
    let registry = Arc::new(PseudonymRegistry::new());
    let anonymizer = anonymizer(false, Arc::clone(&registry));
    let users = json!(synthetic_users(25));

    for kind in [PayloadKind::Generic, PayloadKind::Users] {
        let (sanitized, report) = anonymizer.sanitize_as(&ctx("course-101"), kind, &users).unwrap();
        assert_eq!(sanitized, users);
        assert_eq!(report.total_replacements, 0);
        assert!(!report.enabled);
    }
    assert!(registry.contexts().is_empty());
}

#[test]
fn test_non_identifying_fields_preserved() {
    let registry = Arc::new(PseudonymRegistry::new());
    let anonymizer = anonymizer(true, registry);
    let users = synthetic_users(40);

    let (sanitized, report) = anonymizer
        .sanitize_as(&ctx("course-101"), PayloadKind::Users, &json!(users))
        .unwrap();

    assert_eq!(report.replacements_for(IdentifierTag::Name), 40);
    for (original, sanitized) in users.iter().zip(sanitized.as_array().unwrap()) {
        for key in ["id", "enrollment_state", "last_activity_at"] {
            assert_eq!(original[key], sanitized[key]);
        }
        assert_ne!(original["name"], sanitized["name"]);
        assert_ne!(original["email"], sanitized["email"]);
    }
}

#[test]
fn test_no_raw_identifier_survives() {
    let registry = Arc::new(PseudonymRegistry::new());
    let anonymizer = anonymizer(true, registry);
    let users = synthetic_users(30);

    let (sanitized, report) = anonymizer
        .sanitize_as(&ctx("course-101"), PayloadKind::Users, &json!(users))
        .unwrap();

    let text = serde_json::to_string(&sanitized).unwrap();
    let report_text = format!("{}{}", report.format_console(), report.format_json().unwrap());
    for user in &users {
        let email = user["email"].as_str().unwrap();
        assert!(!text.contains(email));
        assert!(!report_text.contains(email));
    }
}

#[test]
fn test_registry_debug_never_shows_identifiers() {
    let registry = PseudonymRegistry::new();
    let c = ctx("course-101");
    registry.resolve(&c, "alice@x.edu", IdentifierTag::Email);

    let rendered = format!("{registry:?} {:?}", registry.snapshot(&c));
    assert!(!rendered.contains("alice"));
}

#[test]
fn test_seeded_pseudonym_reused() {
    let registry = Arc::new(PseudonymRegistry::new());
    let anonymizer = anonymizer(true, Arc::clone(&registry));
    let c = ctx("course-101");

    registry
        .seed(
            &c,
            &[SeedRecord::single(
                SeedEntry::new("Carol King", IdentifierTag::Name).with_pseudonym("Student_042"),
            )],
        )
        .unwrap();

    let (sanitized, _) = anonymizer
        .sanitize(&c, &json!({"user": {"name": "carol king"}}))
        .unwrap();
    assert_eq!(sanitized["user"]["name"], "Student_042");
}

#[test]
fn test_reset_starts_numbering_over() {
    let registry = PseudonymRegistry::new();
    let c = ctx("course-101");
    registry.resolve(&c, "Alice Smith", IdentifierTag::Name);
    registry.resolve(&c, "Bob Lee", IdentifierTag::Name);

    registry.reset(&c);

    assert!(registry.snapshot(&c).is_empty());
    assert_eq!(registry.resolve(&c, "Bob Lee", IdentifierTag::Name), "Student_001");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolve_converges() {
    let registry = Arc::new(PseudonymRegistry::new());
    let c = ctx("course-101");
    let names: Vec<String> = (0..20).map(|i| format!("Student Person {i}")).collect();

    let tasks = (0..16).map(|t| {
        let registry = Arc::clone(&registry);
        let c = c.clone();
        let mut names = names.clone();
        names.rotate_left(t);
        tokio::spawn(async move {
            names
                .iter()
                .map(|n| (n.clone(), registry.resolve(&c, n, IdentifierTag::Name)))
                .collect::<HashMap<_, _>>()
        })
    });

    let results: Vec<HashMap<String, String>> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    for result in &results[1..] {
        assert_eq!(result, &results[0]);
    }
    let distinct: HashSet<_> = results[0].values().collect();
    assert_eq!(distinct.len(), names.len());
    assert_eq!(registry.snapshot(&c).len(), names.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_courses_isolated() {
    let registry = Arc::new(PseudonymRegistry::new());
    let anonymizer = Arc::new(anonymizer(true, Arc::clone(&registry)));

    let tasks = (0..8).map(|i| {
        let anonymizer = Arc::clone(&anonymizer);
        tokio::spawn(async move {
            let c = ctx(&format!("course-{i}"));
            let payload = json!({"submissions": [
                {"user": {"name": "Alice Smith", "email": "alice@x.edu"}},
                {"user": {"name": "Bob Lee", "email": "bob@x.edu"}}
            ]});
            anonymizer.sanitize(&c, &payload).map(|(sanitized, _)| sanitized)
        })
    });

    let outputs: Vec<Value> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();

    for output in &outputs {
        assert_eq!(output["submissions"][0]["user"]["name"], "Student_001");
        assert_eq!(output["submissions"][1]["user"]["email"], "StudentEmail_002");
    }
    assert_eq!(registry.contexts().len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rebuild_is_atomic_under_concurrent_sanitize() {
    let registry = Arc::new(PseudonymRegistry::new());
    let anonymizer = Arc::new(anonymizer(true, Arc::clone(&registry)));
    let roster = json!(["Carol King", "Dan Brown", "Erin Diaz", "Fay Wong"]);

    let writers = (0..4).map(|t| {
        let anonymizer = Arc::clone(&anonymizer);
        tokio::spawn(async move {
            let c = ctx("course-101");
            for i in 0..200 {
                let payload = json!({"user": {"name": format!("Walk In {t}-{i}")}});
                anonymizer.sanitize(&c, &payload).unwrap();
            }
        })
    });

    let rebuilds = (0..4).map(|_| {
        let anonymizer = Arc::clone(&anonymizer);
        let roster = roster.clone();
        tokio::spawn(async move {
            let c = ctx("course-101");
            (0..50)
                .map(|_| {
                    MapBuilder::for_anonymizer(&anonymizer)
                        .build_map(&c, &roster, BuildMode::Rebuild)
                        .unwrap()
                        .assignments
                        .iter()
                        .map(|a| a.pseudonym.clone())
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        })
    });

    for result in futures::future::join_all(writers).await {
        result.unwrap();
    }
    for result in futures::future::join_all(rebuilds).await {
        for pseudonyms in result.unwrap() {
            assert_eq!(
                pseudonyms,
                vec!["Student_001", "Student_002", "Student_003", "Student_004"]
            );
        }
    }
}
