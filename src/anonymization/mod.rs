//! Student identifier anonymization
//!
//! Replaces student identifiers in Canvas API responses with stable, per-course
//! pseudonyms before the data reaches an AI assistant.
//!
//! # Architecture
//!
//! - **Schema**: path-aware catalog of identifying fields ([`schema`])
//! - **Traversal**: lazy, depth-bounded walk yielding identifying leaves ([`traversal`])
//! - **Registry**: per-context bijective pseudonym store ([`registry`])
//! - **Anonymizer**: scan, resolve, write back ([`engine`])
//! - **Status / roster**: operator views over the registry ([`status`], [`roster`])
//!
//! # Usage
//!
//! ```rust
//! use canvas_shield::anonymization::{AnonymizationConfig, Anonymizer, PayloadKind, PseudonymRegistry};
//! use canvas_shield::domain::CourseIdentityContext;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(PseudonymRegistry::new());
//! let config = AnonymizationConfig { enabled: true, ..Default::default() };
//! let anonymizer = Anonymizer::new(config, registry)?;
//!
//! let ctx = CourseIdentityContext::for_course("course-101")?;
//! let users = json!([{"id": 1, "name": "Alice Smith", "login_id": "asmith"}]);
//! let (sanitized, _report) = anonymizer.sanitize_as(&ctx, PayloadKind::Users, &users)?;
//!
//! assert_eq!(sanitized[0]["name"], "Student_001");
//! assert_eq!(sanitized[0]["login_id"], "StudentLogin_001");
//! assert_eq!(sanitized[0]["id"], 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod engine;
pub mod models;
pub mod registry;
pub mod report;
pub mod roster;
pub mod schema;
pub mod status;
pub mod traversal;

pub use config::AnonymizationConfig;
pub use engine::Anonymizer;
pub use models::{FieldPath, IdentifierHit, IdentifierTag, PayloadKind, Replacement};
pub use registry::{PseudonymEntry, PseudonymRegistry, SeedEntry, SeedRecord};
pub use report::{SanitizationNotice, SanitizationReport};
pub use roster::{BuildMode, MapBuilder, RosterAssignment, RosterMap};
pub use schema::{Classification, IdentifierRule, IdentifierSchema};
pub use status::{AnonymizationStatus, StatusReporter};
