// canvas-shield - FERPA anonymization layer for Canvas LMS tools
// Copyright (c) 2025 canvas-shield Contributors
// Licensed under the MIT License

//! # canvas-shield
//!
//! Anonymization layer for a Canvas LMS tool gateway. Every Canvas API response
//! passes through [`anonymization::Anonymizer`] before it reaches an AI
//! assistant; student identifiers are replaced with stable pseudonyms such as
//! `Student_001` and `StudentEmail_001`, scoped per course.
//!
//! ## Architecture
//!
//! - [`anonymization`] - Identifier schema, traversal, pseudonym registry, anonymizer
//! - [`domain`] - Errors and identifier newtypes
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//! - [`cli`] - Command-line interface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use canvas_shield::anonymization::{Anonymizer, PayloadKind, PseudonymRegistry};
//! use canvas_shield::config::load_config;
//! use canvas_shield::domain::CourseIdentityContext;
//! use std::sync::Arc;
//!
//! # fn example(response: serde_json::Value) -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("canvas-shield.toml")?;
//!
//! // One registry per process, shared by every handler
//! let registry = Arc::new(PseudonymRegistry::new());
//! let anonymizer = Anonymizer::new(config.anonymization, registry)?;
//!
//! let ctx = CourseIdentityContext::for_course("course-101")?;
//! let (sanitized, report) = anonymizer.sanitize_as(&ctx, PayloadKind::Submissions, &response)?;
//! println!("{} identifiers replaced", report.total_replacements);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Sanitization is fail-closed: on any error the caller gets an
//! [`domain::AnonymizationError`], never the unsanitized payload. Startup and
//! configuration paths use [`domain::ShieldError`].

pub mod anonymization;
pub mod cli;
pub mod config;
pub mod domain;
pub mod logging;
