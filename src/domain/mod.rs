//! Domain types for canvas-shield.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Scope identifiers** ([`CourseId`], [`SessionId`], [`CourseIdentityContext`])
//! - **Error types** ([`ShieldError`], [`AnonymizationError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible library operations return [`Result<T, ShieldError>`]; the anonymization
//! subsystem returns [`AnonymizationError`], which converts with `?`:
//!
//! ```rust
//! use canvas_shield::domain::{CourseIdentityContext, Result};
//!
//! fn example() -> Result<CourseIdentityContext> {
//!     let ctx = CourseIdentityContext::for_course("course-101")?;
//!     Ok(ctx)
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod result;

pub use errors::{AnonymizationError, ShieldError};
pub use ids::{CourseId, CourseIdentityContext, SessionId};
pub use result::Result;
