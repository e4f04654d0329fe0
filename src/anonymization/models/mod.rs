//! Anonymization data models

pub mod identifier;
pub mod replacement;

pub use identifier::{FieldPath, IdentifierHit, IdentifierTag, PathSegment, PayloadKind};
pub use replacement::{Replacement, DEBUG_MARKER};
