//! Identifier newtypes for pseudonym scoping
//!
//! Pseudonym assignment is always scoped to a [`CourseIdentityContext`], built from a
//! Canvas course identifier and an optional analysis session identifier.

use crate::domain::errors::AnonymizationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canvas course identifier newtype wrapper
///
/// Accepts either the numeric Canvas ID or a course code such as
/// `badm_554_120251_246794`.
///
/// # Examples
///
/// ```
/// use canvas_shield::domain::ids::CourseId;
///
/// let course = CourseId::new("  course-101 ").unwrap();
/// assert_eq!(course.as_str(), "course-101");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseId(String);

impl CourseId {
    /// Creates a new CourseId, trimming surrounding whitespace
    pub fn new(id: impl Into<String>) -> Result<Self, AnonymizationError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(AnonymizationError::InvalidContext(
                "course identifier cannot be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the course ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CourseId {
    type Err = AnonymizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Analysis session identifier newtype wrapper
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new SessionId, trimming surrounding whitespace
    pub fn new(id: impl Into<String>) -> Result<Self, AnonymizationError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(AnonymizationError::InvalidContext(
                "session identifier cannot be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the session ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scope key for pseudonym assignment
///
/// The same student may receive different pseudonyms in two contexts, but always the
/// same pseudonym within one.
///
/// # Examples
///
/// ```
/// use canvas_shield::domain::ids::CourseIdentityContext;
///
/// let ctx = CourseIdentityContext::for_course("course-101").unwrap();
/// assert_eq!(ctx.to_string(), "course-101");
///
/// let ctx = CourseIdentityContext::for_session("course-101", "grading-pass").unwrap();
/// assert_eq!(ctx.to_string(), "course-101#grading-pass");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseIdentityContext {
    course: CourseId,
    session: Option<SessionId>,
}

impl CourseIdentityContext {
    /// Creates a context from already validated identifiers
    pub fn new(course: CourseId, session: Option<SessionId>) -> Self {
        Self { course, session }
    }

    /// Context scoped to a course for the whole process lifetime
    pub fn for_course(course: impl Into<String>) -> Result<Self, AnonymizationError> {
        Ok(Self::new(CourseId::new(course)?, None))
    }

    /// Context scoped to one analysis session within a course
    pub fn for_session(
        course: impl Into<String>,
        session: impl Into<String>,
    ) -> Result<Self, AnonymizationError> {
        Ok(Self::new(CourseId::new(course)?, Some(SessionId::new(session)?)))
    }

    /// Course part of the context
    pub fn course(&self) -> &CourseId {
        &self.course
    }

    /// Session part of the context, if any
    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }
}

impl fmt::Display for CourseIdentityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.session {
            Some(session) => write!(f, "{}#{}", self.course, session),
            None => write!(f, "{}", self.course),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_id_rejects_blank() {
        assert!(CourseId::new("").is_err());
        assert!(CourseId::new("   ").is_err());
    }

    #[test]
    fn test_session_scoping_distinguishes_contexts() {
        let plain = CourseIdentityContext::for_course("101").unwrap();
        let scoped = CourseIdentityContext::for_session("101", "s1").unwrap();
        assert_ne!(plain, scoped);
        assert_eq!(scoped.course().as_str(), "101");
        assert_eq!(scoped.session().map(SessionId::as_str), Some("s1"));
    }

    #[test]
    fn test_course_id_trims_whitespace() {
        let a = CourseIdentityContext::for_course(" 101 ").unwrap();
        let b = CourseIdentityContext::for_course("101").unwrap();
        assert_eq!(a, b);
    }
}
