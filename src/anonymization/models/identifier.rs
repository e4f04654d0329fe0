//! Identifier data models

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Classification of an identifying field
///
/// Variant order is the anchor priority used when one Canvas user object carries
/// several identifying fields: the first present tag identifies the individual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierTag {
    /// Display, sortable or short name
    Name,
    /// Login identifier
    LoginId,
    /// SIS user or integration identifier
    SisId,
    /// Email address
    Email,
    /// Avatar image URL
    AvatarUrl,
}

impl IdentifierTag {
    /// All tags in anchor priority order
    pub const ALL: [IdentifierTag; 5] = [
        Self::Name,
        Self::LoginId,
        Self::SisId,
        Self::Email,
        Self::AvatarUrl,
    ];

    /// Pseudonym prefix for this tag
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Student",
            Self::LoginId => "StudentLogin",
            Self::SisId => "StudentSis",
            Self::Email => "StudentEmail",
            Self::AvatarUrl => "StudentAvatar",
        }
    }

    /// Configuration/serialization name of the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::LoginId => "login_id",
            Self::SisId => "sis_id",
            Self::Email => "email",
            Self::AvatarUrl => "avatar_url",
        }
    }
}

impl fmt::Display for IdentifierTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "login_id" | "login" => Ok(Self::LoginId),
            "sis_id" | "sis" => Ok(Self::SisId),
            "email" => Ok(Self::Email),
            "avatar_url" | "avatar" => Ok(Self::AvatarUrl),
            other => Err(format!("unknown identifier tag: {other}")),
        }
    }
}

/// Kind of Canvas collection a payload holds
///
/// Tool handlers declare the kind so that top-level lists can be told apart: a
/// bare `[{"name": ...}]` is a roster for [`PayloadKind::Users`] but a list of
/// assignments for [`PayloadKind::Generic`]. The kind's root key is prepended to
/// every path before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// No hint; classification uses payload paths as-is
    #[default]
    Generic,
    /// Course users, enrollments rosters
    Users,
    /// Assignment submissions
    Submissions,
    /// Discussion topics and entries
    Discussions,
    /// Group membership listings
    Groups,
}

impl PayloadKind {
    /// Logical root key used for classification
    pub fn root_key(&self) -> Option<&'static str> {
        match self {
            Self::Generic => None,
            Self::Users => Some("users"),
            Self::Submissions => Some("submissions"),
            Self::Discussions => Some("discussions"),
            Self::Groups => Some("groups"),
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root_key().unwrap_or("generic"))
    }
}

impl FromStr for PayloadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "generic" => Ok(Self::Generic),
            "users" => Ok(Self::Users),
            "submissions" => Ok(Self::Submissions),
            "discussions" => Ok(Self::Discussions),
            "groups" => Ok(Self::Groups),
            other => Err(format!("unknown payload kind: {other}")),
        }
    }
}

/// One step into a JSON structure
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member
    Key(String),
    /// Array element
    Index(usize),
}

/// Location of a node inside a JSON payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Path of the payload root
    pub fn root() -> Self {
        Self::default()
    }

    /// Builds a path from segments
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Path of an object member below this one
    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self { segments }
    }

    /// Path of an array element below this one
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    /// Segments from the root down
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Path of the containing node, `None` at the root
    pub fn parent(&self) -> Option<FieldPath> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// Whether the last segment is an array index
    pub fn is_array_element(&self) -> bool {
        matches!(self.segments.last(), Some(PathSegment::Index(_)))
    }

    /// RFC 6901 JSON pointer, usable with [`Value::pointer_mut`]
    pub fn to_pointer(&self) -> String {
        let mut pointer = String::new();
        for segment in &self.segments {
            pointer.push('/');
            match segment {
                PathSegment::Key(key) => pointer.push_str(&key.replace('~', "~0").replace('/', "~1")),
                PathSegment::Index(idx) => pointer.push_str(&idx.to_string()),
            }
        }
        pointer
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("$");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

/// Identifying leaf found by the traversal engine
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierHit<'a> {
    /// Where the leaf lives in the payload
    pub path: FieldPath,
    /// The leaf as it appears in the payload
    pub value: &'a Value,
    /// Classification from the identifier schema
    pub tag: IdentifierTag,
}

impl IdentifierHit<'_> {
    /// Text form of the raw identifier (numbers use their JSON text)
    pub fn raw_text(&self) -> String {
        match self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
