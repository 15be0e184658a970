//! Stream scopes: the entity that owns an activity stream.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of entity owning a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeType {
    Person,
    Group,
    Organization,
    Resource,
    All,
    Starred,
    PersonsParentOrganization,
    PersonsFollowedStreams,
}

impl ScopeType {
    /// Stable name used in the database and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Group => "GROUP",
            Self::Organization => "ORGANIZATION",
            Self::Resource => "RESOURCE",
            Self::All => "ALL",
            Self::Starred => "STARRED",
            Self::PersonsParentOrganization => "PERSONS_PARENT_ORGANIZATION",
            Self::PersonsFollowedStreams => "PERSONS_FOLLOWED_STREAMS",
        }
    }

    /// Whether activities posted to this scope get stream hashtags.
    pub fn tracks_hashtags(&self) -> bool {
        matches!(self, Self::Person | Self::Group)
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The owner of a stream, identified by type and unique key.
///
/// The unique key is the account id for PERSON streams and the short name for
/// GROUP streams.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamScope {
    pub scope_type: ScopeType,
    pub unique_key: String,
}

impl StreamScope {
    pub fn new(scope_type: ScopeType, unique_key: impl Into<String>) -> Self {
        Self {
            scope_type,
            unique_key: unique_key.into(),
        }
    }

    pub fn person(account_id: impl Into<String>) -> Self {
        Self::new(ScopeType::Person, account_id)
    }

    pub fn group(short_name: impl Into<String>) -> Self {
        Self::new(ScopeType::Group, short_name)
    }
}

impl fmt::Display for StreamScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope_type, self.unique_key)
    }
}
