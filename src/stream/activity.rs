//! Activities: content posted to a stream.

use super::scope::StreamScope;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Type tag for an activity's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BaseObjectType {
    Note,
    Bookmark,
    Photo,
    Video,
    File,
}

impl BaseObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Note => "NOTE",
            Self::Bookmark => "BOOKMARK",
            Self::Photo => "PHOTO",
            Self::Video => "VIDEO",
            Self::File => "FILE",
        }
    }
}

impl fmt::Display for BaseObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw payload of an activity (field name to value).
pub type BaseObject = HashMap<String, String>;

/// A posted activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub actor_person_id: i64,
    /// The stream the activity was posted to.
    pub recipient_stream_scope: StreamScope,
    /// Whether the destination stream is visible to everyone.
    pub is_destination_stream_public: bool,
    pub base_object_type: BaseObjectType,
    pub base_object: BaseObject,
    /// Posting time (Unix seconds).
    pub posted_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_object_type_wire_names_match_stored_names() {
        for kind in [BaseObjectType::Note, BaseObjectType::Bookmark, BaseObjectType::File] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
