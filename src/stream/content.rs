//! Searchable text of an activity's base object.

use super::activity::{BaseObject, BaseObjectType};

/// Pulls the free text out of an activity payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActivityContentExtractor;

impl ActivityContentExtractor {
    /// Text fields of the base object joined by a space, or `None` when empty.
    pub fn extract_content(
        &self,
        base_object_type: BaseObjectType,
        base_object: &BaseObject,
    ) -> Option<String> {
        let fields: &[&str] = match base_object_type {
            BaseObjectType::Note => &["content"],
            BaseObjectType::Bookmark => &["content", "targetTitle", "description"],
            BaseObjectType::Photo | BaseObjectType::Video | BaseObjectType::File => {
                &["content", "description"]
            }
        };

        let text = fields
            .iter()
            .filter_map(|field| base_object.get(*field))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        (!text.is_empty()).then_some(text)
    }
}
