//! Cache key builders.

/// Page properties (tabs and gadgets) of one person.
pub fn person_page_properties(person_id: i64) -> String {
    format!("PersonPagePropertiesById:{person_id}")
}

/// Ids of all system administrators.
pub const SYSTEM_ADMINISTRATOR_IDS: &str = "SystemAdministratorIds";

/// A resolved hashtag, keyed by its normalized content.
pub fn hashtag(content: &str) -> String {
    format!("HashTag:{content}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_formats() {
        assert_eq!(person_page_properties(42), "PersonPagePropertiesById:42");
        assert_eq!(hashtag("#rust"), "HashTag:#rust");
    }
}
