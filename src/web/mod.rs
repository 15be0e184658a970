//! Web client pieces rendered on the server: history pages and the header.

mod header;

pub use header::HeaderComposite;

use serde::{Deserialize, Serialize};

/// Client pages addressable by history token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Page {
    Start,
    Activity,
    Organizations,
    Groups,
    People,
    GroupSettings,
    OrgSettings,
    PersonalSettings,
    Settings,
    Help,
}

impl Page {
    const ALL: [Page; 10] = [
        Page::Start,
        Page::Activity,
        Page::Organizations,
        Page::Groups,
        Page::People,
        Page::GroupSettings,
        Page::OrgSettings,
        Page::PersonalSettings,
        Page::Settings,
        Page::Help,
    ];

    /// History token naming the page.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Activity => "activity",
            Self::Organizations => "organizations",
            Self::Groups => "groups",
            Self::People => "people",
            Self::GroupSettings => "groupsettings",
            Self::OrgSettings => "orgsettings",
            Self::PersonalSettings => "personalsettings",
            Self::Settings => "settings",
            Self::Help => "help",
        }
    }

    /// Page of a full history token such as `people/jdoe`.
    pub fn from_token(token: &str) -> Option<Page> {
        let head = token.trim_start_matches('#').split('/').next()?;
        Self::ALL
            .into_iter()
            .find(|page| page.token().eq_ignore_ascii_case(head))
    }
}

/// Request for a client URL to a page, optionally with a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUrlRequest {
    pub page: Page,
    pub view: Option<String>,
}

impl CreateUrlRequest {
    pub fn new(page: Page) -> Self {
        Self { page, view: None }
    }

    pub fn with_view(page: Page, view: impl Into<String>) -> Self {
        Self {
            page,
            view: Some(view.into()),
        }
    }

    /// `#token` or `#token/view`.
    pub fn to_url(&self) -> String {
        match &self.view {
            Some(view) => format!("#{}/{}", self.page.token(), view),
            None => format!("#{}", self.page.token()),
        }
    }
}

/// How people sign in; decides whether the header offers a logout link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthenticationType {
    #[default]
    Form,
    PreAuthenticated,
}

/// Raised when the client switches to another history view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchedHistoryViewEvent {
    pub page: Option<Page>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_from_requests() {
        assert_eq!(CreateUrlRequest::new(Page::Start).to_url(), "#start");
        assert_eq!(
            CreateUrlRequest::with_view(Page::People, "jdoe").to_url(),
            "#people/jdoe"
        );
    }

    #[test]
    fn pages_from_tokens() {
        assert_eq!(Page::from_token("people/jdoe"), Some(Page::People));
        assert_eq!(Page::from_token("#GroupSettings"), Some(Page::GroupSettings));
        assert_eq!(Page::from_token(""), None);
        assert_eq!(Page::from_token("nowhere"), None);
        for page in Page::ALL {
            assert_eq!(Page::from_token(page.token()), Some(page));
        }
    }

    #[test]
    fn authentication_type_names() {
        let parsed: AuthenticationType = serde_json::from_str("\"PRE_AUTHENTICATED\"").unwrap();
        assert_eq!(parsed, AuthenticationType::PreAuthenticated);
    }
}
