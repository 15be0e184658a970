//! The header bar: main navigation, user navigation and site labeling.
//!
//! The composite keeps a small widget tree so the active link can be moved
//! after rendering, then serializes it through an HTML template with
//! autoescaping. Only the site label template is inserted unescaped.

use super::{AuthenticationType, CreateUrlRequest, Page, SwitchedHistoryViewEvent};
use crate::db::Person;
use minijinja::Environment;
use serde::Serialize;
use std::collections::HashMap;

const NAV_BAR_BUTTON: &str = "nav-bar-button";
const ACTIVE: &str = "active";
const SITE_LABEL_PLACEHOLDER: &str = "%SITELABEL%";
const PROJECT_URL: &str = "http://www.eurekastreams.org";
const LOGOUT_URL: &str = "/j_spring_security_logout";

const TEMPLATE_NAME: &str = "header.html";
const TEMPLATE: &str = r#"
<div class="header-bar"><div class="nav-bar">
{%- for nav in navs -%}
<ul class="{{ nav.class }}">
{%- for i in nav.items -%}
<li{% if i.li_class %} class="{{ i.li_class }}"{% endif %}>
{%- if i.panel_class %}<div class="{{ i.panel_class }}">{% endif -%}
{%- if i.link -%}
<a href="{{ i.link.href }}"{% if i.link.classes %} class="{{ i.link.classes|join(' ') }}"{% endif %}{% if i.link.target %} target="{{ i.link.target }}"{% endif %}>{{ i.link.text }}</a>
{%- endif -%}
{%- if i.kind == "notifications" %}<span class="notif-count"></span>
{%- elif i.kind == "logout" %}<a href="{{ logout_url }}">Logout</a>
{%- elif i.kind == "search" %}<input type="search" class="profile-search" placeholder="{{ i.placeholder }}">
{%- endif -%}
{%- if i.panel_class %}</div>{% endif -%}
</li>
{%- endfor -%}
</ul>
{%- endfor -%}
</div><div class="site-labeling">{{ site_label|safe }}</div></div>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum HeaderLink {
    External,
    Start,
    Activity,
    Directory,
    Settings,
    MyProfile,
    Help,
    PlainHelp,
    Login,
}

#[derive(Debug, Clone, Serialize)]
struct Link {
    text: &'static str,
    href: String,
    classes: Vec<&'static str>,
    target: Option<&'static str>,
}

impl Link {
    fn nav(text: &'static str, href: String) -> Self {
        Self {
            text,
            href,
            classes: vec![NAV_BAR_BUTTON],
            target: None,
        }
    }

    fn plain(text: &'static str, href: String) -> Self {
        Self {
            text,
            href,
            classes: Vec::new(),
            target: None,
        }
    }

    fn add_class(&mut self, class: &'static str) {
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
    }

    fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| *c != class);
    }
}

#[derive(Debug, Clone, Copy)]
enum NavItem {
    Panel {
        class: &'static str,
        link: Option<HeaderLink>,
    },
    Link(HeaderLink),
    NotificationCount,
    Logout,
    ProfileSearch,
}

#[derive(Serialize)]
struct ItemView<'a> {
    kind: &'static str,
    li_class: Option<&'static str>,
    panel_class: Option<&'static str>,
    link: Option<&'a Link>,
    placeholder: Option<&'static str>,
}

#[derive(Serialize)]
struct NavView<'a> {
    class: &'static str,
    items: Vec<ItemView<'a>>,
}

#[derive(Serialize)]
struct HeaderView<'a> {
    navs: [NavView<'a>; 2],
    site_label: &'a str,
    logout_url: &'static str,
}

/// Header bar for the current viewer.
#[derive(Debug, Clone)]
pub struct HeaderComposite {
    authentication_type: AuthenticationType,
    current_page: Option<Page>,
    history_token: String,
    links: HashMap<HeaderLink, Link>,
    link_map: HashMap<Page, HeaderLink>,
    main_nav: Vec<NavItem>,
    user_nav: Vec<NavItem>,
    site_label_html: String,
}

impl HeaderComposite {
    /// A header for a client whose history currently shows `history_token`.
    pub fn new(authentication_type: AuthenticationType, history_token: impl Into<String>) -> Self {
        let history_token = history_token.into();
        Self {
            authentication_type,
            current_page: Page::from_token(&history_token),
            history_token,
            links: HashMap::new(),
            link_map: HashMap::new(),
            main_nav: Vec::new(),
            user_nav: Vec::new(),
            site_label_html: String::new(),
        }
    }

    /// Build the navigation for `viewer`, or for an anonymous visitor.
    pub fn render(&mut self, viewer: Option<&Person>) {
        let url = |page| CreateUrlRequest::new(page).to_url();

        self.links.clear();
        self.links.insert(
            HeaderLink::External,
            Link {
                target: Some("_blank"),
                ..Link::nav("Eureka Streams", PROJECT_URL.to_string())
            },
        );
        self.links.insert(HeaderLink::Start, Link::nav("Start Page", url(Page::Start)));
        self.links.insert(HeaderLink::Activity, Link::nav("Activity", url(Page::Activity)));
        self.links.insert(
            HeaderLink::Directory,
            Link::nav("Profiles", url(Page::Organizations)),
        );
        self.links.insert(HeaderLink::Settings, Link::nav("Settings", url(Page::Settings)));
        self.links.insert(HeaderLink::Help, Link::nav("Help", url(Page::Help)));

        self.link_map = HashMap::from([
            (Page::Start, HeaderLink::Start),
            (Page::Activity, HeaderLink::Activity),
            (Page::Organizations, HeaderLink::Directory),
            (Page::Groups, HeaderLink::Directory),
            (Page::People, HeaderLink::Directory),
            (Page::GroupSettings, HeaderLink::Directory),
            (Page::OrgSettings, HeaderLink::Directory),
            (Page::PersonalSettings, HeaderLink::Directory),
            (Page::Settings, HeaderLink::Settings),
            (Page::Help, HeaderLink::Help),
        ]);

        self.main_nav = vec![NavItem::Panel {
            class: "external-header-button",
            link: Some(HeaderLink::External),
        }];

        match viewer {
            None => {
                self.links
                    .insert(HeaderLink::PlainHelp, Link::plain("Help", url(Page::Help)));
                self.links.insert(
                    HeaderLink::Login,
                    Link::plain("Login", format!("#{}", self.history_token)),
                );
                self.user_nav = vec![
                    NavItem::Link(HeaderLink::PlainHelp),
                    NavItem::Link(HeaderLink::Login),
                ];
            }
            Some(viewer) => {
                self.links.insert(
                    HeaderLink::MyProfile,
                    Link::nav(
                        "My Profile",
                        CreateUrlRequest::with_view(Page::People, &viewer.account_id).to_url(),
                    ),
                );

                self.main_nav.extend([
                    NavItem::Panel {
                        class: "start-header-button",
                        link: Some(HeaderLink::Start),
                    },
                    NavItem::Panel {
                        class: "activity-header-button",
                        link: Some(HeaderLink::Activity),
                    },
                    NavItem::Panel {
                        class: "directory-header-button",
                        link: Some(HeaderLink::Directory),
                    },
                    NavItem::Panel {
                        class: "gallery-header-button",
                        link: None,
                    },
                ]);

                self.user_nav = vec![
                    NavItem::NotificationCount,
                    NavItem::Panel {
                        class: "my-profile-header-button",
                        link: Some(HeaderLink::MyProfile),
                    },
                    NavItem::Panel {
                        class: "settings-header-button",
                        link: Some(HeaderLink::Settings),
                    },
                    NavItem::Panel {
                        class: "help-header-button",
                        link: Some(HeaderLink::Help),
                    },
                ];
                if self.authentication_type == AuthenticationType::Form {
                    self.user_nav.push(NavItem::Logout);
                }
                self.user_nav.push(NavItem::ProfileSearch);
            }
        }

        if let Some(page) = self.current_page {
            self.set_active(page);
        }
    }

    /// Mark the link for `page` active and every other mapped link inactive.
    pub fn set_active(&mut self, page: Page) {
        for link in self.link_map.values() {
            if let Some(link) = self.links.get_mut(link) {
                link.remove_class(ACTIVE);
            }
        }

        if let Some(link) = self.link_map.get(&page)
            && let Some(link) = self.links.get_mut(link)
        {
            link.add_class(ACTIVE);
        }
    }

    /// Follow a history switch. Events without a page are ignored.
    pub fn on_switched_history_view(&mut self, event: Option<&SwitchedHistoryViewEvent>) {
        if let Some(SwitchedHistoryViewEvent { page: Some(page) }) = event {
            self.set_active(*page);
        }
    }

    /// Fill the site-labeling container from an HTML template.
    pub fn set_site_label_template(&mut self, template: &str, site_label: Option<&str>) {
        self.site_label_html = template.replace(SITE_LABEL_PLACEHOLDER, site_label.unwrap_or(""));
    }

    /// Serialize the header to HTML.
    pub fn to_html(&self) -> Result<String, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, TEMPLATE)?;

        let view = HeaderView {
            navs: [
                NavView {
                    class: "main-nav",
                    items: self.main_nav.iter().map(|item| self.item_view(item)).collect(),
                },
                NavView {
                    class: "user-bar",
                    items: self.user_nav.iter().map(|item| self.item_view(item)).collect(),
                },
            ],
            site_label: &self.site_label_html,
            logout_url: LOGOUT_URL,
        };

        env.get_template(TEMPLATE_NAME)?.render(view)
    }

    fn item_view(&self, item: &NavItem) -> ItemView<'_> {
        let mut view = ItemView {
            kind: "panel",
            li_class: None,
            panel_class: None,
            link: None,
            placeholder: None,
        };
        match *item {
            NavItem::Panel { class, link } => {
                view.panel_class = Some(class);
                view.link = link.and_then(|l| self.links.get(&l));
            }
            NavItem::Link(link) => {
                view.kind = "link";
                view.link = self.links.get(&link);
            }
            NavItem::NotificationCount => {
                view.kind = "notifications";
                view.li_class = Some("notif-count-list-item");
            }
            NavItem::Logout => view.kind = "logout",
            NavItem::ProfileSearch => {
                view.kind = "search";
                view.placeholder = Some("search profiles");
            }
        }
        view
    }
}
