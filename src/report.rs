//! Plain-text rendering of issues

use crate::types::{Issue, IssueKind, TargetBrowser};
use indexmap::IndexMap;
use std::fmt;

impl Issue {
    /// What the issue is about, as authored: `grid-column`, `padding: 5deg`, `<a download>`
    pub fn subject(&self) -> String {
        let property = self.property.as_deref().unwrap_or_default();
        let element = self.element.as_deref().unwrap_or_default();

        match self.kind {
            IssueKind::CssProperty => property.to_string(),
            IssueKind::CssPropertyAliases => self.alias_list(),
            IssueKind::CssValue => {
                format!("{}: {}", property, self.value.as_deref().unwrap_or_default())
            }
            IssueKind::CssValueAliases => format!("{}: {}", property, self.alias_list()),
            IssueKind::HtmlElement => format!("<{}>", element),
            IssueKind::HtmlAttribute => format!(
                "<{} {}>",
                element,
                self.attribute.as_deref().unwrap_or_default()
            ),
        }
    }

    fn alias_list(&self) -> String {
        let noun = if self.aliases.len() == 1 { "alias" } else { "aliases" };
        format!("{} {}", self.aliases.join(", "), noun)
    }

    fn is_plural(&self) -> bool {
        self.kind.is_alias_group() && self.aliases.len() > 1
    }
}

/// `Firefox 1, 2, Safari 13`: versions grouped per browser in first-seen order
pub fn format_browser_list(browsers: &[TargetBrowser]) -> String {
    let mut grouped: IndexMap<&str, (&str, Vec<&str>)> = IndexMap::new();
    for browser in browsers {
        grouped
            .entry(browser.id.as_str())
            .or_insert_with(|| (browser.display_name(), Vec::new()))
            .1
            .push(browser.version.as_str());
    }

    grouped
        .values()
        .map(|(name, versions)| format!("{} {}", name, versions.join(", ")))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = self.is_plural();
        write!(f, "{}", self.subject())?;

        if self.invalid {
            return write!(f, " {} invalid.", if plural { "are" } else { "is" });
        }

        let mut clauses = Vec::new();

        let status = match (self.deprecated, self.experimental) {
            (true, true) => Some("deprecated and experimental"),
            (true, false) => Some("deprecated"),
            (false, true) => Some("experimental"),
            (false, false) => None,
        };
        if let Some(status) = status {
            clauses.push(format!("{} {}", if plural { "are" } else { "is" }, status));
        }

        if !self.unsupported_browsers.is_empty() {
            clauses.push(format!(
                "{} not support {}",
                if plural { "do" } else { "does" },
                format_browser_list(&self.unsupported_browsers)
            ));
        }

        write!(f, " {}.", clauses.join(" and "))
    }
}
