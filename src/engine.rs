//! Issue engine: per-declaration and per-element compatibility checks
//!
//! Every checked term first becomes a [`TermSummary`]. CSS summaries whose
//! term is an alias are then folded into one group per canonical term, so
//! `-moz-user-select` and `-webkit-user-select` written side by side are
//! judged together: a browser is only reported when every spelling the
//! author used fails for it.

use crate::classifier::{Classification, ValueClassifier};
use crate::database::{
    namespace_path, CompatDatabase, CSS_PROPERTIES, HTML_ELEMENTS, HTML_GLOBAL_ATTRIBUTES,
};
use crate::error::Result;
use crate::parser::parse_value;
use crate::support::SupportResolver;
use crate::types::{Attribute, Declaration, Issue, IssueKind, SupportState, TargetBrowser};
use crate::CheckOptions;
use indexmap::IndexMap;
use std::path::Path;

/// Attributes with this prefix are author data and never checked
pub const DATA_ATTRIBUTE_PREFIX: &str = "data-";

/// Result of checking a single term against every target browser
#[derive(Debug, Clone)]
struct TermSummary {
    issue: Issue,
    term: String,
    alias_of: Option<String>,
}

impl TermSummary {
    fn has_problem(issue: &Issue) -> bool {
        issue.invalid
            || issue.deprecated
            || issue.experimental
            || !issue.unsupported_browsers.is_empty()
    }
}

pub struct WebCompat {
    database: CompatDatabase,
    support: SupportResolver,
    classifier: ValueClassifier,
}

impl WebCompat {
    pub fn new(database: CompatDatabase) -> Self {
        Self {
            database,
            support: SupportResolver::new(),
            classifier: ValueClassifier::new(),
        }
    }

    /// Load a snapshot file and build an engine over it
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(CompatDatabase::load(path)?))
    }

    pub fn database(&self) -> &CompatDatabase {
        &self.database
    }

    /// Check one declaration block.
    ///
    /// Non-alias issues come first in input order, followed by one issue per
    /// alias group in order of first occurrence.
    pub fn css_declaration_block_issues(
        &self,
        declarations: &[Declaration],
        browsers: &[TargetBrowser],
        options: &CheckOptions,
    ) -> Vec<Issue> {
        let mut summaries = Vec::new();

        for declaration in declarations {
            let path = namespace_path(&CSS_PROPERTIES, &[declaration.name.as_str()]);
            let mut summary = self.summarize(&path, &declaration.name, browsers, options);
            summary.issue.kind = IssueKind::CssProperty;
            summary.issue.property = Some(declaration.name.clone());

            let invalid = summary.issue.invalid;
            summaries.push(summary);

            if !options.css_values || invalid {
                continue;
            }

            for token in parse_value(declaration.value.as_ref()) {
                let (term, path) =
                    match self.classifier.classify(&self.database, &declaration.name, &token) {
                        Classification::Term { term, path } => (term, path),
                        Classification::Whitelisted | Classification::Unverifiable => continue,
                    };

                let mut summary = self.summarize(&path, &term, browsers, options);
                summary.issue.kind = IssueKind::CssValue;
                summary.issue.property = Some(declaration.name.clone());
                summary.issue.value = Some(term);
                summaries.push(summary);
            }
        }

        self.merge_aliases(summaries)
    }

    /// Check an element and its attributes
    pub fn html_element_issues(
        &self,
        element: &str,
        attributes: &[Attribute],
        browsers: &[TargetBrowser],
        options: &CheckOptions,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();

        if let Some(issue) = self.html_element_issue(element, browsers, options) {
            issues.push(issue);
        }

        for attribute in attributes {
            if let Some(issue) = self.html_attribute_issue(element, attribute, browsers, options) {
                issues.push(issue);
            }
        }

        issues
    }

    /// Check only the element itself
    pub fn html_element_issue(
        &self,
        element: &str,
        browsers: &[TargetBrowser],
        options: &CheckOptions,
    ) -> Option<Issue> {
        let path = namespace_path(&HTML_ELEMENTS, &[element]);
        let mut summary = self.summarize(&path, element, browsers, options);
        summary.issue.kind = IssueKind::HtmlElement;
        summary.issue.element = Some(element.to_string());

        TermSummary::has_problem(&summary.issue).then_some(summary.issue)
    }

    fn html_attribute_issue(
        &self,
        element: &str,
        attribute: &Attribute,
        browsers: &[TargetBrowser],
        options: &CheckOptions,
    ) -> Option<Issue> {
        let name = attribute.name.as_str();
        let is_data_attribute = name
            .get(..DATA_ATTRIBUTE_PREFIX.len())
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case(DATA_ATTRIBUTE_PREFIX));
        if is_data_attribute {
            return None;
        }

        let element_path = namespace_path(&HTML_ELEMENTS, &[element, name]);
        let global_path = namespace_path(&HTML_GLOBAL_ATTRIBUTES, &[name]);
        let path = if self.database.term_exists(&element_path) {
            element_path
        } else if self.database.term_exists(&global_path) {
            global_path
        } else {
            // Unknown attributes are commonly injected by frameworks
            log::trace!("Skipping unknown attribute '{}' on <{}>", name, element);
            return None;
        };

        let mut summary = self.summarize(&path, name, browsers, options);
        summary.issue.kind = IssueKind::HtmlAttribute;
        summary.issue.element = Some(element.to_string());
        summary.issue.attribute = Some(name.to_string());
        summary.issue.value = Some(attribute.value.clone());

        TermSummary::has_problem(&summary.issue).then_some(summary.issue)
    }

    fn summarize(
        &self,
        path: &[String],
        term: &str,
        browsers: &[TargetBrowser],
        options: &CheckOptions,
    ) -> TermSummary {
        // Placeholder kind; callers set the real one
        let mut issue = Issue::new(IssueKind::CssProperty);
        let alias_of = self.database.alias_target(path).map(|s| s.to_string());

        let Some(table) = self.database.resolve_table(path) else {
            log::trace!("No compat data for '{}'", path.join("."));
            issue.invalid = true;
            return TermSummary {
                issue,
                term: term.to_string(),
                alias_of: None,
            };
        };

        let last_segment = path.last().map(|s| s.as_str()).unwrap_or(term);
        issue.unsupported_browsers = browsers
            .iter()
            .filter(|browser| {
                let state = self.support.resolve_support_state(
                    &browser.id,
                    &browser.version,
                    Some(table),
                    last_segment,
                );
                match state {
                    SupportState::Supported => false,
                    SupportState::BrowserNotFound => options.flag_unknown_browsers,
                    SupportState::Unsupported | SupportState::DataNotFound => true,
                }
            })
            .cloned()
            .collect();
        issue.deprecated = table.status.deprecated;
        issue.experimental = table.status.experimental;

        TermSummary {
            issue,
            term: term.to_string(),
            alias_of,
        }
    }

    /// Fold alias summaries into groups and emit issues for everything with a problem
    fn merge_aliases(&self, summaries: Vec<TermSummary>) -> Vec<Issue> {
        let mut plain = Vec::new();
        // Keyed by canonical term and whether it is a value
        let mut groups: IndexMap<(String, bool), Issue> = IndexMap::new();

        for summary in summaries {
            let Some(canonical) = summary.alias_of else {
                plain.push(summary.issue);
                continue;
            };

            let is_value = summary.issue.kind == IssueKind::CssValue;
            match groups.get_mut(&(canonical.clone(), is_value)) {
                Some(group) => {
                    let other = &summary.issue.unsupported_browsers;
                    group
                        .unsupported_browsers
                        .retain(|browser| other.iter().any(|b| b.same_release(browser)));
                    if !group.aliases.contains(&summary.term) {
                        group.aliases.push(summary.term);
                    }
                }
                None => {
                    let mut issue = summary.issue;
                    if is_value {
                        issue.kind = IssueKind::CssValueAliases;
                        issue.value = Some(canonical.clone());
                    } else {
                        issue.kind = IssueKind::CssPropertyAliases;
                        issue.property = Some(canonical.clone());
                    }
                    issue.aliases = vec![summary.term];
                    groups.insert((canonical, is_value), issue);
                }
            }
        }

        log::debug!(
            "Merged {} alias groups, {} plain summaries",
            groups.len(),
            plain.len()
        );

        plain
            .into_iter()
            .chain(groups.into_values())
            .filter(TermSummary::has_problem)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{browser, engine};
    use crate::types::Declaration;

    fn css(declarations: &[Declaration], browsers: &[TargetBrowser]) -> Vec<Issue> {
        engine().css_declaration_block_issues(declarations, browsers, &CheckOptions::default())
    }

    fn css_values(declarations: &[Declaration], browsers: &[TargetBrowser]) -> Vec<Issue> {
        let options = CheckOptions {
            css_values: true,
            ..CheckOptions::default()
        };
        engine().css_declaration_block_issues(declarations, browsers, &options)
    }

    #[test]
    fn test_supported_properties() {
        let issues = css(
            &[Declaration::new("background-color"), Declaration::new("color")],
            &[browser("firefox", "69")],
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_unsupported_property() {
        let firefox_1 = browser("firefox", "1");
        let issues = css(&[Declaration::new("grid-column")], &[firefox_1.clone()]);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::CssProperty);
        assert_eq!(issues[0].property.as_deref(), Some("grid-column"));
        assert_eq!(issues[0].unsupported_browsers, vec![firefox_1]);
        assert!(!issues[0].invalid);
    }

    #[test]
    fn test_invalid_property() {
        let issues = css(&[Declaration::new("invalid-property")], &[browser("firefox", "69")]);

        assert_eq!(issues.len(), 1);
        assert!(issues[0].invalid);
        assert_eq!(issues[0].property.as_deref(), Some("invalid-property"));
        assert!(issues[0].unsupported_browsers.is_empty());
    }

    #[test]
    fn test_deprecated_and_experimental_properties() {
        let firefox_69 = browser("firefox", "69");
        let issues = css(
            &[Declaration::new("clip"), Declaration::new("border-block-color")],
            &[firefox_69],
        );

        assert_eq!(issues.len(), 2);
        assert!(issues[0].deprecated && !issues[0].experimental);
        assert!(issues[1].experimental && !issues[1].deprecated);

        let firefox_1 = browser("firefox", "1");
        let issues = css(&[Declaration::new("font-variant-alternates")], &[firefox_1.clone()]);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].deprecated && issues[0].experimental);
        assert_eq!(issues[0].unsupported_browsers, vec![firefox_1]);
    }

    #[test]
    fn test_single_alias_reports_its_own_gaps() {
        let safari_13 = browser("safari", "13");
        let issues = css(
            &[Declaration::new("-moz-user-select")],
            &[browser("firefox", "69"), safari_13.clone()],
        );

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::CssPropertyAliases);
        assert_eq!(issues[0].property.as_deref(), Some("user-select"));
        assert_eq!(issues[0].aliases, vec!["-moz-user-select"]);
        assert!(issues[0].experimental);
        assert_eq!(issues[0].unsupported_browsers, vec![safari_13]);
    }

    #[test]
    fn test_alias_group_intersects_unsupported_browsers() {
        let issues = css(
            &[
                Declaration::new("-moz-user-select"),
                Declaration::new("-webkit-user-select"),
            ],
            &[browser("firefox", "69"), browser("safari", "13")],
        );

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::CssPropertyAliases);
        assert_eq!(issues[0].aliases, vec!["-moz-user-select", "-webkit-user-select"]);
        assert!(issues[0].unsupported_browsers.is_empty());
    }

    #[test]
    fn test_alias_groups_follow_plain_issues() {
        let issues = css(
            &[
                Declaration::new("-moz-user-select"),
                Declaration::new("clip"),
                Declaration::new("-moz-user-select"),
            ],
            &[browser("firefox", "69")],
        );

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].property.as_deref(), Some("clip"));
        assert_eq!(issues[1].kind, IssueKind::CssPropertyAliases);
        assert_eq!(issues[1].aliases, vec!["-moz-user-select"]);
    }

    #[test]
    fn test_alternative_name_alias() {
        let firefox_3 = browser("firefox", "3");
        let issues = css(&[Declaration::new("word-wrap")], &[browser("firefox", "69"), firefox_3.clone()]);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::CssPropertyAliases);
        assert_eq!(issues[0].property.as_deref(), Some("overflow-wrap"));
        assert_eq!(issues[0].unsupported_browsers, vec![firefox_3]);
    }

    #[test]
    fn test_context_dependent_property_uses_first_context() {
        let issues = css(&[Declaration::new("align-items")], &[browser("firefox", "30")]);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_unknown_browser_switch() {
        let supernew = browser("supernew", "1000");
        let declarations = [Declaration::new("grid-column")];

        let flagged = css(&declarations, &[supernew.clone()]);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].unsupported_browsers, vec![supernew.clone()]);

        let options = CheckOptions {
            flag_unknown_browsers: false,
            ..CheckOptions::default()
        };
        let ignored = engine().css_declaration_block_issues(&declarations, &[supernew], &options);
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_values_are_skipped_unless_enabled() {
        let issues = css(
            &[Declaration::with_value("display", "grid")],
            &[browser("firefox", "1")],
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_whitelisted_values() {
        let mut declarations = vec![
            Declaration::with_value("padding", 0.0),
            Declaration::with_value("padding", "1%"),
            Declaration::with_value("padding", "calc(1px + 1%)"),
            Declaration::with_value("padding", "initial"),
            Declaration::with_value("padding", "inherit"),
            Declaration::with_value("padding", "unset"),
            Declaration::with_value("background-image", "url(sample.png)"),
        ];
        for unit in ["px", "cm", "mm", "Q", "in", "pc", "pt", "em", "ex", "ch", "rem", "vh", "vw", "vmin", "vmax"] {
            declarations.push(Declaration::with_value("padding", format!("1{}", unit).as_str()));
        }

        let issues = css_values(&declarations, &[browser("firefox", "69")]);
        assert!(issues.is_empty(), "unexpected issues: {:?}", issues);
    }

    #[test]
    fn test_unknown_values_are_not_flagged() {
        let issues = css_values(
            &[
                Declaration::with_value("padding", "invalid-value"),
                Declaration::with_value("padding", 50.0),
                Declaration::with_value("padding", "solid 10 5deg 1px"),
            ],
            &[browser("firefox", "69")],
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_value_issue() {
        let firefox_1 = browser("firefox", "1");
        let issues = css_values(
            &[Declaration::with_value("display", "grid")],
            &[browser("firefox", "69"), firefox_1.clone()],
        );

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::CssValue);
        assert_eq!(issues[0].property.as_deref(), Some("display"));
        assert_eq!(issues[0].value.as_deref(), Some("grid"));
        assert_eq!(issues[0].unsupported_browsers, vec![firefox_1]);
    }

    #[test]
    fn test_value_below_context_node() {
        let firefox_30 = browser("firefox", "30");
        let issues = css_values(
            &[Declaration::with_value("justify-content", "space-evenly")],
            &[firefox_30.clone(), browser("firefox", "69")],
        );

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::CssValue);
        assert_eq!(issues[0].property.as_deref(), Some("justify-content"));
        assert_eq!(issues[0].value.as_deref(), Some("space-evenly"));
        assert_eq!(issues[0].unsupported_browsers, vec![firefox_30]);
    }

    #[test]
    fn test_deprecated_unit_value() {
        let issues = css_values(
            &[Declaration::with_value("padding", "1mozmm")],
            &[browser("firefox", "69")],
        );

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::CssValue);
        assert_eq!(issues[0].value.as_deref(), Some("1mozmm"));
        assert!(issues[0].deprecated);
        assert!(!issues[0].invalid);
    }

    #[test]
    fn test_value_aliases_not_supported_everywhere() {
        let firefox_1 = browser("firefox", "1");
        let issues = css_values(
            &[
                Declaration::with_value("background-image", "linear-gradient(top,#f5f5f5,#f1f1f1)"),
                Declaration::with_value("background-image", "-moz-linear-gradient(top,#f5f5f5,#f1f1f1)"),
            ],
            &[browser("firefox", "69"), firefox_1.clone()],
        );

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::CssValueAliases);
        assert_eq!(issues[0].property.as_deref(), Some("background-image"));
        assert_eq!(issues[0].value.as_deref(), Some("linear-gradient"));
        assert_eq!(issues[0].aliases, vec!["linear-gradient", "-moz-linear-gradient"]);
        assert_eq!(issues[0].unsupported_browsers, vec![firefox_1]);
    }

    #[test]
    fn test_value_aliases_supported_everywhere() {
        let issues = css_values(
            &[
                Declaration::with_value("background-image", "linear-gradient(top,#f5f5f5,#f1f1f1)"),
                Declaration::with_value("background-image", "-moz-linear-gradient(top,#f5f5f5,#f1f1f1)"),
            ],
            &[browser("firefox", "69"), browser("firefox", "4")],
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn test_values_of_invalid_property_are_not_checked() {
        let issues = css_values(
            &[Declaration::with_value("invalid-property", "grid")],
            &[browser("firefox", "1")],
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::CssProperty);
        assert!(issues[0].invalid);
    }

    #[test]
    fn test_html_elements() {
        let engine = engine();
        let options = CheckOptions::default();
        let firefox_69 = browser("firefox", "69");
        let firefox_1 = browser("firefox", "1");

        assert!(engine.html_element_issue("body", &[firefox_69.clone()], &options).is_none());

        let main = engine
            .html_element_issue("main", &[firefox_69.clone(), firefox_1.clone()], &options)
            .unwrap();
        assert_eq!(main.kind, IssueKind::HtmlElement);
        assert_eq!(main.element.as_deref(), Some("main"));
        assert_eq!(main.unsupported_browsers, vec![firefox_1]);

        let menu = engine.html_element_issue("menu", &[firefox_69.clone()], &options).unwrap();
        assert!(menu.experimental);

        let frame = engine.html_element_issue("frame", &[firefox_69.clone()], &options).unwrap();
        assert!(frame.deprecated);

        let invalid = engine.html_element_issue("invalid", &[firefox_69], &options).unwrap();
        assert!(invalid.invalid);
        assert!(invalid.unsupported_browsers.is_empty());
    }

    #[test]
    fn test_html_attributes() {
        let engine = engine();
        let options = CheckOptions::default();
        let firefox_69 = browser("firefox", "69");
        let firefox_1 = browser("firefox", "1");

        let issues = engine.html_element_issues(
            "a",
            &[Attribute::new("download", "test.png")],
            &[firefox_69.clone(), firefox_1.clone()],
            &options,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::HtmlAttribute);
        assert_eq!(issues[0].element.as_deref(), Some("a"));
        assert_eq!(issues[0].attribute.as_deref(), Some("download"));
        assert_eq!(issues[0].value.as_deref(), Some("test.png"));
        assert_eq!(issues[0].unsupported_browsers, vec![firefox_1]);

        let issues = engine.html_element_issues(
            "menu",
            &[Attribute::new("label", "test")],
            &[firefox_69.clone()],
            &options,
        );
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].kind, IssueKind::HtmlElement);
        assert_eq!(issues[1].kind, IssueKind::HtmlAttribute);
        assert!(issues[1].experimental);

        let issues = engine.html_element_issues(
            "table",
            &[Attribute::new("align", "left")],
            &[firefox_69],
            &options,
        );
        assert_eq!(issues.len(), 1);
        assert!(issues[0].deprecated);
    }

    #[test]
    fn test_ignored_and_global_attributes() {
        let engine = engine();
        let options = CheckOptions::default();
        let firefox_69 = browser("firefox", "69");

        for (element, attribute) in [("body", "id"), ("div", "id"), ("body", "data-test"), ("body", "DATA-x"), ("div", "invalid")] {
            let issues = engine.html_element_issues(
                element,
                &[Attribute::new(attribute, "value")],
                &[firefox_69.clone()],
                &options,
            );
            assert!(issues.is_empty(), "{} {}: {:?}", element, attribute, issues);
        }

        let issues = engine.html_element_issues(
            "div",
            &[Attribute::new("autocapitalize", "on")],
            &[firefox_69.clone()],
            &options,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].attribute.as_deref(), Some("autocapitalize"));
        assert_eq!(issues[0].unsupported_browsers, vec![firefox_69]);
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WebCompat>();
    }
}
