//! Core types shared by the compat engine: browsers, inputs and issues

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Release channel of a browser version, as named by the compat snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStatus {
    Retired,
    Current,
    Exclusive,
    Beta,
    Nightly,
    Esr,
    Planned,
    #[serde(other)]
    Unknown,
}

impl ReleaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseStatus::Retired => "retired",
            ReleaseStatus::Current => "current",
            ReleaseStatus::Exclusive => "exclusive",
            ReleaseStatus::Beta => "beta",
            ReleaseStatus::Nightly => "nightly",
            ReleaseStatus::Esr => "esr",
            ReleaseStatus::Planned => "planned",
            ReleaseStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserRelease {
    pub status: ReleaseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

/// A browser known to the compat snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Browser {
    pub name: String,
    #[serde(default)]
    pub releases: indexmap::IndexMap<String, BrowserRelease>,
}

/// A browser/version pair a query is checked against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetBrowser {
    pub id: String,
    #[serde(deserialize_with = "deserialize_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReleaseStatus>,
}

impl TargetBrowser {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            name: None,
            status: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display name when known, otherwise the browser id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Whether this names the same browser release as `other`
    pub fn same_release(&self, other: &TargetBrowser) -> bool {
        self.id == other.id && self.version == other.version
    }
}

impl fmt::Display for TargetBrowser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.display_name(), self.version)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VersionRepr {
    Number(f64),
    Text(String),
}

fn deserialize_version<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match VersionRepr::deserialize(deserializer)? {
        VersionRepr::Number(n) => format_number(n),
        VersionRepr::Text(s) => s,
    })
}

/// A raw declaration value: authored text or a bare number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CssValue {
    Number(f64),
    Text(String),
}

impl From<&str> for CssValue {
    fn from(value: &str) -> Self {
        CssValue::Text(value.to_string())
    }
}

impl From<f64> for CssValue {
    fn from(value: f64) -> Self {
        CssValue::Number(value)
    }
}

impl fmt::Display for CssValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CssValue::Number(n) => write!(f, "{}", format_number(*n)),
            CssValue::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<CssValue>,
}

impl Declaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<CssValue>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An element with its authored attributes, as read from CLI input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInput {
    pub element: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// Outcome of matching one browser release against a compat table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupportState {
    Supported,
    Unsupported,
    BrowserNotFound,
    DataNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    CssProperty,
    CssPropertyAliases,
    CssValue,
    CssValueAliases,
    HtmlElement,
    HtmlAttribute,
}

impl IssueKind {
    pub fn is_alias_group(&self) -> bool {
        matches!(self, IssueKind::CssPropertyAliases | IssueKind::CssValueAliases)
    }
}

/// A single reported portability problem
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub invalid: bool,
    pub deprecated: bool,
    pub experimental: bool,
    pub unsupported_browsers: Vec<TargetBrowser>,
}

impl Issue {
    pub fn new(kind: IssueKind) -> Self {
        Self {
            kind,
            property: None,
            element: None,
            attribute: None,
            value: None,
            aliases: Vec::new(),
            invalid: false,
            deprecated: false,
            experimental: false,
            unsupported_browsers: Vec::new(),
        }
    }
}

/// Format a number the way it was most likely authored: `10`, `0.5`, `12.25`
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = (value * 1_000_000.0).round() / 1_000_000.0;
    format!("{}", rounded)
}
