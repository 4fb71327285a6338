//! Compatibility database: a homogeneous tree built once from a snapshot
//!
//! Every namespace (`css.properties`, `css.types`, `html.elements`, ...) is a
//! tree of [`CompatNode`]s. A node may carry a [`TableSource`] with the
//! per-browser support records for the term it names, and may be linked to
//! a canonical sibling through an [`AliasLink`] injected by the
//! [`AliasResolver`](crate::alias::AliasResolver).
//!
//! The database is immutable after [`CompatDatabase::from_snapshot`] returns,
//! so a single instance can be shared between threads without locking.

use crate::alias::{AliasResolver, AliasStats};
use crate::error::{CompatError, Result};
use crate::support::parse_version;
use crate::types::Browser;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Reserved key holding a node's compat table
pub const COMPAT_KEY: &str = "__compat";
/// Reserved keys holding a property's declared abstract data types
pub const DATA_TYPES_KEYS: [&str; 2] = ["__data_types", "__dataTypes"];
/// Suffix of children that hold a context-dependent compat table
pub const CONTEXT_SUFFIX: &str = "_context";
/// Implicit data type shared by every property that declares data types
pub const GLOBAL_KEYWORDS: &str = "global_keywords";

pub const CSS_PROPERTIES: [&str; 2] = ["css", "properties"];
pub const CSS_TYPES: [&str; 2] = ["css", "types"];
pub const HTML_ELEMENTS: [&str; 2] = ["html", "elements"];
pub const HTML_GLOBAL_ATTRIBUTES: [&str; 2] = ["html", "global_attributes"];

const NAMESPACES: [&str; 2] = ["css", "html"];

/// Build a lookup path from a namespace prefix and trailing terms
pub fn namespace_path(namespace: &[&str], terms: &[&str]) -> Vec<String> {
    namespace
        .iter()
        .chain(terms.iter())
        .map(|s| s.to_string())
        .collect()
}

/// Data types for properties the snapshot does not annotate itself
pub fn default_data_types(property: &str) -> &'static [&'static str] {
    match property {
        "background-image" => &["image", "url"],
        "padding" | "margin" | "width" | "height" => &["length", "percentage", "calc"],
        _ => &[],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompatStatus {
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub experimental: bool,
    #[serde(default)]
    pub standard_track: bool,
}

/// One end of a supported version range
#[derive(Debug, Clone, PartialEq, Default)]
pub enum VersionBound {
    /// `true`: from the very first release
    Always,
    Version(String),
    /// `false`, `null` or missing
    #[default]
    Absent,
}

impl VersionBound {
    /// Numeric form used for range checks; `Absent` is +inf
    pub fn as_float(&self) -> f64 {
        match self {
            VersionBound::Always => 0.0,
            VersionBound::Version(v) => parse_version(v),
            VersionBound::Absent => f64::INFINITY,
        }
    }
}

impl<'de> Deserialize<'de> for VersionBound {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Text(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Flag(true)) => VersionBound::Always,
            Some(Raw::Text(version)) => VersionBound::Version(version),
            Some(Raw::Flag(false)) | None => VersionBound::Absent,
        })
    }
}

/// A single supported version range, optionally behind a prefix or another name
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SupportRecord {
    #[serde(default)]
    pub version_added: VersionBound,
    #[serde(default)]
    pub version_removed: VersionBound,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub alternative_name: Option<String>,
}

impl SupportRecord {
    pub fn added(version: impl Into<String>) -> Self {
        Self {
            version_added: VersionBound::Version(version.into()),
            ..Self::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Name under which this record makes the term available, if not the canonical one
    pub fn alias_name(&self, canonical: &str) -> Option<String> {
        if let Some(name) = &self.alternative_name {
            return Some(name.clone());
        }
        self.prefix.as_ref().map(|prefix| format!("{}{}", prefix, canonical))
    }
}

/// Support and status information for one term
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CompatTable {
    #[serde(default, deserialize_with = "deserialize_support")]
    pub support: IndexMap<String, Vec<SupportRecord>>,
    #[serde(default)]
    pub status: CompatStatus,
    #[serde(default)]
    pub mdn_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn deserialize_support<'de, D>(
    deserializer: D,
) -> std::result::Result<IndexMap<String, Vec<SupportRecord>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(SupportRecord),
        Many(Vec<SupportRecord>),
    }

    let raw = IndexMap::<String, OneOrMany>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(browser, records)| {
            let records = match records {
                OneOrMany::One(record) => vec![record],
                OneOrMany::Many(records) => records,
            };
            (browser, records)
        })
        .collect())
}

/// Where a node's compat table comes from
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    Direct(CompatTable),
    /// Support depends on syntactic context (e.g. `align-items` in flex vs grid layout)
    ContextDependent(IndexMap<String, CompatTable>),
}

impl TableSource {
    /// Table for an explicitly chosen context. `Direct` tables apply to every context.
    pub fn for_context(&self, context: &str) -> Option<&CompatTable> {
        match self {
            TableSource::Direct(table) => Some(table),
            TableSource::ContextDependent(tables) => tables.get(context),
        }
    }

    /// Table used when the caller has no context to offer.
    ///
    /// For context-dependent terms this is the first context, in snapshot
    /// order, that carries a table of its own; contexts without one are
    /// skipped. That is an approximation: the authored rule's real context
    /// is not known at this layer.
    pub fn primary(&self) -> Option<&CompatTable> {
        match self {
            TableSource::Direct(table) => Some(table),
            TableSource::ContextDependent(tables) => tables.values().next(),
        }
    }

    pub fn contexts(&self) -> Vec<&str> {
        match self {
            TableSource::Direct(_) => Vec::new(),
            TableSource::ContextDependent(tables) => tables.keys().map(|k| k.as_str()).collect(),
        }
    }
}

/// Link between a vendor/alternate spelling and its canonical term
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasLink {
    /// This node is the canonical term and has at least one alias
    Canonical,
    /// This node is a synthetic alias of the named sibling
    AliasOf(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompatNode {
    pub(crate) name: String,
    pub(crate) children: IndexMap<String, CompatNode>,
    pub(crate) table: Option<TableSource>,
    pub(crate) data_types: Vec<String>,
    pub(crate) alias: Option<AliasLink>,
}

impl CompatNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: IndexMap::new(),
            table: None,
            data_types: Vec::new(),
            alias: None,
        }
    }

    /// Synthetic node that only points at its canonical sibling
    pub fn alias_of(name: impl Into<String>, canonical: impl Into<String>) -> Self {
        let mut node = Self::new(name);
        node.alias = Some(AliasLink::AliasOf(canonical.into()));
        node
    }

    /// Parse a snapshot object into a node. `path` is used for error reporting.
    pub fn from_value(name: &str, value: Value, path: &str) -> Result<Self> {
        let object = match value {
            Value::Object(map) => map,
            other => {
                return Err(CompatError::snapshot(
                    path,
                    format!("expected an object, found {}", value_kind(&other)),
                ))
            }
        };

        let mut node = CompatNode::new(name);
        let mut direct = None;
        let mut context_children = Vec::new();

        for (key, child) in object {
            let child_path = format!("{}.{}", path, key);

            if key == COMPAT_KEY {
                let table = serde_json::from_value::<CompatTable>(child)
                    .map_err(|e| CompatError::snapshot(&child_path, e.to_string()))?;
                direct = Some(table);
                continue;
            }

            if DATA_TYPES_KEYS.contains(&key.as_str()) {
                node.data_types = serde_json::from_value::<Vec<String>>(child)
                    .map_err(|e| CompatError::snapshot(&child_path, e.to_string()))?;
                continue;
            }

            if key.starts_with("__") {
                log::warn!("Skipping unknown snapshot key '{}'", child_path);
                continue;
            }

            let child_node = CompatNode::from_value(&key, child, &child_path)?;
            if key.ends_with(CONTEXT_SUFFIX) {
                context_children.push(child_node);
            } else {
                node.insert_child(child_node, &child_path);
            }
        }

        if let Some(table) = direct {
            node.table = Some(TableSource::Direct(table));
            for child in context_children {
                let child_path = format!("{}.{}", path, child.name);
                node.insert_child(child, &child_path);
            }
        } else {
            // Context children stay in the tree so their sub-terms remain searchable
            let mut contexts = IndexMap::new();
            for child in context_children {
                match &child.table {
                    Some(TableSource::Direct(table)) => {
                        contexts.insert(child.name.clone(), table.clone());
                    }
                    _ => log::debug!(
                        "Context '{}.{}' has no compat table of its own",
                        path,
                        child.name
                    ),
                }
                let child_path = format!("{}.{}", path, child.name);
                node.insert_child(child, &child_path);
            }
            if !contexts.is_empty() {
                node.table = Some(TableSource::ContextDependent(contexts));
            }
        }

        Ok(node)
    }

    fn insert_child(&mut self, child: CompatNode, path: &str) {
        let key = child.name.to_lowercase();
        if self.children.contains_key(&key) {
            log::warn!("Duplicate term '{}' differs only in case; keeping the first", path);
            return;
        }
        self.children.insert(key, child);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_source(&self) -> Option<&TableSource> {
        self.table.as_ref()
    }

    pub fn data_types(&self) -> &[String] {
        &self.data_types
    }

    pub fn alias_link(&self) -> Option<&AliasLink> {
        self.alias.as_ref()
    }

    pub fn is_alias(&self) -> bool {
        matches!(self.alias, Some(AliasLink::AliasOf(_)))
    }

    /// Case-insensitive child lookup without following aliases
    pub fn child(&self, term: &str) -> Option<&CompatNode> {
        self.children.get(&term.to_lowercase())
    }

    /// Case-insensitive child lookup that follows an alias to its canonical sibling
    pub fn resolved_child(&self, term: &str) -> Option<&CompatNode> {
        let child = self.child(term)?;
        match &child.alias {
            Some(AliasLink::AliasOf(canonical)) => self.child(canonical),
            _ => Some(child),
        }
    }

    /// Walk `path` segment by segment, following at most one alias per segment
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Option<&CompatNode> {
        let mut node = self;
        for segment in path {
            node = node.resolved_child(segment.as_ref())?;
        }
        Some(node)
    }

    /// Compat table for `path`, falling back to the first context-dependent table
    pub fn resolve_table<S: AsRef<str>>(&self, path: &[S]) -> Option<&CompatTable> {
        self.resolve(path)?.table.as_ref()?.primary()
    }

    /// Canonical name the terminal segment of `path` is an alias of, if any.
    /// A canonical term that has aliases resolves to its own name.
    pub fn alias_target<S: AsRef<str>>(&self, path: &[S]) -> Option<&str> {
        let (last, parent_path) = path.split_last()?;
        let parent = self.resolve(parent_path)?;
        let node = parent.child(last.as_ref())?;
        match node.alias.as_ref()? {
            AliasLink::Canonical => Some(node.name.as_str()),
            AliasLink::AliasOf(canonical) => Some(canonical.as_str()),
        }
    }

    /// Depth-first, pre-order search below this node for a child named `term`.
    /// Returns the path relative to this node.
    pub fn find_descendant(&self, term: &str) -> Option<Vec<String>> {
        let key = term.to_lowercase();
        for (name, child) in &self.children {
            if *name == key {
                return Some(vec![name.clone()]);
            }
            if let Some(mut rest) = child.find_descendant(term) {
                rest.insert(0, name.clone());
                return Some(rest);
            }
        }
        None
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The immutable compatibility database every query runs against
#[derive(Debug, Clone)]
pub struct CompatDatabase {
    browsers: IndexMap<String, Browser>,
    root: CompatNode,
    alias_stats: AliasStats,
}

impl CompatDatabase {
    /// Load and build a database from a JSON snapshot file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| CompatError::FileNotFound {
            path: format!("{}: {}", path.display(), e),
        })?;
        log::info!("Loaded compat snapshot from {}", path.display());
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_snapshot(value)
    }

    /// Build the tree, apply data-type defaults and inject aliases.
    pub fn from_snapshot(snapshot: Value) -> Result<Self> {
        let mut object = match snapshot {
            Value::Object(map) => map,
            other => {
                return Err(CompatError::snapshot(
                    "<root>",
                    format!("expected an object, found {}", value_kind(&other)),
                ))
            }
        };

        let browsers = match object.remove("browsers") {
            Some(value) => serde_json::from_value::<IndexMap<String, Browser>>(value)
                .map_err(|e| CompatError::snapshot("browsers", e.to_string()))?,
            None => {
                log::warn!("Snapshot has no 'browsers' section");
                IndexMap::new()
            }
        };

        let mut root = CompatNode::new("<root>");
        for namespace in NAMESPACES {
            match object.remove(namespace) {
                Some(value) => {
                    let node = CompatNode::from_value(namespace, value, namespace)?;
                    root.insert_child(node, namespace);
                }
                None => log::warn!("Snapshot has no '{}' namespace", namespace),
            }
        }
        for (key, _) in object {
            log::debug!("Ignoring snapshot namespace '{}'", key);
        }

        apply_data_types(&mut root);
        let alias_stats = AliasResolver::new().flatten(&mut root);

        log::debug!(
            "Built compat database: {} browsers, {} canonical terms with {} aliases",
            browsers.len(),
            alias_stats.canonical_terms,
            alias_stats.aliases
        );

        Ok(Self {
            browsers,
            root,
            alias_stats,
        })
    }

    pub fn browsers(&self) -> &IndexMap<String, Browser> {
        &self.browsers
    }

    pub fn browser(&self, id: &str) -> Option<&Browser> {
        self.browsers.get(id)
    }

    pub fn alias_stats(&self) -> AliasStats {
        self.alias_stats
    }

    pub fn resolve_node<S: AsRef<str>>(&self, path: &[S]) -> Option<&CompatNode> {
        self.root.resolve(path)
    }

    pub fn resolve_table<S: AsRef<str>>(&self, path: &[S]) -> Option<&CompatTable> {
        self.root.resolve_table(path)
    }

    pub fn term_exists<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.resolve_table(path).is_some()
    }

    pub fn alias_target<S: AsRef<str>>(&self, path: &[S]) -> Option<&str> {
        self.root.alias_target(path)
    }
}

/// Fill in default data types and prepend the implicit global keywords type
fn apply_data_types(root: &mut CompatNode) {
    let properties = root
        .children
        .get_mut(CSS_PROPERTIES[0])
        .and_then(|css| css.children.get_mut(CSS_PROPERTIES[1]));

    let Some(properties) = properties else {
        return;
    };

    for (name, property) in properties.children.iter_mut() {
        if property.data_types.is_empty() {
            property.data_types = default_data_types(name)
                .iter()
                .map(|s| s.to_string())
                .collect();
        }
        if !property.data_types.is_empty()
            && !property.data_types.iter().any(|t| t == GLOBAL_KEYWORDS)
        {
            property.data_types.insert(0, GLOBAL_KEYWORDS.to_string());
        }
    }
}
