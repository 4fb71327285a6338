//! Vendor-prefix and alternate-name alias injection
//!
//! Support records such as `{ "prefix": "-moz-", ... }` or
//! `{ "alternative_name": "word-wrap", ... }` mean the term is also reachable
//! under another spelling. The resolver adds a synthetic sibling for every
//! such spelling that points back at the canonical term, and marks the
//! canonical term itself so callers can ask "has aliases" uniformly.
//!
//! Reserved snapshot keys never become tree children, so only real terms
//! are visited.

use crate::database::{AliasLink, CompatNode, CompatTable, CONTEXT_SUFFIX};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AliasStats {
    /// Terms that gained at least one alias
    pub canonical_terms: usize,
    /// Alias spellings pointing at a canonical term
    pub aliases: usize,
}

pub struct AliasResolver;

impl AliasResolver {
    pub fn new() -> Self {
        Self
    }

    /// Inject aliases everywhere below `root`. Running it again is a no-op.
    pub fn flatten(&self, root: &mut CompatNode) -> AliasStats {
        let mut stats = AliasStats::default();
        self.flatten_node(root, &mut stats);
        stats
    }

    fn flatten_node(&self, parent: &mut CompatNode, stats: &mut AliasStats) {
        for child in parent.children.values_mut() {
            if !child.is_alias() {
                self.flatten_node(child, stats);
            }
        }

        let mut discovered = Vec::new();
        for (key, child) in &parent.children {
            // Context tables describe their parent, not a term of their own
            if child.is_alias() || child.name.ends_with(CONTEXT_SUFFIX) {
                continue;
            }
            let Some(table) = child.table.as_ref().and_then(|source| source.primary()) else {
                continue;
            };
            let aliases = self.find_aliases(table, &child.name);
            if !aliases.is_empty() {
                discovered.push((key.clone(), child.name.clone(), aliases));
            }
        }

        for (canonical_key, canonical_name, aliases) in discovered {
            if let Some(canonical) = parent.children.get_mut(&canonical_key) {
                canonical.alias = Some(AliasLink::Canonical);
            }
            stats.canonical_terms += 1;

            for alias in aliases {
                let alias_key = alias.to_lowercase();
                if alias_key == canonical_key {
                    continue;
                }

                if let Some(existing) = parent.children.get(&alias_key) {
                    match &existing.alias {
                        Some(AliasLink::AliasOf(target)) if *target == canonical_name => {
                            stats.aliases += 1;
                        }
                        _ => log::debug!(
                            "Alias '{}' of '{}' collides with an existing term; keeping the existing term",
                            alias,
                            canonical_name
                        ),
                    }
                    continue;
                }

                log::trace!("Alias '{}' -> '{}'", alias, canonical_name);
                parent
                    .children
                    .insert(alias_key, CompatNode::alias_of(alias, canonical_name.clone()));
                stats.aliases += 1;
            }
        }
    }

    /// Every distinct alias spelling named by the table's support records
    fn find_aliases(&self, table: &CompatTable, canonical: &str) -> Vec<String> {
        let mut aliases: Vec<String> = Vec::new();
        for records in table.support.values() {
            for record in records {
                if let Some(alias) = record.alias_name(canonical) {
                    if !aliases.iter().any(|a| a.eq_ignore_ascii_case(&alias)) {
                        aliases.push(alias);
                    }
                }
            }
        }
        aliases
    }
}

impl Default for AliasResolver {
    fn default() -> Self {
        Self::new()
    }
}
