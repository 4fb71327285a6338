//! Maps parsed value tokens to lookup paths in the compat database
//!
//! Classification is deliberately conservative: a token that cannot be
//! placed in the database is reported as unverifiable and never flagged.

use crate::database::{namespace_path, CompatDatabase, CSS_PROPERTIES, CSS_TYPES};
use crate::parser::ValueToken;

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Known to be universally supported for this property
    Whitelisted,
    /// No compat data could be located for the token
    Unverifiable,
    /// Compat data lives at `path`; `term` is the authored spelling
    Term { term: String, path: Vec<String> },
}

/// Type keys that every engine supports for a given abstract data type
pub fn whitelisted_keys(data_type: &str) -> &'static [&'static str] {
    match data_type {
        "length" => &[
            "px", "cm", "mm", "q", "in", "pc", "pt", "em", "ex", "ch", "rem", "vh", "vw", "vmin",
            "vmax",
        ],
        "percentage" => &["percentage"],
        "global_keywords" => &["inherit", "initial"],
        _ => &[],
    }
}

/// Authored term and lookup key of a token; `None` for symbols
pub fn term_and_type_key(token: &ValueToken) -> Option<(String, String)> {
    match token {
        ValueToken::Ident(s) | ValueToken::String(s) | ValueToken::Url(s) => {
            Some((s.clone(), s.clone()))
        }
        ValueToken::Function { name, .. } => Some((name.clone(), name.clone())),
        ValueToken::Dimension { unit, .. } => Some((token.term(), unit.clone())),
        ValueToken::Percentage(_) => Some((token.term(), "percentage".to_string())),
        ValueToken::Number(_) => {
            let term = token.term();
            Some((term.clone(), term))
        }
        ValueToken::Symbol(_) => None,
    }
}

pub struct ValueClassifier;

impl ValueClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(
        &self,
        database: &CompatDatabase,
        property: &str,
        token: &ValueToken,
    ) -> Classification {
        let Some((term, type_key)) = term_and_type_key(token) else {
            return Classification::Unverifiable;
        };

        let property_path = namespace_path(&CSS_PROPERTIES, &[property]);
        let Some(property_node) = database.resolve_node(&property_path) else {
            return Classification::Unverifiable;
        };
        let data_types = property_node.data_types();

        if self.is_whitelisted(data_types, &type_key, token) {
            log::trace!("'{}' is whitelisted for '{}'", term, property);
            return Classification::Whitelisted;
        }

        if let Some(relative) = property_node.find_descendant(&type_key) {
            let mut path = property_path.clone();
            path.extend(relative);
            if database.term_exists(&path) {
                return Classification::Term { term, path };
            }
        }

        for data_type in data_types {
            let type_path = namespace_path(&CSS_TYPES, &[data_type.as_str()]);

            if type_key.eq_ignore_ascii_case(data_type) {
                if database.term_exists(&type_path) {
                    return Classification::Term { term, path: type_path };
                }
                continue;
            }

            let found = database
                .resolve_node(&type_path)
                .and_then(|node| node.find_descendant(&type_key));
            if let Some(relative) = found {
                let mut path = type_path;
                path.extend(relative);
                if database.term_exists(&path) {
                    return Classification::Term { term, path };
                }
            }
        }

        log::trace!("'{}' of '{}' is unverifiable", term, property);
        Classification::Unverifiable
    }

    fn is_whitelisted(&self, data_types: &[String], type_key: &str, token: &ValueToken) -> bool {
        let key = type_key.to_lowercase();
        if data_types
            .iter()
            .any(|data_type| whitelisted_keys(data_type).contains(&key.as_str()))
        {
            return true;
        }

        // A bare zero is a valid <length>
        matches!(token, ValueToken::Number(n) if *n == 0.0)
            && data_types.iter().any(|data_type| data_type == "length")
    }
}

impl Default for ValueClassifier {
    fn default() -> Self {
        Self::new()
    }
}
