//! Web Compatibility Checker
//!
//! Reports portability problems in CSS declarations and HTML elements by
//! checking them against an MDN-style browser compatibility snapshot.
//!
//! # Features
//!
//! - CSS property and (optionally) value checks, including vendor-prefixed
//!   and alternate spellings judged together as one alias group
//! - HTML element and attribute checks with global attribute fallback
//! - Deprecated and experimental status reporting
//! - Default target browsers drawn from the snapshot's maintained releases
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use webcompat::{CheckOptions, Declaration, TargetBrowser, WebCompat, Result};
//!
//! fn main() -> Result<()> {
//!     let engine = WebCompat::load("compat-snapshot.json")?;
//!     let issues = engine.css_declaration_block_issues(
//!         &[Declaration::new("grid-column")],
//!         &[TargetBrowser::new("firefox", "1")],
//!         &CheckOptions::default(),
//!     );
//!     for issue in issues {
//!         println!("{}", issue);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Checking Pipeline
//!
//! 1. **Load**: the snapshot becomes a case-insensitive [`CompatNode`] tree
//! 2. **Aliases**: prefixed and alternate names are injected as siblings
//! 3. **Values**: declaration values are tokenized, parsed and classified
//! 4. **Support**: each term is matched against every target browser
//! 5. **Merge**: alias spellings are folded into one issue per canonical term

pub mod alias;
pub mod classifier;
pub mod cli;
pub mod database;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod report;
pub mod support;
pub mod targets;
pub mod types;

// Re-export commonly used types and functions
pub use alias::{AliasResolver, AliasStats};
pub use classifier::{Classification, ValueClassifier};
pub use cli::EnhancedCli;
pub use database::{CompatDatabase, CompatNode, CompatTable, SupportRecord, TableSource};
pub use engine::WebCompat;
pub use error::{CompatError, Result};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::{parse_value, Parser, ValueToken};
pub use report::format_browser_list;
pub use support::{parse_version, SupportResolver};
pub use targets::default_target_browsers;
pub use types::*;

/// Checker version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Per-query switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// Check declaration values as well as property names
    pub css_values: bool,

    /// Report browsers the compat data has no entry for as unsupported
    pub flag_unknown_browsers: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            css_values: false,
            flag_unknown_browsers: true,
        }
    }
}

/// Check a JSON array of declarations
pub fn check_css_source(
    engine: &WebCompat,
    source: &str,
    browsers: &[TargetBrowser],
    options: &CheckOptions,
) -> Result<Vec<Issue>> {
    let declarations: Vec<Declaration> = serde_json::from_str(source)?;
    log::debug!("Checking {} declarations", declarations.len());
    Ok(engine.css_declaration_block_issues(&declarations, browsers, options))
}

/// Check a JSON element object, or an array of them
pub fn check_html_source(
    engine: &WebCompat,
    source: &str,
    browsers: &[TargetBrowser],
    options: &CheckOptions,
) -> Result<Vec<Issue>> {
    let value: serde_json::Value = serde_json::from_str(source)?;
    let elements: Vec<ElementInput> = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };

    log::debug!("Checking {} elements", elements.len());
    Ok(elements
        .iter()
        .flat_map(|input| {
            engine.html_element_issues(&input.element, &input.attributes, browsers, options)
        })
        .collect())
}
