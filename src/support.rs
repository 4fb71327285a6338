//! Version-range and vendor-prefix matching against compat tables

use crate::database::{CompatTable, VersionBound};
use crate::types::SupportState;
use regex::Regex;

/// Parse the longest leading decimal number of a version string.
///
/// `"69"` → 69, `"3.6"` → 3.6, `"12.1.2"` → 12.1. Strings without a numeric
/// prefix (`"preview"`, `"≤37"`) yield NaN, which fails every comparison.
pub fn parse_version(version: &str) -> f64 {
    let trimmed = version.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (index, ch) in trimmed.char_indices() {
        match ch {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            '+' | '-' if index == 0 => {}
            _ => break,
        }
        end = index + ch.len_utf8();
    }

    if !seen_digit {
        return f64::NAN;
    }

    let mut number = &trimmed[..end];
    if number.ends_with('.') {
        number = &number[..number.len() - 1];
    }
    number.parse().unwrap_or(f64::NAN)
}

pub struct SupportResolver {
    vendor_prefix_regex: Regex,
}

impl SupportResolver {
    pub fn new() -> Self {
        Self {
            vendor_prefix_regex: Regex::new(r"^-\w+-").expect("vendor prefix pattern is valid"),
        }
    }

    /// Leading `-vendor-` prefix of a term, if any
    pub fn vendor_prefix<'a>(&self, term: &'a str) -> Option<&'a str> {
        self.vendor_prefix_regex.find(term).map(|m| m.as_str())
    }

    /// Decide whether `browser_id` at `version` supports the term described by `table`.
    ///
    /// `last_segment` is the authored spelling of the term; its vendor prefix
    /// selects which support records apply.
    pub fn resolve_support_state(
        &self,
        browser_id: &str,
        version: &str,
        table: Option<&CompatTable>,
        last_segment: &str,
    ) -> SupportState {
        let Some(table) = table else {
            return SupportState::DataNotFound;
        };

        let Some(records) = table.support.get(browser_id) else {
            return SupportState::BrowserNotFound;
        };

        let required_prefix = self.vendor_prefix(last_segment);
        let version_number = parse_version(version);

        for record in records {
            if record.prefix.as_deref() != required_prefix {
                continue;
            }

            if record.version_added == VersionBound::Always
                && record.version_removed == VersionBound::Absent
            {
                return SupportState::Supported;
            }

            let added = record.version_added.as_float();
            let removed = record.version_removed.as_float();
            if added <= version_number && version_number < removed {
                return SupportState::Supported;
            }
        }

        SupportState::Unsupported
    }
}

impl Default for SupportResolver {
    fn default() -> Self {
        Self::new()
    }
}
