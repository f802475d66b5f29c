//! Shared types of the site model.
//!
//! These types make up the manifest handed to the renderer and are
//! serialized to JSON by the `scan` command.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// A content document (an article or a standalone page).
///
/// Identified by `path`, the content-relative source path. Created when the
/// file is loaded and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Source path relative to the content root, `/`-separated.
    pub path: String,
    /// First directory of `path` (`""` for top-level documents).
    pub section: String,
    pub slug: String,
    /// Site-relative URL (`/posts/hello/`).
    pub url: String,
    /// `url` joined onto the configured base URL.
    pub permalink: String,
    pub title: String,
    #[serde(serialize_with = "crate::date::rfc3339::serialize")]
    pub date: DateTime<FixedOffset>,
    #[serde(serialize_with = "crate::date::rfc3339::serialize")]
    pub lastmod: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub draft: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    pub summary: String,
    pub word_count: usize,
    /// Minutes, at least 1.
    pub reading_time: usize,
    /// Raw Markdown after the header.
    pub body: String,
    /// Header keys without a dedicated field.
    #[serde(skip_serializing_if = "toml::Table::is_empty")]
    pub params: toml::Table,
}

impl Document {
    /// Terms this document declares for a taxonomy (by plural name).
    ///
    /// `tags` and `categories` read the dedicated fields; any other taxonomy
    /// reads a string or list of strings from `params`. Duplicates are
    /// dropped, first occurrence kept.
    pub fn terms(&self, taxonomy: &str) -> Vec<String> {
        match taxonomy {
            "tags" => self.tags.clone(),
            "categories" => self.categories.clone(),
            other => unique_terms(crate::frontmatter::string_list(self.params.get(other))),
        }
    }

    pub fn page_ref(&self) -> PageRef {
        PageRef {
            path: self.path.clone(),
            title: self.title.clone(),
            url: self.url.clone(),
            date: self.date,
        }
    }
}

/// Trim, drop empty entries and exact duplicates, keeping first occurrences.
pub fn unique_terms(terms: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(terms.len());
    for term in terms {
        let term = term.trim();
        if !term.is_empty() && !unique.iter().any(|t| t == term) {
            unique.push(term.to_string());
        }
    }
    unique
}

/// A reference to a document from a listing (taxonomy term, section).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRef {
    pub path: String,
    pub title: String,
    pub url: String,
    #[serde(serialize_with = "crate::date::rfc3339::serialize")]
    pub date: DateTime<FixedOffset>,
}

/// A content section: a top-level directory, or the home page (`name == ""`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    /// Whether an `_index.md` describes this section.
    pub has_index: bool,
    pub page_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_terms_drops_duplicates_and_blanks() {
        let terms = vec![
            "rust".to_string(),
            " cli ".to_string(),
            "".to_string(),
            "rust".to_string(),
            "Rust".to_string(),
        ];
        assert_eq!(unique_terms(terms), vec!["rust", "cli", "Rust"]);
    }
}
