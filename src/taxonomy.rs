//! Taxonomy indexing: groups documents by the terms they declare.
//!
//! Each configured taxonomy (`tag = "tags"`, `category = "categories"`, ...)
//! gets a [`Taxonomy`] keyed by its plural name. Terms are keyed by slug, so
//! `"Rust"` and `"rust"` share a listing page; the display name is the first
//! spelling seen.
//!
//! The index is rebuilt from scratch on every build.

use crate::naming::slugify;
use crate::types::{Document, PageRef};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// All taxonomies, keyed by plural name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TaxonomyIndex {
    pub taxonomies: BTreeMap<String, Taxonomy>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Taxonomy {
    pub singular: String,
    pub plural: String,
    /// Listing page for the whole taxonomy (`/tags/`).
    pub url: String,
    /// Terms keyed by slug.
    pub terms: BTreeMap<String, Term>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Term {
    pub name: String,
    pub slug: String,
    pub url: String,
    /// Newest first; equal dates by path.
    pub pages: Vec<PageRef>,
}

impl TaxonomyIndex {
    /// Index `documents` under every taxonomy in `taxonomies` (singular → plural).
    pub fn build(documents: &[Document], taxonomies: &BTreeMap<String, String>) -> Self {
        let mut index = TaxonomyIndex::default();

        for (singular, plural) in taxonomies {
            let mut taxonomy = Taxonomy {
                singular: singular.clone(),
                plural: plural.clone(),
                url: format!("/{plural}/"),
                terms: BTreeMap::new(),
            };

            for doc in documents {
                for name in doc.terms(plural) {
                    let slug = slugify(&name);
                    if slug.is_empty() {
                        warn!(path = %doc.path, taxonomy = %plural, term = %name, "term has no usable slug, skipped");
                        continue;
                    }
                    let term = taxonomy.terms.entry(slug.clone()).or_insert_with(|| Term {
                        url: format!("/{plural}/{slug}/"),
                        name,
                        slug,
                        pages: Vec::new(),
                    });
                    if !term.pages.iter().any(|p| p.path == doc.path) {
                        term.pages.push(doc.page_ref());
                    }
                }
            }

            for term in taxonomy.terms.values_mut() {
                term.pages
                    .sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.path.cmp(&b.path)));
            }
            index.taxonomies.insert(plural.clone(), taxonomy);
        }

        index
    }

    pub fn get(&self, plural: &str) -> Option<&Taxonomy> {
        self.taxonomies.get(plural)
    }

    /// Look up a term by name or slug.
    pub fn term(&self, plural: &str, term: &str) -> Option<&Term> {
        self.get(plural)?.terms.get(&slugify(term))
    }

    pub fn len(&self) -> usize {
        self.taxonomies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxonomies.is_empty()
    }
}

impl Taxonomy {
    /// Terms with the most pages first; equal counts by name.
    pub fn terms_by_count(&self) -> Vec<&Term> {
        let mut terms: Vec<&Term> = self.terms.values().collect();
        terms.sort_by(|a, b| {
            b.pages
                .len()
                .cmp(&a.pages.len())
                .then_with(|| a.name.cmp(&b.name))
        });
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn doc(path: &str, date: &str, tags: &[&str]) -> Document {
        Document {
            path: path.to_string(),
            section: "posts".to_string(),
            slug: path.to_string(),
            url: format!("/{path}/"),
            permalink: format!("https://example.org/{path}/"),
            title: path.to_string(),
            date: DateTime::parse_from_rfc3339(date).unwrap(),
            lastmod: DateTime::parse_from_rfc3339(date).unwrap(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            categories: Vec::new(),
            description: None,
            draft: false,
            weight: None,
            summary: String::new(),
            word_count: 0,
            reading_time: 1,
            body: String::new(),
            params: toml::Table::new(),
        }
    }

    fn tags_only() -> BTreeMap<String, String> {
        BTreeMap::from([("tag".to_string(), "tags".to_string())])
    }

    fn paths(term: &Term) -> Vec<&str> {
        term.pages.iter().map(|p| p.path.as_str()).collect()
    }

    #[test]
    fn document_listed_under_every_tag() {
        let docs = vec![doc("a", "2024-01-01T00:00:00Z", &["a", "b"])];
        let index = TaxonomyIndex::build(&docs, &tags_only());
        assert_eq!(paths(index.term("tags", "a").unwrap()), vec!["a"]);
        assert_eq!(paths(index.term("tags", "b").unwrap()), vec!["a"]);
    }

    #[test]
    fn newer_document_listed_first() {
        let docs = vec![
            doc("old", "2023-01-01T00:00:00Z", &["rust"]),
            doc("new", "2024-01-01T00:00:00Z", &["rust"]),
        ];
        let index = TaxonomyIndex::build(&docs, &tags_only());
        assert_eq!(paths(index.term("tags", "rust").unwrap()), vec!["new", "old"]);
    }

    #[test]
    fn same_date_ordered_by_path() {
        let docs = vec![
            doc("b", "2024-01-01T00:00:00Z", &["x"]),
            doc("a", "2024-01-01T00:00:00Z", &["x"]),
        ];
        let index = TaxonomyIndex::build(&docs, &tags_only());
        assert_eq!(paths(index.term("tags", "x").unwrap()), vec!["a", "b"]);
    }

    #[test]
    fn spellings_share_a_term() {
        let docs = vec![
            doc("a", "2024-01-02T00:00:00Z", &["Web Dev"]),
            doc("b", "2024-01-01T00:00:00Z", &["web-dev"]),
        ];
        let index = TaxonomyIndex::build(&docs, &tags_only());
        let tags = index.get("tags").unwrap();
        assert_eq!(tags.terms.len(), 1);
        let term = &tags.terms["web-dev"];
        assert_eq!(term.name, "Web Dev");
        assert_eq!(term.url, "/tags/web-dev/");
        assert_eq!(term.pages.len(), 2);
    }

    #[test]
    fn document_appears_once_per_term() {
        let docs = vec![doc("a", "2024-01-01T00:00:00Z", &["Rust", "rust"])];
        let index = TaxonomyIndex::build(&docs, &tags_only());
        assert_eq!(index.term("tags", "rust").unwrap().pages.len(), 1);
    }

    #[test]
    fn unsluggable_term_skipped() {
        let docs = vec![doc("a", "2024-01-01T00:00:00Z", &["???", "ok"])];
        let index = TaxonomyIndex::build(&docs, &tags_only());
        assert_eq!(index.get("tags").unwrap().terms.len(), 1);
    }

    #[test]
    fn custom_taxonomy_reads_params() {
        let mut d = doc("a", "2024-01-01T00:00:00Z", &[]);
        d.params
            .insert("series".into(), toml::Value::String("Rust Basics".into()));
        let taxonomies = BTreeMap::from([("series".to_string(), "series".to_string())]);
        let index = TaxonomyIndex::build(&[d], &taxonomies);
        let term = index.term("series", "Rust Basics").unwrap();
        assert_eq!(term.url, "/series/rust-basics/");
    }

    #[test]
    fn empty_taxonomy_is_still_listed() {
        let index = TaxonomyIndex::build(&[], &tags_only());
        assert_eq!(index.len(), 1);
        assert!(index.get("tags").unwrap().terms.is_empty());
        assert_eq!(index.get("tags").unwrap().url, "/tags/");
    }

    #[test]
    fn terms_by_count_orders_by_popularity_then_name() {
        let docs = vec![
            doc("a", "2024-01-01T00:00:00Z", &["zeta", "beta"]),
            doc("b", "2024-01-02T00:00:00Z", &["zeta", "alpha"]),
        ];
        let index = TaxonomyIndex::build(&docs, &tags_only());
        let names: Vec<&str> = index
            .get("tags")
            .unwrap()
            .terms_by_count()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "beta"]);
    }
}
