//! # Simple Blog
//!
//! The content pipeline of a personal Markdown blog. Articles are Markdown
//! files with a metadata header, configuration is a stack of TOML/YAML
//! layers, and the result is a single JSON manifest that any renderer or
//! theme can consume.
//!
//! # Architecture: One-Pass Pipeline
//!
//! ```text
//! config layers  →  SiteConfig        (merge, typed view, validation)
//! content/*.md   →  Documents         (front matter, slugs, URLs, summaries)
//! Documents      →  Sections          (top-level directories + _index.md)
//! menus config   →  Menus             (page_ref resolution, ordering, nesting)
//! Documents      →  TaxonomyIndex     (tags, categories, custom taxonomies)
//!                →  manifest.json
//! ```
//!
//! Everything runs in one pass on one thread. Any error aborts the build:
//! there is no partial manifest.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Runs the pipeline, filters drafts and future posts, produces the [`scan::Manifest`] |
//! | [`config`] | Config layer discovery, merging, typed `SiteConfig`, validation |
//! | [`content`] | Walks the content directory, builds documents and sections |
//! | [`frontmatter`] | Splits and parses YAML/TOML headers, writes them back |
//! | [`formats`] | TOML/YAML parsing into a common `toml::Table` |
//! | [`menu`] | Menu entries, `page_ref` resolution, weight ordering, nesting |
//! | [`taxonomy`] | Groups documents by taxonomy term |
//! | [`types`] | Shared manifest types (`Document`, `Section`, `PageRef`) |
//! | [`naming`] | Slugs, display titles, permalink patterns |
//! | [`date`] | Lenient date parsing for header values |
//! | [`output`] | CLI output formatting: inventory of the scanned site |
//!
//! # Design Decisions
//!
//! ## One Value Model For Both Formats
//!
//! YAML headers and config files are converted into `toml::Value` right after
//! parsing. Merging, type checks and typed deserialization are written once,
//! against one value model. YAML `null` inside a mapping means "not set".
//!
//! ## Stable Menu Ordering
//!
//! Menus sort by weight with a stable sort, so entries that share a weight
//! stay in the order they were declared. Reordering a config file is the only
//! way to reorder equal-weight entries.
//!
//! ## Shallow Config Merge
//!
//! Layers override per key. Only `params`, `menus` and `permalinks` merge one
//! level deep, so an environment layer can change `params.author` without
//! restating every other parameter. A layer that changes a value's type is
//! rejected rather than silently winning.

pub mod config;
pub mod content;
pub mod date;
pub mod formats;
pub mod frontmatter;
pub mod menu;
pub mod naming;
pub mod output;
pub mod scan;
pub mod taxonomy;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
