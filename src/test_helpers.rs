//! Shared test utilities for the simple-blog test suite.
//!
//! Provides fixture setup, lookup helpers, and menu tree assertions that work
//! with scan-phase data structures (`Manifest`, `Document`, `MenuItem`).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let manifest = scan(tmp.path(), &fixture_options()).unwrap();
//!
//! let doc = find_document(&manifest, "posts/hello-world.md");
//! assert_eq!(doc.tags, vec!["rust", "cli"]);
//!
//! assert_menu_shape(&manifest, "main", &[
//!     ("Posts", &["Archive"]),
//!     ("About", &[]),
//! ]);
//! ```

use chrono::{DateTime, FixedOffset};
use std::path::Path;
use tempfile::TempDir;

use crate::menu::MenuItem;
use crate::scan::{BuildOptions, Manifest};
use crate::taxonomy::Term;
use crate::types::{Document, Section};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Production build options pinned to 2025-01-01, so the fixture's
/// far-future post stays in the future and everything else is published.
pub fn fixture_options() -> BuildOptions {
    BuildOptions {
        now: fixture_now(),
        ..BuildOptions::default()
    }
}

pub fn fixture_now() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z").unwrap()
}

// =========================================================================
// Manifest lookups (panic with the available names on miss)
// =========================================================================

/// Find a document by content path. Panics if not found.
pub fn find_document<'a>(manifest: &'a Manifest, path: &str) -> &'a Document {
    manifest
        .documents
        .iter()
        .find(|d| d.path == path)
        .unwrap_or_else(|| panic!("document '{path}' not found. Available: {:?}", document_paths(manifest)))
}

/// Find a section by name (`""` for home). Panics if not found.
pub fn find_section<'a>(manifest: &'a Manifest, name: &str) -> &'a Section {
    manifest
        .sections
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| {
            let names: Vec<&str> = manifest.sections.iter().map(|s| s.name.as_str()).collect();
            panic!("section '{name}' not found. Available: {names:?}")
        })
}

/// Find a menu bucket by name. Panics if not found.
pub fn find_menu<'a>(manifest: &'a Manifest, name: &str) -> &'a [MenuItem] {
    manifest.menus.get(name).unwrap_or_else(|| {
        let names: Vec<&String> = manifest.menus.keys().collect();
        panic!("menu '{name}' not found. Available: {names:?}")
    })
}

/// Find a taxonomy term by name or slug. Panics if not found.
pub fn find_term<'a>(manifest: &'a Manifest, taxonomy: &str, term: &str) -> &'a Term {
    manifest.taxonomies.term(taxonomy, term).unwrap_or_else(|| {
        let terms: Vec<&String> = manifest
            .taxonomies
            .get(taxonomy)
            .map(|t| t.terms.keys().collect())
            .unwrap_or_default();
        panic!("term '{term}' not found in '{taxonomy}'. Available: {terms:?}")
    })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// Content paths of all documents, in manifest order.
pub fn document_paths(manifest: &Manifest) -> Vec<&str> {
    manifest.documents.iter().map(|d| d.path.as_str()).collect()
}

/// Content paths of a term's pages, in listing order.
pub fn term_paths(term: &Term) -> Vec<&str> {
    term.pages.iter().map(|p| p.path.as_str()).collect()
}

/// Names of menu items at one level.
pub fn menu_names(items: &[MenuItem]) -> Vec<&str> {
    items.iter().map(|i| i.name.as_str()).collect()
}

// =========================================================================
// Menu assertions
// =========================================================================

/// Assert a menu's two-level shape: top-level names and their children.
///
/// ```rust
/// assert_menu_shape(&manifest, "main", &[
///     ("Posts", &["Archive"]),
///     ("About", &[]),
/// ]);
/// ```
pub fn assert_menu_shape(manifest: &Manifest, menu: &str, expected: &[(&str, &[&str])]) {
    let items = find_menu(manifest, menu);
    let expected_names: Vec<&str> = expected.iter().map(|(name, _)| *name).collect();
    assert_eq!(menu_names(items), expected_names, "menu '{menu}' top level");

    for (item, (name, children)) in items.iter().zip(expected) {
        assert_eq!(
            menu_names(&item.children),
            children.to_vec(),
            "children of '{name}' in menu '{menu}'"
        );
    }
}
