//! CLI output formatting for the scan and config commands.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every entity (document, section, menu entry, term) is its semantic
//! identity: positional index and title. Source paths and URLs are secondary
//! context on indented lines. The output reads as a content inventory while
//! still letting users trace data back to specific files.
//!
//! # Entity Display Contract
//!
//! 1. **Header line**: positional index + title (+ optional detail like a date
//!    or page count)
//! 2. **Context lines**: indented `Source:`, `URL:`, `Tags:`, etc.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Documents
//! 001 Parsing Headers (2024-04-10)
//!     Source: posts/parsing-headers.md
//!     URL: /posts/2024/parsing-headers/
//!     Tags: rust, parsing
//!
//! Sections
//! 001 Field Notes (1 page)
//!     URL: /
//! 002 Writing (3 pages)
//!     Source: posts/_index.md
//!     URL: /posts/
//!
//! Menus
//! main
//!     001 Posts → /posts/
//!         001 Archive → /archive/
//!     002 Search [search]
//!
//! Taxonomies
//! tags (2 terms)
//!     001 rust (2 pages)
//!     002 cli (1 page)
//! ```
//!
//! ## Config
//!
//! ```text
//! Layers
//! 001 defaults
//! 002 config.toml
//!
//! Merged
//!     base_url = "https://notes.example.org/"
//!     ...
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::config::ResolvedConfig;
use crate::menu::MenuItem;
use crate::scan::Manifest;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an entity header: positional index + title, with optional detail.
///
/// ```text
/// 001 Writing (3 pages)
/// 002 About
/// ```
fn entity_header(index: usize, title: &str, detail: Option<&str>) -> String {
    match detail {
        Some(d) => format!("{} {} ({})", format_index(index), title, d),
        None => format!("{} {}", format_index(index), title),
    }
}

/// `1 page`, `2 pages`.
fn count_label(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

// ============================================================================
// Menu tree walker
// ============================================================================

/// A flattened node from walking a menu tree.
struct TreeNode<'a> {
    depth: usize,
    position: usize,
    item: &'a MenuItem,
}

/// Walk a menu, assigning positional indices per sibling level.
/// Returns a flat list of nodes with depth and position for formatting.
fn walk_menu_tree(items: &[MenuItem]) -> Vec<TreeNode<'_>> {
    let mut nodes = Vec::new();
    walk_menu_tree_recursive(items, 0, &mut nodes);
    nodes
}

fn walk_menu_tree_recursive<'a>(items: &'a [MenuItem], depth: usize, nodes: &mut Vec<TreeNode<'a>>) {
    for (i, item) in items.iter().enumerate() {
        nodes.push(TreeNode {
            depth,
            position: i + 1,
            item,
        });
        walk_menu_tree_recursive(&item.children, depth + 1, nodes);
    }
}

fn menu_line(node: &TreeNode<'_>) -> String {
    let header = entity_header(node.position, &node.item.name, None);
    match (&node.item.url, &node.item.action) {
        (Some(url), _) => format!("{} → {}", header, url),
        (None, Some(action)) => format!("{} [{}]", header, action),
        (None, None) => header,
    }
}

// ============================================================================
// Scan output
// ============================================================================

/// Format scan output: documents, sections, menus, taxonomies.
pub fn format_scan_output(manifest: &Manifest) -> Vec<String> {
    let mut lines = Vec::new();

    // Documents
    lines.push("Documents".to_string());
    for (i, doc) in manifest.documents.iter().enumerate() {
        let date = doc.date.format("%Y-%m-%d").to_string();
        let mut header = entity_header(i + 1, &doc.title, Some(&date));
        if doc.draft {
            header.push_str(" [draft]");
        }
        lines.push(header);
        lines.push(format!("    Source: {}", doc.path));
        lines.push(format!("    URL: {}", doc.url));
        if !doc.tags.is_empty() {
            lines.push(format!("    Tags: {}", doc.tags.join(", ")));
        }
        if !doc.categories.is_empty() {
            lines.push(format!("    Categories: {}", doc.categories.join(", ")));
        }
        if let Some(ref desc) = doc.description {
            let truncated = truncate_desc(desc.trim(), 60);
            if !truncated.is_empty() {
                lines.push(format!("    {}", truncated));
            }
        }
    }

    // Sections
    lines.push(String::new());
    lines.push("Sections".to_string());
    for (i, section) in manifest.sections.iter().enumerate() {
        let count = count_label(section.page_count, "page");
        lines.push(entity_header(i + 1, &section.title, Some(&count)));
        if section.has_index {
            let source = if section.name.is_empty() {
                "_index.md".to_string()
            } else {
                format!("{}/_index.md", section.name)
            };
            lines.push(format!("    Source: {}", source));
        }
        lines.push(format!("    URL: {}", section.url));
    }

    // Menus
    if !manifest.menus.is_empty() {
        lines.push(String::new());
        lines.push("Menus".to_string());
        for (name, items) in &manifest.menus {
            lines.push(name.clone());
            for node in walk_menu_tree(items) {
                lines.push(format!("{}{}", indent(node.depth + 1), menu_line(&node)));
            }
        }
    }

    // Taxonomies
    if !manifest.taxonomies.is_empty() {
        lines.push(String::new());
        lines.push("Taxonomies".to_string());
        for (plural, taxonomy) in &manifest.taxonomies.taxonomies {
            lines.push(format!("{} ({})", plural, count_label(taxonomy.terms.len(), "term")));
            for (i, term) in taxonomy.terms_by_count().iter().enumerate() {
                let count = count_label(term.pages.len(), "page");
                lines.push(format!("{}{}", indent(1), entity_header(i + 1, &term.name, Some(&count))));
            }
        }
    }

    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(manifest: &Manifest) {
    for line in format_scan_output(manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// Config output
// ============================================================================

/// Format the loaded layers and the merged configuration as TOML.
pub fn format_config_output(resolved: &ResolvedConfig) -> Result<Vec<String>, toml::ser::Error> {
    let mut lines = vec!["Layers".to_string()];
    for (i, layer) in resolved.layers.iter().enumerate() {
        lines.push(entity_header(i + 1, layer, None));
    }

    lines.push(String::new());
    lines.push("Merged".to_string());
    let merged = toml::to_string_pretty(&resolved.values)?;
    for line in merged.lines() {
        if line.is_empty() {
            lines.push(String::new());
        } else {
            lines.push(format!("{}{}", indent(1), line));
        }
    }
    Ok(lines)
}

/// Print config output to stdout.
pub fn print_config_output(resolved: &ResolvedConfig) -> Result<(), toml::ser::Error> {
    for line in format_config_output(resolved)? {
        println!("{}", line);
    }
    Ok(())
}
