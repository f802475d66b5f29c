//! Navigation menus.
//!
//! Menus are declared per bucket in configuration:
//!
//! ```toml
//! [[menus.main]]
//! name = "Posts"
//! page_ref = "/posts"
//! weight = 10
//!
//! [[menus.main]]
//! name = "Search"
//! action = "search"
//! weight = 20
//!
//! [[menus.main]]
//! name = "Archive"
//! url = "/archive/"
//! parent = "Posts"
//! ```
//!
//! Every entry targets exactly one of: a content reference (`page_ref`),
//! a URL, or a renderer action (`action`, e.g. a search overlay or theme
//! toggle). Entries are ordered by `weight` ascending; entries with equal
//! weight keep their declaration order. An entry with `parent` is nested
//! under the entry whose identifier matches, and children follow the same
//! ordering rule.
//!
//! `page_ref` values are resolved through a [`PageResolver`]; a reference
//! that matches nothing fails the build.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("menu `{menu}` entry #{index} ({name:?}): {reason}")]
    InvalidEntry {
        menu: String,
        index: usize,
        name: String,
        reason: String,
    },
    #[error("menu `{menu}`: duplicate identifier `{identifier}`")]
    DuplicateIdentifier { menu: String, identifier: String },
    #[error("menu `{menu}`: entry `{identifier}` has unknown parent `{parent}`")]
    UnknownParent {
        menu: String,
        identifier: String,
        parent: String,
    },
    #[error("menu `{menu}`: entry `{identifier}` is part of a parent cycle")]
    ParentCycle { menu: String, identifier: String },
    #[error("menu `{menu}` entry {name:?}: page_ref `{page_ref}` does not match any content")]
    MissingPage {
        menu: String,
        name: String,
        page_ref: String,
    },
}

/// A menu entry as declared in configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuEntry {
    /// Display label. May be omitted for `page_ref` entries, which then use
    /// the target's title.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Content reference: a document path (`/posts/hello`, `posts/hello.md`)
    /// or a section (`/posts`, `/`).
    #[serde(default, alias = "pageRef", skip_serializing_if = "Option::is_none")]
    pub page_ref: Option<String>,
    /// Absolute or site-relative URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Renderer action identifier, e.g. `search` or `theme-toggle`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default)]
    pub weight: i64,
    /// Defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Identifier of the entry to nest under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "toml::Table::is_empty")]
    pub params: toml::Table,
}

/// A resolved, ordered menu item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItem {
    pub identifier: String,
    pub name: String,
    /// Target URL; absent for action entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub weight: i64,
    #[serde(skip_serializing_if = "toml::Table::is_empty")]
    pub params: toml::Table,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

/// What a `page_ref` resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct RefTarget {
    pub title: String,
    pub url: String,
}

/// Resolves content references used by `page_ref`.
pub trait PageResolver {
    fn resolve(&self, page_ref: &str) -> Option<RefTarget>;
}

/// Lookup table keyed by [`normalize_ref`] output.
impl PageResolver for BTreeMap<String, RefTarget> {
    fn resolve(&self, page_ref: &str) -> Option<RefTarget> {
        self.get(&normalize_ref(page_ref)).cloned()
    }
}

/// Normalize a content reference to its lookup key.
///
/// Leading/trailing slashes, a Markdown extension and a trailing `index` /
/// `_index` file name are dropped, so all of these name the same document:
/// `/posts/trip/`, `posts/trip/index.md`, `posts/trip`. The home section is
/// the empty key.
pub fn normalize_ref(page_ref: &str) -> String {
    let mut key = page_ref.trim().trim_matches('/');
    for ext in [".md", ".markdown"] {
        if let Some(stripped) = key.strip_suffix(ext) {
            key = stripped;
            break;
        }
    }
    for index in ["_index", "index"] {
        if key == index {
            return String::new();
        }
        if let Some(stripped) = key.strip_suffix(index).and_then(|k| k.strip_suffix('/')) {
            key = stripped;
            break;
        }
    }
    key.to_string()
}

/// Build every configured menu bucket.
pub fn build_menus(
    menus: &BTreeMap<String, Vec<MenuEntry>>,
    resolver: &impl PageResolver,
) -> Result<BTreeMap<String, Vec<MenuItem>>, MenuError> {
    let mut built = BTreeMap::new();
    for (name, entries) in menus {
        built.insert(name.clone(), build_menu(name, entries, resolver)?);
    }
    Ok(built)
}

/// Build one menu bucket: validate, resolve, order by weight, nest.
pub fn build_menu(
    menu: &str,
    entries: &[MenuEntry],
    resolver: &impl PageResolver,
) -> Result<Vec<MenuItem>, MenuError> {
    let mut items: Vec<(MenuItem, Option<String>)> = Vec::with_capacity(entries.len());
    let mut identifiers = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        let item = resolve_entry(menu, index, entry, resolver)?;
        if !identifiers.insert(item.identifier.clone()) {
            return Err(MenuError::DuplicateIdentifier {
                menu: menu.to_string(),
                identifier: item.identifier,
            });
        }
        items.push((item, entry.parent.clone().filter(|p| !p.is_empty())));
    }

    for (item, parent) in &items {
        if let Some(parent) = parent
            && !identifiers.contains(parent)
        {
            return Err(MenuError::UnknownParent {
                menu: menu.to_string(),
                identifier: item.identifier.clone(),
                parent: parent.clone(),
            });
        }
    }

    // Stable: equal weights keep declaration order.
    items.sort_by_key(|(item, _)| item.weight);

    let mut placed = HashSet::new();
    let tree = nest(None, &items, &mut placed);
    if let Some((item, _)) = items.iter().find(|(item, _)| !placed.contains(&item.identifier)) {
        return Err(MenuError::ParentCycle {
            menu: menu.to_string(),
            identifier: item.identifier.clone(),
        });
    }
    Ok(tree)
}

fn set(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn resolve_entry(
    menu: &str,
    index: usize,
    entry: &MenuEntry,
    resolver: &impl PageResolver,
) -> Result<MenuItem, MenuError> {
    let invalid = |reason: &str| MenuError::InvalidEntry {
        menu: menu.to_string(),
        index,
        name: entry.name.clone(),
        reason: reason.to_string(),
    };

    let page_ref = set(&entry.page_ref);
    let url = set(&entry.url);
    let action = set(&entry.action);

    let (name, url) = match (page_ref, url, action) {
        (Some(page_ref), None, None) => {
            let target = resolver
                .resolve(page_ref)
                .ok_or_else(|| MenuError::MissingPage {
                    menu: menu.to_string(),
                    name: entry.name.clone(),
                    page_ref: page_ref.to_string(),
                })?;
            let name = if entry.name.trim().is_empty() {
                target.title
            } else {
                entry.name.clone()
            };
            (name, Some(target.url))
        }
        (None, Some(url), None) => (entry.name.clone(), Some(url.to_string())),
        (None, None, Some(_)) => (entry.name.clone(), None),
        (None, None, None) => return Err(invalid("needs one of page_ref, url, or action")),
        _ => return Err(invalid("sets more than one of page_ref, url, and action")),
    };

    if name.trim().is_empty() {
        return Err(invalid("missing name"));
    }

    Ok(MenuItem {
        identifier: set(&entry.identifier).unwrap_or(&name).to_string(),
        name,
        url,
        page_ref: page_ref.map(str::to_string),
        action: action.map(str::to_string),
        weight: entry.weight,
        params: entry.params.clone(),
        children: Vec::new(),
    })
}

/// Collect the children of `parent` (top level for `None`) in sorted order.
///
/// Entries caught in a parent cycle are unreachable from the top level and
/// are left out of `placed`.
fn nest(
    parent: Option<&str>,
    items: &[(MenuItem, Option<String>)],
    placed: &mut HashSet<String>,
) -> Vec<MenuItem> {
    items
        .iter()
        .filter(|(_, p)| p.as_deref() == parent)
        .map(|(item, _)| {
            placed.insert(item.identifier.clone());
            let mut node = item.clone();
            node.children = nest(Some(&item.identifier), items, placed);
            node
        })
        .collect()
}
