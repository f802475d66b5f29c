//! Site scanning and manifest generation.
//!
//! Runs the whole content pipeline in one pass and produces the [`Manifest`]
//! a renderer consumes:
//!
//! ```text
//! config layers ──► SiteConfig ─┐
//!                               ├─► filter ─► sections ─► taxonomies ─► menus ─► Manifest
//! content/*.md ──► Documents ───┘
//! ```
//!
//! ## Site Layout
//!
//! ```text
//! site/                            # Site root (--source)
//! ├── config.toml                  # Root config layer
//! ├── config/
//! │   ├── _default/config.yaml     # Shared layer (TOML or YAML)
//! │   └── production/config.toml   # Environment layer
//! └── content/                     # content_dir
//!     ├── _index.md
//!     ├── about.md
//!     └── posts/
//!         ├── _index.md
//!         └── hello-world.md
//! ```
//!
//! ## Build Rules
//!
//! - Drafts are left out unless `--drafts` or `build_drafts` is set.
//! - Documents dated after the build time are left out unless `--future` or
//!   `build_future` is set.
//! - Two pages with the same URL fail the build. Documents, section
//!   listings, taxonomy listings and term listings all count.
//! - Documents are listed newest first; equal dates by path.
//!
//! Any error aborts the scan; there is no partial manifest.

use crate::config::{self, LayerSelector, SiteConfig};
use crate::content::{self, ContentError, build_sections, load_content, ref_targets};
use crate::menu::{self, MenuError, MenuItem, build_menus};
use crate::taxonomy::TaxonomyIndex;
use crate::types::{Document, Section};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Content error: {0}")]
    Content(#[from] content::ContentError),
    #[error("Menu error: {0}")]
    Menu(#[from] menu::MenuError),
    #[error("{first} and {second} both resolve to {url}")]
    DuplicateUrl {
        url: String,
        first: String,
        second: String,
    },
}

/// Coarse classification of a scan failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced path does not exist.
    MissingFile,
    /// Configuration is malformed or contradicts itself.
    Configuration,
    /// A content file's header is malformed.
    Parse,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::MissingFile => "missing file",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Parse => "parse",
            ErrorKind::Io => "io",
        })
    }
}

impl ScanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::Config(config::ConfigError::Io(_)) => ErrorKind::Io,
            ScanError::Config(_) => ErrorKind::Configuration,
            ScanError::Content(ContentError::Io(_) | ContentError::Walk(_)) => ErrorKind::Io,
            ScanError::Content(ContentError::MissingDir(_)) => ErrorKind::MissingFile,
            ScanError::Content(
                ContentError::Parse { .. } | ContentError::MissingDate(_) | ContentError::EmptySlug(_),
            ) => ErrorKind::Parse,
            ScanError::Menu(MenuError::MissingPage { .. }) => ErrorKind::MissingFile,
            ScanError::Menu(_) => ErrorKind::Configuration,
            ScanError::DuplicateUrl { .. } => ErrorKind::Configuration,
        }
    }
}

/// Build-time switches that come from the command line rather than config.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Environment layer to load (`config/<environment>/`).
    pub environment: String,
    /// Locale layer to load; `None` uses `default_locale`.
    pub locale: Option<String>,
    /// Include drafts regardless of `build_drafts`.
    pub drafts: bool,
    /// Include future-dated documents regardless of `build_future`.
    pub future: bool,
    /// Reference time for the future-date filter.
    pub now: DateTime<FixedOffset>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            environment: "production".to_string(),
            locale: None,
            drafts: false,
            future: false,
            now: Utc::now().fixed_offset(),
        }
    }
}

/// Manifest output from the scan stage
#[derive(Debug, Serialize)]
pub struct Manifest {
    /// Config layers that were merged, lowest priority first.
    pub config_layers: Vec<String>,
    pub config: SiteConfig,
    /// Home section first, then by weight and name.
    pub sections: Vec<Section>,
    /// Newest first.
    pub documents: Vec<Document>,
    pub menus: BTreeMap<String, Vec<MenuItem>>,
    pub taxonomies: TaxonomyIndex,
}

pub fn scan(root: &Path, options: &BuildOptions) -> Result<Manifest, ScanError> {
    let selector = LayerSelector {
        environment: &options.environment,
        locale: options.locale.as_deref(),
    };
    let resolved = config::load_config(root, &selector)?;
    let site = &resolved.site;

    let content = load_content(&root.join(&site.content_dir), site)?;
    let include_drafts = options.drafts || site.build_drafts;
    let include_future = options.future || site.build_future;

    let mut documents = Vec::with_capacity(content.documents.len());
    for doc in content.documents {
        if doc.draft && !include_drafts {
            debug!(path = %doc.path, "skipping draft");
            continue;
        }
        if doc.date > options.now && !include_future {
            debug!(path = %doc.path, date = %doc.date, "skipping future-dated document");
            continue;
        }
        documents.push(doc);
    }

    sort_documents(&mut documents);

    let sections = build_sections(&documents, &content.section_indexes, site);
    let taxonomies = TaxonomyIndex::build(&documents, &site.taxonomies);
    check_unique_urls(&documents, &sections, &taxonomies)?;

    let targets = ref_targets(&documents, &sections);
    let menus = build_menus(&site.menus, &targets)?;

    info!(
        documents = documents.len(),
        sections = sections.len(),
        menus = menus.len(),
        taxonomies = taxonomies.len(),
        "scan complete"
    );

    Ok(Manifest {
        config_layers: resolved.layers,
        config: resolved.site,
        sections,
        documents,
        menus,
        taxonomies,
    })
}

/// Newest first; equal dates by path.
pub fn sort_documents(documents: &mut [Document]) {
    documents.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.path.cmp(&b.path)));
}

/// Every page the site will render needs its own URL: section listings,
/// taxonomy and term listings, and documents.
fn check_unique_urls(documents: &[Document], sections: &[Section], taxonomies: &TaxonomyIndex) -> Result<(), ScanError> {
    let mut owners: Vec<(&str, String)> = Vec::new();
    for section in sections {
        let label = if section.name.is_empty() {
            "home section".to_string()
        } else {
            format!("section '{}'", section.name)
        };
        owners.push((section.url.as_str(), label));
    }
    for taxonomy in taxonomies.taxonomies.values() {
        owners.push((taxonomy.url.as_str(), format!("taxonomy '{}'", taxonomy.plural)));
        for term in taxonomy.terms.values() {
            owners.push((term.url.as_str(), format!("term '{}/{}'", taxonomy.plural, term.slug)));
        }
    }
    owners.extend(documents.iter().map(|doc| (doc.url.as_str(), doc.path.clone())));

    let mut seen: HashMap<&str, String> = HashMap::with_capacity(owners.len());
    for (url, owner) in owners {
        if let Some(first) = seen.insert(url, owner.clone()) {
            return Err(ScanError::DuplicateUrl {
                url: url.to_string(),
                first,
                second: owner,
            });
        }
    }
    Ok(())
}
