//! Content discovery and document loading.
//!
//! Walks the content directory and turns every Markdown file into a
//! [`Document`] (or, for `_index.md`, a [`SectionIndex`]).
//!
//! ## Directory Structure
//!
//! ```text
//! content/
//! ├── _index.md                    # Home page metadata (optional)
//! ├── about.md                     # Top-level document → /about/
//! └── posts/                       # Section "posts"
//!     ├── _index.md                # Section metadata (title, description, weight)
//!     ├── hello-world.md           # → /posts/hello-world/
//!     └── first-trip/              # Leaf bundle: slug comes from the directory
//!         ├── index.md             # → /posts/first-trip/
//!         └── cover.jpg
//! ```
//!
//! Hidden files and directories (leading `.`) are skipped. Files are visited
//! in sorted order so the result does not depend on the filesystem.
//!
//! ## Derived Fields
//!
//! - **title**: header `title`, else the file name with dashes as spaces
//! - **slug**: header `slug`, else the file stem (bundle directory for
//!   `index.md`), slugified
//! - **url**: the section's permalink pattern, default `/:section/:slug/`
//! - **summary**: header `summary`, else the text before `<!--more-->`, else
//!   the first `summary_length` words
//! - **reading_time**: word count over `words_per_minute`, rounded up, min 1

use crate::config::SiteConfig;
use crate::frontmatter::{FrontMatter, FrontMatterError};
use crate::menu::{RefTarget, normalize_ref};
use crate::naming::{
    PermalinkParts, absolute_url, default_permalink_pattern, display_title, expand_permalink,
    normalize_url_path, slugify,
};
use crate::types::{Document, Section, unique_terms};
use chrono::Datelike;
use pulldown_cmark::{Event, Parser, TagEnd};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Content directory not found: {}", .0.display())]
    MissingDir(PathBuf),
    #[error("{path}: {source}")]
    Parse {
        path: String,
        source: FrontMatterError,
    },
    #[error("{0}: missing publish date")]
    MissingDate(String),
    #[error("{0}: cannot derive a slug")]
    EmptySlug(String),
}

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];
const SUMMARY_DIVIDER: &str = "<!--more-->";
const SECTION_INDEX_STEM: &str = "_index";
const BUNDLE_INDEX_STEM: &str = "index";

/// Metadata from a section's `_index.md`.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionIndex {
    /// Section name (`""` for the home page).
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub weight: Option<i64>,
}

/// Everything found under the content directory.
#[derive(Debug, Default)]
pub struct Content {
    pub documents: Vec<Document>,
    pub section_indexes: Vec<SectionIndex>,
}

/// Load every Markdown file under `content_dir`.
pub fn load_content(content_dir: &Path, config: &SiteConfig) -> Result<Content, ContentError> {
    if !content_dir.is_dir() {
        return Err(ContentError::MissingDir(content_dir.to_path_buf()));
    }

    let mut content = Content::default();
    let walker = WalkDir::new(content_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }
        let rel = relative_path(entry.path(), content_dir);
        let source = fs::read_to_string(entry.path())?;

        if file_stem(&rel) == SECTION_INDEX_STEM {
            if rel.matches('/').count() > 1 {
                debug!(path = %rel, "skipping nested section index");
                continue;
            }
            content.section_indexes.push(parse_section_index(&rel, &source)?);
        } else {
            content.documents.push(parse_document(&rel, &source, config)?);
        }
    }

    debug!(
        documents = content.documents.len(),
        sections = content.section_indexes.len(),
        "loaded content"
    );
    Ok(content)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| MARKDOWN_EXTENSIONS.contains(&e.as_str()))
}

/// Content-relative, `/`-separated path.
fn relative_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn file_stem(rel: &str) -> &str {
    let file = rel.rsplit('/').next().unwrap_or(rel);
    file.rsplit_once('.').map_or(file, |(stem, _)| stem)
}

/// Where a document sits: its section and the name its slug derives from.
#[derive(Debug, PartialEq)]
struct Location {
    section: String,
    name: String,
}

fn locate(rel: &str) -> Location {
    let parts: Vec<&str> = rel.split('/').collect();
    let dirs = &parts[..parts.len().saturating_sub(1)];
    let stem = file_stem(rel);

    let (name, containers) = match dirs.split_last() {
        Some((bundle, parents)) if stem == BUNDLE_INDEX_STEM => (*bundle, parents),
        _ => (stem, dirs),
    };
    Location {
        section: containers.first().map(|s| s.to_string()).unwrap_or_default(),
        name: name.to_string(),
    }
}

/// Parse one document from its content-relative path and file contents.
pub fn parse_document(rel: &str, source: &str, config: &SiteConfig) -> Result<Document, ContentError> {
    let parsed = FrontMatter::parse(source).map_err(|source| ContentError::Parse {
        path: rel.to_string(),
        source,
    })?;
    let fm = parsed.front_matter;
    let location = locate(rel);

    let date = fm
        .date
        .ok_or_else(|| ContentError::MissingDate(rel.to_string()))?;

    let slug = slugify(fm.slug.as_deref().unwrap_or(&location.name));
    if slug.is_empty() {
        return Err(ContentError::EmptySlug(rel.to_string()));
    }

    let title = fm
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| display_title(&location.name));

    let pattern = config
        .permalinks
        .get(&location.section)
        .map(String::as_str)
        .unwrap_or_else(|| default_permalink_pattern(&location.section));
    let url = expand_permalink(
        pattern,
        &PermalinkParts {
            year: date.year(),
            month: date.month(),
            day: date.day(),
            section: &location.section,
            slug: &slug,
            title: &title,
        },
    );

    let text = plain_text(parsed.body);
    let word_count = text.split_whitespace().count();
    let summary = match fm.summary {
        Some(summary) => summary,
        None => summarize(parsed.body, &text, config.summary_length),
    };

    Ok(Document {
        path: rel.to_string(),
        section: location.section,
        slug,
        permalink: absolute_url(&config.base_url, &url),
        url,
        title,
        date,
        lastmod: fm.lastmod.unwrap_or(date),
        tags: unique_terms(fm.tags),
        categories: unique_terms(fm.categories),
        description: fm.description,
        draft: fm.draft,
        weight: fm.weight,
        summary,
        word_count,
        reading_time: word_count.div_ceil(config.words_per_minute.max(1)).max(1),
        body: parsed.body.to_string(),
        params: fm.params,
    })
}

/// Parse an `_index.md`. The header is optional and no date is required.
pub fn parse_section_index(rel: &str, source: &str) -> Result<SectionIndex, ContentError> {
    let fm = match FrontMatter::parse(source) {
        Ok(parsed) => parsed.front_matter,
        Err(FrontMatterError::MissingHeader) => FrontMatter::default(),
        Err(source) => {
            return Err(ContentError::Parse {
                path: rel.to_string(),
                source,
            });
        }
    };
    let name = rel.rsplit_once('/').map_or("", |(dir, _)| dir);
    Ok(SectionIndex {
        name: name.to_string(),
        title: fm.title,
        description: fm.description,
        weight: fm.weight,
    })
}

/// Markdown reduced to its text content, blocks separated by spaces.
pub fn plain_text(markdown: &str) -> String {
    let mut text = String::with_capacity(markdown.len());
    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak
            | Event::HardBreak
            | Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::BlockQuote(_)
                | TagEnd::TableCell,
            ) => text.push(' '),
            _ => {}
        }
    }
    text
}

fn summarize(body: &str, text: &str, max_words: usize) -> String {
    match body.split_once(SUMMARY_DIVIDER) {
        Some((before, _)) => collapse_whitespace(&plain_text(before)),
        None => text
            .split_whitespace()
            .take(max_words)
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Assemble sections from the documents that made it into the build and the
/// `_index.md` metadata. The home section is always present and listed
/// first; the rest are ordered by weight (unweighted last), then name.
pub fn build_sections(documents: &[Document], indexes: &[SectionIndex], config: &SiteConfig) -> Vec<Section> {
    let mut sections: BTreeMap<String, Section> = BTreeMap::new();
    sections.insert(String::new(), new_section("", config));

    for doc in documents {
        sections
            .entry(doc.section.clone())
            .or_insert_with(|| new_section(&doc.section, config))
            .page_count += 1;
    }

    for index in indexes {
        let section = sections
            .entry(index.name.clone())
            .or_insert_with(|| new_section(&index.name, config));
        if let Some(title) = index.title.as_ref().filter(|t| !t.trim().is_empty()) {
            section.title = title.clone();
        }
        section.description = index.description.clone();
        section.weight = index.weight;
        section.has_index = true;
    }

    let mut sections: Vec<Section> = sections.into_values().collect();
    sections.sort_by(|a, b| {
        (!a.name.is_empty(), a.weight.is_none(), a.weight, &a.name).cmp(&(
            !b.name.is_empty(),
            b.weight.is_none(),
            b.weight,
            &b.name,
        ))
    });
    sections
}

fn new_section(name: &str, config: &SiteConfig) -> Section {
    let title = if name.is_empty() {
        if config.title.is_empty() {
            "Home".to_string()
        } else {
            config.title.clone()
        }
    } else {
        display_title(name)
    };
    Section {
        name: name.to_string(),
        title,
        description: None,
        url: normalize_url_path(&format!("/{name}/")),
        weight: None,
        has_index: false,
        page_count: 0,
    }
}

/// Lookup table for menu `page_ref`s: documents by path, sections by name.
///
/// A document and a section with the same key resolve to the document.
pub fn ref_targets(documents: &[Document], sections: &[Section]) -> BTreeMap<String, RefTarget> {
    let mut targets = BTreeMap::new();
    for doc in documents {
        targets.insert(
            normalize_ref(&doc.path),
            RefTarget {
                title: doc.title.clone(),
                url: doc.url.clone(),
            },
        );
    }
    for section in sections {
        targets
            .entry(section.name.clone())
            .or_insert_with(|| RefTarget {
                title: section.title.clone(),
                url: section.url.clone(),
            });
    }
    targets
}
