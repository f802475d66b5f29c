//! Site configuration module.
//!
//! Handles discovering, merging, and validating configuration layers.
//! Configuration is layered: stock defaults are overridden by the site's
//! config files, which are overridden by locale- and environment-specific
//! files.
//!
//! ## Config File Location
//!
//! ```text
//! site/
//! ├── config.toml                   # Root layer (or config.yaml / config.yml)
//! └── config/
//!     ├── _default/
//!     │   ├── config.toml           # Shared defaults
//!     │   └── config.fr.toml        # Locale layer for `fr`
//!     └── production/
//!         ├── config.toml           # Environment layer
//!         └── config.fr.toml        # Environment + locale layer
//! ```
//!
//! Layers in increasing priority: stock defaults, `config.*`,
//! `config/_default/config.*`, `config/_default/config.<locale>.*`,
//! `config/<env>/config.*`, `config/<env>/config.<locale>.*`. Absent files are
//! skipped. When no locale is requested, `default_locale` from the non-locale
//! layers picks one.
//!
//! ## Merge Rules
//!
//! Merging is a shallow override per key: the last layer that defines a key
//! wins. Map-valued parameters (`params`, `menus`, `permalinks`) merge one
//! level deep instead, so a layer can override `params.author` without
//! restating the rest of `params`. A key whose value changes type between
//! layers is an error.
//!
//! ```toml
//! # config.toml
//! title = "Notes"
//! [params]
//! author = "Sam"
//! show_reading_time = true
//!
//! # config/production/config.toml
//! base_url = "https://notes.example.org/"
//! [params]
//! author = "Sam Doe"        # show_reading_time survives
//! ```
//!
//! Unknown top-level keys are rejected to catch typos early; `params` is
//! free-form.

use crate::formats::{Format, FormatError};
use crate::menu::MenuEntry;
use crate::naming::slugify;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{}: {source}", path.display())]
    Parse { path: PathBuf, source: FormatError },
    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("type mismatch for `{key}`: {layer} sets a {found}, earlier layers set a {expected}")]
    TypeMismatch {
        key: String,
        layer: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("more than one config file for the same layer: {} and {}", .0.display(), .1.display())]
    AmbiguousLayer(PathBuf, PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Parameters whose nested keys merge individually across layers.
pub const MAP_VALUED_KEYS: &[&str] = &["params", "menus", "permalinks"];

const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml"];

/// Site configuration.
///
/// All fields have defaults. Config files need only specify the values they
/// want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute URL the site is served from (e.g. `https://example.org/`).
    pub base_url: String,
    pub title: String,
    pub language_code: String,
    /// Locale whose layers load when none is requested explicitly.
    pub default_locale: String,
    /// Theme name, passed through to the renderer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Content directory, relative to the site root.
    pub content_dir: String,
    /// Include documents marked `draft: true`.
    pub build_drafts: bool,
    /// Include documents dated in the future.
    pub build_future: bool,
    /// Words in an automatic summary.
    pub summary_length: usize,
    /// Reading speed used for `reading_time`.
    pub words_per_minute: usize,
    /// Taxonomies as singular → plural (`tag = "tags"`).
    pub taxonomies: BTreeMap<String, String>,
    /// Permalink pattern per section (`posts = "/:year/:slug/"`).
    pub permalinks: BTreeMap<String, String>,
    /// Menu buckets (`[[menus.main]]`).
    pub menus: BTreeMap<String, Vec<MenuEntry>>,
    /// Free-form theme parameters.
    pub params: toml::Table,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            title: String::new(),
            language_code: "en-us".to_string(),
            default_locale: "en".to_string(),
            theme: None,
            content_dir: "content".to_string(),
            build_drafts: false,
            build_future: false,
            summary_length: 70,
            words_per_minute: 213,
            taxonomies: BTreeMap::from([
                ("category".to_string(), "categories".to_string()),
                ("tag".to_string(), "tags".to_string()),
            ]),
            permalinks: BTreeMap::new(),
            menus: BTreeMap::new(),
            params: toml::Table::new(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.is_empty()
            || self.base_url.starts_with("http://")
            || self.base_url.starts_with("https://"))
        {
            return Err(ConfigError::Validation(format!(
                "base_url must be empty or start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        if self.content_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "content_dir must not be empty".into(),
            ));
        }
        if self.summary_length == 0 {
            return Err(ConfigError::Validation(
                "summary_length must be greater than 0".into(),
            ));
        }
        if self.words_per_minute == 0 {
            return Err(ConfigError::Validation(
                "words_per_minute must be greater than 0".into(),
            ));
        }
        for (singular, plural) in &self.taxonomies {
            if singular.is_empty() || plural.is_empty() {
                return Err(ConfigError::Validation(
                    "taxonomy names must not be empty".into(),
                ));
            }
            if slugify(plural) != *plural {
                return Err(ConfigError::Validation(format!(
                    "taxonomy {singular:?} plural name {plural:?} must be URL-safe (lowercase, dashes)"
                )));
            }
        }
        for (section, pattern) in &self.permalinks {
            if !pattern.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "permalinks.{section} must start with '/', got {pattern:?}"
                )));
            }
        }
        Ok(())
    }
}

/// One configuration source, in the order it was loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayer {
    /// Human-readable origin: `defaults` or a site-relative file path.
    pub name: String,
    pub values: toml::Table,
}

impl ConfigLayer {
    pub fn new(name: impl Into<String>, values: toml::Table) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Which environment and locale layers to load.
#[derive(Debug, Clone, Copy)]
pub struct LayerSelector<'a> {
    pub environment: &'a str,
    /// Explicit locale; `None` falls back to `default_locale`.
    pub locale: Option<&'a str>,
}

/// A fully merged configuration together with the layers it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Names of the layers that contributed, lowest priority first.
    pub layers: Vec<String>,
    /// The merged parameter table.
    pub values: toml::Table,
    /// Typed view of `values`.
    pub site: SiteConfig,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// The stock defaults as the lowest-priority layer.
pub fn stock_defaults_layer() -> ConfigLayer {
    let values = match stock_defaults_value() {
        toml::Value::Table(table) => table,
        _ => toml::Table::new(),
    };
    ConfigLayer::new("defaults", values)
}

/// Merge layers in order; later layers win.
///
/// - Keys are overridden shallowly: a later value replaces the earlier one.
/// - Keys listed in [`MAP_VALUED_KEYS`] whose values are tables merge one
///   level deep with the same rule.
/// - A value whose type differs from the earlier value for the same key (or
///   nested key of a map-valued parameter) is a [`ConfigError::TypeMismatch`].
pub fn merge_layers(layers: &[ConfigLayer]) -> Result<toml::Table, ConfigError> {
    let mut merged = toml::Table::new();
    for layer in layers {
        for (key, value) in &layer.values {
            if let Some(existing) = merged.get_mut(key) {
                check_same_type(key, existing, value, &layer.name)?;
                match (existing, value) {
                    (toml::Value::Table(base), toml::Value::Table(overlay))
                        if MAP_VALUED_KEYS.contains(&key.as_str()) =>
                    {
                        for (nested_key, nested_value) in overlay {
                            if let Some(base_value) = base.get(nested_key) {
                                check_same_type(
                                    &format!("{key}.{nested_key}"),
                                    base_value,
                                    nested_value,
                                    &layer.name,
                                )?;
                            }
                            base.insert(nested_key.clone(), nested_value.clone());
                        }
                    }
                    (existing, value) => *existing = value.clone(),
                }
            } else {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(merged)
}

fn check_same_type(
    key: &str,
    existing: &toml::Value,
    value: &toml::Value,
    layer: &str,
) -> Result<(), ConfigError> {
    if existing.type_str() == value.type_str() {
        return Ok(());
    }
    Err(ConfigError::TypeMismatch {
        key: key.to_string(),
        layer: layer.to_string(),
        expected: existing.type_str(),
        found: value.type_str(),
    })
}

/// Load `<dir>/<stem>.{toml,yaml,yml}` as a layer.
///
/// Returns `Ok(None)` if no such file exists, and an error if more than one
/// does or the file fails to parse. The layer is named by its path relative
/// to `root`.
pub fn load_layer_file(root: &Path, dir: &Path, stem: &str) -> Result<Option<ConfigLayer>, ConfigError> {
    let mut found = CONFIG_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .filter(|path| path.is_file());

    let Some(path) = found.next() else {
        return Ok(None);
    };
    if let Some(other) = found.next() {
        return Err(ConfigError::AmbiguousLayer(path, other));
    }

    let format = Format::from_path(&path).unwrap_or(Format::Toml);
    let content = fs::read_to_string(&path)?;
    let values = format
        .parse(&content)
        .map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

    let name = path
        .strip_prefix(root)
        .unwrap_or(&path)
        .to_string_lossy()
        .replace('\\', "/");
    debug!(layer = %name, keys = values.len(), "loaded config layer");
    Ok(Some(ConfigLayer::new(name, values)))
}

/// Discover every config layer for the site at `root`, lowest priority first.
pub fn discover_layers(root: &Path, selector: &LayerSelector<'_>) -> Result<Vec<ConfigLayer>, ConfigError> {
    let environment = selector.environment;
    if environment.is_empty()
        || environment.starts_with('.')
        || environment.contains(['/', '\\'])
    {
        return Err(ConfigError::Validation(format!(
            "invalid environment name {environment:?}"
        )));
    }

    let config_dir = root.join("config");
    let default_dir = config_dir.join("_default");
    let env_dir = (environment != "_default").then(|| config_dir.join(environment));

    let root_layer = load_layer_file(root, root, "config")?;
    let default_layer = load_layer_file(root, &default_dir, "config")?;
    let env_layer = match &env_dir {
        Some(dir) => load_layer_file(root, dir, "config")?,
        None => None,
    };

    let locale = match selector.locale {
        Some(locale) => locale.to_string(),
        None => {
            let mut base = vec![stock_defaults_layer()];
            base.extend(root_layer.iter().cloned());
            base.extend(default_layer.iter().cloned());
            base.extend(env_layer.iter().cloned());
            default_locale_of(&merge_layers(&base)?)
        }
    };
    let locale_stem = format!("config.{locale}");

    let default_locale_layer = load_layer_file(root, &default_dir, &locale_stem)?;
    let env_locale_layer = match &env_dir {
        Some(dir) => load_layer_file(root, dir, &locale_stem)?,
        None => None,
    };

    let mut layers = vec![stock_defaults_layer()];
    layers.extend(root_layer);
    layers.extend(default_layer);
    layers.extend(default_locale_layer);
    layers.extend(env_layer);
    layers.extend(env_locale_layer);
    Ok(layers)
}

fn default_locale_of(values: &toml::Table) -> String {
    values
        .get("default_locale")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| SiteConfig::default().default_locale)
}

/// Merge layers, then deserialize and validate.
pub fn resolve_config(layers: &[ConfigLayer]) -> Result<ResolvedConfig, ConfigError> {
    let values = merge_layers(layers)?;
    let site: SiteConfig = toml::Value::Table(values.clone()).try_into()?;
    site.validate()?;
    Ok(ResolvedConfig {
        layers: layers.iter().map(|l| l.name.clone()).collect(),
        values,
        site,
    })
}

/// Discover, merge, and validate the configuration for the site at `root`.
pub fn load_config(root: &Path, selector: &LayerSelector<'_>) -> Result<ResolvedConfig, ConfigError> {
    let layers = discover_layers(root, selector)?;
    resolve_config(&layers)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Blog Configuration
# =========================
# All settings are optional. Values shown below are the defaults.
#
# Config files are layered, later layers win:
#   config.toml                          -> root
#   config/_default/config.toml          -> shared defaults
#   config/_default/config.<locale>.toml -> locale overrides
#   config/<env>/config.toml             -> environment overrides
#   config/<env>/config.<locale>.toml    -> environment + locale overrides
#
# Each layer only needs the keys it wants to override. Any layer may be
# written as YAML instead (config.yaml). Unknown keys cause an error.

# Absolute URL the site is served from, e.g. "https://example.org/".
base_url = ""

title = ""
language_code = "en-us"

# Locale whose config.<locale>.* layers load when --locale is not given.
default_locale = "en"

# Theme name, passed through to the renderer.
# theme = "paper"

# Content directory, relative to the site root.
content_dir = "content"

# Include drafts (draft: true) and future-dated documents.
build_drafts = false
build_future = false

# Words in an automatic summary, and reading speed for reading_time.
summary_length = 70
words_per_minute = 213

# ---------------------------------------------------------------------------
# Taxonomies (singular = plural). Replaced as a whole by later layers.
# ---------------------------------------------------------------------------
[taxonomies]
category = "categories"
tag = "tags"

# ---------------------------------------------------------------------------
# Permalink pattern per section. Tokens: :year :month :day :section :slug :title
# Default: /:section/:slug/ (/:slug/ for top-level documents)
# ---------------------------------------------------------------------------
[permalinks]
# posts = "/:year/:month/:slug/"

# ---------------------------------------------------------------------------
# Menus. Each entry sets exactly one of page_ref, url, or action.
# Entries are ordered by weight; equal weights keep file order.
# ---------------------------------------------------------------------------
[menus]
# [[menus.main]]
# name = "Posts"
# page_ref = "/posts"
# weight = 10
#
# [[menus.main]]
# name = "GitHub"
# url = "https://github.com/example"
# weight = 20
#
# [[menus.main]]
# name = "Search"
# action = "search"
# weight = 30

# ---------------------------------------------------------------------------
# Free-form theme parameters. Later layers merge key by key.
# ---------------------------------------------------------------------------
[params]
"##
}
