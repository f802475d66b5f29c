//! Naming conventions: slugs, display titles and URLs.
//!
//! Every name that ends up in a URL (document slugs, section paths, taxonomy
//! terms) goes through [`slugify`], so `"Rust & WebAssembly"` and
//! `"rust-webassembly"` land on the same term page.
//!
//! ## Display Titles
//!
//! Documents without a `title` header fall back to their file name, with
//! dashes converted to spaces and the first letter capitalized. Sections
//! without an `_index.md` title use the same rule on their directory name:
//! - `hello-world.md` → "Hello world"
//! - `my-trip/index.md` → "My trip"
//! - `content/notes/` → "Notes"

use deunicode::deunicode;

/// Convert arbitrary text into a URL-safe slug.
///
/// Transliterates to ASCII, lowercases, and collapses every run of
/// non-alphanumeric characters into a single `-`. Leading and trailing
/// dashes are trimmed.
///
/// - `"Hello, World!"` → `"hello-world"`
/// - `"Crème Brûlée"` → `"creme-brulee"`
/// - `"  --  "` → `""`
pub fn slugify(text: &str) -> String {
    let ascii = deunicode(text);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Display title for a file stem or directory name: dashes and underscores
/// become spaces, and the first letter is uppercased.
pub fn display_title(stem: &str) -> String {
    let spaced = stem.replace(['-', '_'], " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Values substituted into a permalink pattern.
#[derive(Debug, Clone)]
pub struct PermalinkParts<'a> {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub section: &'a str,
    pub slug: &'a str,
    pub title: &'a str,
}

/// Default pattern when no `permalinks` entry matches the section.
pub fn default_permalink_pattern(section: &str) -> &'static str {
    if section.is_empty() {
        "/:slug/"
    } else {
        "/:section/:slug/"
    }
}

/// Expand a permalink pattern such as `/:year/:month/:slug/`.
///
/// Recognized tokens: `:year`, `:month`, `:day` (zero-padded), `:section`,
/// `:slug`, `:title` (slugified). Unknown tokens are left as written. Empty
/// path segments produced by an empty token (e.g. `:section` for root
/// documents) are collapsed.
pub fn expand_permalink(pattern: &str, parts: &PermalinkParts<'_>) -> String {
    let mut expanded = String::with_capacity(pattern.len() + parts.slug.len());
    let mut rest = pattern;
    while let Some(pos) = rest.find(':') {
        expanded.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let token_len = after
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(after.len());
        let token = &after[..token_len];
        match token {
            "year" => expanded.push_str(&format!("{:04}", parts.year)),
            "month" => expanded.push_str(&format!("{:02}", parts.month)),
            "day" => expanded.push_str(&format!("{:02}", parts.day)),
            "section" => expanded.push_str(parts.section),
            "slug" => expanded.push_str(parts.slug),
            "title" => expanded.push_str(&slugify(parts.title)),
            _ => {
                expanded.push(':');
                expanded.push_str(token);
            }
        }
        rest = &after[token_len..];
    }
    expanded.push_str(rest);
    normalize_url_path(&expanded)
}

/// Collapse duplicate slashes and make sure the path starts with `/`.
pub fn normalize_url_path(path: &str) -> String {
    let trailing = path.ends_with('/');
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut normalized = format!("/{}", segments.join("/"));
    if trailing {
        normalized.push('/');
    }
    normalized
}

/// Join a site-relative URL onto the configured base URL.
///
/// An empty base URL leaves the path unchanged.
pub fn absolute_url(base_url: &str, path: &str) -> String {
    if base_url.is_empty() {
        return path.to_string();
    }
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts<'a>(section: &'a str, slug: &'a str) -> PermalinkParts<'a> {
        PermalinkParts {
            year: 2024,
            month: 3,
            day: 7,
            section,
            slug,
            title: "Hello, World!",
        }
    }

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
    }

    #[test]
    fn slugify_transliterates() {
        assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
    }

    #[test]
    fn slugify_collapses_runs() {
        assert_eq!(slugify("rust  --  & wasm"), "rust-wasm");
    }

    #[test]
    fn slugify_trims_edges() {
        assert_eq!(slugify("--rust--"), "rust");
        assert_eq!(slugify("  --  "), "");
    }

    #[test]
    fn slugify_keeps_digits() {
        assert_eq!(slugify("Advent of Code 2023"), "advent-of-code-2023");
    }

    #[test]
    fn display_title_from_stem() {
        assert_eq!(display_title("hello-world"), "Hello world");
        assert_eq!(display_title("my_trip"), "My trip");
        assert_eq!(display_title("-notes-"), "Notes");
        assert_eq!(display_title("école"), "École");
        assert_eq!(display_title("--"), "");
    }

    #[test]
    fn default_pattern_for_section() {
        let p = parts("posts", "hello");
        assert_eq!(expand_permalink(default_permalink_pattern("posts"), &p), "/posts/hello/");
    }

    #[test]
    fn default_pattern_for_root() {
        let p = parts("", "about");
        assert_eq!(expand_permalink(default_permalink_pattern(""), &p), "/about/");
    }

    #[test]
    fn date_tokens_zero_padded() {
        let p = parts("posts", "hello");
        assert_eq!(expand_permalink("/:year/:month/:day/:slug/", &p), "/2024/03/07/hello/");
    }

    #[test]
    fn title_token_slugified() {
        let p = parts("posts", "hello");
        assert_eq!(expand_permalink("/:section/:title/", &p), "/posts/hello-world/");
    }

    #[test]
    fn unknown_token_preserved() {
        let p = parts("posts", "hello");
        assert_eq!(expand_permalink("/:filename/:slug", &p), "/:filename/hello");
    }

    #[test]
    fn empty_section_collapses_segment() {
        let p = parts("", "hello");
        assert_eq!(expand_permalink("/:section/:slug/", &p), "/hello/");
    }

    #[test]
    fn normalize_root() {
        assert_eq!(normalize_url_path(""), "/");
        assert_eq!(normalize_url_path("//"), "/");
    }

    #[test]
    fn absolute_url_joins_once() {
        assert_eq!(
            absolute_url("https://example.org/", "/posts/hello/"),
            "https://example.org/posts/hello/"
        );
        assert_eq!(absolute_url("", "/posts/hello/"), "/posts/hello/");
    }
}
