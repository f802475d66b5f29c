//! Front matter: the metadata header at the top of a content file.
//!
//! Two header styles are recognized, chosen by the opening delimiter line:
//!
//! ```text
//! ---                         +++
//! title: Hello                title = "Hello"
//! date: 2024-03-01            date = 2024-03-01
//! tags: [rust, cli]           tags = ["rust", "cli"]
//! ---                         +++
//! Body text...                Body text...
//! ```
//!
//! The header is read into a `toml::Table` (see [`crate::formats`]) and then
//! deserialized into [`FrontMatter`]. Keys without a dedicated field are kept
//! in [`FrontMatter::params`], so a header written back with
//! [`FrontMatter::to_header`] carries the same values it was read from.

use crate::formats::{self, Format, FormatError};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("file has no front matter header (expected a leading `---` or `+++` line)")]
    MissingHeader,
    #[error("front matter opened with `{0}` is never closed")]
    Unterminated(&'static str),
    #[error("front matter syntax: {0}")]
    Syntax(#[from] FormatError),
    #[error("front matter field: {0}")]
    Field(#[from] toml::de::Error),
    #[error("rendered header contains a bare `{0}` line")]
    DelimiterInHeader(&'static str),
}

/// Header values of a content file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(with = "crate::date::optional", skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<FixedOffset>>,
    /// Last modification date; falls back to `date` when absent.
    #[serde(
        with = "crate::date::optional",
        skip_serializing_if = "Option::is_none",
        alias = "lastMod"
    )]
    pub lastmod: Option<DateTime<FixedOffset>>,
    #[serde(deserialize_with = "string_or_list", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "string_or_list", skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub draft: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    /// Overrides the slug derived from the file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Overrides the automatically extracted summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Every other header key, untouched.
    #[serde(flatten)]
    pub params: toml::Table,
}

/// A content file split into its parsed header and raw body.
#[derive(Debug, Clone)]
pub struct ParsedSource<'a> {
    pub format: Format,
    pub front_matter: FrontMatter,
    pub body: &'a str,
}

impl FrontMatter {
    /// Deserialize a header table.
    ///
    /// TOML datetimes are turned into strings first so the date fields see
    /// one representation regardless of header format.
    pub fn from_table(table: toml::Table) -> Result<Self, FrontMatterError> {
        let mut value = toml::Value::Table(table);
        formats::stringify_datetimes(&mut value);
        Ok(value.try_into()?)
    }

    /// Parse a full content file: header plus body.
    pub fn parse(source: &str) -> Result<ParsedSource<'_>, FrontMatterError> {
        let (format, header, body) = split(source)?;
        let table = format.parse(header)?;
        Ok(ParsedSource {
            format,
            front_matter: Self::from_table(table)?,
            body,
        })
    }

    /// Serialize back into a delimited header block, ending with a newline.
    ///
    /// The TOML serializer writes strings containing newlines as `"""`
    /// blocks with unindented lines. When one of those lines equals the
    /// delimiter, the header is written again with every string escaped
    /// onto a single line.
    pub fn to_header(&self, format: Format) -> Result<String, FrontMatterError> {
        let delim = format.delimiter();
        let mut text = format.serialize(self)?;
        if has_delimiter_line(&text, delim) {
            text = match format {
                Format::Toml => match toml::Value::try_from(self).map_err(FormatError::from)? {
                    toml::Value::Table(table) => single_line_toml(&table),
                    _ => return Err(FrontMatterError::DelimiterInHeader(delim)),
                },
                Format::Yaml => return Err(FrontMatterError::DelimiterInHeader(delim)),
            };
        }
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(format!("{delim}\n{text}{delim}\n"))
    }

    /// Render a complete content file (header followed by `body`).
    pub fn render(&self, format: Format, body: &str) -> Result<String, FrontMatterError> {
        Ok(format!("{}{}", self.to_header(format)?, body))
    }

    /// Look up a header key that has no dedicated field as a list of strings.
    ///
    /// Accepts a single string or an array of strings; anything else yields
    /// an empty list.
    pub fn param_list(&self, key: &str) -> Vec<String> {
        string_list(self.params.get(key))
    }
}

/// A string or array of strings as a list; non-string items are skipped.
pub fn string_list(value: Option<&toml::Value>) -> Vec<String> {
    match value {
        Some(toml::Value::String(s)) => vec![s.clone()],
        Some(toml::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Split a content file into `(format, header, body)`.
///
/// The first line must be exactly `---` or `+++` (trailing whitespace and a
/// leading byte-order mark are tolerated). The header ends at the next line
/// equal to the same delimiter.
pub fn split(source: &str) -> Result<(Format, &str, &str), FrontMatterError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut lines = source.split_inclusive('\n');
    let first = lines.next().ok_or(FrontMatterError::MissingHeader)?;
    let format = match first.trim_end() {
        "---" => Format::Yaml,
        "+++" => Format::Toml,
        _ => return Err(FrontMatterError::MissingHeader),
    };

    let header_start = first.len();
    let mut pos = header_start;
    for line in lines {
        if line.trim_end() == format.delimiter() {
            let header = &source[header_start..pos];
            let body = &source[pos + line.len()..];
            return Ok((format, header, body));
        }
        pos += line.len();
    }
    Err(FrontMatterError::Unterminated(format.delimiter()))
}

fn has_delimiter_line(text: &str, delim: &str) -> bool {
    text.lines().any(|line| line.trim_end() == delim)
}

/// Write a table as TOML with every string as a one-line basic string.
fn single_line_toml(table: &toml::Table) -> String {
    let mut out = String::new();
    write_toml_table(&mut out, table, &mut Vec::new());
    out
}

fn write_toml_table(out: &mut String, table: &toml::Table, path: &mut Vec<String>) {
    for (key, value) in table {
        if !value.is_table() {
            out.push_str(&format!("{} = {}\n", toml_key(key), inline_toml(value)));
        }
    }
    for (key, value) in table {
        if let toml::Value::Table(child) = value {
            path.push(toml_key(key));
            out.push_str(&format!("[{}]\n", path.join(".")));
            write_toml_table(out, child, path);
            path.pop();
        }
    }
}

fn inline_toml(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => basic_string(s),
        toml::Value::Array(items) => {
            let items: Vec<String> = items.iter().map(inline_toml).collect();
            format!("[{}]", items.join(", "))
        }
        toml::Value::Table(table) if table.is_empty() => "{}".to_string(),
        toml::Value::Table(table) => {
            let fields: Vec<String> = table
                .iter()
                .map(|(k, v)| format!("{} = {}", toml_key(k), inline_toml(v)))
                .collect();
            format!("{{ {} }}", fields.join(", "))
        }
        scalar => scalar.to_string(),
    }
}

fn toml_key(key: &str) -> String {
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare { key.to_string() } else { basic_string(key) }
}

fn basic_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Accept `tags = "rust"` as well as `tags = ["rust", "cli"]`.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrList;

    impl<'de> serde::de::Visitor<'de> for StringOrList {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or a list of strings")
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::SeqAccess<'de>,
        {
            let mut items = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                items.push(item);
            }
            Ok(items)
        }
    }

    deserializer.deserialize_any(StringOrList)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    const YAML_POST: &str = "---\ntitle: Hello World\ndate: 2024-03-01\ntags: [rust, cli]\ndescription: First post\n---\nBody line one.\n";

    const TOML_POST: &str = "+++\ntitle = \"Hello World\"\ndate = 2024-03-01T10:00:00Z\ntags = [\"rust\", \"cli\"]\ndraft = true\n+++\n\nBody.\n";

    #[test]
    fn parse_yaml_header() {
        let parsed = FrontMatter::parse(YAML_POST).unwrap();
        assert_eq!(parsed.format, Format::Yaml);
        let fm = parsed.front_matter;
        assert_eq!(fm.title.as_deref(), Some("Hello World"));
        assert_eq!(fm.date.unwrap().year(), 2024);
        assert_eq!(fm.tags, vec!["rust", "cli"]);
        assert_eq!(fm.description.as_deref(), Some("First post"));
        assert!(!fm.draft);
        assert_eq!(parsed.body, "Body line one.\n");
    }

    #[test]
    fn parse_toml_header_with_native_datetime() {
        let parsed = FrontMatter::parse(TOML_POST).unwrap();
        assert_eq!(parsed.format, Format::Toml);
        let fm = parsed.front_matter;
        assert_eq!(fm.date.unwrap().to_rfc3339(), "2024-03-01T10:00:00+00:00");
        assert!(fm.draft);
        assert_eq!(parsed.body, "\nBody.\n");
    }

    #[test]
    fn single_tag_string_accepted() {
        let fm = FrontMatter::parse("---\ntags: rust\n---\n").unwrap().front_matter;
        assert_eq!(fm.tags, vec!["rust"]);
    }

    #[test]
    fn unknown_keys_kept_in_params() {
        let fm = FrontMatter::parse("---\ntitle: x\nshowToc: true\nseries: [intro]\n---\n")
            .unwrap()
            .front_matter;
        assert_eq!(fm.params.get("showToc").and_then(|v| v.as_bool()), Some(true));
        assert_eq!(fm.param_list("series"), vec!["intro"]);
        assert!(fm.param_list("missing").is_empty());
    }

    #[test]
    fn lastmod_alias() {
        let fm = FrontMatter::parse("---\nlastMod: 2024-05-01\n---\n").unwrap().front_matter;
        assert_eq!(fm.lastmod.unwrap().month(), 5);
    }

    #[test]
    fn crlf_line_endings() {
        let parsed = FrontMatter::parse("---\r\ntitle: Win\r\n---\r\nBody\r\n").unwrap();
        assert_eq!(parsed.front_matter.title.as_deref(), Some("Win"));
        assert_eq!(parsed.body, "Body\r\n");
    }

    #[test]
    fn byte_order_mark_tolerated() {
        let parsed = FrontMatter::parse("\u{feff}+++\ntitle = \"x\"\n+++\n").unwrap();
        assert_eq!(parsed.front_matter.title.as_deref(), Some("x"));
    }

    #[test]
    fn empty_header() {
        let parsed = FrontMatter::parse("---\n---\nonly body").unwrap();
        assert_eq!(parsed.front_matter, FrontMatter::default());
        assert_eq!(parsed.body, "only body");
    }

    #[test]
    fn missing_header_is_error() {
        assert!(matches!(
            FrontMatter::parse("# Just markdown\n"),
            Err(FrontMatterError::MissingHeader)
        ));
        assert!(matches!(FrontMatter::parse(""), Err(FrontMatterError::MissingHeader)));
    }

    #[test]
    fn unterminated_header_is_error() {
        assert!(matches!(
            FrontMatter::parse("---\ntitle: x\nbody without close\n"),
            Err(FrontMatterError::Unterminated("---"))
        ));
    }

    #[test]
    fn mismatched_delimiter_does_not_close() {
        assert!(matches!(
            FrontMatter::parse("---\ntitle: x\n+++\n"),
            Err(FrontMatterError::Unterminated("---"))
        ));
    }

    #[test]
    fn invalid_date_is_field_error() {
        assert!(matches!(
            FrontMatter::parse("---\ndate: someday\n---\n"),
            Err(FrontMatterError::Field(_))
        ));
    }

    #[test]
    fn wrong_type_is_field_error() {
        assert!(matches!(
            FrontMatter::parse("+++\ndraft = \"yes\"\n+++\n"),
            Err(FrontMatterError::Field(_))
        ));
    }

    #[test]
    fn bad_yaml_is_syntax_error() {
        assert!(matches!(
            FrontMatter::parse("---\ntitle: [unclosed\n---\n"),
            Err(FrontMatterError::Syntax(_))
        ));
    }

    #[test]
    fn header_round_trips_in_both_formats() {
        for source in [YAML_POST, TOML_POST] {
            let parsed = FrontMatter::parse(source).unwrap();
            for format in [Format::Yaml, Format::Toml] {
                let rendered = parsed.front_matter.render(format, parsed.body).unwrap();
                let reparsed = FrontMatter::parse(&rendered).unwrap();
                assert_eq!(reparsed.front_matter, parsed.front_matter);
                assert_eq!(reparsed.body, parsed.body);
            }
        }
    }

    #[test]
    fn params_round_trip() {
        let source = "+++\ntitle = \"x\"\ndate = 2024-01-01\n[cover]\nimage = \"a.png\"\nhidden = false\n+++\n";
        let fm = FrontMatter::parse(source).unwrap().front_matter;
        let header = fm.to_header(Format::Toml).unwrap();
        let again = FrontMatter::parse(&header).unwrap().front_matter;
        assert_eq!(again, fm);
        assert_eq!(again.params["cover"]["image"].as_str(), Some("a.png"));
    }

    #[test]
    fn to_header_is_delimited() {
        let fm = FrontMatter {
            title: Some("T".into()),
            ..Default::default()
        };
        let header = fm.to_header(Format::Toml).unwrap();
        assert!(header.starts_with("+++\n"));
        assert!(header.ends_with("+++\n"));
        assert!(header.contains("title = \"T\""));
    }

    #[test]
    fn delimiter_lines_inside_strings_round_trip() {
        let mut params = toml::Table::new();
        params.insert("note".into(), toml::Value::String("a\n+++\nb".into()));
        params.insert(
            "cover".into(),
            toml::Value::Table(toml::Table::from_iter([(
                "caption".to_string(),
                toml::Value::String("---\n\"quoted\"\tand \\ slashed".into()),
            )])),
        );
        let fm = FrontMatter {
            title: Some("Delimiters".into()),
            description: Some("first\n+++\nsecond".into()),
            summary: Some("one\n---\ntwo".into()),
            params,
            ..Default::default()
        };

        for format in [Format::Toml, Format::Yaml] {
            let rendered = fm.render(format, "Body.\n").unwrap();
            let lines: Vec<&str> = rendered.lines().collect();
            let delim = format.delimiter();
            assert_eq!(
                lines.iter().filter(|line| line.trim_end() == delim).count(),
                2,
                "{format:?} header:\n{rendered}"
            );

            let parsed = FrontMatter::parse(&rendered).unwrap();
            assert_eq!(parsed.front_matter, fm);
            assert_eq!(parsed.body, "Body.\n");
        }
    }

    #[test]
    fn single_line_toml_escapes_strings() {
        let table = toml::Table::from_iter([
            ("plain".to_string(), toml::Value::String("x\ny".into())),
            ("odd key".to_string(), toml::Value::Integer(3)),
            (
                "list".to_string(),
                toml::Value::Array(vec![toml::Value::Float(0.5), toml::Value::Boolean(true)]),
            ),
        ]);
        let text = single_line_toml(&table);
        assert!(text.contains("plain = \"x\\ny\"\n"), "{text}");
        assert!(text.contains("\"odd key\" = 3\n"), "{text}");
        assert_eq!(toml::from_str::<toml::Table>(&text).unwrap(), table);
    }
}
