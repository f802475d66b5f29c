//! TOML and YAML as one data model.
//!
//! Config files and front matter headers may be written in either format.
//! Both are read into a `toml::Table` so merging, validation and typed
//! deserialization only have one value model to deal with.
//!
//! YAML → TOML conversion rules:
//! - `null` map entries are dropped (the key is treated as absent); `null`
//!   inside a sequence is an error since TOML arrays cannot hold holes.
//! - Integers that do not fit `i64` become floats.
//! - Non-string mapping keys (numbers, booleans) are stringified.
//! - Tagged values (`!tag value`) keep their inner value.

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("top level must be a table, found {0}")]
    NotATable(&'static str),
    #[error("unsupported value at {path}: {reason}")]
    Unsupported { path: String, reason: String },
}

/// Serialization format of a config file or front matter header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Toml,
    Yaml,
}

impl Format {
    /// Detect the format from a file extension (`toml`, `yaml`, `yml`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Header delimiter used in content files.
    pub const fn delimiter(self) -> &'static str {
        match self {
            Self::Toml => "+++",
            Self::Yaml => "---",
        }
    }

    /// Parse text in this format into a table.
    pub fn parse(self, text: &str) -> Result<toml::Table, FormatError> {
        match self {
            Self::Toml => Ok(toml::from_str(text)?),
            Self::Yaml => {
                let value: serde_yaml::Value = serde_yaml::from_str(text)?;
                match value {
                    serde_yaml::Value::Null => Ok(toml::Table::new()),
                    serde_yaml::Value::Mapping(map) => yaml_mapping_to_table(map, ""),
                    other => Err(FormatError::NotATable(yaml_type_name(&other))),
                }
            }
        }
    }

    /// Serialize any value into this format.
    pub fn serialize<T: serde::Serialize>(self, value: &T) -> Result<String, FormatError> {
        match self {
            Self::Toml => Ok(toml::to_string(value)?),
            Self::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }
}

fn yaml_mapping_to_table(map: serde_yaml::Mapping, path: &str) -> Result<toml::Table, FormatError> {
    let mut table = toml::Table::new();
    for (key, value) in map {
        let key = yaml_key(&key, path)?;
        let child_path = join_key(path, &key);
        if let Some(converted) = yaml_to_toml(value, &child_path)? {
            table.insert(key, converted);
        }
    }
    Ok(table)
}

fn yaml_key(key: &serde_yaml::Value, path: &str) -> Result<String, FormatError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(FormatError::Unsupported {
            path: path.to_string(),
            reason: format!("{} used as a mapping key", yaml_type_name(other)),
        }),
    }
}

/// Convert a YAML value. `Ok(None)` means "absent" (a `null`).
fn yaml_to_toml(value: serde_yaml::Value, path: &str) -> Result<Option<toml::Value>, FormatError> {
    use serde_yaml::Value as Y;
    let converted = match value {
        Y::Null => return Ok(None),
        Y::Bool(b) => toml::Value::Boolean(b),
        Y::Number(n) => {
            if let Some(i) = n.as_i64() {
                toml::Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                toml::Value::Float(f)
            } else {
                return Err(FormatError::Unsupported {
                    path: path.to_string(),
                    reason: format!("number {n} is not representable"),
                });
            }
        }
        Y::String(s) => toml::Value::String(s),
        Y::Sequence(items) => {
            let mut array = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let item_path = format!("{path}[{i}]");
                match yaml_to_toml(item, &item_path)? {
                    Some(v) => array.push(v),
                    None => {
                        return Err(FormatError::Unsupported {
                            path: item_path,
                            reason: "null inside a list".to_string(),
                        });
                    }
                }
            }
            toml::Value::Array(array)
        }
        Y::Mapping(map) => toml::Value::Table(yaml_mapping_to_table(map, path)?),
        Y::Tagged(tagged) => return yaml_to_toml(tagged.value, path),
    };
    Ok(Some(converted))
}

fn yaml_type_name(value: &serde_yaml::Value) -> &'static str {
    use serde_yaml::Value as Y;
    match value {
        Y::Null => "null",
        Y::Bool(_) => "boolean",
        Y::Number(_) => "number",
        Y::String(_) => "string",
        Y::Sequence(_) => "sequence",
        Y::Mapping(_) => "mapping",
        Y::Tagged(_) => "tagged value",
    }
}

fn join_key(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Replace every TOML datetime in the tree with its string form.
///
/// Typed structs read dates as strings; a native TOML datetime would
/// otherwise fail to deserialize into a `String` field.
pub fn stringify_datetimes(value: &mut toml::Value) {
    match value {
        toml::Value::Datetime(dt) => *value = toml::Value::String(dt.to_string()),
        toml::Value::Array(items) => items.iter_mut().for_each(stringify_datetimes),
        toml::Value::Table(table) => table.iter_mut().for_each(|(_, v)| stringify_datetimes(v)),
        _ => {}
    }
}
