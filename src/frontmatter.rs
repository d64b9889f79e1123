//! YAML front matter extraction.
//!
//! A front matter block opens with a `---` line at the very start of the
//! document and closes with the next `---` line. Anything else is body.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::QuireError;

/// Known front matter fields plus whatever else the author wrote.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocMetadata {
    #[serde(default, deserialize_with = "scalar_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub description: Option<String>,
    /// `false` marks a draft.
    pub publish: Option<bool>,
    /// Explicit sibling position, overrides the title's numeric prefix.
    pub order: Option<i64>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub section: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "scalar_text")]
    pub doc_type: Option<String>,
    /// Unrecognized keys, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DocMetadata {
    pub fn is_published(&self) -> bool {
        self.publish.unwrap_or(true)
    }
}

/// Text field that also takes a number or boolean as written, so
/// `title: 2024` reads as `"2024"`.
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        Value::Number(number) => Ok(Some(number.to_string())),
        Value::Bool(flag) => Ok(Some(flag.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected text, found {}",
            kind_of(&other)
        ))),
    }
}

/// Split `raw` into metadata and body.
///
/// Never fails: a malformed block is logged and the whole of `raw` is
/// returned as body with empty metadata.
pub fn extract(raw: &str) -> (DocMetadata, String) {
    match try_extract(raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Ignoring malformed front matter: {e}");
            (DocMetadata::default(), raw.to_string())
        }
    }
}

fn try_extract(raw: &str) -> Result<(DocMetadata, String), QuireError> {
    let Some((yaml, body)) = split_block(raw) else {
        return Ok((DocMetadata::default(), raw.to_string()));
    };

    let body = body.trim_start_matches(['\r', '\n']).to_string();

    if yaml.trim().is_empty() {
        return Ok((DocMetadata::default(), body));
    }

    let metadata: DocMetadata = match serde_yaml::from_str::<Value>(yaml)? {
        Value::Object(map) => serde_json::from_value(Value::Object(map))?,
        // Empty block or comments only
        Value::Null => DocMetadata::default(),
        other => {
            return Err(QuireError::Source(format!(
                "front matter must be a mapping, found {}",
                kind_of(&other)
            )))
        }
    };

    Ok((metadata, body))
}

/// Locate the front matter block. Returns `(yaml, rest)`.
fn split_block(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix("---")?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
