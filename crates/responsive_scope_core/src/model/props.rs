//! Fragment props blob and host asset declarations.
//!
//! # Responsibility
//! - Parse the per-fragment `props` JSON (`type`, `id`, `script`).
//! - Classify configured style/script entries as URL or inline source.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

static URL_ASSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://").expect("valid asset url regex"));

/// Per-fragment props declared by markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentProps {
    pub kind: Option<String>,
    pub id: Option<String>,
    pub script: Option<String>,
}

impl FragmentProps {
    /// Parses a props blob. Blank input and `null` mean "no props".
    ///
    /// Scalar ids (`"id": 7`) are accepted and kept in string form.
    pub fn parse(raw: &str) -> Result<Self, PropsError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let value: Value =
            serde_json::from_str(trimmed).map_err(|err| PropsError::Malformed(err.to_string()))?;
        let mut fields = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(fields) => fields,
            other => return Err(PropsError::NotAnObject(other.to_string())),
        };
        Ok(Self {
            kind: fields.remove("type").and_then(scalar_to_string),
            id: fields.remove("id").and_then(scalar_to_string),
            script: fields.remove("script").and_then(scalar_to_string),
        })
    }

    /// Classes added to the fragment root: `type` split on whitespace.
    pub fn root_classes(&self) -> Vec<String> {
        self.kind
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Element id for the fragment root, when a non-empty `id` is declared.
    pub fn root_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Props parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropsError {
    Malformed(String),
    NotAnObject(String),
}

impl Display for PropsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(message) => write!(f, "fragment props are malformed: {message}"),
            Self::NotAnObject(value) => write!(f, "fragment props must be an object: {value}"),
        }
    }
}

impl Error for PropsError {}

/// Source kind of one configured style or script entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSource {
    Url,
    Inline,
}

/// One classified style or script entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetItem {
    pub source: AssetSource,
    pub body: String,
}

pub fn classify_asset(body: &str) -> AssetSource {
    if URL_ASSET_RE.is_match(body) {
        AssetSource::Url
    } else {
        AssetSource::Inline
    }
}

pub fn classify_assets(entries: &[String]) -> Vec<AssetItem> {
    entries
        .iter()
        .map(|body| AssetItem {
            source: classify_asset(body),
            body: body.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{classify_asset, classify_assets, AssetSource, FragmentProps, PropsError};

    #[test]
    fn parses_full_props() {
        let props = FragmentProps::parse(r#"{"type":"card wide","id":"7","script":"init()"}"#)
            .expect("props should parse");
        assert_eq!(props.root_classes(), vec!["card".to_string(), "wide".to_string()]);
        assert_eq!(props.root_id(), Some("7"));
        assert_eq!(props.script.as_deref(), Some("init()"));
    }

    #[test]
    fn blank_and_null_props_are_empty() {
        assert_eq!(
            FragmentProps::parse("  ").expect("blank props"),
            FragmentProps::default()
        );
        assert_eq!(
            FragmentProps::parse("null").expect("null props"),
            FragmentProps::default()
        );
    }

    #[test]
    fn numeric_id_is_kept_and_empty_id_is_ignored() {
        let props = FragmentProps::parse(r#"{"id":42}"#).expect("numeric id should parse");
        assert_eq!(props.root_id(), Some("42"));
        assert!(props.root_classes().is_empty());

        let props = FragmentProps::parse(r#"{"type":"  ","id":""}"#).expect("props should parse");
        assert_eq!(props.root_id(), None);
        assert!(props.root_classes().is_empty());
    }

    #[test]
    fn rejects_malformed_props() {
        let err = FragmentProps::parse("{type: card").expect_err("malformed props must fail");
        assert!(matches!(err, PropsError::Malformed(_)));

        let err = FragmentProps::parse("[1, 2]").expect_err("array props must fail");
        assert!(matches!(err, PropsError::NotAnObject(_)));
    }

    #[test]
    fn classifies_url_and_inline_assets() {
        assert_eq!(
            classify_asset("https://cdn.example.com/a.css"),
            AssetSource::Url
        );
        assert_eq!(classify_asset("http://localhost/a.js"), AssetSource::Url);
        assert_eq!(classify_asset(".card { color: red }"), AssetSource::Inline);
        assert_eq!(classify_asset("ftp://host/a.css"), AssetSource::Inline);

        let items = classify_assets(&["https://x/y.css".to_string(), "p{}".to_string()]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source, AssetSource::Url);
        assert_eq!(items[1].source, AssetSource::Inline);
    }
}
