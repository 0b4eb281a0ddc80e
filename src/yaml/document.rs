//! Front-matter document codec
//!
//! A record carrying a body is stored as a YAML block between two `---`
//! lines, a blank separator line and then the body verbatim:
//!
//! ```text
//! ---
//! id: 01J...
//! title: Sample card
//! ---
//!
//! Body text
//! ```
//!
//! A record without a body is stored as a plain YAML mapping.

use serde_yml::{Mapping, Value};

use super::diagnostics::CodecError;

/// Attribute name → value mapping, in insertion order
pub type Record = Mapping;

/// Attribute that holds the document body
pub const BODY_KEY: &str = "content";

const DELIMITER: &str = "---";

/// Serialize a record into document text
pub fn encode(record: &Record) -> Result<String, CodecError> {
    let mut metadata = record.clone();
    match metadata.remove(BODY_KEY) {
        Some(body) => {
            let yaml = to_yaml(&metadata)?;
            let body = body_text(&body)?;
            Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n\n{body}"))
        }
        None => to_yaml(&metadata),
    }
}

/// Parse document text into a record
pub fn decode(text: &str) -> Result<Record, CodecError> {
    match split_front_matter(text) {
        Some((metadata, body)) => {
            let mut record = parse_mapping(metadata, text, 1)?;
            record.insert(
                Value::String(BODY_KEY.to_string()),
                Value::String(body.to_string()),
            );
            Ok(record)
        }
        None => parse_mapping(text, text, 0),
    }
}

/// Split `text` into (metadata, body) when it opens with a delimiter line
/// and a later delimiter line closes the block.
fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let mut lines = text.split_inclusive('\n');
    let opening = lines.next()?;
    if !is_delimiter(opening) {
        return None;
    }

    let start = opening.len();
    let mut offset = start;
    for line in lines {
        if is_delimiter(line) {
            let metadata = &text[start..offset];
            let rest = &text[offset + line.len()..];
            let body = rest
                .strip_prefix("\r\n")
                .or_else(|| rest.strip_prefix('\n'))
                .unwrap_or(rest);
            return Some((metadata, body));
        }
        offset += line.len();
    }
    None
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

fn parse_mapping(yaml: &str, document: &str, line_offset: usize) -> Result<Record, CodecError> {
    match serde_yml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(mapping)) => Ok(mapping),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(other) => Err(CodecError::new(format!(
            "expected a mapping of attributes, found {}",
            value_kind(&other)
        ))),
        Err(e) => Err(CodecError::from_yaml(&e, document, line_offset)),
    }
}

fn to_yaml(mapping: &Mapping) -> Result<String, CodecError> {
    serde_yml::to_string(mapping).map_err(|e| CodecError::new(e.to_string()))
}

fn body_text(body: &Value) -> Result<String, CodecError> {
    match body {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => to_yaml_scalar(other),
    }
}

fn to_yaml_scalar(value: &Value) -> Result<String, CodecError> {
    serde_yml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .map_err(|e| CodecError::new(e.to_string()))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
