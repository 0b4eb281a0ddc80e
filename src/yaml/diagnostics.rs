//! Diagnostics for stored documents that fail to decode

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// A stored document could not be encoded or decoded.
///
/// The parser message is always kept. When the YAML parser reports a
/// location, the error also carries the document text so miette can point
/// at the offending line of a hand-edited file.
#[derive(Debug, Error, Diagnostic)]
#[error("malformed document: {message}")]
#[diagnostic(code(kood::codec))]
pub struct CodecError {
    message: String,

    #[source_code]
    src: Option<NamedSource<String>>,

    #[label("here")]
    span: Option<SourceSpan>,

    #[help]
    help: Option<String>,

    document: Option<String>,
    line: Option<usize>,
}

impl CodecError {
    /// An error without a source location
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let help = generate_help(&message);
        Self {
            message,
            src: None,
            span: None,
            help,
            document: None,
            line: None,
        }
    }

    /// Wrap a YAML parser error. `line_offset` is the number of document
    /// lines preceding the parsed block (the opening delimiter of a front
    /// matter block).
    pub fn from_yaml(err: &serde_yml::Error, document: &str, line_offset: usize) -> Self {
        let mut error = Self::new(err.to_string());
        if let Some(location) = err.location() {
            let line = location.line() + line_offset;
            let offset = offset_of(document, line, location.column());
            error.line = Some(line);
            error.span = Some(SourceSpan::from(offset..offset.saturating_add(1).min(document.len())));
            error.src = Some(NamedSource::new("document", document.to_string()));
            error.document = Some(document.to_string());
        }
        error
    }

    /// Name the file the document was read from
    pub fn in_file(mut self, name: &str) -> Self {
        if let Some(document) = &self.document {
            self.src = Some(NamedSource::new(name, document.clone()));
        }
        self
    }

    /// The underlying parser message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// One-based line of the failure within the whole document, if known
    pub fn line(&self) -> Option<usize> {
        self.line
    }
}

/// Byte offset of a one-based line/column pair
fn offset_of(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len())
}

fn generate_help(message: &str) -> Option<String> {
    let msg_lower = message.to_lowercase();

    if msg_lower.contains("tab") {
        return Some("YAML requires spaces for indentation, not tabs.".to_string());
    }

    if msg_lower.contains("duplicate") {
        return Some("Each attribute can only appear once in a card or list file.".to_string());
    }

    if msg_lower.contains("mapping values are not allowed") {
        return Some(
            "Values containing ':' need quotes, e.g. title: \"Release: v2\"".to_string(),
        );
    }

    if msg_lower.contains("missing field") {
        return Some("A required attribute was removed from the file.".to_string());
    }

    None
}
