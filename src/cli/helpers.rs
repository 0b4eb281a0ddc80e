//! Shared helper functions for CLI commands
//!
//! Error reporting, success lines and the parsing of attribute values given
//! on the command line.

use console::style;
use miette::Diagnostic;

use crate::core::{Context, KoodError, Settings};
use crate::entities::AttrValue;

/// Open the storage for a command, creating it on first use
pub fn open_context() -> miette::Result<Context> {
    Context::open(Settings::load()).map_err(report)
}

/// Turn a core error into the report shown to the user.
///
/// Codec errors keep their source snippet; everything else becomes a
/// one-line message, with the error's help text when it has one.
pub fn report(err: KoodError) -> miette::Report {
    tracing::debug!(error = ?err, "command failed");
    match err {
        KoodError::Codec(e) => miette::Report::new(e),
        other => {
            let message = user_message(&other);
            match other.help() {
                Some(help) => miette::miette!(help = help.to_string(), "{}", message),
                None => miette::miette!("{}", message),
            }
        }
    }
}

/// Message printed for a failed command
pub fn user_message(err: &KoodError) -> String {
    match err {
        KoodError::NotFound { kind, .. } => format!("The specified {} does not exist.", kind),
        KoodError::NotUnique { kind, .. } => format!("A {} with this ID already exists.", kind),
        KoodError::MultipleDocumentsFound { kind, .. } => {
            format!("Multiple {}s match the given criteria.", kind)
        }
        KoodError::Validation { kind, field: "id", .. } => {
            format!("{} ID is invalid.", capitalize(kind))
        }
        KoodError::Validation {
            kind,
            field,
            message,
        } => format!(
            "Invalid {} {}: {}.",
            kind,
            humanize(field).to_lowercase(),
            message
        ),
        KoodError::NoCurrentBoard => "No board has been selected yet.".to_string(),
        other => other.to_string(),
    }
}

/// Print a success line
pub fn success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Parse a command-line value, preferring integers, then floats, then text
pub fn try_convert(raw: &str) -> AttrValue {
    if let Ok(i) = raw.parse::<i64>() {
        return AttrValue::Integer(i);
    }
    // Rust accepts "inf" and "NaN" as floats; those stay text
    if raw.chars().any(|c| c.is_ascii_digit()) {
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() {
                return AttrValue::Float(f);
            }
        }
    }
    AttrValue::Text(raw.to_string())
}

/// Split `key:value` at the first colon
pub fn parse_assignment(raw: &str) -> Option<(&str, &str)> {
    let (key, value) = raw.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

/// `hello_world` → `Hello world`
pub fn humanize(key: &str) -> String {
    capitalize(&key.replace('_', " "))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Truncate a string to `max_len` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
