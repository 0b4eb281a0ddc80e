//! Partial attribute lookup
//!
//! Users name cards by a fragment of their title or id. A term is treated
//! as a case-insensitive regular expression and falls back to a literal
//! match when it does not parse as one.

use regex::{Regex, RegexBuilder};
use serde_yml::Value;

use crate::core::error::{KoodError, Result};
use crate::core::store::{to_record, Entity, Tracked};

/// Split a compound attribute name: `"id_or_title"` → `["id", "title"]`
pub fn attribute_names(compound: &str) -> Vec<&str> {
    compound.split("_or_").filter(|s| !s.is_empty()).collect()
}

/// Case-insensitive pattern for a user supplied search term
pub fn partial_pattern(term: &str) -> Result<Regex> {
    let build = |pattern: &str| RegexBuilder::new(pattern).case_insensitive(true).build();
    build(term)
        .or_else(|_| build(&regex::escape(term)))
        .map_err(|e| KoodError::validation("search", "term", e.to_string()))
}

/// Every candidate where one of `attributes` partially matches `term`
pub fn find_all_by_partial_attribute<T: Entity>(
    candidates: impl IntoIterator<Item = Tracked<T>>,
    attributes: &[&str],
    term: &str,
) -> Result<Vec<Tracked<T>>> {
    Ok(matches(candidates, attributes, term)?
        .into_iter()
        .map(|(candidate, _)| candidate)
        .collect())
}

/// One candidate matching `term`.
///
/// Exact (case-insensitive, whole value) matches win over partial ones.
/// With `unique`, anything other than a single winner is an error;
/// without it the first winner is returned.
pub fn find_by_partial_attribute<T: Entity>(
    candidates: impl IntoIterator<Item = Tracked<T>>,
    attributes: &[&str],
    term: &str,
    unique: bool,
) -> Result<Tracked<T>> {
    let (exact, partial): (Vec<_>, Vec<_>) = matches(candidates, attributes, term)?
        .into_iter()
        .partition(|(_, exact)| *exact);

    let winners = if exact.is_empty() { partial } else { exact };
    let mut pool: Vec<Tracked<T>> = winners
        .into_iter()
        .map(|(candidate, _)| candidate)
        .collect();

    match pool.len() {
        0 => Err(KoodError::not_found(T::KIND, term)),
        1 => Ok(pool.remove(0)),
        n if unique => Err(KoodError::MultipleDocumentsFound {
            kind: T::KIND,
            term: term.to_string(),
            matches: n,
        }),
        _ => Ok(pool.remove(0)),
    }
}

/// Matching candidates paired with whether the match was exact
fn matches<T: Entity>(
    candidates: impl IntoIterator<Item = Tracked<T>>,
    attributes: &[&str],
    term: &str,
) -> Result<Vec<(Tracked<T>, bool)>> {
    let pattern = partial_pattern(term)?;
    let needle = term.to_lowercase();

    let mut found = Vec::new();
    for candidate in candidates {
        let values = attribute_values(&*candidate, attributes)?;
        if values.iter().any(|v| pattern.is_match(v)) {
            let exact = values.iter().any(|v| v.to_lowercase() == needle);
            found.push((candidate, exact));
        }
    }
    Ok(found)
}

fn attribute_values<T: Entity>(entity: &T, attributes: &[&str]) -> Result<Vec<String>> {
    let record = to_record(entity)?;
    let mut values = Vec::new();
    for attribute in attributes {
        match record.get(*attribute) {
            Some(Value::Sequence(items)) => values.extend(items.iter().filter_map(scalar_text)),
            Some(value) => values.extend(scalar_text(value)),
            None => {}
        }
    }
    Ok(values)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Item {
        id: String,
        title: String,
        #[serde(default)]
        labels: Vec<String>,
    }

    impl Entity for Item {
        const KIND: &'static str = "card";

        fn id(&self) -> &str {
            &self.id
        }
    }

    fn items(titles: &[&str]) -> Vec<Tracked<Item>> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                Tracked::new(Item {
                    id: format!("id{}", i),
                    title: title.to_string(),
                    labels: vec!["bug".to_string()],
                })
            })
            .collect()
    }

    fn titles(found: &[Tracked<Item>]) -> Vec<&str> {
        found.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_attribute_names() {
        assert_eq!(attribute_names("id_or_title"), vec!["id", "title"]);
        assert_eq!(attribute_names("title"), vec!["title"]);
        assert_eq!(attribute_names("a_or_b_or_c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_find_all_is_case_insensitive() {
        let found = find_all_by_partial_attribute(items(&["Foo", "bar", "FOOD"]), &["title"], "foo")
            .unwrap();
        assert_eq!(titles(&found), vec!["Foo", "FOOD"]);
    }

    #[test]
    fn test_find_all_over_several_attributes() {
        let found =
            find_all_by_partial_attribute(items(&["alpha", "beta"]), &["id", "title"], "id1").unwrap();
        assert_eq!(titles(&found), vec!["beta"]);
    }

    #[test]
    fn test_find_all_matches_sequence_elements() {
        let found = find_all_by_partial_attribute(items(&["alpha"]), &["labels"], "^bug$").unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_invalid_regex_falls_back_to_literal() {
        let found = find_all_by_partial_attribute(items(&["fix (urgent", "other"]), &["title"], "(urgent")
            .unwrap();
        assert_eq!(titles(&found), vec!["fix (urgent"]);
    }

    #[test]
    fn test_partial_match_disambiguation() {
        let candidates = || items(&["foo", "fooo!"]);
        let attrs = attribute_names("id_or_title");

        // "fo" matches both partially and neither exactly
        let err = find_by_partial_attribute(candidates(), &attrs, "fo", true).unwrap_err();
        assert!(matches!(err, KoodError::MultipleDocumentsFound { matches: 2, .. }));

        // "foo" matches both partially but only one exactly
        let found = find_by_partial_attribute(candidates(), &attrs, "foo", true).unwrap();
        assert_eq!(found.title, "foo");

        let found = find_by_partial_attribute(candidates(), &attrs, "fooo!", true).unwrap();
        assert_eq!(found.title, "fooo!");
    }

    #[test]
    fn test_non_unique_takes_first_match() {
        let found = find_by_partial_attribute(items(&["foo", "fooo!"]), &["title"], "fo", false)
            .unwrap();
        assert_eq!(found.title, "foo");

        let found = find_by_partial_attribute(items(&["fooo!", "FOO"]), &["title"], "foo", false)
            .unwrap();
        assert_eq!(found.title, "FOO");
    }

    #[test]
    fn test_not_found() {
        let err = find_by_partial_attribute(items(&["foo"]), &["title"], "zzz", false).unwrap_err();
        assert!(matches!(err, KoodError::NotFound { kind: "card", .. }));
    }
}
