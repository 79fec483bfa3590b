//! IRI abbreviation for template-facing keys
//!
//! Templates address attributes by short names (`title`, `citeKey`, `id`)
//! rather than by the full IRIs the graph uses, so every key of a flattened
//! record is cut down to its last path or fragment segment.

use serde_json::{Map, Value};

/// Abbreviate a single key or identifier
///
/// "@id" -> "id"
/// "dct:title" -> "title"
/// "https://derwen.ai/ns/v1#citeKey" -> "citeKey"
pub fn abbrev_key(key: &str) -> &str {
    if let Some(rest) = key.strip_prefix('@') {
        return rest;
    }

    let key = last_segment(key, ':');
    let key = last_segment(key, '/');
    last_segment(key, '#')
}

fn last_segment(key: &str, sep: char) -> &str {
    match key.rfind(sep) {
        Some(pos) => &key[pos + sep.len_utf8()..],
        None => key,
    }
}

/// Abbreviate every key within a JSON value (recursive)
///
/// Values are left untouched unless they are themselves objects or arrays.
pub fn abbrev_iri(value: &Value) -> Value {
    match value {
        Value::Object(obj) => Value::Object(abbrev_map(obj)),
        Value::Array(arr) => Value::Array(arr.iter().map(abbrev_iri).collect()),
        other => other.clone(),
    }
}

/// Abbreviate the keys of a JSON object (recursive)
pub fn abbrev_map(obj: &Map<String, Value>) -> Map<String, Value> {
    obj.iter()
        .map(|(k, v)| (abbrev_key(k).to_string(), abbrev_iri(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_abbrev_key() {
        assert_eq!(abbrev_key("https://derwen.ai/ns/v1#citeKey"), "citeKey");
        assert_eq!(abbrev_key("@id"), "id");
        assert_eq!(abbrev_key("dct:title"), "title");
        assert_eq!(abbrev_key("http://purl.org/ontology/bibo/abstract"), "abstract");
        assert_eq!(abbrev_key("label"), "label");
    }

    #[test]
    fn test_abbrev_key_metadata_marker_wins() {
        // only the marker is stripped, the rest is kept verbatim
        assert_eq!(abbrev_key("@type"), "type");
        assert_eq!(abbrev_key("@http://x/y"), "http://x/y");
    }

    #[test]
    fn test_abbrev_iri_nested() {
        let value = json!({
            "@id": "https://example.org/article/1",
            "dct:title": "A Title",
            "http://purl.org/ontology/bibo/authorList": [
                {"@id": "https://example.org/person/a", "http://xmlns.com/foaf/0.1/name": "A"}
            ],
            "dct:isPartOf": {"@id": "https://example.org/journal"}
        });

        let abbreviated = abbrev_iri(&value);

        assert_eq!(abbreviated["id"], "https://example.org/article/1");
        assert_eq!(abbreviated["title"], "A Title");
        assert_eq!(abbreviated["authorList"][0]["name"], "A");
        // values are never abbreviated
        assert_eq!(abbreviated["isPartOf"]["id"], "https://example.org/journal");
    }

    #[test]
    fn test_abbrev_iri_scalars_pass_through() {
        assert_eq!(abbrev_iri(&json!("dct:title")), json!("dct:title"));
        assert_eq!(abbrev_iri(&json!(42)), json!(42));
        assert_eq!(abbrev_iri(&json!(null)), json!(null));
    }
}
