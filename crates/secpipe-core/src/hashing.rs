//! Content-addressing primitives.
//!
//! Every artifact type (documents, prompts, model configs, generated
//! content) is identified by the SHA-256 hex digest of a canonical byte
//! representation. This module owns the canonicalization rules so that
//! every store computes hashes the same way.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of arbitrary content. This is the primary
/// logical key for every hash-addressed artifact.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// First 12 hex characters of a content hash, used for human-facing URLs.
/// Ambiguous prefixes (matching more than one row) must be rejected by the
/// caller; this module only does the truncation.
pub fn short_hash(full_hash: &str) -> &str {
    &full_hash[..full_hash.len().min(12)]
}

/// Canonical content for a model configuration: `{"model": ..., "options_json": ...}`
/// where `options_json` is itself a canonical (sorted-key) JSON encoding of the
/// options object. Hashing this string yields the ModelConfig's content_hash.
pub fn canonical_model_config(model: &str, options: &serde_json::Value) -> (String, String) {
    let options_json = canonical_json(options);
    let envelope = serde_json::json!({
        "model": model,
        "options_json": options_json,
    });
    let canonical = canonical_json(&envelope);
    (options_json, canonical)
}

/// Render a `serde_json::Value` with object keys sorted recursively, matching
/// Python's `json.dumps(..., sort_keys=True)` used by the original ingestion
/// tooling. This is what makes JSON-keyed content hashes reproducible.
pub fn canonical_json(value: &serde_json::Value) -> String {
    let sorted = sort_value(value);
    serde_json::to_string(&sorted).expect("serializing a Value cannot fail")
}

fn sort_value(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut sorted = serde_json::Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                sorted.insert(key.clone(), sort_value(&map[key]));
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(sort_value).collect())
        }
        other => other.clone(),
    }
}

/// Canonical content for a prompt directory: `prompt.md` stripped, followed
/// by each `examples/*.md` file (sorted by filename) stripped and joined
/// with a blank line, mirroring the on-disk layout described in the spec.
pub fn canonical_prompt_content(prompt_md: &str, examples: &[String]) -> String {
    let mut content = prompt_md.trim().to_string();
    for example in examples {
        content.push_str("\n\n");
        content.push_str(example.trim());
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_hashes_deterministically() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn same_content_hashes_the_same() {
        assert_eq!(content_hash("hello world"), content_hash("hello world"));
        assert_ne!(content_hash("hello world"), content_hash("hello world!"));
    }

    #[test]
    fn canonical_json_sorts_keys_recursively() {
        let a = serde_json::json!({"b": 1, "a": {"d": 2, "c": 3}});
        let b = serde_json::json!({"a": {"c": 3, "d": 2}, "b": 1});
        assert_eq!(canonical_json(&a), canonical_json(&b));
    }

    #[test]
    fn model_config_hash_ignores_key_order() {
        let opts_a = serde_json::json!({"temperature": 0.2, "max_tokens": 2048});
        let opts_b = serde_json::json!({"max_tokens": 2048, "temperature": 0.2});
        let (_, hash_a) = canonical_model_config("claude-haiku-4-5-20251001", &opts_a);
        let (_, hash_b) = canonical_model_config("claude-haiku-4-5-20251001", &opts_b);
        assert_eq!(hash_a, hash_b);
    }

    #[test]
    fn prompt_content_joins_sorted_examples_with_blank_line() {
        let content = canonical_prompt_content(
            " Be concise. \n",
            &["Example two.".to_string(), "Example one.".to_string()],
        );
        assert_eq!(content, "Be concise.\n\nExample two.\n\nExample one.");
    }
}
