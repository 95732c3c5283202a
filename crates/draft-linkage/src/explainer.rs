//! Explanation prompts and the content-hash cache keys.
//!
//! Explanations are cached by a hash of the linked pair's texts. Lookups
//! try both orderings so a pair explained as (A, B) is found again when the
//! similarity computation enumerates it as (B, A).

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use draft_core::defaults;

/// Content hash key for an ordered pair of node texts.
///
/// A record-separator byte between the texts keeps ("ab", "c") and
/// ("a", "bc") from colliding.
pub fn pair_hash(text_a: &str, text_b: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text_a.as_bytes());
    hasher.update([0x1e]);
    hasher.update(text_b.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Look up a cached explanation under either ordering of the pair.
pub fn cached_explanation<'a>(
    explainers: &'a HashMap<String, String>,
    text_a: &str,
    text_b: &str,
) -> Option<&'a String> {
    explainers
        .get(&pair_hash(text_a, text_b))
        .or_else(|| explainers.get(&pair_hash(text_b, text_a)))
}

/// System message for explanation generation.
pub const EXPLAIN_SYSTEM: &str =
    "You are a concise writing assistant. Answer in a single sentence.";

/// Build the prompt asking for the common thread between two idea texts.
///
/// Long texts are truncated to keep the prompt bounded.
pub fn explanation_prompt(text_a: &str, text_b: &str) -> String {
    let preview = |text: &str| -> String {
        text.chars().take(defaults::EXPLAIN_TEXT_PREVIEW).collect()
    };
    format!(
        r#"A writer has two ideas that appear to be related. Describe the common thread between them in one short sentence, without restating either idea.

Idea one:
{}

Idea two:
{}"#,
        preview(text_a),
        preview(text_b)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_order_sensitive() {
        let fwd = pair_hash("apples", "bananas");
        let rev = pair_hash("bananas", "apples");
        assert_ne!(fwd, rev);
        assert!(fwd.starts_with("sha256:"));
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(pair_hash("a", "b"), pair_hash("a", "b"));
    }

    #[test]
    fn separator_prevents_concatenation_collisions() {
        assert_ne!(pair_hash("ab", "c"), pair_hash("a", "bc"));
    }

    #[test]
    fn cache_lookup_tries_both_orders() {
        let mut explainers = HashMap::new();
        explainers.insert(
            pair_hash("apples", "bananas"),
            "Both are fruit.".to_string(),
        );

        assert_eq!(
            cached_explanation(&explainers, "apples", "bananas").map(String::as_str),
            Some("Both are fruit.")
        );
        // Reverse order finds the same entry
        assert_eq!(
            cached_explanation(&explainers, "bananas", "apples").map(String::as_str),
            Some("Both are fruit.")
        );
        assert!(cached_explanation(&explainers, "apples", "rockets").is_none());
    }

    #[test]
    fn prompt_truncates_long_texts() {
        let long = "x".repeat(defaults::EXPLAIN_TEXT_PREVIEW * 2);
        let prompt = explanation_prompt(&long, "short");
        assert!(prompt.len() < long.len() + 500);
        assert!(prompt.contains("short"));
    }
}
