//! Content-based review deduplication.
//!
//! The scraping backend observes the same review through different
//! extraction paths (truncated vs "More..."-expanded text, basic vs
//! extended review sets). Reviews are collapsed by a signature derived
//! from author, rating, date text, and a text prefix; the prefix stops
//! at 50 characters because expanded variants diverge beyond it.

use std::collections::HashMap;

use platewatch_common::RawReview;

/// Lowercase and collapse all whitespace runs to single spaces.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Content signature: `author|rating|date|text_prefix`.
pub fn signature(review: &RawReview) -> String {
    let author = normalize(&review.author);
    let date = normalize(&review.date_text);
    let prefix: String = normalize(&review.text).chars().take(50).collect();
    format!("{author}|{rating}|{date}|{prefix}", rating = review.rating)
}

/// Deterministic display/lookup id for a signature. FNV-1a, stable
/// across runs on identical input. Not a security boundary: hash
/// collisions are tolerated.
pub fn signature_id(sig: &str) -> String {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in sig.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("{hash:016x}")
}

/// Collapse near-duplicate reviews into a canonical set.
///
/// Reviews sharing a signature are the same review seen twice; the
/// variant with the longer text wins (more complete), equal lengths
/// keep the first seen. Reviews without a source-provided id get a
/// deterministic id derived from the signature. Output order is not
/// guaranteed. Idempotent.
pub fn dedupe(reviews: Vec<RawReview>) -> Vec<RawReview> {
    let mut by_signature: HashMap<String, RawReview> = HashMap::new();

    for mut review in reviews {
        let sig = signature(&review);
        if review.review_id.is_empty() {
            review.review_id = signature_id(&sig);
        }

        match by_signature.get(&sig) {
            Some(existing) if review.text.len() <= existing.text.len() => {}
            _ => {
                by_signature.insert(sig, review);
            }
        }
    }

    by_signature.into_values().collect()
}
