use crate::address::fold_text;

/// Order-insensitive word-overlap score in [0, 1].
///
/// Both inputs are folded (lowercase, no diacritics, punctuation removed) and
/// split on whitespace. A token of `a` counts as matched when it is a
/// substring or superstring of any token of `b`. The score is
/// `matched / max(len(a), len(b))`; identical folded strings score 1.0 and an
/// empty side scores 0.0.
///
/// This is a cheap heuristic, not an edit distance. Short or common tokens
/// (house numbers, `ulica`) can inflate scores between unrelated addresses.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = fold_text(a);
    let b = fold_text(b);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let tokens_a: Vec<&str> = a.split_whitespace().collect();
    let tokens_b: Vec<&str> = b.split_whitespace().collect();

    let matched = tokens_a
        .iter()
        .filter(|ta| {
            tokens_b
                .iter()
                .any(|tb| tb.contains(**ta) || ta.contains(*tb))
        })
        .count();

    let denominator = tokens_a.len().max(tokens_b.len());
    matched as f64 / denominator as f64
}
