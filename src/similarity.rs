use std::collections::HashMap;

fn bigrams(value: &str) -> Vec<(char, char)> {
    let chars = value.chars().filter(|ch| !ch.is_whitespace()).collect::<Vec<_>>();
    chars.windows(2).map(|pair| (pair[0], pair[1])).collect()
}

/// Sørensen–Dice coefficient over character bigrams, ignoring whitespace.
///
/// Identical strings score 1; a string with fewer than two characters
/// scores 0 against anything else.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = bigrams(a);
    let right = bigrams(b);
    if a.chars().filter(|ch| !ch.is_whitespace()).eq(b.chars().filter(|ch| !ch.is_whitespace())) {
        return 1.0;
    }
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let mut counts: HashMap<(char, char), usize> = HashMap::new();
    for bigram in &left {
        *counts.entry(*bigram).or_insert(0) += 1;
    }
    let mut shared = 0_usize;
    for bigram in &right {
        if let Some(count) = counts.get_mut(bigram)
            && *count > 0
        {
            *count -= 1;
            shared += 1;
        }
    }

    (2 * shared) as f64 / (left.len() + right.len()) as f64
}

/// Upper bound of [`similarity`] given only the character counts, used to
/// skip candidates that cannot reach `threshold`.
pub(crate) fn could_reach(a_chars: usize, b_chars: usize, threshold: f64) -> bool {
    let a = a_chars.saturating_sub(1);
    let b = b_chars.saturating_sub(1);
    if a == 0 || b == 0 {
        return false;
    }
    (2 * a.min(b)) as f64 / (a + b) as f64 >= threshold
}
