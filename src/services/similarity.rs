/// Title similarity in [0, 1], case-insensitive.
///
/// Exact matches score 1.0 and containment in either direction 0.9. When any
/// word (longer than one character) of `a` overlaps a word of `b`, the score
/// is 0.5 plus up to 0.4 for the share of overlapping words. Otherwise it is
/// the normalized Levenshtein similarity.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a = a.to_lowercase();
    let b = b.to_lowercase();

    if a == b {
        return 1.0;
    }
    if a.contains(&b) || b.contains(&a) {
        return 0.9;
    }

    let words_a = significant_words(&a);
    let words_b = significant_words(&b);

    let matched = words_a
        .iter()
        .filter(|wa| words_b.iter().any(|wb| wb.contains(*wa) || wa.contains(*wb)))
        .count();

    if matched > 0 {
        let longest = words_a.len().max(words_b.len()) as f64;
        return 0.5 + 0.4 * matched as f64 / longest;
    }

    let max_len = a.chars().count().max(b.chars().count()) as f64;
    1.0 - strsim::levenshtein(&a, &b) as f64 / max_len
}

fn significant_words(s: &str) -> Vec<&str> {
    s.split_whitespace()
        .filter(|w| w.chars().count() > 1)
        .collect()
}
