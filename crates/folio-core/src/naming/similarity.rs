use crate::config::MatchThresholds;

/// Ratcliff–Obershelp similarity: `2·M / (|a| + |b|)`, where M counts the
/// characters of the longest common substring plus, recursively, the
/// matches on either side of it.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, k) = longest_common_substring(a, b);
    if k == 0 {
        return 0;
    }
    k + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + k..], &b[j + k..])
}

/// Returns `(start_a, start_b, len)`; the earliest match wins ties.
fn longest_common_substring(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    if a.is_empty() || b.is_empty() {
        return best;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        for j in 0..b.len() {
            row[j + 1] = if a[i] == b[j] { prev[j] + 1 } else { 0 };
            if row[j + 1] > best.2 {
                best = (i + 1 - row[j + 1], j + 1 - row[j + 1], row[j + 1]);
            }
        }
        std::mem::swap(&mut prev, &mut row);
    }
    best
}

fn containment_ratio(a: &str, b: &str) -> Option<f64> {
    if a.starts_with(b) || b.starts_with(a) {
        let la = a.chars().count() as f64;
        let lb = b.chars().count() as f64;
        Some(la.min(lb) / la.max(lb))
    } else {
        None
    }
}

/// Name score used when routing a placement. Both inputs are cleaned names.
/// Exact is 1.0, prefix containment scores by length ratio, anything else
/// scores its sequence ratio only above the configured floor.
pub fn placement_score(suggested: &str, candidate: &str, thresholds: &MatchThresholds) -> f64 {
    if suggested.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    if suggested == candidate {
        return 1.0;
    }
    if let Some(ratio) = containment_ratio(suggested, candidate) {
        return ratio;
    }
    let ratio = sequence_ratio(suggested, candidate);
    if ratio > thresholds.placement_sequence {
        ratio
    } else {
        0.0
    }
}

/// Whether two cleaned folder names belong in the same merge group.
pub fn cluster_similar(a: &str, b: &str, thresholds: &MatchThresholds) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    if let Some(ratio) = containment_ratio(a, b) {
        if ratio > thresholds.cluster_containment {
            return true;
        }
    }
    sequence_ratio(a, b) > thresholds.cluster_sequence
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_sequence_ratio_known_values() {
        assert!(approx(sequence_ratio("abcd", "bcde"), 0.75));
        assert!(approx(sequence_ratio("acme", "acne"), 0.75));
        assert!(approx(sequence_ratio("same", "same"), 1.0));
        assert!(approx(sequence_ratio("abc", "xyz"), 0.0));
        assert!(approx(sequence_ratio("", ""), 1.0));
        assert!(approx(sequence_ratio("abc", ""), 0.0));
    }

    #[test]
    fn test_sequence_ratio_is_symmetric_for_simple_inputs() {
        assert!(approx(
            sequence_ratio("invoices", "invoice"),
            sequence_ratio("invoice", "invoices")
        ));
    }

    #[test]
    fn test_placement_score() {
        let t = MatchThresholds::default();
        assert!(approx(placement_score("acme", "acme", &t), 1.0));
        assert!(approx(placement_score("acme", "acme corp", &t), 4.0 / 9.0));
        assert!(approx(placement_score("acme", "acne", &t), 0.75));
        assert!(approx(placement_score("acme", "zebra", &t), 0.0));
        assert!(approx(placement_score("", "acme", &t), 0.0));
    }

    #[test]
    fn test_cluster_similar() {
        let t = MatchThresholds::default();
        assert!(cluster_similar("projx", "projx", &t));
        assert!(cluster_similar("report", "reports", &t));
        assert!(cluster_similar("invoices", "invoice", &t));
        // prefix, but too short relative to the other name
        assert!(!cluster_similar("ab", "abcdefghijk", &t));
        assert!(!cluster_similar("photos", "invoices", &t));
        assert!(!cluster_similar("", "", &t));
    }
}
