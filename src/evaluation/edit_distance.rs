use crate::evaluation::report::Metric;
use itertools::Itertools;
use ndarray::Array2;
use serde::Serialize;

/// Result of comparing one predicted character sequence against its ground truth.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct WordErrorRate {
    /// Edit distance as a percentage of the ground truth length.
    pub rate: Metric,
    /// Substitutions + insertions + deletions.
    pub distance: usize,
    /// Length of the ground truth.
    pub total: usize,
}

/// Levenshtein distance with unit costs for substitution, insertion and deletion.
pub fn levenshtein<T: PartialEq>(reference: &[T], hypothesis: &[T]) -> usize {
    let rows = reference.len() + 1;
    let cols = hypothesis.len() + 1;
    let mut d = Array2::<usize>::zeros((rows, cols));
    for j in 0..cols {
        d[[0, j]] = j;
    }
    for i in 0..rows {
        d[[i, 0]] = i;
    }
    for i in 1..rows {
        for j in 1..cols {
            d[[i, j]] = if reference[i - 1] == hypothesis[j - 1] {
                d[[i - 1, j - 1]]
            } else {
                let substitution = d[[i - 1, j - 1]] + 1;
                let insertion = d[[i, j - 1]] + 1;
                let deletion = d[[i - 1, j]] + 1;
                substitution.min(insertion).min(deletion)
            };
        }
    }
    d[[rows - 1, cols - 1]]
}

/// Computes the word error rate of `hypothesis` against `reference`.
///
/// An empty reference has no rate; its distance is still the hypothesis length.
pub fn word_error_rate<T: PartialEq>(reference: &[T], hypothesis: &[T]) -> WordErrorRate {
    let distance = levenshtein(reference, hypothesis);
    let total = reference.len();
    WordErrorRate {
        rate: Metric::ratio(distance * 100, total),
        distance,
        total,
    }
}

/// Bag-of-characters agreement between two plate strings.
///
/// Returns the ground truth length and the size of the multiset intersection, i.e. for every
/// character the smaller of its two occurrence counts. Position is ignored.
pub fn character_overlap(ground_truth: &str, predicted: &str) -> (usize, usize) {
    let predicted_counts = predicted.chars().counts();
    let correct = ground_truth
        .chars()
        .counts()
        .into_iter()
        .map(|(c, n)| n.min(predicted_counts.get(&c).copied().unwrap_or(0)))
        .sum();
    (ground_truth.chars().count(), correct)
}
