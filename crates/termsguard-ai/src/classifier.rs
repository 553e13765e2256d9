//! Zero-shot noise classification for the relevance filter.

/// Candidate labels for the relevance gate, legal first.
pub const NOISE_LABELS: [&str; 2] = ["legal clause", "irrelevant noise"];

/// Scores `text` against free-form `labels`.
///
/// Returns `(label, score)` pairs ranked by descending score. Scores across
/// labels sum to 1. Callers treat any error as "keep the clause".
pub trait NoiseClassifier: Send + Sync {
    fn classify(&self, text: &str, labels: &[&str]) -> anyhow::Result<Vec<(String, f32)>>;
}

/// Softmax over raw per-label logits, paired back with labels and ranked.
pub fn rank_labels(labels: &[&str], logits: &[f32]) -> Vec<(String, f32)> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exp.iter().sum();

    let mut ranked: Vec<(String, f32)> = labels
        .iter()
        .zip(exp)
        .map(|(label, e)| (label.to_string(), if sum > 0.0 { e / sum } else { 0.0 }))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_softmax() {
        let ranked = rank_labels(&NOISE_LABELS, &[0.0, 2.0]);
        assert_eq!(ranked[0].0, "irrelevant noise");
        assert!((ranked[0].1 - 0.880_797).abs() < 1e-4);
        let total: f32 = ranked.iter().map(|(_, s)| s).sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn equal_logits_keep_label_order() {
        let ranked = rank_labels(&NOISE_LABELS, &[1.0, 1.0]);
        assert_eq!(ranked[0].0, "legal clause");
        assert_eq!(ranked[0].1, 0.5);
    }
}
