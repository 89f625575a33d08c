//! Embedding distance strategies.

/// Strategy for measuring the distance between two embeddings.
///
/// Implementations must be total: comparing embeddings of mismatched
/// dimensionality is a policy decision, never an error.
pub trait DistanceMetric: Send + Sync {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64;
}

/// Euclidean distance over the common prefix of the two vectors.
///
/// Embeddings from different models can legitimately disagree on length;
/// this policy truncates both to the shorter length before comparing.
/// Truncation changes the effective metric — it is an approximation that
/// keeps mixed-model galleries comparable, not a claim of metric
/// equivalence. An empty common prefix yields `f64::INFINITY` so such a
/// pair can never win a match.
#[derive(Debug, Clone, Copy, Default)]
pub struct TruncatedEuclidean;

impl DistanceMetric for TruncatedEuclidean {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let common = a.len().min(b.len());
        if common == 0 {
            return f64::INFINITY;
        }
        if a.len() != b.len() {
            tracing::debug!(
                left = a.len(),
                right = b.len(),
                truncated_to = common,
                "embedding dimension mismatch, comparing common prefix"
            );
        }
        a[..common]
            .iter()
            .zip(&b[..common])
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    }
}
