/// Fixed-dimension appearance feature vector.
///
/// L2-norm is `1 ± 1e-3` when `valid`; invalid embeddings (degenerate
/// crops) carry whatever the embedder returned and are skipped by
/// similarity math rather than inspected.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding {
    values: Vec<f32>,
    pub valid: bool,
}

const NORM_TOLERANCE: f32 = 1e-3;

impl Embedding {
    /// Build from raw values, L2-normalizing in place. `valid` reflects
    /// the caller's judgement about the source crop, not the arithmetic
    /// here (a degenerate all-zero vector is still marked invalid by the
    /// caller, since normalizing it would be undefined).
    pub fn new(mut values: Vec<f32>, valid: bool) -> Self {
        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if valid && norm > f32::EPSILON {
            for v in values.iter_mut() {
                *v /= norm;
            }
        }
        Self { values, valid }
    }

    pub fn invalid(dim: usize) -> Self {
        Self {
            values: vec![0.0; dim],
            valid: false,
        }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn is_unit_norm(&self) -> bool {
        let norm = self.values.iter().map(|v| v * v).sum::<f32>().sqrt();
        (norm - 1.0).abs() <= NORM_TOLERANCE
    }

    /// Cosine similarity. Returns `None` if dimensions differ or either
    /// input is invalid, rather than comparing mismatched vectors.
    pub fn cosine_similarity(&self, other: &Embedding) -> Option<f32> {
        if self.dim() != other.dim() || !self.valid || !other.valid {
            return None;
        }
        let dot: f32 = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum();
        let na = self.values.iter().map(|v| v * v).sum::<f32>().sqrt();
        let nb = other.values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if na <= f32::EPSILON || nb <= f32::EPSILON {
            return None;
        }
        Some((dot / (na * nb)).clamp(-1.0, 1.0))
    }

    /// Running-mean update re-normalised to unit length:
    /// `(n*c + e) / (n+1)`, then renormalised.
    pub fn running_mean_update(centroid: &Embedding, member_count: usize, new_member: &Embedding) -> Embedding {
        debug_assert_eq!(centroid.dim(), new_member.dim());
        let n = member_count as f32;
        let combined: Vec<f32> = centroid
            .values
            .iter()
            .zip(new_member.values.iter())
            .map(|(c, e)| (n * c + e) / (n + 1.0))
            .collect();
        Embedding::new(combined, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_to_unit_length() {
        let e = Embedding::new(vec![3.0, 4.0], true);
        assert!(e.is_unit_norm());
    }

    #[test]
    fn self_similarity_is_one() {
        let e = Embedding::new(vec![1.0, 2.0, 3.0], true);
        let sim = e.cosine_similarity(&e).unwrap();
        assert!((sim - 1.0).abs() < 1e-5, "sim={sim}");
    }

    #[test]
    fn dimension_mismatch_returns_none() {
        let a = Embedding::new(vec![1.0, 0.0], true);
        let b = Embedding::new(vec![1.0, 0.0, 0.0], true);
        assert_eq!(a.cosine_similarity(&b), None);
    }

    #[test]
    fn invalid_embeddings_are_skipped() {
        let a = Embedding::invalid(4);
        let b = Embedding::new(vec![1.0, 0.0, 0.0, 0.0], true);
        assert_eq!(a.cosine_similarity(&b), None);
    }

    proptest::proptest! {
        #[test]
        fn prop_self_similarity_idempotent(v in proptest::collection::vec(-10.0f32..10.0, 2..8)) {
            let sum_sq: f32 = v.iter().map(|x| x * x).sum();
            if sum_sq > 1e-6 {
                let e = Embedding::new(v, true);
                let sim = e.cosine_similarity(&e).unwrap();
                proptest::prop_assert!((sim - 1.0).abs() < 1e-3);
            }
        }
    }
}
