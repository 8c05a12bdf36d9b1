use std::cmp::Ordering;

/// Cosine similarity in `[-1, 1]`. Zero-magnitude (or mismatched) inputs score 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() { return 0.0; }
    let mut dot = 0f32; let mut na = 0f32; let mut nb = 0f32;
    for (x, y) in a.iter().zip(b) { dot += x * y; na += x * x; nb += y * y; }
    if na == 0.0 || nb == 0.0 { return 0.0; }
    (dot / (na.sqrt() * nb.sqrt())).clamp(-1.0, 1.0)
}

/// Score every candidate against `query` and keep the `k` best as
/// `(position, similarity)`, best first. The sort is stable, so equal scores
/// keep insertion order.
pub fn rank_top_k<'a, I>(query: &[f32], candidates: I, k: usize) -> Vec<(usize, f32)>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut scored: Vec<(usize, f32)> = candidates.into_iter().enumerate().map(|(i, v)| (i, cosine(query, v))).collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_vector_scores_zero() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine(&[], &[]), 0.0);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let vs: Vec<Vec<f32>> = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]];
        let ranked = rank_top_k(&[1.0, 0.0], vs.iter().map(Vec::as_slice), 3);
        assert_eq!(ranked.iter().map(|r| r.0).collect::<Vec<_>>(), vec![0, 2, 1]);
    }
}
