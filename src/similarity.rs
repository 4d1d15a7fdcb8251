//! Cosine similarity over unit-normalized embeddings.

/// Embedding vector (512-dimensional for CLIP ViT-B/32)
pub type Embedding = Vec<f32>;

/// Scale a vector in place to unit L2 norm. Zero vectors are left untouched.
pub fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Cosine similarity between two pre-normalized embeddings.
///
/// Both inputs must already be unit length, so this is a plain dot product.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Score one query against every candidate, preserving candidate order.
pub fn scores(query: &[f32], candidates: &[Embedding]) -> Vec<f32> {
    candidates
        .iter()
        .map(|candidate| cosine_similarity(query, candidate))
        .collect()
}

/// Index and value of the highest score. Ties go to the first index.
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;

    for (idx, &score) in scores.iter().enumerate() {
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((idx, score)),
        }
    }

    best
}

/// Indices of all scores strictly above `cutoff`, in order.
pub fn above(scores: &[f32], cutoff: f32) -> Vec<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|(_, score)| **score > cutoff)
        .map(|(idx, _)| idx)
        .collect()
}
