//! Cosine similarity and the upper-triangular pair matrix.

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when either vector has zero norm (or zero length).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Build the upper-triangular similarity matrix for a set of vectors.
///
/// Row `i` holds similarities against columns `i+1..n` as offsets: entry
/// `matrix[i][j]` is the similarity between node `i` and node `i + 1 + j`.
/// The last row is always empty.
pub fn build_similarity_matrix(vectors: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let n = vectors.len();
    let mut matrix = Vec::with_capacity(n);
    for i in 0..n {
        let mut row = Vec::with_capacity(n - i - 1);
        for j in (i + 1)..n {
            row.push(cosine_similarity(&vectors[i], &vectors[j]));
        }
        matrix.push(row);
    }
    matrix
}

/// Reconstruct the actual column index from a row and its offset.
pub fn column_for(row: usize, offset: usize) -> usize {
    row + 1 + offset
}

/// Whether a raw similarity clears the linkage threshold.
///
/// The similarity is raised to `exponent` BEFORE the comparison. The
/// sharpening pushes values near 1 closer to 1 and suppresses mid-range
/// values, which changes the effective threshold curve versus comparing the
/// raw similarity — the two steps must not be folded together.
pub fn qualifies(similarity: f32, exponent: f32, threshold: f32) -> bool {
    similarity.powf(exponent) > threshold
}
