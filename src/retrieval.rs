//! Similarity scoring and in-memory ranking
//!
//! The vector store normally runs the nearest-neighbor search itself and
//! reports its native distance; [`distance_to_score`] maps that onto the
//! same closer-is-higher scale the cosine path uses. The conversion assumes
//! the store's default L2 metric and is not metric-agnostic: changing the
//! store's index metric requires re-deriving it.

use crate::types::IndexedChunk;

/// Cosine similarity of two vectors
///
/// Defined as 0.0 when either operand has zero norm (or the lengths differ),
/// so degenerate vectors never rank above real matches.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Convert a store-native distance (smaller is closer) to a similarity
/// score (higher is closer)
pub fn distance_to_score(distance: f32) -> f32 {
    1.0 / (1.0 + distance.max(0.0))
}

/// Rank chunks by cosine similarity to a query vector, descending
///
/// Ties keep their original order; at most `top_k` results are returned and
/// an empty chunk slice yields an empty result.
pub fn rank_by_similarity<'a>(
    query: &[f32],
    chunks: &'a [IndexedChunk],
    top_k: usize,
) -> Vec<(&'a IndexedChunk, f32)> {
    let mut scored: Vec<(&IndexedChunk, f32)> = chunks
        .iter()
        .map(|chunk| (chunk, cosine_similarity(query, &chunk.embedding)))
        .collect();

    // Stable sort keeps the original order for equal scores
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkStrategy;

    fn chunk(id: &str, embedding: Vec<f32>) -> IndexedChunk {
        IndexedChunk {
            id: id.to_string(),
            path: format!("src/{id}.rs"),
            language: None,
            start_line: 1,
            end_line: 1,
            content: id.to_string(),
            strategy: ChunkStrategy::Windowed,
            node_type: None,
            symbol: None,
            content_hash: String::new(),
            file_mtime_ms: 0,
            file_size: 0,
            embedding,
        }
    }

    #[test]
    fn test_cosine_self_is_one() {
        let v = vec![0.3, -1.2, 4.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector_is_zero() {
        let zero = vec![0.0, 0.0];
        let v = vec![1.0, 2.0];
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_cosine_length_mismatch_is_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_distance_to_score() {
        assert_eq!(distance_to_score(0.0), 1.0);
        assert_eq!(distance_to_score(1.0), 0.5);
        // Negative distances are clamped before conversion
        assert_eq!(distance_to_score(-2.5), 1.0);
        // Closer is higher
        assert!(distance_to_score(0.1) > distance_to_score(0.9));
    }

    #[test]
    fn test_rank_orders_descending() {
        let query = vec![1.0, 0.0];
        let chunks = vec![
            chunk("far", vec![0.0, 1.0]),
            chunk("near", vec![1.0, 0.1]),
            chunk("mid", vec![1.0, 1.0]),
        ];

        let ranked = rank_by_similarity(&query, &chunks, 10);
        assert_eq!(ranked[0].0.id, "near");
        assert_eq!(ranked[1].0.id, "mid");
        assert_eq!(ranked[2].0.id, "far");
        assert!(ranked[0].1 >= ranked[1].1 && ranked[1].1 >= ranked[2].1);
    }

    #[test]
    fn test_rank_ties_keep_original_order() {
        let query = vec![1.0, 0.0];
        let chunks = vec![
            chunk("first", vec![2.0, 0.0]),
            chunk("second", vec![5.0, 0.0]),
        ];

        let ranked = rank_by_similarity(&query, &chunks, 10);
        assert_eq!(ranked[0].0.id, "first");
        assert_eq!(ranked[1].0.id, "second");
    }

    #[test]
    fn test_rank_respects_top_k() {
        let query = vec![1.0];
        let chunks: Vec<_> = (0..20).map(|i| chunk(&format!("c{i}"), vec![1.0])).collect();
        assert_eq!(rank_by_similarity(&query, &chunks, 5).len(), 5);
    }

    #[test]
    fn test_rank_empty_chunks() {
        let ranked = rank_by_similarity(&[1.0, 2.0], &[], 5);
        assert!(ranked.is_empty());
    }
}
