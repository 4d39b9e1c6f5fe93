use crate::embeddings::EmbeddingClient;
use crate::error::{Result, StoreError};
use std::collections::HashMap;

/// Brute-force cosine similarity index.
///
/// Linear scan is exact and plenty for per-run session and repo corpora;
/// the search contract stays the same if an ANN structure replaces it.
pub struct VectorIndex {
    dimension: usize,
    vectors: HashMap<usize, Vec<f32>>,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: HashMap::new(),
        }
    }

    pub fn add(&mut self, id: usize, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(StoreError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.insert(id, vector.to_vec());
        Ok(())
    }

    /// K nearest by cosine similarity, scores descending.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimension {
            return Err(StoreError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scores: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .map(|(id, vector)| (*id, EmbeddingClient::cosine_similarity(query, vector)))
            .collect();

        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scores.truncate(k);

        Ok(scores)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn clear(&mut self) {
        self.vectors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nearest_neighbors_in_score_order() {
        let mut index = VectorIndex::new(3);
        index.add(0, &[1.0, 0.0, 0.0]).unwrap();
        index.add(1, &[0.9, 0.1, 0.0]).unwrap();
        index.add(2, &[0.0, 1.0, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 0);
        assert!((results[0].1 - 1.0).abs() < 1e-6);
        assert_eq!(results[1].0, 1);
        assert!(results[1].1 > 0.9);
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let mut index = VectorIndex::new(3);
        assert!(index.add(0, &[1.0, 0.0]).is_err());

        index.add(0, &[1.0, 0.0, 0.0]).unwrap();
        assert!(index.search(&[1.0, 0.0], 1).is_err());
    }
}
