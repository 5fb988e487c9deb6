// Vector index module
// Exact inner-product search over a dense row-major f32 matrix


use tracing::debug;

use crate::RagError;

/// One scored row from an index scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    /// Row position in the matrix, the join key to the metadata records
    pub ordinal: usize,
    pub score: f32,
}

/// Normalize `vector` to unit L2 norm in place.
///
/// Returns `false` when the norm is zero and the vector was left untouched.
#[inline]
pub fn normalize_l2(vector: &mut [f32]) -> bool {
    let norm_sq: f32 = vector.iter().map(|v| v * v).sum();
    if norm_sq == 0.0 {
        return false;
    }

    let inv = 1.0 / norm_sq.sqrt();
    for v in vector.iter_mut() {
        *v *= inv;
    }
    true
}

/// Append-only builder for a [`FlatIpIndex`].
///
/// The first appended vector fixes the matrix dimension; every later vector
/// must agree. Vectors are L2-normalized on append, so the stored matrix can
/// be scored with a plain inner product at query time.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    dimension: Option<usize>,
    data: Vec<f32>,
    count: usize,
}

impl IndexBuilder {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vectors appended so far
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Normalize and append a batch of vectors as the next matrix rows.
    ///
    /// Fails on the first vector whose dimension disagrees with the fixed
    /// dimension, or whose norm is zero; nothing from the failing batch
    /// onward is appended.
    #[inline]
    pub fn add(&mut self, vectors: Vec<Vec<f32>>) -> Result<(), RagError> {
        for mut vector in vectors {
            let dimension = *self.dimension.get_or_insert(vector.len());
            if vector.len() != dimension {
                return Err(RagError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }

            if !normalize_l2(&mut vector) {
                return Err(RagError::ZeroVector {
                    ordinal: self.count,
                });
            }

            self.data.extend_from_slice(&vector);
            self.count += 1;
        }

        Ok(())
    }

    /// Fix the matrix and hand it over for searching.
    ///
    /// An empty builder finalizes into a valid zero-entry index.
    #[inline]
    #[must_use]
    pub fn finalize(self) -> FlatIpIndex {
        let dimension = self.dimension.unwrap_or(0);
        debug!(
            "Finalized index: {} vectors, dimension {}",
            self.count, dimension
        );
        FlatIpIndex {
            dimension,
            data: self.data,
        }
    }
}

/// Dense row-major matrix of unit vectors scored by exact inner product.
///
/// With all rows and the query L2-normalized, the inner product equals
/// cosine similarity; normalizing once at build time keeps query scoring a
/// single pass over the matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIpIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIpIndex {
    /// Reassemble an index from persisted parts.
    #[inline]
    pub fn from_parts(dimension: usize, data: Vec<f32>) -> Result<Self, RagError> {
        if dimension == 0 {
            if !data.is_empty() {
                return Err(RagError::Store(
                    "Zero-dimension index with non-empty vector data".to_string(),
                ));
            }
        } else if data.len() % dimension != 0 {
            return Err(RagError::Store(format!(
                "Vector data length {} is not a multiple of dimension {}",
                data.len(),
                dimension
            )));
        }

        Ok(Self { dimension, data })
    }

    #[inline]
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw row-major matrix data
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Score `query` against every row and return the top `k` rows.
    ///
    /// Scoring is exhaustive and exact. Results are ordered by descending
    /// score; equal scores fall back to ascending ordinal, so output is
    /// deterministic for deterministic embeddings. `k` greater than the row
    /// count is clamped. The query must already be normalized.
    #[inline]
    #[must_use]
    pub fn search(&self, query: &[f32], k: usize) -> Vec<Scored> {
        if self.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<Scored> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(ordinal, row)| Scored {
                ordinal,
                score: row.iter().zip(query).map(|(a, b)| a * b).sum(),
            })
            .collect();

        scored.sort_unstable_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.ordinal.cmp(&b.ordinal))
        });

        scored.truncate(k.min(self.len()));
        scored
    }
}
