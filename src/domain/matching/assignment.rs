//! Optimal one-to-one assignment between expected and actual list items.

use pathfinding::kuhn_munkres::{kuhn_munkres, Weights};

/// Similarities are scaled to integers before solving.
const SCALE: f64 = 1_000_000.0;

/// Result of solving an assignment problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// `(expected_index, actual_index)` pairs, ordered by expected index.
    pub pairs: Vec<(usize, usize)>,
    /// Expected items left without a partner.
    pub unassigned_expected: Vec<usize>,
    /// Actual items left without a partner.
    pub unassigned_actual: Vec<usize>,
    /// Sum of the similarities of `pairs`.
    pub total_similarity: f64,
}

/// Similarity matrix padded to a square with zero-similarity dummies.
struct PaddedSimilarity {
    data: Vec<Vec<i64>>,
    size: usize,
}

impl PaddedSimilarity {
    fn new(similarity: &[Vec<f64>], columns: usize) -> Self {
        let size = similarity.len().max(columns);
        let mut data = vec![vec![0i64; size]; size];
        for (i, row) in similarity.iter().enumerate() {
            for (j, value) in row.iter().take(columns).enumerate() {
                let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
                data[i][j] = (value * SCALE).round() as i64;
            }
        }
        Self { data, size }
    }
}

impl Weights<i64> for PaddedSimilarity {
    fn rows(&self) -> usize {
        self.size
    }

    fn columns(&self) -> usize {
        self.size
    }

    fn at(&self, row: usize, col: usize) -> i64 {
        self.data[row][col]
    }

    fn neg(&self) -> Self {
        let data = self
            .data
            .iter()
            .map(|row| row.iter().map(|&v| -v).collect())
            .collect();
        Self {
            data,
            size: self.size,
        }
    }
}

/// Finds the assignment maximizing total similarity.
///
/// `similarity[i][j]` is the similarity of expected item `i` and actual item
/// `j`, in `[0, 1]`. Rows may be empty; `columns` gives the actual count.
pub fn solve_assignment(similarity: &[Vec<f64>], columns: usize) -> Assignment {
    let rows = similarity.len();
    if rows == 0 || columns == 0 {
        return Assignment {
            pairs: Vec::new(),
            unassigned_expected: (0..rows).collect(),
            unassigned_actual: (0..columns).collect(),
            total_similarity: 0.0,
        };
    }

    let weights = PaddedSimilarity::new(similarity, columns);
    let (_, solution) = kuhn_munkres(&weights);

    let mut pairs = Vec::new();
    let mut unassigned_expected = Vec::new();
    let mut taken = vec![false; columns];
    for (i, &j) in solution.iter().enumerate().take(rows) {
        if j < columns {
            pairs.push((i, j));
            taken[j] = true;
        } else {
            unassigned_expected.push(i);
        }
    }
    let unassigned_actual = (0..columns).filter(|j| !taken[*j]).collect();
    let total_similarity = pairs
        .iter()
        .map(|&(i, j)| similarity[i].get(j).copied().unwrap_or(0.0).clamp(0.0, 1.0))
        .sum();

    Assignment {
        pairs,
        unassigned_expected,
        unassigned_actual,
        total_similarity,
    }
}
