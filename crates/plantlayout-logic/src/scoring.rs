//! Layout scoring: distance metrics, flow matrices, flow-distance cost and
//! the final shared-edge adjacency score.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::geometry::{shared_edge_length, CellRect, DeptRect};
use crate::relationship::{ClosenessWeights, RelationshipMatrix, Relationships};

/// Distance between department centers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Manhattan,
    Euclidean,
}

impl DistanceMetric {
    pub fn distance(&self, a: (f64, f64), b: (f64, f64)) -> f64 {
        let dx = (a.0 - b.0).abs();
        let dy = (a.1 - b.1).abs();
        match self {
            DistanceMetric::Manhattan => dx + dy,
            DistanceMetric::Euclidean => (dx * dx + dy * dy).sqrt(),
        }
    }
}

/// Square numeric flow matrix, row-major. `flow(i, j)` is the volume moved from `i` to `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowMatrix {
    n: usize,
    values: Vec<f64>,
}

impl FlowMatrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            values: vec![0.0; n * n],
        }
    }

    /// Build from rows, requiring exactly `expected × expected` entries.
    pub fn from_rows(rows: &[Vec<f64>], expected: usize) -> Result<Self, LayoutError> {
        if rows.len() != expected {
            return Err(LayoutError::MatrixRowCount {
                matrix: "flow",
                expected,
                found: rows.len(),
            });
        }
        let mut values = Vec::with_capacity(expected * expected);
        for (row, r) in rows.iter().enumerate() {
            if r.len() != expected {
                return Err(LayoutError::MatrixRowLength {
                    matrix: "flow",
                    row,
                    expected,
                    found: r.len(),
                });
            }
            values.extend_from_slice(r);
        }
        Ok(Self { n: expected, values })
    }

    /// Raw flow blended with closeness: `raw(i,j) + lambda · w(M[i][j])`.
    /// Either source may be absent; missing sources contribute zero.
    pub fn effective(
        n: usize,
        raw: Option<&FlowMatrix>,
        closeness: Option<&RelationshipMatrix>,
        weights: &ClosenessWeights,
        lambda: f64,
    ) -> Self {
        let mut out = raw.cloned().unwrap_or_else(|| Self::zeros(n));
        if let Some(chart) = closeness {
            for i in 0..n {
                for j in 0..n {
                    out.values[i * n + j] += lambda * weights.weight(chart.get(i, j));
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i < self.n && j < self.n {
            self.values[i * self.n + j]
        } else {
            0.0
        }
    }

    /// True if every entry is zero (the search has nothing to optimize).
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }
}

/// Σ over ordered pairs `i ≠ j` of `flow(i, j) × distance(center_i, center_j)`.
///
/// Each entry pairs a flow-matrix index with the rectangle it occupies;
/// indices outside the matrix contribute nothing.
pub fn flow_distance_cost(
    assignment: &[(usize, CellRect)],
    flow: &FlowMatrix,
    metric: DistanceMetric,
) -> f64 {
    let mut total = 0.0;
    for &(a, rect_a) in assignment {
        for &(b, rect_b) in assignment {
            if a == b || a >= flow.len() || b >= flow.len() {
                continue;
            }
            let f = flow.get(a, b);
            if f == 0.0 {
                continue;
            }
            total += f * metric.distance(rect_a.center(), rect_b.center());
        }
    }
    total
}

/// Final closeness score: shared boundary length times symmetric weight,
/// over every pair of rectangles belonging to different departments.
pub fn adjacency_score(rects: &[DeptRect], relationships: &Relationships) -> f64 {
    let mut score = 0.0;
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            let a = &rects[i];
            let b = &rects[j];
            if a.dept == b.dept {
                continue;
            }
            let len = shared_edge_length(&a.rect, &b.rect);
            if len > 0 {
                score += len as f64 * relationships.symmetric_weight(a.dept, b.dept);
            }
        }
    }
    score
}
