//! Closeness relationships between departments.
//!
//! A relationship chart rates every ordered department pair with a closeness
//! letter (A = absolutely necessary … U = unimportant, X = undesirable). The
//! chart is not required to be symmetric, so two derived weights exist:
//!
//! | Weight | Formula | Used for |
//! |--------|---------|----------|
//! | symmetric | `w(M[i][j]) + w(M[j][i])` | TCR, seed choice, final adjacency score |
//! | pair | `max(w(M[i][j]), w(M[j][i]))` | per-step placement rating (PR) |
//!
//! The symmetric weight double-counts both directions on purpose; the pair
//! weight credits a single shared boundary once.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Closeness rating letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Closeness {
    A,
    E,
    I,
    O,
    U,
    X,
    #[default]
    Blank,
}

impl Closeness {
    /// Selection tiers in strict priority order. X and blank never trigger selection.
    pub const TIERS: [Closeness; 5] = [
        Closeness::A,
        Closeness::E,
        Closeness::I,
        Closeness::O,
        Closeness::U,
    ];

    /// Case-insensitive parse; anything unrecognized is blank.
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_uppercase().as_str() {
            "A" => Closeness::A,
            "E" => Closeness::E,
            "I" => Closeness::I,
            "O" => Closeness::O,
            "U" => Closeness::U,
            "X" => Closeness::X,
            _ => Closeness::Blank,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Closeness::A => "A",
            Closeness::E => "E",
            Closeness::I => "I",
            Closeness::O => "O",
            Closeness::U => "U",
            Closeness::X => "X",
            Closeness::Blank => "",
        }
    }

    pub fn is_tier(&self) -> bool {
        Self::TIERS.contains(self)
    }
}

impl From<&str> for Closeness {
    fn from(token: &str) -> Self {
        Closeness::parse(token)
    }
}

impl From<String> for Closeness {
    fn from(token: String) -> Self {
        Closeness::parse(&token)
    }
}

impl From<Closeness> for String {
    fn from(c: Closeness) -> Self {
        c.as_str().to_string()
    }
}

/// Numeric weight for each closeness letter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosenessWeights {
    #[serde(rename = "A")]
    pub a: f64,
    #[serde(rename = "E")]
    pub e: f64,
    #[serde(rename = "I")]
    pub i: f64,
    #[serde(rename = "O")]
    pub o: f64,
    #[serde(rename = "U")]
    pub u: f64,
    #[serde(rename = "X")]
    pub x: f64,
    pub blank: f64,
}

impl Default for ClosenessWeights {
    fn default() -> Self {
        Self {
            a: 10.0,
            e: 8.0,
            i: 6.0,
            o: 4.0,
            u: 2.0,
            x: 0.0,
            blank: 0.0,
        }
    }
}

impl ClosenessWeights {
    pub fn weight(&self, c: Closeness) -> f64 {
        match c {
            Closeness::A => self.a,
            Closeness::E => self.e,
            Closeness::I => self.i,
            Closeness::O => self.o,
            Closeness::U => self.u,
            Closeness::X => self.x,
            Closeness::Blank => self.blank,
        }
    }

    /// Weight of a raw matrix token. Unrecognized or empty tokens get `blank`.
    pub fn letter_weight(&self, token: &str) -> f64 {
        self.weight(Closeness::parse(token))
    }

    /// A > E > I > O > U > X. Tier-priority selection assumes this ordering.
    pub fn is_strictly_ordered(&self) -> bool {
        self.a > self.e && self.e > self.i && self.i > self.o && self.o > self.u && self.u > self.x
    }
}

/// Square closeness chart over real departments, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipMatrix {
    n: usize,
    cells: Vec<Closeness>,
}

impl RelationshipMatrix {
    /// All-blank chart.
    pub fn blank(n: usize) -> Self {
        Self {
            n,
            cells: vec![Closeness::Blank; n * n],
        }
    }

    /// Parse a chart of raw tokens, requiring exactly `expected × expected` entries.
    pub fn from_rows<S: AsRef<str>>(rows: &[Vec<S>], expected: usize) -> Result<Self, LayoutError> {
        if rows.len() != expected {
            return Err(LayoutError::MatrixRowCount {
                matrix: "closeness",
                expected,
                found: rows.len(),
            });
        }
        let mut cells = Vec::with_capacity(expected * expected);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != expected {
                return Err(LayoutError::MatrixRowLength {
                    matrix: "closeness",
                    row,
                    expected,
                    found: values.len(),
                });
            }
            cells.extend(values.iter().map(|v| Closeness::parse(v.as_ref())));
        }
        Ok(Self { n: expected, cells })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> Closeness {
        if i < self.n && j < self.n {
            self.cells[i * self.n + j]
        } else {
            Closeness::Blank
        }
    }

    pub fn set(&mut self, i: usize, j: usize, c: Closeness) {
        if i < self.n && j < self.n {
            self.cells[i * self.n + j] = c;
        }
    }

    /// True if either direction between `i` and `j` is rated `tier`.
    pub fn relates_at(&self, i: usize, j: usize, tier: Closeness) -> bool {
        self.get(i, j) == tier || self.get(j, i) == tier
    }
}

/// A closeness chart together with the weight table used to read it.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationships {
    pub matrix: RelationshipMatrix,
    pub weights: ClosenessWeights,
}

impl Relationships {
    pub fn new(matrix: RelationshipMatrix, weights: ClosenessWeights) -> Self {
        if !weights.is_strictly_ordered() {
            log::warn!(
                "closeness weights are not strictly ordered A>E>I>O>U>X ({:?}); tier priority may look arbitrary",
                weights
            );
        }
        Self { matrix, weights }
    }

    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    fn w(&self, i: usize, j: usize) -> f64 {
        self.weights.weight(self.matrix.get(i, j))
    }

    /// Both directions summed; zero on the diagonal.
    pub fn symmetric_weight(&self, i: usize, j: usize) -> f64 {
        if i == j {
            return 0.0;
        }
        self.w(i, j) + self.w(j, i)
    }

    /// Stronger of the two directions.
    pub fn pair_weight(&self, i: usize, j: usize) -> f64 {
        self.w(i, j).max(self.w(j, i))
    }

    /// Total Closeness Rating of department `i`.
    pub fn tcr(&self, i: usize) -> f64 {
        (0..self.len()).map(|j| self.symmetric_weight(i, j)).sum()
    }

    /// TCR for every department, by index.
    pub fn tcrs(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.tcr(i)).collect()
    }
}
