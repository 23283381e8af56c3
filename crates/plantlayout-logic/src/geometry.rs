//! Cell rectangles and post-hoc layout diagnostics.
//!
//! Pure functions that take placed rectangles and return validation errors.
//! No grid dependency: works with plain structs, so both engines (and any
//! caller holding a stored layout) can re-check a result after the fact.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Axis-aligned rectangle measured in grid cells. `(x, y)` is the top-left cell;
/// rows grow downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl CellRect {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Cell count, saturating for dimensions no grid can hold.
    pub fn area(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    /// Exclusive right edge, saturating at `usize::MAX`.
    pub fn right(&self) -> usize {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge, saturating at `usize::MAX`.
    pub fn bottom(&self) -> usize {
        self.y.saturating_add(self.height)
    }

    /// Geometric center in cell units (a 2×2 block at the origin is centered on (1, 1)).
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// True if the two rectangles share at least one cell.
    pub fn overlaps(&self, other: &CellRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// True if the rectangle is non-empty and lies inside `[0, width) × [0, height)`.
    pub fn within(&self, grid_width: usize, grid_height: usize) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|r| r <= grid_width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= grid_height)
    }

    /// Distance to the nearest of the four grid edges.
    pub fn edge_padding(&self, grid_width: usize, grid_height: usize) -> usize {
        self.x
            .min(self.y)
            .min(grid_width.saturating_sub(self.right()))
            .min(grid_height.saturating_sub(self.bottom()))
    }
}

/// A rectangle attributed to a department.
#[derive(Debug, Clone, PartialEq)]
pub struct DeptRect {
    /// Department index (matrix index for real departments).
    pub dept: usize,
    pub name: String,
    pub rect: CellRect,
}

/// Length of the common boundary between two rectangles.
///
/// Counts the overlapping run along a shared left/right or top/bottom edge.
/// Rectangles that only meet at a corner share nothing.
pub fn shared_edge_length(a: &CellRect, b: &CellRect) -> usize {
    let touch_lr = a.right() == b.x || b.right() == a.x;
    let touch_tb = a.bottom() == b.y || b.bottom() == a.y;

    let y_overlap = a.bottom().min(b.bottom()).saturating_sub(a.y.max(b.y));
    let x_overlap = a.right().min(b.right()).saturating_sub(a.x.max(b.x));

    let vertical = if touch_lr { y_overlap } else { 0 };
    let horizontal = if touch_tb { x_overlap } else { 0 };
    vertical + horizontal
}

/// Integer factor pairs `(w, h)` with `w * h == cells` that fit the grid,
/// near-square shapes first. Ties keep ascending width.
pub fn factor_pairs(cells: usize, max_width: usize, max_height: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for w in 1..=cells.min(max_width) {
        if cells % w != 0 {
            continue;
        }
        let h = cells / w;
        if h <= max_height {
            pairs.push((w, h));
        }
    }
    pairs.sort_by_key(|&(w, h)| w.abs_diff(h));
    pairs
}

/// Layout diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

// ── A. Per-rectangle ────────────────────────────────────────────────────

/// Check that every rectangle is non-empty and inside the grid.
pub fn check_within_grid(
    rects: &[DeptRect],
    grid_width: usize,
    grid_height: usize,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for r in rects {
        if !r.rect.within(grid_width, grid_height) {
            errors.push(ValidationError {
                category: "bounds",
                severity: Severity::Error,
                message: format!(
                    "'{}' at ({},{}) {}×{} lies outside the {}×{} grid",
                    r.name, r.rect.x, r.rect.y, r.rect.width, r.rect.height, grid_width, grid_height
                ),
            });
        }
    }
    errors
}

// ── B. Pairwise ─────────────────────────────────────────────────────────

/// No two rectangles of different departments may share a cell.
pub fn check_overlaps(rects: &[DeptRect]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            let a = &rects[i];
            let b = &rects[j];
            if a.dept == b.dept {
                continue;
            }
            if a.rect.overlaps(&b.rect) {
                errors.push(ValidationError {
                    category: "overlap",
                    severity: Severity::Error,
                    message: format!("'{}' and '{}' overlap", a.name, b.name),
                });
            }
        }
    }
    errors
}

// ── C. Per-department accounting ────────────────────────────────────────

/// Fragment count per department must stay within `limit`.
pub fn check_fragment_limits(rects: &[DeptRect], limit: usize) -> Vec<ValidationError> {
    let mut counts: HashMap<usize, (usize, &str)> = HashMap::new();
    for r in rects {
        counts.entry(r.dept).or_insert((0, r.name.as_str())).0 += 1;
    }
    let mut offenders: Vec<_> = counts
        .into_iter()
        .filter(|(_, (count, _))| *count > limit)
        .collect();
    offenders.sort_by_key(|(dept, _)| *dept);
    offenders
        .into_iter()
        .map(|(_, (count, name))| ValidationError {
            category: "fragments",
            severity: Severity::Error,
            message: format!("'{}' has {} fragments (limit {})", name, count, limit),
        })
        .collect()
}

/// Placed area per department against its request: more is an error,
/// less is a warning (partial placement).
pub fn check_requested_areas(rects: &[DeptRect], requested: &[usize]) -> Vec<ValidationError> {
    let mut placed = vec![0usize; requested.len()];
    for r in rects {
        if let Some(slot) = placed.get_mut(r.dept) {
            *slot += r.rect.area();
        }
    }
    let mut errors = Vec::new();
    for (dept, (&got, &want)) in placed.iter().zip(requested).enumerate() {
        if got > want {
            errors.push(ValidationError {
                category: "area",
                severity: Severity::Error,
                message: format!("department #{} placed {} of {} cells", dept, got, want),
            });
        } else if got < want {
            errors.push(ValidationError {
                category: "area",
                severity: Severity::Warning,
                message: format!(
                    "department #{} only partially placed ({} of {} cells)",
                    dept, got, want
                ),
            });
        }
    }
    errors
}

/// A locked department must consist of exactly its declared rectangle.
pub fn check_locked_positions(
    rects: &[DeptRect],
    locked: &[(usize, CellRect)],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for &(dept, expected) in locked {
        let own: Vec<&DeptRect> = rects.iter().filter(|r| r.dept == dept).collect();
        if own.len() != 1 || own[0].rect != expected {
            let name = own.first().map(|r| r.name.as_str()).unwrap_or("?");
            errors.push(ValidationError {
                category: "locked",
                severity: Severity::Error,
                message: format!(
                    "locked department #{} ('{}') moved from {:?}",
                    dept, name, expected
                ),
            });
        }
    }
    errors
}

// ── Master validation ───────────────────────────────────────────────────

/// Run all layout checks and return combined results.
pub fn validate_layout(
    rects: &[DeptRect],
    grid_width: usize,
    grid_height: usize,
    fragment_limit: usize,
    requested: &[usize],
    locked: &[(usize, CellRect)],
) -> Vec<ValidationError> {
    let mut all = Vec::new();
    all.extend(check_within_grid(rects, grid_width, grid_height));
    all.extend(check_overlaps(rects));
    all.extend(check_fragment_limits(rects, fragment_limit));
    all.extend(check_requested_areas(rects, requested));
    all.extend(check_locked_positions(rects, locked));
    all
}
