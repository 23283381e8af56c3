//! Serializable outputs of both engines.

use serde::Serialize;

use crate::department::DepartmentKind;
use crate::geometry::{CellRect, Severity, ValidationError};
use crate::grid::Grid;
use crate::scoring::DistanceMetric;

/// Grid dimensions echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridEcho {
    pub width: usize,
    pub height: usize,
    pub cell_size_meters: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TcrEntry {
    pub name: String,
    pub tcr: f64,
}

/// One commit of the constructive engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementStep {
    /// 1-based commit number.
    pub step: usize,
    pub name: String,
    pub index: usize,
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub pr: f64,
    pub score: f64,
    /// Closeness tier that selected the department, or `none`.
    pub tier: &'static str,
    pub tcr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Score {
    pub total: f64,
    pub closeness: f64,
}

/// One committed rectangle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRecord {
    pub name: String,
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    /// Position in the placement list.
    pub part: usize,
    /// Commit that produced this rectangle.
    pub step: usize,
    #[serde(skip)]
    pub dept: usize,
}

impl PlacementRecord {
    pub fn rect(&self) -> CellRect {
        CellRect::new(self.x, self.y, self.width, self.height)
    }
}

/// A department that ran out of fragments before covering its area.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortfall {
    pub name: String,
    pub placed: usize,
    pub requested: usize,
}

/// Output of the constructive engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructiveResult {
    pub grid: GridEcho,
    pub tcr: Vec<TcrEntry>,
    /// First department grown from the grid center; `None` when every
    /// department was anchored.
    pub seed: Option<String>,
    /// Department names in order of first commit.
    pub order: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<PlacementStep>>,
    pub score: Score,
    pub placements: Vec<PlacementRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shortfalls: Vec<Shortfall>,
    pub diagnostics: Vec<ValidationError>,
    #[serde(skip)]
    pub blocked: Vec<CellRect>,
}

impl ConstructiveResult {
    /// Rectangles committed for the department at matrix index `dept`.
    pub fn rects_of(&self, dept: usize) -> Vec<CellRect> {
        self.placements
            .iter()
            .filter(|p| p.dept == dept)
            .map(PlacementRecord::rect)
            .collect()
    }

    /// True when no diagnostic has error severity.
    pub fn is_valid(&self) -> bool {
        !has_errors(&self.diagnostics)
    }

    /// Every department covers its full requested area.
    pub fn is_complete(&self) -> bool {
        self.shortfalls.is_empty()
    }

    /// Text map of the layout (see [`Grid::render`]).
    pub fn render(&self) -> String {
        let mut grid = Grid::new(self.grid.width, self.grid.height);
        grid.pre_mark_obstacles(&self.blocked);
        for p in &self.placements {
            grid.mark(&p.rect(), Some(p.dept), true);
        }
        grid.render()
    }
}

/// Final position of one department after the swap search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedDepartment {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DepartmentKind,
    pub locked: bool,
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    /// No free slot was found; the department kept its input coordinates.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl AssignedDepartment {
    pub fn rect(&self) -> CellRect {
        CellRect::new(self.x, self.y, self.width, self.height)
    }
}

/// Output of the improvement search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementResult {
    #[serde(skip)]
    pub grid_width: usize,
    #[serde(skip)]
    pub grid_height: usize,
    /// Every department in request order, at its best-packing position.
    pub assignment: Vec<AssignedDepartment>,
    /// Movable department names in the best packing order.
    pub order: Vec<String>,
    pub total_cost: f64,
    pub initial_cost: f64,
    pub metric: DistanceMetric,
    pub iterations: usize,
    pub accepted_swaps: usize,
    pub stopped_early: bool,
    /// Departments left at their input coordinates.
    pub fallbacks: Vec<String>,
    pub diagnostics: Vec<ValidationError>,
}

impl ImprovementResult {
    pub fn is_valid(&self) -> bool {
        self.fallbacks.is_empty() && !has_errors(&self.diagnostics)
    }

    pub fn find(&self, name: &str) -> Option<&AssignedDepartment> {
        self.assignment.iter().find(|a| a.name == name)
    }

    /// Text map of the assignment; voids render as `#`, fallbacks are omitted.
    pub fn render(&self) -> String {
        let mut grid = Grid::new(self.grid_width, self.grid_height);
        for (i, a) in self.assignment.iter().enumerate() {
            if a.fallback {
                continue;
            }
            let owner = match a.kind {
                DepartmentKind::Void => None,
                DepartmentKind::Dept => Some(i),
            };
            grid.mark(&a.rect(), owner, true);
        }
        grid.render()
    }
}

fn has_errors(diagnostics: &[ValidationError]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}
