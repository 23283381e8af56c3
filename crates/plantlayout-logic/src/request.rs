//! Request contracts for both engines and their structural checks.
//!
//! A request is what a caller hands over as JSON. `prepare()` resolves it into
//! an engine input: real departments are renumbered into matrix index space,
//! voids become blocked rectangles, and every contradiction that can be seen
//! without placing anything is rejected up front.

use serde::{Deserialize, Serialize};

use crate::config::{PlacementOptions, SearchOptions, SeedRule};
use crate::constructive::{ConstructiveInput, PlannedDepartment};
use crate::department::Department;
use crate::error::LayoutError;
use crate::geometry::CellRect;
use crate::improvement::{ImprovementInput, SearchItem};
use crate::relationship::{ClosenessWeights, RelationshipMatrix, Relationships};
use crate::scoring::{DistanceMetric, FlowMatrix};

/// Input for the constructive engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructiveRequest {
    #[serde(default)]
    pub name: String,
    pub grid_width: usize,
    pub grid_height: usize,
    pub departments: Vec<Department>,
    /// Closeness letters over real departments, in request order.
    #[serde(default)]
    pub closeness_matrix: Vec<Vec<String>>,
    #[serde(default, alias = "weights")]
    pub closeness_weights: ClosenessWeights,
    #[serde(default)]
    pub options: PlacementOptions,
    #[serde(default)]
    pub obstacles: Vec<CellRect>,
    #[serde(default)]
    pub seed_rule: SeedRule,
}

/// Input for the improvement search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementRequest {
    #[serde(default)]
    pub name: String,
    pub grid_width: usize,
    pub grid_height: usize,
    pub departments: Vec<Department>,
    #[serde(default)]
    pub flow_matrix: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub closeness_matrix: Option<Vec<Vec<String>>>,
    #[serde(default, alias = "weights")]
    pub closeness_weights: ClosenessWeights,
    #[serde(default)]
    pub metric: DistanceMetric,
    #[serde(default)]
    pub options: SearchOptions,
}

/// A rectangle the caller has pinned, kept for pairwise overlap checks.
struct Pinned {
    name: String,
    rect: CellRect,
}

fn check_grid(width: usize, height: usize) -> Result<(), LayoutError> {
    if width == 0 || height == 0 || width.checked_mul(height).is_none() {
        return Err(LayoutError::InvalidGrid { width, height });
    }
    Ok(())
}

/// Rectangle for a department whose position the caller supplies.
fn pinned_rect(d: &Department, grid_width: usize, grid_height: usize) -> Result<CellRect, LayoutError> {
    let (w, h) = d
        .footprint(grid_width, grid_height)
        .ok_or_else(|| LayoutError::MissingFootprint {
            name: d.name.clone(),
        })?;
    let (x, y) = match (d.x, d.y) {
        (Some(x), Some(y)) => (x, y),
        _ => {
            return Err(LayoutError::MissingPosition {
                name: d.name.clone(),
            })
        }
    };
    let rect = CellRect::new(x, y, w, h);
    if !rect.within(grid_width, grid_height) {
        return Err(LayoutError::FixedOutOfBounds {
            name: d.name.clone(),
            rect,
        });
    }
    Ok(rect)
}

fn check_pinned_overlaps(pinned: &[Pinned]) -> Result<(), LayoutError> {
    for i in 0..pinned.len() {
        for j in (i + 1)..pinned.len() {
            if pinned[i].rect.overlaps(&pinned[j].rect) {
                return Err(LayoutError::FixedOverlap {
                    first: pinned[i].name.clone(),
                    second: pinned[j].name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn real_count(departments: &[Department]) -> usize {
    departments.iter().filter(|d| !d.is_void()).count()
}

impl ConstructiveRequest {
    /// Resolve into engine input, rejecting structural contradictions.
    pub fn prepare(&self) -> Result<ConstructiveInput, LayoutError> {
        let (gw, gh) = (self.grid_width, self.grid_height);
        check_grid(gw, gh)?;

        let n = real_count(&self.departments);
        if n == 0 {
            return Err(LayoutError::NoDepartments);
        }

        let mut pinned = Vec::new();
        let mut blocked = Vec::new();
        let mut planned = Vec::with_capacity(n);

        for (index, rect) in self.obstacles.iter().enumerate() {
            if !rect.within(gw, gh) {
                return Err(LayoutError::ObstacleOutOfBounds { index, rect: *rect });
            }
            blocked.push(*rect);
            pinned.push(Pinned {
                name: format!("obstacle #{}", index),
                rect: *rect,
            });
        }

        for d in &self.departments {
            if d.is_void() {
                let rect = pinned_rect(d, gw, gh)?;
                blocked.push(rect);
                pinned.push(Pinned {
                    name: d.name.clone(),
                    rect,
                });
                continue;
            }
            let cells = d.requested_cells();
            if cells == 0 {
                return Err(LayoutError::MissingFootprint {
                    name: d.name.clone(),
                });
            }
            let anchor = if d.is_pinned() {
                let rect = pinned_rect(d, gw, gh)?;
                pinned.push(Pinned {
                    name: d.name.clone(),
                    rect,
                });
                Some(rect)
            } else {
                None
            };
            planned.push(PlannedDepartment {
                profile: d.clone(),
                cells,
                anchor,
            });
        }

        check_pinned_overlaps(&pinned)?;

        let matrix = RelationshipMatrix::from_rows(&self.closeness_matrix, n)?;
        Ok(ConstructiveInput {
            grid_width: gw,
            grid_height: gh,
            departments: planned,
            blocked,
            relationships: Relationships::new(matrix, self.closeness_weights),
            options: self.options.clone(),
            seed_rule: self.seed_rule,
        })
    }
}

impl ImprovementRequest {
    /// Resolve into search input. Voids and pinned departments become locked
    /// items; the effective flow matrix covers real departments only.
    pub fn prepare(&self) -> Result<ImprovementInput, LayoutError> {
        let (gw, gh) = (self.grid_width, self.grid_height);
        check_grid(gw, gh)?;

        let n = real_count(&self.departments);
        if n == 0 {
            return Err(LayoutError::NoDepartments);
        }

        let mut pinned = Vec::new();
        let mut items = Vec::with_capacity(self.departments.len());
        let mut next_index = 0;

        for d in &self.departments {
            let locked = d.is_void() || d.is_pinned();
            let rect = if locked {
                let rect = pinned_rect(d, gw, gh)?;
                pinned.push(Pinned {
                    name: d.name.clone(),
                    rect,
                });
                rect
            } else {
                let (w, h) = d
                    .footprint(gw, gh)
                    .ok_or_else(|| LayoutError::MissingFootprint {
                        name: d.name.clone(),
                    })?;
                CellRect::new(d.x.unwrap_or(0), d.y.unwrap_or(0), w, h)
            };
            let matrix_index = if d.is_void() {
                None
            } else {
                next_index += 1;
                Some(next_index - 1)
            };
            items.push(SearchItem {
                name: d.name.clone(),
                kind: d.kind,
                locked,
                matrix_index,
                rect,
            });
        }

        check_pinned_overlaps(&pinned)?;

        let raw = self
            .flow_matrix
            .as_ref()
            .map(|rows| FlowMatrix::from_rows(rows, n))
            .transpose()?;
        let chart = self
            .closeness_matrix
            .as_ref()
            .map(|rows| RelationshipMatrix::from_rows(rows, n))
            .transpose()?;
        let flow = FlowMatrix::effective(
            n,
            raw.as_ref(),
            chart.as_ref(),
            &self.closeness_weights,
            self.options.closeness_lambda,
        );
        if flow.is_zero() {
            log::warn!("improvement request '{}' has no flow or closeness to optimize", self.name);
        }

        Ok(ImprovementInput {
            grid_width: gw,
            grid_height: gh,
            items,
            flow,
            metric: self.metric,
            options: self.options.clone(),
        })
    }
}
