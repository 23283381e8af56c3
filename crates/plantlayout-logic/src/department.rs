//! Department model: kinds, footprints and candidate shapes.

use serde::{Deserialize, Serialize};

use crate::geometry::{factor_pairs, CellRect};

/// Real departments take part in relationship scoring; voids only block cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepartmentKind {
    #[default]
    Dept,
    Void,
}

/// A named area to be placed on the grid.
///
/// The footprint comes from `width × height` when both are given, otherwise
/// from `area` (whole cells). `x`/`y` are required for fixed, locked and void
/// entries; for movable departments in the swap search they are the original
/// coordinates used when packing fails.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Department {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DepartmentKind,
    pub fixed: bool,
    pub locked: bool,
    pub x: Option<usize>,
    pub y: Option<usize>,
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub area: Option<f64>,
    pub min_aspect_ratio: Option<f64>,
    pub max_aspect_ratio: Option<f64>,
}

impl Department {
    /// A real department sized by area alone.
    pub fn with_area(name: impl Into<String>, area: usize) -> Self {
        Self {
            name: name.into(),
            area: Some(area as f64),
            ..Default::default()
        }
    }

    /// A real department with an explicit box at an initial position.
    pub fn with_rect(name: impl Into<String>, rect: CellRect) -> Self {
        Self {
            name: name.into(),
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            ..Default::default()
        }
    }

    /// An obstacle occupying `rect`.
    pub fn void(name: impl Into<String>, rect: CellRect) -> Self {
        Self {
            kind: DepartmentKind::Void,
            ..Self::with_rect(name, rect)
        }
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    pub fn is_void(&self) -> bool {
        self.kind == DepartmentKind::Void
    }

    /// Position is supplied by the caller and never altered.
    pub fn is_pinned(&self) -> bool {
        self.fixed || self.locked
    }

    /// Requested cell count: `width × height` if both are set, otherwise
    /// `floor(area)`, clamped at zero. Saturates instead of overflowing.
    pub fn requested_cells(&self) -> usize {
        match (self.width, self.height) {
            (Some(w), Some(h)) => w.saturating_mul(h),
            _ => self.area.map_or(0, |a| a.max(0.0).floor() as usize),
        }
    }

    /// Explicit box, or the most square factor pair of the requested area
    /// that fits the grid. `None` when no footprint can be derived.
    pub fn footprint(&self, grid_width: usize, grid_height: usize) -> Option<(usize, usize)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => self
                .shape_candidates(self.requested_cells(), grid_width, grid_height)
                .into_iter()
                .next(),
        }
    }

    /// Declared rectangle, if the department carries a position and footprint.
    pub fn declared_rect(&self, grid_width: usize, grid_height: usize) -> Option<CellRect> {
        let (w, h) = self.footprint(grid_width, grid_height)?;
        Some(CellRect::new(self.x?, self.y?, w, h))
    }

    fn aspect_ok(&self, w: usize, h: usize) -> bool {
        let aspect = w as f64 / h as f64;
        self.min_aspect_ratio.map_or(true, |min| aspect >= min)
            && self.max_aspect_ratio.map_or(true, |max| aspect <= max)
    }

    /// Shapes for a piece of `cells` cells, near-square first. Aspect bounds
    /// drop shapes outside them unless that would leave nothing.
    pub fn shape_candidates(
        &self,
        cells: usize,
        grid_width: usize,
        grid_height: usize,
    ) -> Vec<(usize, usize)> {
        let all = factor_pairs(cells, grid_width, grid_height);
        if self.min_aspect_ratio.is_none() && self.max_aspect_ratio.is_none() {
            return all;
        }
        let filtered: Vec<_> = all
            .iter()
            .copied()
            .filter(|&(w, h)| self.aspect_ok(w, h))
            .collect();
        if filtered.is_empty() {
            all
        } else {
            filtered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_cells_prefers_explicit_box() {
        let mut d = Department::with_area("Stores", 7);
        assert_eq!(d.requested_cells(), 7);
        d.width = Some(2);
        d.height = Some(3);
        assert_eq!(d.requested_cells(), 6);
    }

    #[test]
    fn fractional_and_negative_area() {
        let mut d = Department::with_area("Office", 0);
        d.area = Some(4.9);
        assert_eq!(d.requested_cells(), 4);
        d.area = Some(-3.0);
        assert_eq!(d.requested_cells(), 0);
    }

    #[test]
    fn footprint_from_area_is_square_ish() {
        let d = Department::with_area("Press", 6);
        assert_eq!(d.footprint(10, 10), Some((2, 3)));
        assert_eq!(d.footprint(10, 1), Some((6, 1)));
        assert_eq!(Department::with_area("Empty", 0).footprint(5, 5), None);
    }

    #[test]
    fn aspect_bounds_filter_shapes() {
        let d = Department {
            min_aspect_ratio: Some(2.0),
            ..Department::with_area("Line", 8)
        };
        assert_eq!(d.shape_candidates(8, 10, 10), vec![(4, 2), (8, 1)]);
    }

    #[test]
    fn aspect_bounds_are_soft() {
        let d = Department {
            min_aspect_ratio: Some(10.0),
            ..Department::with_area("Line", 4)
        };
        assert_eq!(d.shape_candidates(4, 4, 4), vec![(2, 2), (1, 4), (4, 1)]);
    }

    #[test]
    fn declared_rect_needs_position() {
        let d = Department::with_area("Dock", 4);
        assert_eq!(d.declared_rect(5, 5), None);
        let d = Department::void("Column", CellRect::new(1, 2, 1, 1));
        assert_eq!(d.declared_rect(5, 5), Some(CellRect::new(1, 2, 1, 1)));
        assert!(d.is_void());
    }

    #[test]
    fn deserialize_with_type_key() {
        let d: Department = serde_json::from_str(
            r#"{"name":"Pillar","type":"void","x":1,"y":1,"width":1,"height":2,"locked":true}"#,
        )
        .unwrap();
        assert_eq!(d.kind, DepartmentKind::Void);
        assert!(d.is_pinned());
        assert_eq!(d.requested_cells(), 2);

        let d: Department =
            serde_json::from_str(r#"{"name":"Paint","area":12,"maxAspectRatio":1.5}"#).unwrap();
        assert_eq!(d.kind, DepartmentKind::Dept);
        assert_eq!(d.max_aspect_ratio, Some(1.5));
    }
}
