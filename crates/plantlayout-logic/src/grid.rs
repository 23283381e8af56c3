//! Grid occupancy store.
//!
//! A flat row-major arena holding an occupied flag and an optional owner per
//! cell. Obstacles are occupied cells without an owner. Queries outside the
//! grid read as occupied so callers never index past the arena.

use crate::geometry::CellRect;

/// What sits in a (possibly out-of-bounds) neighbor cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighbor {
    OutOfBounds,
    Free,
    /// Occupied with no owner (void department or obstacle).
    Obstacle,
    /// Occupied by a placed department.
    Owned(usize),
}

/// Occupancy and ownership for every cell of a `width × height` grid.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    occupied: Vec<bool>,
    owner: Vec<Option<usize>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        let cells = width * height;
        Self {
            width,
            height,
            occupied: vec![false; cells],
            owner: vec![None; cells],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    pub fn capacity(&self) -> usize {
        self.width * self.height
    }

    /// Number of cells not yet occupied.
    pub fn free_cells(&self) -> usize {
        self.occupied.iter().filter(|&&o| !o).count()
    }

    /// Geometric center of the grid.
    pub fn center(&self) -> (f64, f64) {
        (self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        self.index(x, y).map_or(true, |i| self.occupied[i])
    }

    pub fn owner(&self, x: usize, y: usize) -> Option<usize> {
        self.index(x, y).and_then(|i| self.owner[i])
    }

    /// Classify a cell given signed coordinates (neighbors of edge cells go negative).
    pub fn neighbor(&self, x: isize, y: isize) -> Neighbor {
        if x < 0 || y < 0 {
            return Neighbor::OutOfBounds;
        }
        match self.index(x as usize, y as usize) {
            None => Neighbor::OutOfBounds,
            Some(i) if !self.occupied[i] => Neighbor::Free,
            Some(i) => match self.owner[i] {
                Some(dept) => Neighbor::Owned(dept),
                None => Neighbor::Obstacle,
            },
        }
    }

    /// True iff the rectangle lies within bounds and every cell is free.
    pub fn fits(&self, rect: &CellRect) -> bool {
        if !rect.within(self.width, self.height) {
            return false;
        }
        for y in rect.y..rect.bottom() {
            let row = y * self.width;
            if self.occupied[row + rect.x..row + rect.right()]
                .iter()
                .any(|&o| o)
            {
                return false;
            }
        }
        true
    }

    /// Set or clear occupancy over the rectangle. Clearing also drops the owner.
    /// Cells outside the grid are ignored.
    pub fn mark(&mut self, rect: &CellRect, owner: Option<usize>, occupied: bool) {
        let right = rect.right().min(self.width);
        let bottom = rect.bottom().min(self.height);
        for y in rect.y..bottom {
            for x in rect.x..right {
                let i = y * self.width + x;
                self.occupied[i] = occupied;
                self.owner[i] = if occupied { owner } else { None };
            }
        }
    }

    /// Seed permanently occupied, ownerless cells before any department placement.
    pub fn pre_mark_obstacles(&mut self, rects: &[CellRect]) {
        for rect in rects {
            self.mark(rect, None, true);
        }
    }

    /// First free cell in row-major order (rows top to bottom, columns left to right).
    pub fn first_free_cell(&self) -> Option<(usize, usize)> {
        self.occupied
            .iter()
            .position(|&o| !o)
            .map(|i| (i % self.width, i / self.width))
    }

    /// First row-major slot where a `width × height` box fits entirely in free cells.
    pub fn first_fit(&self, width: usize, height: usize) -> Option<(usize, usize)> {
        if width == 0 || height == 0 || width > self.width || height > self.height {
            return None;
        }
        for y in 0..=(self.height - height) {
            for x in 0..=(self.width - width) {
                if self.fits(&CellRect::new(x, y, width, height)) {
                    return Some((x, y));
                }
            }
        }
        None
    }

    /// Render the owner map as text, one character per cell: `.` free,
    /// `#` obstacle, otherwise a letter cycling through `A..Z` by owner index.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let c = match self.neighbor(x as isize, y as isize) {
                    Neighbor::Free | Neighbor::OutOfBounds => '.',
                    Neighbor::Obstacle => '#',
                    Neighbor::Owned(dept) => (b'A' + (dept % 26) as u8) as char,
                };
                out.push(c);
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_empty() {
        let grid = Grid::new(4, 3);
        assert_eq!(grid.capacity(), 12);
        assert_eq!(grid.free_cells(), 12);
        assert_eq!(grid.first_free_cell(), Some((0, 0)));
    }

    #[test]
    fn fits_respects_bounds() {
        let grid = Grid::new(4, 4);
        assert!(grid.fits(&CellRect::new(2, 2, 2, 2)));
        assert!(!grid.fits(&CellRect::new(3, 0, 2, 1)));
        assert!(!grid.fits(&CellRect::new(0, 3, 1, 2)));
        assert!(!grid.fits(&CellRect::new(0, 0, 0, 1)));
    }

    #[test]
    fn mark_sets_owner_and_blocks_fit() {
        let mut grid = Grid::new(4, 4);
        grid.mark(&CellRect::new(1, 1, 2, 2), Some(7), true);
        assert!(grid.is_occupied(1, 1));
        assert_eq!(grid.owner(2, 2), Some(7));
        assert!(!grid.fits(&CellRect::new(0, 0, 2, 2)));
        assert!(grid.fits(&CellRect::new(3, 0, 1, 4)));
        assert_eq!(grid.free_cells(), 12);
    }

    #[test]
    fn clearing_drops_owner() {
        let mut grid = Grid::new(3, 3);
        let rect = CellRect::new(0, 0, 2, 1);
        grid.mark(&rect, Some(1), true);
        grid.mark(&rect, Some(1), false);
        assert!(!grid.is_occupied(0, 0));
        assert_eq!(grid.owner(0, 0), None);
    }

    #[test]
    fn obstacles_are_ownerless() {
        let mut grid = Grid::new(3, 3);
        grid.pre_mark_obstacles(&[CellRect::new(1, 0, 1, 3)]);
        assert_eq!(grid.neighbor(1, 1), Neighbor::Obstacle);
        assert_eq!(grid.neighbor(0, 1), Neighbor::Free);
        assert_eq!(grid.neighbor(-1, 0), Neighbor::OutOfBounds);
        assert_eq!(grid.neighbor(3, 0), Neighbor::OutOfBounds);
        assert_eq!(grid.free_cells(), 6);
    }

    #[test]
    fn first_free_cell_is_row_major() {
        let mut grid = Grid::new(3, 2);
        grid.mark(&CellRect::new(0, 0, 3, 1), Some(0), true);
        grid.mark(&CellRect::new(0, 1, 1, 1), Some(0), true);
        assert_eq!(grid.first_free_cell(), Some((1, 1)));
        grid.mark(&CellRect::new(1, 1, 2, 1), Some(0), true);
        assert_eq!(grid.first_free_cell(), None);
    }

    #[test]
    fn first_fit_skips_blocked_slots() {
        let mut grid = Grid::new(5, 3);
        grid.mark(&CellRect::new(0, 0, 2, 2), None, true);
        assert_eq!(grid.first_fit(2, 2), Some((2, 0)));
        assert_eq!(grid.first_fit(5, 1), Some((0, 2)));
        assert_eq!(grid.first_fit(6, 1), None);
    }

    #[test]
    fn out_of_bounds_reads_as_occupied() {
        let grid = Grid::new(2, 2);
        assert!(grid.is_occupied(2, 0));
        assert_eq!(grid.owner(5, 5), None);
    }

    #[test]
    fn render_shows_owners_and_obstacles() {
        let mut grid = Grid::new(3, 2);
        grid.pre_mark_obstacles(&[CellRect::new(2, 0, 1, 2)]);
        grid.mark(&CellRect::new(0, 0, 1, 2), Some(1), true);
        assert_eq!(grid.render(), "B.#\nB.#\n");
    }
}
