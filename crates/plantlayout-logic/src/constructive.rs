//! Constructive placement: tier-driven seed-and-grow.
//!
//! Anchored departments are committed first, then a seed department is
//! placed near the grid center. Every following commit picks the next
//! department by closeness tier against what is already placed, sizes a chunk
//! of its remaining area, and drops it where the candidate score is highest:
//!
//! ```text
//! score = PR + 0.06·centerGain + 0.03·padding + 0.1 + jitter·U[0,1)
//! ```
//!
//! PR sums pair weights over occupied edge neighbors (corners count half),
//! centerGain pulls toward the area-weighted centroid of committed rectangles
//! and padding nudges away from the grid border. Candidates must touch
//! something already occupied.
//!
//! A department never exceeds its fragment limit. When the last fragment
//! cannot hold the remainder, the largest piece that fits is committed and
//! the rest is reported as a shortfall, or the run fails with
//! `FragmentLimit` when `rejectPartial` is set.

use rand::Rng;

use crate::config::{make_rng, Budget, PlacementOptions, SeedRule};
use crate::department::Department;
use crate::error::LayoutError;
use crate::geometry::{validate_layout, CellRect, DeptRect};
use crate::grid::{Grid, Neighbor};
use crate::relationship::{Closeness, Relationships};
use crate::request::ConstructiveRequest;
use crate::result::{
    ConstructiveResult, GridEcho, PlacementRecord, PlacementStep, Score, Shortfall, TcrEntry,
};
use crate::scoring::adjacency_score;

pub const CENTER_PULL: f64 = 0.06;
pub const EDGE_PADDING: f64 = 0.03;
pub const TOUCH_BONUS: f64 = 0.1;
pub const CORNER_FACTOR: f64 = 0.5;

/// A real department resolved for placement. Its position in
/// [`ConstructiveInput::departments`] is its relationship-matrix index.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDepartment {
    pub profile: Department,
    pub cells: usize,
    /// Caller-supplied rectangle for fixed or locked departments.
    pub anchor: Option<CellRect>,
}

impl PlannedDepartment {
    pub fn name(&self) -> &str {
        &self.profile.name
    }
}

/// Everything the constructive engine needs, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructiveInput {
    pub grid_width: usize,
    pub grid_height: usize,
    pub departments: Vec<PlannedDepartment>,
    /// Void departments and obstacles.
    pub blocked: Vec<CellRect>,
    pub relationships: Relationships,
    pub options: PlacementOptions,
    pub seed_rule: SeedRule,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    rect: CellRect,
    pr: f64,
    score: f64,
}

struct Placer<'a, R: Rng> {
    input: &'a ConstructiveInput,
    rng: &'a mut R,
    budget: Budget,
    grid: Grid,
    tcrs: Vec<f64>,
    remaining: Vec<usize>,
    fragments: Vec<usize>,
    /// Out of fragments with area still unplaced.
    stalled: Vec<bool>,
    placed: Vec<bool>,
    order: Vec<usize>,
    rects: Vec<DeptRect>,
    steps: Vec<PlacementStep>,
}

impl<'a, R: Rng> Placer<'a, R> {
    fn new(input: &'a ConstructiveInput, rng: &'a mut R) -> Self {
        let n = input.departments.len();
        let mut grid = Grid::new(input.grid_width, input.grid_height);
        grid.pre_mark_obstacles(&input.blocked);
        Self {
            input,
            rng,
            budget: Budget::from_millis(input.options.deadline_ms),
            grid,
            tcrs: input.relationships.tcrs(),
            remaining: input.departments.iter().map(|d| d.cells).collect(),
            fragments: vec![0; n],
            stalled: vec![false; n],
            placed: vec![false; n],
            order: Vec::with_capacity(n),
            rects: Vec::new(),
            steps: Vec::new(),
        }
    }

    fn name(&self, dept: usize) -> &str {
        self.input.departments[dept].name()
    }

    /// Still has area to place and fragments to place it with.
    fn is_open(&self, dept: usize) -> bool {
        self.remaining[dept] > 0 && !self.stalled[dept]
    }

    fn check_deadline(&self) -> Result<(), LayoutError> {
        if self.budget.expired() {
            log::warn!("constructive placement hit its deadline after {} steps", self.steps.len());
            return Err(LayoutError::DeadlineExceeded {
                steps: self.steps.len(),
            });
        }
        Ok(())
    }

    fn jitter(&mut self) -> f64 {
        let amplitude = self.input.options.jitter;
        if amplitude > 0.0 {
            amplitude * self.rng.gen::<f64>()
        } else {
            0.0
        }
    }

    fn commit(&mut self, dept: usize, c: Candidate, tier: Option<Closeness>) {
        self.grid.mark(&c.rect, Some(dept), true);
        self.remaining[dept] = self.remaining[dept].saturating_sub(c.rect.area());
        self.fragments[dept] += 1;
        if !self.placed[dept] {
            self.placed[dept] = true;
            self.order.push(dept);
        }
        let name = self.name(dept).to_string();
        let step = self.steps.len() + 1;
        log::debug!(
            "step {}: '{}' at ({},{}) {}x{} pr={:.2} score={:.3} tier={}",
            step,
            name,
            c.rect.x,
            c.rect.y,
            c.rect.width,
            c.rect.height,
            c.pr,
            c.score,
            tier.map_or("none", |t| t.as_str())
        );
        self.steps.push(PlacementStep {
            step,
            name: name.clone(),
            index: dept,
            x: c.rect.x,
            y: c.rect.y,
            width: c.rect.width,
            height: c.rect.height,
            pr: c.pr,
            score: c.score,
            tier: tier.map_or("none", |t| t.as_str()),
            tcr: self.tcrs[dept],
        });
        self.rects.push(DeptRect {
            dept,
            name,
            rect: c.rect,
        });
    }

    // ── Anchors ─────────────────────────────────────────────────────────

    fn place_anchors(&mut self) -> Result<(), LayoutError> {
        for dept in 0..self.input.departments.len() {
            let Some(rect) = self.input.departments[dept].anchor else {
                continue;
            };
            if !self.grid.fits(&rect) {
                let other = self
                    .rects
                    .iter()
                    .find(|r| r.rect.overlaps(&rect))
                    .map_or_else(|| "blocked cells".to_string(), |r| r.name.clone());
                return Err(LayoutError::FixedOverlap {
                    first: self.name(dept).to_string(),
                    second: other,
                });
            }
            let candidate = Candidate {
                rect,
                pr: 0.0,
                score: 0.0,
            };
            self.commit(dept, candidate, None);
        }
        Ok(())
    }

    // ── Seed ────────────────────────────────────────────────────────────

    fn choose_seed(&mut self) -> Option<usize> {
        let open: Vec<usize> = (0..self.remaining.len())
            .filter(|&i| self.is_open(i))
            .collect();
        if open.is_empty() {
            return None;
        }
        let input = self.input;
        let cells = |i: usize| input.departments[i].cells;
        let seed = match self.input.seed_rule {
            SeedRule::Random => open[self.rng.gen_range(0..open.len())],
            SeedRule::MaxTcr => open.iter().copied().fold(open[0], |best, i| {
                let better = self.tcrs[i] > self.tcrs[best]
                    || (self.tcrs[i] == self.tcrs[best] && cells(i) > cells(best));
                if better {
                    i
                } else {
                    best
                }
            }),
            SeedRule::MaxArea => open.iter().copied().fold(open[0], |best, i| {
                let better = cells(i) > cells(best)
                    || (cells(i) == cells(best) && self.tcrs[i] > self.tcrs[best]);
                if better {
                    i
                } else {
                    best
                }
            }),
        };
        Some(seed)
    }

    /// Best whole-block position for `cells` near the grid center: for each
    /// shape the closest fitting position, then highest padding across shapes.
    fn center_fit(&mut self, dept: usize, cells: usize) -> Option<CellRect> {
        let (gw, gh) = (self.grid.width(), self.grid.height());
        let center = self.grid.center();
        let shapes = self.input.departments[dept]
            .profile
            .shape_candidates(cells, gw, gh);

        let mut best: Option<(f64, CellRect)> = None;
        for (w, h) in shapes {
            let Some(rect) = positions_by_distance(gw, gh, w, h, center)
                .into_iter()
                .find(|r| self.grid.fits(r))
            else {
                continue;
            };
            let score = EDGE_PADDING * rect.edge_padding(gw, gh) as f64 + self.jitter();
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, rect));
            }
        }
        best.map(|(_, rect)| rect)
    }

    fn place_seed(&mut self, seed: usize) -> Result<(), LayoutError> {
        let cells = self.remaining[seed];
        let limit = self.input.options.fragment_limit();
        let may_shrink = limit > 1 || !self.input.options.reject_partial;

        let mut rect = self.center_fit(seed, cells);
        if rect.is_none() && may_shrink {
            let mut chunk = self.input.departments[seed].cells.div_ceil(limit).min(cells);
            while rect.is_none() && chunk > 0 {
                rect = self.center_fit(seed, chunk);
                chunk -= 1;
            }
        }
        if rect.is_none() && (cells == 1 || may_shrink) {
            rect = self
                .grid
                .first_free_cell()
                .map(|(x, y)| CellRect::new(x, y, 1, 1));
        }
        let rect = rect.ok_or_else(|| LayoutError::SeedUnplaceable {
            name: self.name(seed).to_string(),
        })?;

        let candidate = Candidate {
            rect,
            pr: 0.0,
            score: 0.0,
        };
        self.commit(seed, candidate, None);
        self.check_fragments(seed)
    }

    // ── Selection ───────────────────────────────────────────────────────

    /// Next department with remaining area, by closeness tier to the placed
    /// set; max TCR within the first non-empty tier, lowest index on ties.
    fn pick_next(&self) -> Option<(usize, Option<Closeness>)> {
        let open: Vec<usize> = (0..self.remaining.len())
            .filter(|&i| self.is_open(i))
            .collect();
        if open.is_empty() {
            return None;
        }
        let matrix = &self.input.relationships.matrix;
        for tier in Closeness::TIERS {
            let bucket: Vec<usize> = open
                .iter()
                .copied()
                .filter(|&i| {
                    (0..self.placed.len())
                        .any(|j| j != i && self.placed[j] && matrix.relates_at(i, j, tier))
                })
                .collect();
            if !bucket.is_empty() {
                return Some((self.max_tcr(&bucket), Some(tier)));
            }
        }
        Some((self.max_tcr(&open), None))
    }

    fn max_tcr(&self, among: &[usize]) -> usize {
        among[1..].iter().copied().fold(among[0], |best, i| {
            if self.tcrs[i] > self.tcrs[best] {
                i
            } else {
                best
            }
        })
    }

    // ── Growth ──────────────────────────────────────────────────────────

    /// Area-weighted centroid of everything committed, or the grid center.
    fn cluster_centroid(&self) -> (f64, f64) {
        let (mut ax, mut ay, mut total) = (0.0, 0.0, 0.0);
        for r in &self.rects {
            let area = r.rect.area() as f64;
            let (cx, cy) = r.rect.center();
            ax += cx * area;
            ay += cy * area;
            total += area;
        }
        if total > 0.0 {
            (ax / total, ay / total)
        } else {
            self.grid.center()
        }
    }

    fn neighbor_weight(&self, dept: usize, x: isize, y: isize, touching: &mut bool) -> f64 {
        match self.grid.neighbor(x, y) {
            Neighbor::Owned(other) => {
                *touching = true;
                if other == dept {
                    0.0
                } else {
                    self.input.relationships.pair_weight(dept, other)
                }
            }
            Neighbor::Obstacle => {
                *touching = true;
                0.0
            }
            Neighbor::Free | Neighbor::OutOfBounds => 0.0,
        }
    }

    /// Score a fitting rectangle; `None` if it touches nothing occupied.
    fn evaluate(&mut self, dept: usize, rect: CellRect, target: (f64, f64)) -> Option<Candidate> {
        let (x0, y0) = (rect.x as isize, rect.y as isize);
        let (x1, y1) = (rect.right() as isize, rect.bottom() as isize);
        let mut touching = false;
        let mut pr = 0.0;

        for x in x0..x1 {
            pr += self.neighbor_weight(dept, x, y0 - 1, &mut touching);
            pr += self.neighbor_weight(dept, x, y1, &mut touching);
        }
        for y in y0..y1 {
            pr += self.neighbor_weight(dept, x0 - 1, y, &mut touching);
            pr += self.neighbor_weight(dept, x1, y, &mut touching);
        }
        for (cx, cy) in [(x0 - 1, y0 - 1), (x1, y0 - 1), (x0 - 1, y1), (x1, y1)] {
            pr += CORNER_FACTOR * self.neighbor_weight(dept, cx, cy, &mut touching);
        }
        if !touching {
            return None;
        }

        let (cx, cy) = rect.center();
        let center_gain = -((cx - target.0).abs() + (cy - target.1).abs());
        let padding = rect.edge_padding(self.grid.width(), self.grid.height()) as f64;
        let score = pr
            + CENTER_PULL * center_gain
            + EDGE_PADDING * padding
            + TOUCH_BONUS
            + self.jitter();
        Some(Candidate { rect, pr, score })
    }

    /// Highest-scoring touching position for a piece of `cells` cells.
    fn best_for_piece(&mut self, dept: usize, cells: usize) -> Option<Candidate> {
        let (gw, gh) = (self.grid.width(), self.grid.height());
        let target = self.cluster_centroid();
        let shapes = self.input.departments[dept]
            .profile
            .shape_candidates(cells, gw, gh);

        let mut best: Option<Candidate> = None;
        for (w, h) in shapes {
            for rect in positions_by_distance(gw, gh, w, h, target) {
                if !self.grid.fits(&rect) {
                    continue;
                }
                let Some(c) = self.evaluate(dept, rect, target) else {
                    continue;
                };
                if best.map_or(true, |b| c.score > b.score) {
                    best = Some(c);
                }
            }
        }
        best
    }

    fn fragment_error(&self, dept: usize, limit: usize) -> LayoutError {
        LayoutError::FragmentLimit {
            name: self.name(dept).to_string(),
            limit,
            remaining: self.remaining[dept],
        }
    }

    /// Stall a department that has used its last fragment with area left,
    /// or fail under `rejectPartial`.
    fn check_fragments(&mut self, dept: usize) -> Result<(), LayoutError> {
        let limit = self.input.options.fragment_limit();
        if self.remaining[dept] == 0 || self.fragments[dept] < limit {
            return Ok(());
        }
        if self.input.options.reject_partial {
            return Err(self.fragment_error(dept, limit));
        }
        log::warn!(
            "'{}' used all {} fragments with {} cells unplaced",
            self.name(dept),
            limit,
            self.remaining[dept]
        );
        self.stalled[dept] = true;
        Ok(())
    }

    fn place_next(&mut self, dept: usize, tier: Option<Closeness>) -> Result<(), LayoutError> {
        let limit = self.input.options.fragment_limit();
        let rem = self.remaining[dept];
        let used = self.fragments[dept];
        if used >= limit {
            return self.check_fragments(dept);
        }
        let frags_left = limit - used;
        // Shrinking the last fragment leaves the department short.
        let may_shrink = frags_left > 1 || !self.input.options.reject_partial;
        let chunk = if self.input.options.allow_splitting {
            rem.div_ceil(frags_left)
        } else {
            rem
        };

        let mut best = self.best_for_piece(dept, chunk);
        if best.is_none() && may_shrink {
            let mut piece = chunk;
            while best.is_none() && piece > 1 {
                piece -= 1;
                best = self.best_for_piece(dept, piece);
            }
        }

        let candidate = match best {
            Some(c) => c,
            None => {
                if rem > 1 && !may_shrink {
                    return Err(self.fragment_error(dept, limit));
                }
                let (x, y) = self.grid.first_free_cell().ok_or_else(|| {
                    LayoutError::GridExhausted {
                        name: self.name(dept).to_string(),
                        remaining: rem,
                    }
                })?;
                log::warn!(
                    "no touching slot for '{}'; falling back to free cell ({},{})",
                    self.name(dept),
                    x,
                    y
                );
                Candidate {
                    rect: CellRect::new(x, y, 1, 1),
                    pr: 0.0,
                    score: 0.0,
                }
            }
        };
        self.commit(dept, candidate, tier);
        self.check_fragments(dept)
    }

    // ── Driver ──────────────────────────────────────────────────────────

    fn run(mut self) -> Result<ConstructiveResult, LayoutError> {
        let input = self.input;
        let required = input
            .departments
            .iter()
            .fold(0usize, |acc, d| acc.saturating_add(d.cells));
        let capacity = self.grid.free_cells();
        if required > capacity {
            return Err(LayoutError::CapacityExceeded { required, capacity });
        }

        self.check_deadline()?;
        self.place_anchors()?;

        let seed = self.choose_seed();
        if let Some(seed) = seed {
            self.check_deadline()?;
            self.place_seed(seed)?;
        }

        loop {
            self.check_deadline()?;
            let Some((dept, tier)) = self.pick_next() else {
                break;
            };
            self.place_next(dept, tier)?;
        }

        let closeness = adjacency_score(&self.rects, &input.relationships);
        let requested: Vec<usize> = input.departments.iter().map(|d| d.cells).collect();
        let anchors: Vec<(usize, CellRect)> = input
            .departments
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.anchor.map(|r| (i, r)))
            .collect();
        let diagnostics = validate_layout(
            &self.rects,
            input.grid_width,
            input.grid_height,
            input.options.fragment_limit(),
            &requested,
            &anchors,
        );

        let shortfalls: Vec<Shortfall> = input
            .departments
            .iter()
            .zip(&self.remaining)
            .filter(|(_, &rem)| rem > 0)
            .map(|(d, &rem)| Shortfall {
                name: d.name().to_string(),
                placed: d.cells - rem,
                requested: d.cells,
            })
            .collect();

        log::info!(
            "constructive layout: {} departments, {} rectangles in {} steps, score {:.1}, {} short",
            input.departments.len(),
            self.rects.len(),
            self.steps.len(),
            closeness,
            shortfalls.len()
        );

        let placements = self
            .rects
            .iter()
            .enumerate()
            .map(|(k, r)| PlacementRecord {
                name: r.name.clone(),
                x: r.rect.x,
                y: r.rect.y,
                width: r.rect.width,
                height: r.rect.height,
                part: k,
                step: k + 1,
                dept: r.dept,
            })
            .collect();

        Ok(ConstructiveResult {
            grid: GridEcho {
                width: input.grid_width,
                height: input.grid_height,
                cell_size_meters: input.options.cell_size_meters,
            },
            tcr: input
                .departments
                .iter()
                .zip(&self.tcrs)
                .map(|(d, &tcr)| TcrEntry {
                    name: d.name().to_string(),
                    tcr,
                })
                .collect(),
            seed: seed.map(|s| input.departments[s].name().to_string()),
            order: self
                .order
                .iter()
                .map(|&i| input.departments[i].name().to_string())
                .collect(),
            steps: input.options.include_trace.then_some(self.steps),
            score: Score {
                total: closeness,
                closeness,
            },
            placements,
            shortfalls,
            diagnostics,
            blocked: input.blocked.clone(),
        })
    }
}

/// Every in-bounds position for a `w × h` box, nearest center to `target`
/// first (Manhattan). Equal distances keep row-major order.
fn positions_by_distance(
    grid_width: usize,
    grid_height: usize,
    w: usize,
    h: usize,
    target: (f64, f64),
) -> Vec<CellRect> {
    if w == 0 || h == 0 || w > grid_width || h > grid_height {
        return Vec::new();
    }
    let mut coords = Vec::with_capacity((grid_width - w + 1) * (grid_height - h + 1));
    for y in 0..=(grid_height - h) {
        for x in 0..=(grid_width - w) {
            let rect = CellRect::new(x, y, w, h);
            let (cx, cy) = rect.center();
            coords.push(((cx - target.0).abs() + (cy - target.1).abs(), rect));
        }
    }
    coords.sort_by(|a, b| a.0.total_cmp(&b.0));
    coords.into_iter().map(|(_, r)| r).collect()
}

/// Run the constructive engine on a validated input.
pub fn generate(
    input: &ConstructiveInput,
    rng: &mut impl Rng,
) -> Result<ConstructiveResult, LayoutError> {
    Placer::new(input, rng).run()
}

/// Validate a request and run it with a generator seeded from its options.
pub fn run(request: &ConstructiveRequest) -> Result<ConstructiveResult, LayoutError> {
    let input = request.prepare()?;
    let mut rng = make_rng(input.options.seed);
    generate(&input, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn letters(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn request(gw: usize, gh: usize, areas: &[usize], matrix: &[&[&str]]) -> ConstructiveRequest {
        ConstructiveRequest {
            name: "test".into(),
            grid_width: gw,
            grid_height: gh,
            departments: areas
                .iter()
                .enumerate()
                .map(|(i, &a)| Department::with_area(format!("D{}", i), a))
                .collect(),
            closeness_matrix: letters(matrix),
            options: PlacementOptions {
                jitter: 0.0,
                seed: Some(1),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn placer_for(input: &ConstructiveInput, rng: &mut StdRng) -> Result<(), LayoutError> {
        let mut p = Placer::new(input, rng);
        p.place_anchors()
    }

    #[test]
    fn positions_sorted_by_distance() {
        let positions = positions_by_distance(3, 1, 1, 1, (1.5, 0.5));
        assert_eq!(positions[0], CellRect::new(1, 0, 1, 1));
        assert_eq!(positions[1], CellRect::new(0, 0, 1, 1));
        assert_eq!(positions[2], CellRect::new(2, 0, 1, 1));
        assert!(positions_by_distance(2, 2, 3, 1, (1.0, 1.0)).is_empty());
    }

    #[test]
    fn seed_lands_on_grid_center() {
        let req = request(4, 4, &[4], &[&[""]]);
        let result = run(&req).unwrap();
        assert_eq!(result.seed.as_deref(), Some("D0"));
        assert_eq!(result.rects_of(0), vec![CellRect::new(1, 1, 2, 2)]);
    }

    #[test]
    fn seed_rule_max_tcr_breaks_ties_by_area() {
        let req = request(4, 4, &[2, 4], &[&["", ""], &["", ""]]);
        let result = run(&req).unwrap();
        assert_eq!(result.seed.as_deref(), Some("D1"));
    }

    #[test]
    fn seed_rule_max_area() {
        let mut req = request(6, 6, &[2, 6, 3], &[&["", "", "A"], &["", "", ""], &["A", "", ""]]);
        req.seed_rule = SeedRule::MaxArea;
        let result = run(&req).unwrap();
        assert_eq!(result.seed.as_deref(), Some("D1"));

        req.seed_rule = SeedRule::MaxTcr;
        let result = run(&req).unwrap();
        assert_eq!(result.seed.as_deref(), Some("D2"));
    }

    #[test]
    fn tier_selection_prefers_stronger_relation() {
        // D0 seeds (highest TCR); D2 is A-related to it, D1 only O-related.
        let req = request(
            6,
            6,
            &[4, 4, 4],
            &[&["", "O", "A"], &["O", "", ""], &["A", "", ""]],
        );
        let result = run(&req).unwrap();
        assert_eq!(result.order, vec!["D0", "D2", "D1"]);
        let steps = result.steps.unwrap();
        assert_eq!(steps[0].tier, "none");
        assert_eq!(steps[1].tier, "A");
        assert_eq!(steps.last().map(|s| s.tier), Some("O"));
    }

    #[test]
    fn no_relation_falls_back_to_global_tcr() {
        let req = request(
            6,
            6,
            &[2, 2, 2],
            &[&["", "X", ""], &["X", "", ""], &["", "", ""]],
        );
        let result = run(&req).unwrap();
        let steps = result.steps.unwrap();
        assert!(steps.iter().all(|s| s.tier == "none"));
        assert_eq!(result.order.len(), 3);
    }

    #[test]
    fn anchored_departments_commit_first() {
        let mut req = request(5, 5, &[4, 4], &[&["", "A"], &["A", ""]]);
        req.departments[1] = Department::with_rect("D1", CellRect::new(0, 0, 2, 2)).locked();
        let result = run(&req).unwrap();
        assert_eq!(result.order[0], "D1");
        assert_eq!(result.seed.as_deref(), Some("D0"));
        assert_eq!(result.rects_of(1), vec![CellRect::new(0, 0, 2, 2)]);
        assert!(result.is_valid(), "{:?}", result.diagnostics);
    }

    #[test]
    fn all_anchored_has_no_seed() {
        let mut req = request(4, 2, &[4, 4], &[&["", "E"], &["E", ""]]);
        req.departments[0] = Department::with_rect("D0", CellRect::new(0, 0, 2, 2)).fixed();
        req.departments[1] = Department::with_rect("D1", CellRect::new(2, 0, 2, 2)).fixed();
        let result = run(&req).unwrap();
        assert_eq!(result.seed, None);
        assert_eq!(result.score.total, 2.0 * 16.0);
    }

    #[test]
    fn anchor_over_obstacle_rejected() {
        let req = request(4, 4, &[4], &[&[""]]);
        let mut input = req.prepare().unwrap();
        input.departments[0].anchor = Some(CellRect::new(0, 0, 2, 2));
        input.blocked.push(CellRect::new(1, 1, 1, 1));
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            placer_for(&input, &mut rng),
            Err(LayoutError::FixedOverlap { .. })
        ));
    }

    #[test]
    fn unsplittable_seed_fails_when_partial_rejected() {
        let mut req = request(7, 1, &[6], &[&[""]]);
        req.obstacles = vec![CellRect::new(3, 0, 1, 1)];
        req.options.allow_splitting = false;
        req.options.reject_partial = true;
        assert_eq!(
            run(&req).unwrap_err(),
            LayoutError::SeedUnplaceable { name: "D0".into() }
        );
    }

    #[test]
    fn unsplittable_seed_takes_largest_piece() {
        let mut req = request(7, 1, &[6], &[&[""]]);
        req.obstacles = vec![CellRect::new(3, 0, 1, 1)];
        req.options.allow_splitting = false;
        let result = run(&req).unwrap();
        assert_eq!(result.rects_of(0), vec![CellRect::new(0, 0, 3, 1)]);
        assert_eq!(
            result.shortfalls,
            vec![Shortfall {
                name: "D0".into(),
                placed: 3,
                requested: 6
            }]
        );
        assert!(!result.is_complete());
        assert!(result.is_valid(), "{:?}", result.diagnostics);
    }

    /// Locked center cell: no 2x2 block or 4-cell bar fits in a 3x3 grid.
    fn ringed_request() -> ConstructiveRequest {
        let mut req = request(
            3,
            3,
            &[1, 1, 4],
            &[&["", "A", ""], &["A", "", ""], &["", "", ""]],
        );
        req.departments[0] = Department::with_rect("D0", CellRect::new(1, 1, 1, 1)).locked();
        req
    }

    #[test]
    fn fragment_limit_is_enforced_when_partial_rejected() {
        let mut req = ringed_request();
        req.options.allow_splitting = false;
        req.options.reject_partial = true;
        let err = run(&req).unwrap_err();
        assert!(matches!(err, LayoutError::FragmentLimit { limit: 1, remaining: 4, .. }));

        req.options.allow_splitting = true;
        req.options.max_fragments_per_dept = 4;
        let result = run(&req).unwrap();
        assert_eq!(result.rects_of(2).len(), 4);
        assert!(result.is_complete());
        assert!(result.is_valid(), "{:?}", result.diagnostics);
    }

    #[test]
    fn fragment_limit_leaves_department_short() {
        let mut req = ringed_request();
        req.options.allow_splitting = false;
        let result = run(&req).unwrap();

        let rects = result.rects_of(2);
        assert_eq!(rects.len(), 1);
        assert!(rects[0].area() < 4);
        assert_eq!(result.shortfalls.len(), 1);
        assert_eq!(result.shortfalls[0].name, "D2");
        assert_eq!(result.shortfalls[0].placed, rects[0].area());
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.category == "area" && d.severity == crate::geometry::Severity::Warning));
        assert!(result.is_valid(), "{:?}", result.diagnostics);
    }

    #[test]
    fn tier_bucket_tie_goes_to_lower_index() {
        // D1 and D2 are both A-related to D0 only, with equal TCR and area.
        let req = request(
            6,
            6,
            &[2, 2, 2],
            &[&["", "A", "A"], &["A", "", ""], &["A", "", ""]],
        );
        let result = run(&req).unwrap();
        assert_eq!(result.tcr[1].tcr, result.tcr[2].tcr);
        assert_eq!(result.order, vec!["D0", "D1", "D2"]);
        let steps = result.steps.unwrap();
        assert_eq!(steps[1].name, "D1");
        assert_eq!(steps[1].tier, "A");
    }

    #[test]
    fn aspect_bound_shapes_seed() {
        let mut req = request(6, 6, &[4], &[&[""]]);
        let result = run(&req).unwrap();
        assert_eq!(result.rects_of(0)[0].width, 2);

        req.departments[0].min_aspect_ratio = Some(4.0);
        let result = run(&req).unwrap();
        let rect = result.rects_of(0)[0];
        assert_eq!((rect.width, rect.height), (4, 1));
    }

    #[test]
    fn aspect_bound_shapes_grown_department() {
        let mut req = request(8, 8, &[4, 4], &[&["", "A"], &["A", ""]]);
        req.options.allow_splitting = false;
        req.departments[1].min_aspect_ratio = Some(4.0);
        let result = run(&req).unwrap();
        assert_eq!(result.rects_of(0), vec![CellRect::new(3, 3, 2, 2)]);
        let grown = result.rects_of(1);
        assert_eq!(grown.len(), 1);
        assert_eq!((grown[0].width, grown[0].height), (4, 1));
        assert!(result.is_valid(), "{:?}", result.diagnostics);
    }

    #[test]
    fn zero_deadline_aborts() {
        let mut req = request(4, 4, &[4], &[&[""]]);
        req.options.deadline_ms = Some(0);
        assert_eq!(
            run(&req).unwrap_err(),
            LayoutError::DeadlineExceeded { steps: 0 }
        );
    }

    #[test]
    fn trace_can_be_disabled() {
        let mut req = request(4, 4, &[4, 4], &[&["", "A"], &["A", ""]]);
        req.options.include_trace = false;
        let result = run(&req).unwrap();
        assert!(result.steps.is_none());
        assert_eq!(result.placements.last().map(|p| p.step), Some(result.placements.len()));
    }

    #[test]
    fn random_seed_rule_uses_generator() {
        let mut req = request(
            6,
            6,
            &[2, 2, 2, 2],
            &[
                &["", "", "", ""],
                &["", "", "", ""],
                &["", "", "", ""],
                &["", "", "", ""],
            ],
        );
        req.seed_rule = SeedRule::Random;
        let input = req.prepare().unwrap();
        let a = generate(&input, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = generate(&input, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a.seed, b.seed);
        assert_eq!(a.placements, b.placements);
    }
}
