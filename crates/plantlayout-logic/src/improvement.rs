//! Improvement search: locked-aware packing plus pairwise swap hill climbing.
//!
//! Locked departments (locked, fixed or void) keep their rectangles. Movable
//! departments are packed in a given order, each into the first row-major slot
//! its box fits. The search swaps two positions of that order, repacks, and
//! keeps the new order only if the flow-distance cost drops.

use rand::Rng;

use crate::config::{make_rng, Budget, SearchOptions};
use crate::department::DepartmentKind;
use crate::error::LayoutError;
use crate::geometry::{check_overlaps, check_within_grid, CellRect, DeptRect};
use crate::grid::Grid;
use crate::request::ImprovementRequest;
use crate::result::{AssignedDepartment, ImprovementResult};
use crate::scoring::{flow_distance_cost, DistanceMetric, FlowMatrix};

/// One department as seen by the packer.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchItem {
    pub name: String,
    pub kind: DepartmentKind,
    /// Locked, fixed or void: never moved.
    pub locked: bool,
    /// Index into the flow matrix; `None` for voids.
    pub matrix_index: Option<usize>,
    /// Declared rectangle. For movables only the size matters, plus the
    /// coordinates used when no slot is free.
    pub rect: CellRect,
}

/// Everything the search needs, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ImprovementInput {
    pub grid_width: usize,
    pub grid_height: usize,
    pub items: Vec<SearchItem>,
    /// Effective flow over real departments.
    pub flow: FlowMatrix,
    pub metric: DistanceMetric,
    pub options: SearchOptions,
}

impl ImprovementInput {
    /// Indices of movable items, in input order.
    pub fn movables(&self) -> Vec<usize> {
        (0..self.items.len())
            .filter(|&i| !self.items[i].locked)
            .collect()
    }
}

/// Positions produced by one packing pass, indexed like the items.
#[derive(Debug, Clone, PartialEq)]
pub struct Packing {
    pub rects: Vec<CellRect>,
    /// Items that found no free slot and kept their input coordinates.
    pub fallbacks: Vec<usize>,
}

/// Mark locked items, then first-fit every item of `order` in turn.
pub fn pack(items: &[SearchItem], order: &[usize], grid_width: usize, grid_height: usize) -> Packing {
    let mut grid = Grid::new(grid_width, grid_height);
    let mut rects: Vec<CellRect> = items.iter().map(|it| it.rect).collect();
    let mut fallbacks = Vec::new();

    for item in items.iter().filter(|it| it.locked) {
        grid.mark(&item.rect, None, true);
    }
    for &i in order {
        let rect = items[i].rect;
        match grid.first_fit(rect.width, rect.height) {
            Some((x, y)) => {
                let placed = CellRect::new(x, y, rect.width, rect.height);
                grid.mark(&placed, Some(i), true);
                rects[i] = placed;
            }
            None => fallbacks.push(i),
        }
    }
    Packing { rects, fallbacks }
}

/// Flow-distance cost of a packing over items that sit in the flow matrix.
pub fn packing_cost(
    items: &[SearchItem],
    rects: &[CellRect],
    flow: &FlowMatrix,
    metric: DistanceMetric,
) -> f64 {
    let assignment: Vec<(usize, CellRect)> = items
        .iter()
        .zip(rects)
        .filter_map(|(it, &r)| it.matrix_index.map(|m| (m, r)))
        .collect();
    flow_distance_cost(&assignment, flow, metric)
}

fn check_capacity(input: &ImprovementInput) -> Result<(), LayoutError> {
    let mut grid = Grid::new(input.grid_width, input.grid_height);
    for item in input.items.iter().filter(|it| it.locked) {
        grid.mark(&item.rect, None, true);
    }
    let required = input
        .items
        .iter()
        .filter(|it| !it.locked)
        .fold(0usize, |acc, it| acc.saturating_add(it.rect.area()));
    let capacity = grid.free_cells();
    if required > capacity {
        return Err(LayoutError::CapacityExceeded { required, capacity });
    }
    Ok(())
}

/// Run the swap search on a validated input.
pub fn search(
    input: &ImprovementInput,
    rng: &mut impl Rng,
) -> Result<ImprovementResult, LayoutError> {
    check_capacity(input)?;
    let (gw, gh) = (input.grid_width, input.grid_height);
    let budget = Budget::from_millis(input.options.deadline_ms);
    let cost_of = |p: &Packing| packing_cost(&input.items, &p.rects, &input.flow, input.metric);

    let mut order = input.movables();
    let mut best = pack(&input.items, &order, gw, gh);
    let mut best_cost = cost_of(&best);
    let initial_cost = best_cost;

    let mut iterations = 0;
    let mut accepted_swaps = 0;
    let mut stopped_early = false;
    let n = order.len();

    if n >= 2 {
        for _ in 0..input.options.max_iterations {
            if budget.expired() {
                stopped_early = true;
                log::warn!("swap search stopped at its deadline after {} iterations", iterations);
                break;
            }
            iterations += 1;

            let i = rng.gen_range(0..n);
            let mut j = rng.gen_range(0..n);
            if i == j {
                j = (j + 1) % n;
            }
            let mut candidate = order.clone();
            candidate.swap(i, j);

            let packing = pack(&input.items, &candidate, gw, gh);
            let cost = cost_of(&packing);
            if cost < best_cost {
                log::debug!("swap {}<->{} accepted: {:.2} -> {:.2}", i, j, best_cost, cost);
                best_cost = cost;
                best = packing;
                order = candidate;
                accepted_swaps += 1;
            }
        }
    }

    let fallbacks: Vec<String> = best
        .fallbacks
        .iter()
        .map(|&i| input.items[i].name.clone())
        .collect();
    if !fallbacks.is_empty() {
        if input.options.reject_unplaced {
            return Err(LayoutError::PackingFailed { names: fallbacks });
        }
        log::warn!("no free slot for {:?}; left at input coordinates", fallbacks);
    }

    let rects: Vec<DeptRect> = input
        .items
        .iter()
        .zip(&best.rects)
        .enumerate()
        .map(|(i, (it, &rect))| DeptRect {
            dept: i,
            name: it.name.clone(),
            rect,
        })
        .collect();
    let mut diagnostics = check_within_grid(&rects, gw, gh);
    diagnostics.extend(check_overlaps(&rects));

    log::info!(
        "swap search: {} movable of {} departments, cost {:.2} -> {:.2} ({} of {} swaps accepted)",
        n,
        input.items.len(),
        initial_cost,
        best_cost,
        accepted_swaps,
        iterations
    );

    let assignment = input
        .items
        .iter()
        .zip(&best.rects)
        .enumerate()
        .map(|(i, (it, rect))| AssignedDepartment {
            name: it.name.clone(),
            kind: it.kind,
            locked: it.locked,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            fallback: best.fallbacks.contains(&i),
        })
        .collect();

    Ok(ImprovementResult {
        grid_width: gw,
        grid_height: gh,
        assignment,
        order: order.iter().map(|&i| input.items[i].name.clone()).collect(),
        total_cost: best_cost,
        initial_cost,
        metric: input.metric,
        iterations,
        accepted_swaps,
        stopped_early,
        fallbacks,
        diagnostics,
    })
}

/// Validate a request and search with a generator seeded from its options.
pub fn run(request: &ImprovementRequest) -> Result<ImprovementResult, LayoutError> {
    let input = request.prepare()?;
    let mut rng = make_rng(input.options.seed);
    search(&input, &mut rng)
}

// ── Shelf baseline ──────────────────────────────────────────────────────

/// Reference layout from row-wrapping placement.
#[derive(Debug, Clone, PartialEq)]
pub struct ShelfBaseline {
    pub rects: Vec<CellRect>,
    pub cost: f64,
    /// Some shelf ran past the bottom of the grid.
    pub overflow: bool,
}

/// Place real departments left to right in input order, starting a new shelf
/// when a box would cross the right edge. Shelf height is the tallest box on
/// it. Voids keep their rectangles; locks are ignored.
pub fn shelf_layout(items: &[SearchItem], grid_width: usize) -> Vec<CellRect> {
    let (mut x, mut y, mut row_height) = (0, 0, 0);
    items
        .iter()
        .map(|it| {
            if it.kind == DepartmentKind::Void {
                return it.rect;
            }
            let (w, h) = (it.rect.width, it.rect.height);
            if x + w > grid_width && x > 0 {
                x = 0;
                y += row_height;
                row_height = 0;
            }
            let rect = CellRect::new(x, y, w, h);
            x += w;
            row_height = row_height.max(h);
            rect
        })
        .collect()
}

/// Shelf layout plus its cost under the input's flow and metric.
pub fn shelf_baseline(input: &ImprovementInput) -> ShelfBaseline {
    let rects = shelf_layout(&input.items, input.grid_width);
    let cost = packing_cost(&input.items, &rects, &input.flow, input.metric);
    let overflow = rects
        .iter()
        .any(|r| r.bottom() > input.grid_height || r.right() > input.grid_width);
    ShelfBaseline {
        rects,
        cost,
        overflow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn item(name: &str, rect: CellRect, locked: bool, index: Option<usize>) -> SearchItem {
        SearchItem {
            name: name.into(),
            kind: if index.is_some() {
                DepartmentKind::Dept
            } else {
                DepartmentKind::Void
            },
            locked,
            matrix_index: index,
            rect,
        }
    }

    fn input(gw: usize, gh: usize, items: Vec<SearchItem>, flow: FlowMatrix) -> ImprovementInput {
        ImprovementInput {
            grid_width: gw,
            grid_height: gh,
            items,
            flow,
            metric: DistanceMetric::Manhattan,
            options: SearchOptions::default(),
        }
    }

    #[test]
    fn pack_respects_locked_and_order() {
        let items = vec![
            item("Wall", CellRect::new(0, 0, 1, 2), true, None),
            item("A", CellRect::new(0, 0, 2, 2), false, Some(0)),
            item("B", CellRect::new(0, 0, 1, 2), false, Some(1)),
        ];
        let p = pack(&items, &[1, 2], 4, 2);
        assert!(p.fallbacks.is_empty());
        assert_eq!(p.rects[1], CellRect::new(1, 0, 2, 2));
        assert_eq!(p.rects[2], CellRect::new(3, 0, 1, 2));

        let p = pack(&items, &[2, 1], 4, 2);
        assert_eq!(p.rects[2], CellRect::new(1, 0, 1, 2));
        assert_eq!(p.rects[1], CellRect::new(2, 0, 2, 2));
        assert_eq!(p.rects[0], CellRect::new(0, 0, 1, 2));
    }

    #[test]
    fn search_finds_adjacent_pair() {
        let items = vec![
            item("A", CellRect::new(0, 0, 1, 1), false, Some(0)),
            item("B", CellRect::new(0, 0, 1, 1), false, Some(1)),
            item("C", CellRect::new(0, 0, 1, 1), false, Some(2)),
        ];
        let flow = FlowMatrix::from_rows(
            &[vec![0.0, 0.0, 10.0], vec![0.0, 0.0, 0.0], vec![10.0, 0.0, 0.0]],
            3,
        )
        .unwrap();
        let input = input(3, 1, items, flow);
        let result = search(&input, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(result.initial_cost, 40.0);
        assert_eq!(result.total_cost, 20.0);
        assert_eq!(result.accepted_swaps, 1);
        assert_eq!(result.iterations, 1200);
        assert!(result.is_valid());
        let a = result.find("A").unwrap().x as isize;
        let c = result.find("C").unwrap().x as isize;
        assert_eq!((a - c).abs(), 1);
    }

    #[test]
    fn single_movable_skips_search() {
        let items = vec![
            item("Dock", CellRect::new(0, 0, 1, 1), true, Some(0)),
            item("Line", CellRect::new(0, 0, 1, 1), false, Some(1)),
        ];
        let input = input(2, 1, items, FlowMatrix::zeros(2));
        let result = search(&input, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(result.iterations, 0);
        assert_eq!(result.find("Line").unwrap().x, 1);
        assert_eq!(result.order, vec!["Line"]);
    }

    #[test]
    fn fallback_is_surfaced() {
        let items = vec![
            item("Core", CellRect::new(1, 1, 1, 1), true, None),
            item("Bay", CellRect::new(0, 0, 2, 2), false, Some(0)),
        ];
        let input = input(3, 3, items, FlowMatrix::zeros(1));
        let result = search(&input, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(result.fallbacks, vec!["Bay"]);
        assert!(result.find("Bay").unwrap().fallback);
        assert!(result.diagnostics.iter().any(|d| d.category == "overlap"));
        assert!(!result.is_valid());
    }

    #[test]
    fn fallback_rejected_in_strict_mode() {
        let items = vec![
            item("Core", CellRect::new(1, 1, 1, 1), true, None),
            item("Bay", CellRect::new(0, 0, 2, 2), false, Some(0)),
        ];
        let mut input = input(3, 3, items, FlowMatrix::zeros(1));
        input.options.reject_unplaced = true;
        assert_eq!(
            search(&input, &mut StdRng::seed_from_u64(0)).unwrap_err(),
            LayoutError::PackingFailed {
                names: vec!["Bay".into()]
            }
        );
    }

    #[test]
    fn capacity_checked_against_free_cells() {
        let items = vec![
            item("Wall", CellRect::new(0, 0, 1, 2), true, None),
            item("A", CellRect::new(0, 0, 2, 2), false, Some(0)),
        ];
        let input = input(2, 2, items, FlowMatrix::zeros(1));
        assert_eq!(
            search(&input, &mut StdRng::seed_from_u64(0)).unwrap_err(),
            LayoutError::CapacityExceeded {
                required: 4,
                capacity: 2
            }
        );
    }

    #[test]
    fn zero_deadline_stops_early() {
        let items = vec![
            item("A", CellRect::new(0, 0, 1, 1), false, Some(0)),
            item("B", CellRect::new(0, 0, 1, 1), false, Some(1)),
        ];
        let mut input = input(2, 1, items, FlowMatrix::zeros(2));
        input.options.deadline_ms = Some(0);
        let result = search(&input, &mut StdRng::seed_from_u64(0)).unwrap();
        assert!(result.stopped_early);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.total_cost, result.initial_cost);
    }

    #[test]
    fn shelf_wraps_rows() {
        let items = vec![
            item("A", CellRect::new(0, 0, 2, 1), false, Some(0)),
            item("B", CellRect::new(0, 0, 2, 2), false, Some(1)),
            item("C", CellRect::new(0, 0, 3, 1), false, Some(2)),
        ];
        let rects = shelf_layout(&items, 4);
        assert_eq!(rects[0], CellRect::new(0, 0, 2, 1));
        assert_eq!(rects[1], CellRect::new(2, 0, 2, 2));
        assert_eq!(rects[2], CellRect::new(0, 2, 3, 1));

        let flow = FlowMatrix::from_rows(
            &[vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 0.0], vec![0.0, 0.0, 0.0]],
            3,
        )
        .unwrap();
        let baseline = shelf_baseline(&input(4, 2, items, flow));
        // centers (1, 0.5) and (3, 1)
        assert_eq!(baseline.cost, 2.5);
        assert!(baseline.overflow);
    }
}
