//! Benchmark: constructive placement and swap search on mid-sized plants.
//!
//! Run with: `cargo bench -p plantlayout-logic --bench placement`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use plantlayout_logic::config::{PlacementOptions, SearchOptions};
use plantlayout_logic::constructive;
use plantlayout_logic::department::Department;
use plantlayout_logic::geometry::CellRect;
use plantlayout_logic::improvement;
use plantlayout_logic::relationship::Closeness;
use plantlayout_logic::{ConstructiveRequest, ImprovementRequest};

const LETTERS: [Closeness; 7] = [
    Closeness::A,
    Closeness::E,
    Closeness::I,
    Closeness::O,
    Closeness::U,
    Closeness::X,
    Closeness::Blank,
];

/// Deterministic chart: letter picked from the pair indices.
fn chart(n: usize) -> Vec<Vec<String>> {
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        String::new()
                    } else {
                        LETTERS[(i * 7 + j * 3) % LETTERS.len()].as_str().to_string()
                    }
                })
                .collect()
        })
        .collect()
}

fn constructive_request(n: usize, side: usize) -> ConstructiveRequest {
    ConstructiveRequest {
        name: format!("bench-{}", n),
        grid_width: side,
        grid_height: side,
        departments: (0..n)
            .map(|i| Department::with_area(format!("D{}", i), 4 + i % 5))
            .collect(),
        closeness_matrix: chart(n),
        options: PlacementOptions {
            seed: Some(1),
            include_trace: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn improvement_request(n: usize, side: usize) -> ImprovementRequest {
    ImprovementRequest {
        name: format!("bench-{}", n),
        grid_width: side,
        grid_height: side,
        departments: (0..n)
            .map(|i| Department::with_rect(format!("D{}", i), CellRect::new(0, 0, 1 + i % 3, 2)))
            .collect(),
        flow_matrix: Some(
            (0..n)
                .map(|i| (0..n).map(|j| ((i * 5 + j * 11) % 13) as f64).collect())
                .collect(),
        ),
        options: SearchOptions {
            seed: Some(1),
            max_iterations: 200,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn bench_constructive(c: &mut Criterion) {
    let mut group = c.benchmark_group("constructive");
    for &(n, side) in &[(8usize, 12usize), (16, 16), (24, 20)] {
        let req = constructive_request(n, side);
        group.bench_with_input(BenchmarkId::from_parameter(n), &req, |b, req| {
            b.iter(|| constructive::run(black_box(req)))
        });
    }
    group.finish();
}

fn bench_improvement(c: &mut Criterion) {
    let mut group = c.benchmark_group("improvement");
    for &(n, side) in &[(8usize, 10usize), (16, 14)] {
        let req = improvement_request(n, side);
        group.bench_with_input(BenchmarkId::from_parameter(n), &req, |b, req| {
            b.iter(|| improvement::run(black_box(req)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_constructive, bench_improvement);
criterion_main!(benches);
