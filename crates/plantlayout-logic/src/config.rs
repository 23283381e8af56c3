//! Engine options and run budgets.
//!
//! All option structs deserialize from camelCase JSON with every field
//! optional; missing fields take the defaults below.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Options for the constructive engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlacementOptions {
    /// Allow a department's area to be split across disjoint rectangles.
    pub allow_splitting: bool,
    pub max_fragments_per_dept: usize,
    /// Echoed in the result; all geometry is in cells.
    pub cell_size_meters: f64,
    /// Amplitude of the random tie-break added to candidate scores. Zero disables it.
    pub jitter: f64,
    pub include_trace: bool,
    pub seed: Option<u64>,
    pub deadline_ms: Option<u64>,
    /// Fail with `FragmentLimit` instead of leaving a department short of its
    /// area once its fragments run out.
    pub reject_partial: bool,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            allow_splitting: true,
            max_fragments_per_dept: 3,
            cell_size_meters: 5.0,
            jitter: 1e-3,
            include_trace: true,
            seed: None,
            deadline_ms: None,
            reject_partial: false,
        }
    }
}

impl PlacementOptions {
    /// Effective per-department fragment cap (1 without splitting).
    pub fn fragment_limit(&self) -> usize {
        if self.allow_splitting {
            self.max_fragments_per_dept.max(1)
        } else {
            1
        }
    }
}

/// How the constructive engine picks its first department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SeedRule {
    /// Highest TCR; ties go to the larger area, then the lower index.
    #[default]
    #[serde(alias = "maxDegree")]
    MaxTcr,
    /// Largest area; ties go to the higher TCR, then the lower index.
    MaxArea,
    /// Uniform draw from the injected generator.
    Random,
}

/// Options for the improvement search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    /// Blend factor for closeness weights added on top of raw flow.
    pub closeness_lambda: f64,
    pub max_iterations: usize,
    pub seed: Option<u64>,
    pub deadline_ms: Option<u64>,
    /// Fail with `PackingFailed` instead of returning a layout with fallbacks.
    pub reject_unplaced: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            closeness_lambda: 1.0,
            max_iterations: 1200,
            seed: None,
            deadline_ms: None,
            reject_unplaced: false,
        }
    }
}

/// Wall-clock budget for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    deadline: Option<Instant>,
}

impl Budget {
    pub fn unlimited() -> Self {
        Self { deadline: None }
    }

    /// Starts counting now.
    pub fn from_millis(ms: Option<u64>) -> Self {
        Self {
            deadline: ms.map(|ms| Instant::now() + Duration::from_millis(ms)),
        }
    }

    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Seeded generator when a seed is given, entropy-seeded otherwise.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}
