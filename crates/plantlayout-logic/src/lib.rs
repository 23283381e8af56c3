//! Pure facility layout logic for PlantLayout.
//!
//! This crate places named departments onto a bounded cell grid. It has no
//! storage, transport or runtime dependencies: functions take plain data and
//! return plain results, so a service, a CLI harness or a test can all drive
//! the same engines.
//!
//! Two engines share the grid and scoring machinery:
//!
//! - [`constructive`] grows a layout from a seed department, choosing each
//!   next department by closeness tier and placing it where shared boundaries
//!   with related neighbors score highest.
//! - [`improvement`] repacks movable departments around locked ones and
//!   hill-climbs over pairwise order swaps to cut flow-weighted travel.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Placement/search options, seed rule, deadline budget, RNG setup |
//! | [`constructive`] | Tier-driven seed-and-grow placement with fragment splitting |
//! | [`department`] | Department kinds, footprints, aspect-filtered shapes |
//! | [`error`] | `LayoutError`, the single failure type |
//! | [`geometry`] | Cell rectangles, shared edges, post-hoc layout diagnostics |
//! | [`grid`] | Flat occupancy/owner arena with first-free and first-fit scans |
//! | [`improvement`] | Locked-aware packer, swap hill climbing, shelf baseline |
//! | [`relationship`] | Closeness letters, weight table, symmetric/pair weights, TCR |
//! | [`request`] | JSON request contracts and structural validation |
//! | [`result`] | Serializable engine outputs |
//! | [`scoring`] | Distance metrics, flow matrices, flow cost, adjacency score |

pub mod config;
pub mod constructive;
pub mod department;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod improvement;
pub mod relationship;
pub mod request;
pub mod result;
pub mod scoring;

pub use error::LayoutError;
pub use request::{ConstructiveRequest, ImprovementRequest};
pub use result::{ConstructiveResult, ImprovementResult};
