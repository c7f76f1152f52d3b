//! `closetrack-engine` — Reconciliation tag extraction and validation sync.
//!
//! Pure engine crate: receives a pre-loaded cell grid, returns validation
//! records and structured per-tag failures. No file-format or IO dependencies;
//! document parsing lives in `closetrack-io`.

pub mod bulk;
pub mod config;
pub mod error;
pub mod extract;
pub mod grid;
pub mod model;
pub mod normalize;
pub mod scan;
pub mod store;
pub mod sync;
pub mod tag;
pub mod validation;

pub use bulk::{run_bulk, BulkResult};
pub use config::MatchPolicy;
pub use error::ExtractError;
pub use extract::{run_single, SingleRequest};
pub use grid::{CellRef, Grid, SheetGrid};
pub use model::{Account, TaskRecord, TaskType, ValidationRecord};
pub use store::MemoryStore;
pub use tag::ReconTag;
