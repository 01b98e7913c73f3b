//! `posrecon-recon`: three-way position reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded position records and mapping
//! outcomes, returns classified summary/detail rows. No CLI, file, or
//! network dependencies.

pub mod engine;
pub mod enrich;
pub mod error;
pub mod key;
pub mod loader;
pub mod model;

pub use engine::reconcile;
pub use enrich::{build_jobs, enrich};
pub use error::ReconError;
pub use key::{recon_key, UNMAPPED_KEY};
pub use loader::load_positions;
pub use model::{EnrichedRecord, OutputRow, PositionRecord, ReconReport, Source};
