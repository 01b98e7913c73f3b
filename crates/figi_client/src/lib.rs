//! `posrecon-figi-client`: OpenFIGI mapping API client.
//!
//! Blocking reqwest client (no Tokio runtime required). Normalizes raw
//! security identifiers into OpenFIGI mapping jobs, submits them in
//! fixed-size batches with a fixed inter-batch pause, and returns one
//! outcome per job with full request/response provenance.

pub mod client;
pub mod job;

pub use client::{FigiClient, FigiConfig, FigiError, JobOutcome, MappingResult, DEFAULT_BASE_URL};
pub use job::MappingJob;
