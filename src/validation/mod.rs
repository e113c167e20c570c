//! Validation runs.
//!
//! The pipeline checks a scenario configuration against the validators a
//! plugin declares, before any benchmark workload starts.

pub mod pipeline;

pub use pipeline::ValidationPipeline;
