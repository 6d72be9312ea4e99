//! Vulnerability-to-fix pipeline.
//!
//! Takes normalized scanner findings (static analyzers, dependency
//! auditors, HTTP scanners, IaC linters), resolves each finding to real
//! source context where one exists, generates candidate security fixes
//! through per-tool strategies, and scores every candidate so only
//! validated fixes reach downstream consumers.
//!
//! The three stages are independently usable:
//!
//! - [`context::ContextResolver`] maps scanner file references to code
//!   context, or reports a first-class "no source" outcome.
//! - [`generator::FixGenerator`] routes records to fix strategies by tool.
//! - [`assessor::FixAssessor`] scores and filters the candidates.
//!
//! [`FixPipeline`] wires the stages together for single records and
//! batches.

pub mod assessor;
pub mod config;
pub mod context;
pub mod ecosystem;
pub mod error;
pub mod generator;
pub mod language;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod versions;

pub use config::{AssessorConfig, PipelineConfig};
pub use error::{FixgenError, Result};
pub use pipeline::{BatchStats, FixPipeline, PipelineReport};
