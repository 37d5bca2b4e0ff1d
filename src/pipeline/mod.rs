//! Upload pipeline framework
//!
//! A pipeline is an ordered list of stages run sequentially against a shared
//! context, bounded by an optional deadline, with session state advanced by
//! the executor as stages complete.

pub mod context;
pub mod core;
pub mod executor;
pub mod stages;

pub use context::PipelineContext;
pub use core::{PipelineResult, PipelineStage, StageResult};
pub use executor::{Pipeline, PipelineBuilder};
