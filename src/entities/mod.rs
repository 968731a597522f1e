//! Entity type definitions
//!
//! Metria supports the following entity types:
//!
//! **Function Point Analysis:**
//! - [`Estimate`] - A sizing exercise with its project configuration and GSC scores
//! - [`Component`] - A classified functional unit (ALI/AIE/EI/EO/EQ) under an estimate
//!
//! **GQM Measurement:**
//! - [`MeasurementPlan`] - Objectives, questions, metrics and measurement definitions
//! - [`Cycle`] - A bounded reporting window with recorded measurement values

pub mod component;
pub mod cycle;
pub mod estimate;
pub mod plan;

pub use component::Component;
pub use cycle::Cycle;
pub use estimate::Estimate;
pub use plan::MeasurementPlan;
