//! Vision-model food analysis boundary
//!
//! The external recognizer is an opaque capability returning structured
//! nutrient estimates. This module holds its explicit configuration, the
//! HTTP client, and the normalizer that turns the schema-loose upstream
//! payload into a well-formed analysis.

pub mod client;
pub mod config;
pub mod normalize;

pub use client::{RawAnalysis, VisionClient, VisionError};
pub use config::VisionConfig;
pub use normalize::{normalize, normalize_failure, EstimatedTotals, NormalizedAnalysis};
