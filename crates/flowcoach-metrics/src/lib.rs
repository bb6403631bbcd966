//! Flow Coach metrics engine
//!
//! Computes the quantitative picture of one scope and window.
//!
//! # Core Concepts
//!
//! - [`MetricsEngine`]: records → [`MetricsSnapshot`](flowcoach_model::MetricsSnapshot)
//! - [`compute_baseline`]: current period vs. the last N periods
//! - [`GroupFlow`]: Little's Law for one team or period
//! - [`stats`]: mean, population standard deviation, interpolated percentiles
//!
//! # Example
//!
//! ```rust,ignore
//! use flowcoach_metrics::{MetricsConfig, MetricsEngine};
//!
//! let engine = MetricsEngine::new(MetricsConfig::default());
//! let snapshot = engine.compute(&scope, &records, &history)?;
//! assert!(snapshot.satisfies_littles_law());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod baseline;
mod config;
mod engine;
mod error;
mod group;
pub mod stats;

pub use baseline::compute_baseline;
pub use config::MetricsConfig;
pub use engine::{dominant_workflow, recommended_limit, MetricsEngine, MetricsRequest};
pub use error::MetricsError;
pub use group::GroupFlow;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
