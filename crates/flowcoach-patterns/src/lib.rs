//! Flow Coach pattern detector
//!
//! Finds the systemic patterns behind a metrics snapshot.
//!
//! # Core Concepts
//!
//! - **Bottlenecks**: stages scored by mean time and share of items over threshold
//! - **Stuck items**: items over the time-in-stage threshold
//! - **High WIP**: in-flight items above stage limits or predicted WIP
//! - **Low predictability**: wide lead time spread
//! - **Flow health**: overall severity tier against the target lead time
//!
//! # Example
//!
//! ```rust,ignore
//! use flowcoach_patterns::{DetectionContext, PatternDetector};
//!
//! let detector = PatternDetector::default();
//! let context = DetectionContext::new(&scope, today);
//! let patterns = detector.detect(&snapshot, &records, &context);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod bottleneck;
mod config;
mod detector;
mod error;
mod predictability;
mod severity;
mod stuck;
mod wip;

pub use bottleneck::{detect_bottlenecks, score_stages, StageScore};
pub use config::DetectorConfig;
pub use detector::{sort_patterns, DetectionContext, PatternDetector};
pub use error::PatternError;
pub use predictability::detect_low_predictability;
pub use severity::{flow_health, sample_confidence};
pub use stuck::{detect_stuck, find_stuck_items, StuckItem};
pub use wip::{detect_high_wip, WipDistribution};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
