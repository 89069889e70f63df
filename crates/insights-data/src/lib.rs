//! Normalization and aggregation engine for Hinge Insights.
//!
//! Reads a `matches.json` export, flattens each profile record into typed
//! event streams, and computes the derived analytics, story deck and
//! insight figures consumed by presentation layers.

pub mod aggregator;
pub mod analytics;
pub mod collector;
pub mod emoji;
pub mod engine;
pub mod reader;
pub mod stories;

pub use insights_core as core;
