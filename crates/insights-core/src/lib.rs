//! Shared building blocks for Hinge Insights.
//!
//! Holds the input record and event model, the timestamp resolver, display
//! formatting helpers, CLI settings and the common error type.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
