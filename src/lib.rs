//! Traffic-flow forecast presentation.
//!
//! Requests a forecast from an external prediction service, shapes the
//! loosely-typed nested payload into per-interval and global statistics,
//! and classifies the result into a plain-language traffic condition.

pub mod aggregate;
pub mod client;
pub mod condition;
pub mod config;
pub mod forecast;
pub mod logging;
pub mod report;
pub mod session;
