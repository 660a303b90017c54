//! Core business logic - framework-agnostic award, calendar and reporting operations.
//!
//! Everything that depends on the current time takes `now` as a parameter.

/// Award model, entry input, edits and the stored JSON shape
pub mod award;
/// Weekday rules, week boundaries and expiry projection
pub mod calendar;
/// Status classification (redeemed, expired, usable, waiting)
pub mod eligibility;
/// Totals, per-value and per-bank statistics
pub mod report;
/// Award repository over the key-value state table
pub mod storage;
/// JSON backup export and import
pub mod transfer;
/// Weekly buckets, merchant rollups and this-week bank status
pub mod trend;
