//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions such as autocomplete.

/// Autocomplete handlers for bank names, merchant names and award ids
pub mod autocomplete;
