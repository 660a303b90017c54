//! Shared test utilities for `AwardBuddy`.
//!
//! This module provides helpers for setting up test databases and building awards
//! with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    config::{Config, rules::DEFAULT_FALLBACK_BANK},
    core::{
        award::{Award, NewAward, generate_award_id},
        calendar::{ExpiryPolicy, expiry_from_draw_date},
    },
    errors::Result,
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber once per process.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all storage tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Built-in configuration: next-Sunday expiry, weekend-only draw check, batches of 3.
pub fn test_config() -> Config {
    Config::default()
}

/// Shorthand for a calendar date.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Shorthand for a local instant on the hour.
pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    date(year, month, day).and_hms_opt(hour, 0, 0).unwrap()
}

/// Form input with the fallback bank and no merchant.
pub fn new_award_input(value: u32, draw_date: NaiveDate) -> NewAward {
    NewAward {
        value,
        bank: DEFAULT_FALLBACK_BANK.to_string(),
        draw_date,
        merchant: None,
        notes: None,
    }
}

/// An unredeemed award from the fallback bank with next-Sunday expiry.
///
/// Skips entry validation, so weekend draws can be built for edge-case tests.
pub fn sample_award(value: u32, draw_date: NaiveDate) -> Award {
    sample_award_for_bank(value, DEFAULT_FALLBACK_BANK, draw_date)
}

/// Like [`sample_award`], for a specific bank.
pub fn sample_award_for_bank(value: u32, bank: &str, draw_date: NaiveDate) -> Award {
    Award {
        id: generate_award_id(),
        value,
        bank: bank.to_string(),
        draw_date,
        expiry_date: expiry_from_draw_date(draw_date, ExpiryPolicy::NextSunday),
        redeemed: false,
        redeemed_date: None,
        merchant: None,
        notes: None,
    }
}

/// Marks an award as redeemed, keeping everything else.
pub fn redeemed(mut award: Award) -> Award {
    award.redeemed = true;
    award
}

/// Sets the merchant of an award.
pub fn with_merchant(mut award: Award, merchant: &str) -> Award {
    award.merchant = Some(merchant.to_string());
    award
}
