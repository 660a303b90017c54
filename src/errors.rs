//! Unified error type for `AwardBuddy`.
//!
//! Validation failures (`InvalidDrawDate`, `InvalidAwardValue`, ...) are meant to be
//! shown to the user next to the offending field. Missing records are not errors:
//! storage functions return `Ok(None)` / `Ok(false)` instead.

use crate::core::calendar::DrawDateRejection;
use chrono::NaiveDate;
use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Any failure reported by the database layer
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// JSON (de)serialization of the stored blob or an export file failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The draw date is not acceptable under the active draw-date policy
    #[error("Invalid draw date {date}: {reason}")]
    InvalidDrawDate {
        /// The rejected date
        date: NaiveDate,
        /// Why it was rejected
        reason: DrawDateRejection,
    },

    /// The face value is not one of the campaign denominations
    #[error("Invalid award value: {value} MOP (expected one of 0, 10, 20, 50, 100, 200)")]
    InvalidAwardValue {
        /// The rejected value
        value: u32,
    },

    /// The bank is not part of the configured bank list
    #[error("Unknown bank: {name}")]
    UnknownBank {
        /// The rejected bank name
        name: String,
    },

    /// A batch submission was empty or larger than the configured maximum
    #[error("Invalid batch size {count}: between 1 and {max} awards can be added at once")]
    InvalidBatch {
        /// Number of awards submitted
        count: usize,
        /// Configured maximum batch size
        max: usize,
    },

    /// The import file as a whole was rejected
    #[error("Import rejected: {message}")]
    MalformedImport {
        /// Human-readable description of the problem
        message: String,
    },

    /// Replacing existing data was attempted without explicit confirmation
    #[error(
        "Import would replace {existing} existing award(s) with {incoming} imported award(s); confirmation required"
    )]
    ImportNotConfirmed {
        /// Number of validated records waiting to be imported
        incoming: usize,
        /// Number of records that would be discarded
        existing: usize,
    },

    /// I/O failure (config file, attachments)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Required environment variable missing or invalid
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Formatting a message buffer failed
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Discord framework failure
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl Error {
    /// Whether this error is a problem with the user's input rather than a failure
    /// of the system. Such errors are shown to the user and not logged as errors.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidDrawDate { .. }
                | Self::InvalidAwardValue { .. }
                | Self::UnknownBank { .. }
                | Self::InvalidBatch { .. }
                | Self::MalformedImport { .. }
                | Self::ImportNotConfirmed { .. }
        )
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
