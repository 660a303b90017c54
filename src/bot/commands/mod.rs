//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Award entry and management commands
pub mod award;

/// General utility commands
pub mod general;

/// Summary, trend and bank status commands
pub mod report;

/// Backup export and import commands
pub mod transfer;

// Export commands
pub use award::*;
pub use general::*;
pub use report::*;
pub use transfer::*;
