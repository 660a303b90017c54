/// Database configuration and connection management
pub mod database;

/// Award rules and bank list loading from config.toml
pub mod rules;

pub use rules::{BankRegistry, Config, RuleConfig};
