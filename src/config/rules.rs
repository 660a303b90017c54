//! Award rule and bank configuration loading from config.toml
//!
//! This module loads the campaign rules (expiry policy, past-date policy, batch size)
//! and the versioned bank list. The bank list is data, not code: the participating
//! providers were renamed between campaign versions, so legacy names are mapped to
//! their current names through `[banks.aliases]` whenever records are read or imported.

use crate::{
    core::calendar::{DrawDatePolicy, ExpiryPolicy},
    errors::{Error, Result},
};
use serde::Deserialize;
use std::{collections::BTreeMap, path::Path};
use tracing::{debug, warn};

/// Bank assigned to legacy records that were stored before the bank field existed.
pub const DEFAULT_FALLBACK_BANK: &str = "螞蟻銀行（澳門）股份有限公司";

/// Participating providers of the 2025 campaign, with the short names used by
/// earlier versions of the bank list.
const DEFAULT_BANKS: [(&str, &str); 8] = [
    ("澳門通股份有限公司", "澳門通"),
    ("中國銀行股份有限公司澳門分行", "中國銀行"),
    ("中國工商銀行（澳門）股份有限公司", "工銀澳門"),
    ("大豐銀行股份有限公司", "大豐銀行"),
    ("澳門國際銀行股份有限公司", "國際銀行"),
    ("螞蟻銀行（澳門）股份有限公司", "螞蟻銀行"),
    ("澳門商業銀行股份有限公司", "澳門商業銀行"),
    ("廣發銀行股份有限公司澳門分行", "廣發銀行"),
];

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Date and batch rules
    pub rules: RuleConfig,
    /// Versioned bank list
    pub banks: BankRegistry,
}

/// Which expiry policy the `[rules]` table selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicyKind {
    /// Expire on the Sunday after the draw
    #[default]
    NextSunday,
    /// Expire a fixed number of days after the draw
    FixedWindow,
}

/// The `[rules]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Expiry policy selector
    pub expiry_policy: ExpiryPolicyKind,
    /// Window length used by the fixed-window policy
    pub fixed_window_days: u32,
    /// Whether draw dates before today are rejected at entry time
    pub reject_past_draw_dates: bool,
    /// Maximum number of awards accepted in one submission
    pub max_batch_size: usize,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            expiry_policy: ExpiryPolicyKind::NextSunday,
            fixed_window_days: 30,
            reject_past_draw_dates: false,
            max_batch_size: 3,
        }
    }
}

impl RuleConfig {
    /// Resolves the configured expiry policy.
    #[must_use]
    pub const fn expiry_policy(&self) -> ExpiryPolicy {
        match self.expiry_policy {
            ExpiryPolicyKind::NextSunday => ExpiryPolicy::NextSunday,
            ExpiryPolicyKind::FixedWindow => ExpiryPolicy::FixedWindow {
                days: self.fixed_window_days,
            },
        }
    }

    /// Resolves the configured draw-date validation policy.
    #[must_use]
    pub const fn draw_date_policy(&self) -> DrawDatePolicy {
        if self.reject_past_draw_dates {
            DrawDatePolicy::WeekdayNotPast
        } else {
            DrawDatePolicy::WeekdayOnly
        }
    }
}

/// The `[banks]` table: the fixed provider list plus its migration data.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BankRegistry {
    /// Version of the bank list, bumped whenever names change
    pub version: u32,
    /// Ordered list of current bank names
    pub names: Vec<String>,
    /// Bank assigned to stored records without one
    pub fallback: String,
    /// Legacy name -> current name. Empty unless given, so a custom `names` list
    /// does not inherit aliases pointing at the built-in banks.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl Default for BankRegistry {
    fn default() -> Self {
        Self {
            version: 2,
            names: DEFAULT_BANKS
                .iter()
                .map(|(name, _)| (*name).to_string())
                .collect(),
            fallback: DEFAULT_FALLBACK_BANK.to_string(),
            aliases: DEFAULT_BANKS
                .iter()
                .map(|(name, short)| ((*short).to_string(), (*name).to_string()))
                .collect(),
        }
    }
}

impl BankRegistry {
    /// Maps a stored or user-supplied bank name to its current name.
    ///
    /// Unknown names pass through unchanged (trimmed) so that reports can still
    /// show them.
    #[must_use]
    pub fn resolve(&self, name: &str) -> String {
        let trimmed = name.trim();
        self.aliases
            .get(trimmed)
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }

    /// Whether `name` is one of the current bank names.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|bank| bank == name)
    }

    /// Checks that the list is usable: non-empty, no duplicates, and every alias
    /// and the fallback pointing at a listed bank.
    pub fn validate(&self) -> Result<()> {
        if self.names.is_empty() {
            return Err(Error::Config {
                message: "[banks] names must not be empty".to_string(),
            });
        }
        for (index, name) in self.names.iter().enumerate() {
            if self.names[..index].contains(name) {
                return Err(Error::Config {
                    message: format!("[banks] duplicate bank name '{name}'"),
                });
            }
        }
        if !self.contains(&self.fallback) {
            return Err(Error::Config {
                message: format!("[banks] fallback '{}' is not in names", self.fallback),
            });
        }
        if let Some((old, new)) = self.aliases.iter().find(|(_, new)| !self.contains(new)) {
            return Err(Error::Config {
                message: format!("[banks] alias '{old}' points at unknown bank '{new}'"),
            });
        }
        Ok(())
    }
}

/// Parses configuration from a TOML string and validates the bank list.
///
/// # Errors
/// Returns `Error::Config` if the TOML is invalid or the bank list is inconsistent.
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.banks.validate()?;
    if config.rules.max_batch_size == 0 {
        return Err(Error::Config {
            message: "[rules] max_batch_size must be at least 1".to_string(),
        });
    }
    Ok(config)
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - The bank list is inconsistent
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    debug!("Loading configuration from {:?}", path.as_ref());
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `path`, falling back to the built-in defaults when the
/// file does not exist. A file that exists but is invalid is still an error.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        warn!(
            "Config file {:?} not found, using built-in rules and bank list",
            path.as_ref()
        );
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.banks.validate().is_ok());
        assert_eq!(config.rules.expiry_policy(), ExpiryPolicy::NextSunday);
        assert_eq!(config.rules.draw_date_policy(), DrawDatePolicy::WeekdayOnly);
        assert_eq!(config.rules.max_batch_size, 3);
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [rules]
            expiry_policy = "fixed_window"
            fixed_window_days = 30
            reject_past_draw_dates = true
            max_batch_size = 2

            [banks]
            version = 3
            names = ["Bank A", "Bank B"]
            fallback = "Bank A"

            [banks.aliases]
            "A" = "Bank A"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(
            config.rules.expiry_policy(),
            ExpiryPolicy::FixedWindow { days: 30 }
        );
        assert_eq!(config.rules.draw_date_policy(), DrawDatePolicy::WeekdayNotPast);
        assert_eq!(config.rules.max_batch_size, 2);
        assert_eq!(config.banks.version, 3);
        assert_eq!(config.banks.resolve("A"), "Bank A");
        assert_eq!(config.banks.resolve(" Bank B "), "Bank B");
        assert_eq!(config.banks.resolve("Bank Z"), "Bank Z");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.banks.names.len(), DEFAULT_BANKS.len());
        assert_eq!(config.banks.fallback, DEFAULT_FALLBACK_BANK);
    }

    #[test]
    fn test_default_aliases_map_short_names() {
        let banks = BankRegistry::default();
        assert_eq!(banks.resolve("螞蟻銀行"), DEFAULT_FALLBACK_BANK);
        assert!(banks.contains(&banks.resolve("工銀澳門")));
    }

    #[test]
    fn test_fallback_must_be_listed() {
        let toml_str = r#"
            [banks]
            names = ["Bank A"]
            fallback = "Bank B"
        "#;
        assert!(matches!(parse_config(toml_str), Err(Error::Config { .. })));
    }

    #[test]
    fn test_alias_target_must_be_listed() {
        let toml_str = r#"
            [banks]
            names = ["Bank A"]
            fallback = "Bank A"
            [banks.aliases]
            "B" = "Bank B"
        "#;
        assert!(matches!(parse_config(toml_str), Err(Error::Config { .. })));
    }

    #[test]
    fn test_duplicate_bank_names_rejected() {
        let toml_str = r#"
            [banks]
            names = ["Bank A", "Bank A"]
            fallback = "Bank A"
        "#;
        assert!(matches!(parse_config(toml_str), Err(Error::Config { .. })));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let toml_str = r#"
            [rules]
            max_batch_size = 0
        "#;
        assert!(matches!(parse_config(toml_str), Err(Error::Config { .. })));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = parse_config(include_str!("../../config.toml")).unwrap();
        let defaults = BankRegistry::default();
        assert_eq!(config.banks.names, defaults.names);
        assert_eq!(config.banks.aliases, defaults.aliases);
        assert_eq!(config.rules.expiry_policy(), ExpiryPolicy::NextSunday);
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let config = load_config_or_default("does/not/exist/config.toml").unwrap();
        assert_eq!(config.banks.version, 2);
    }
}
