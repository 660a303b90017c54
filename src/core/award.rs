//! Award model - the single recorded entity, plus its entry and stored forms.
//!
//! * [`Award`] is the validated, in-memory record every engine works on.
//! * [`NewAward`] is what a form submits; it becomes an `Award` after validation
//!   and expiry derivation.
//! * [`AwardUpdate`] carries field-level edits.
//! * [`StoredAward`] is the lenient on-disk/JSON shape. It tolerates missing fields
//!   from older versions and is migrated on every read.

use crate::{
    config::{BankRegistry, Config},
    core::calendar::{self, expiry_from_draw_date},
    errors::{Error, Result},
};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Face values (MOP) an award can have. 0 is a "thank you" draw with no prize.
pub const AWARD_VALUES: [u32; 6] = [0, 10, 20, 50, 100, 200];

/// Awards at or above this value count as big awards.
pub const BIG_AWARD_THRESHOLD: u32 = 100;

/// Spend required per MOP of award value.
pub const CONSUMPTION_MULTIPLIER: u32 = 3;

/// Returns true if `value` is one of [`AWARD_VALUES`].
#[must_use]
pub fn is_valid_award_value(value: u32) -> bool {
    AWARD_VALUES.contains(&value)
}

/// Generates a new opaque award id.
#[must_use]
pub fn generate_award_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Trims free text, mapping blank input to `None`.
#[must_use]
pub fn normalize_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// A recorded award.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "StoredAward")]
pub struct Award {
    /// Unique, immutable identifier
    pub id: String,
    /// Face value in MOP
    pub value: u32,
    /// Issuing bank or provider
    pub bank: String,
    /// Day the award was drawn
    pub draw_date: NaiveDate,
    /// Last day the award can be used
    pub expiry_date: NaiveDate,
    /// Whether the award has been used
    pub redeemed: bool,
    /// When the award was marked redeemed
    pub redeemed_date: Option<DateTime<Utc>>,
    /// Where the award was (or will be) spent
    pub merchant: Option<String>,
    /// Free text
    pub notes: Option<String>,
}

impl Award {
    /// A "thank you" award carries no prize.
    #[must_use]
    pub const fn is_thank_you(&self) -> bool {
        self.value == 0
    }

    /// Big awards are worth 100 MOP or more.
    #[must_use]
    pub const fn is_big_award(&self) -> bool {
        self.value >= BIG_AWARD_THRESHOLD
    }

    /// Spend needed to use this award (value x 3).
    #[must_use]
    pub const fn consumption_value(&self) -> u32 {
        self.value.saturating_mul(CONSUMPTION_MULTIPLIER)
    }

    /// Merchant name for grouping, with blank merchants folded into `unspecified`.
    #[must_use]
    pub fn merchant_or<'a>(&'a self, unspecified: &'a str) -> &'a str {
        self.merchant
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(unspecified)
    }
}

/// Form input for a new award.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAward {
    /// Face value in MOP
    pub value: u32,
    /// Bank name, current or legacy
    pub bank: String,
    /// Day of the draw
    pub draw_date: NaiveDate,
    /// Optional merchant
    pub merchant: Option<String>,
    /// Optional notes
    pub notes: Option<String>,
}

impl NewAward {
    /// Validates the input and builds an `Award` with a fresh id and derived expiry.
    ///
    /// # Errors
    /// * `Error::InvalidAwardValue` - value not in [`AWARD_VALUES`]
    /// * `Error::UnknownBank` - bank not in the configured list
    /// * `Error::InvalidDrawDate` - draw date rejected by the configured policy
    pub fn into_award(self, config: &Config, today: NaiveDate) -> Result<Award> {
        let value = check_value(self.value)?;
        let bank = check_bank(&config.banks, &self.bank)?;
        calendar::validate_draw_date(self.draw_date, config.rules.draw_date_policy(), today)?;

        Ok(Award {
            id: generate_award_id(),
            value,
            bank,
            draw_date: self.draw_date,
            expiry_date: expiry_from_draw_date(self.draw_date, config.rules.expiry_policy()),
            redeemed: false,
            redeemed_date: None,
            merchant: normalize_text(self.merchant),
            notes: normalize_text(self.notes),
        })
    }
}

fn check_value(value: u32) -> Result<u32> {
    if is_valid_award_value(value) {
        Ok(value)
    } else {
        Err(Error::InvalidAwardValue { value })
    }
}

fn check_bank(banks: &BankRegistry, bank: &str) -> Result<String> {
    let resolved = banks.resolve(bank);
    if banks.contains(&resolved) {
        Ok(resolved)
    } else {
        Err(Error::UnknownBank {
            name: bank.trim().to_string(),
        })
    }
}

/// Field-level edits. `None` leaves a field untouched; for optional fields,
/// `Some(None)` clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwardUpdate {
    /// New face value
    pub value: Option<u32>,
    /// New bank
    pub bank: Option<String>,
    /// New draw date; expiry is re-derived
    pub draw_date: Option<NaiveDate>,
    /// New redemption flag
    pub redeemed: Option<bool>,
    /// New redemption timestamp
    pub redeemed_date: Option<Option<DateTime<Utc>>>,
    /// New merchant
    pub merchant: Option<Option<String>>,
    /// New notes
    pub notes: Option<Option<String>>,
}

impl AwardUpdate {
    /// Update that only changes the merchant.
    #[must_use]
    pub fn merchant(merchant: Option<String>) -> Self {
        Self {
            merchant: Some(merchant),
            ..Self::default()
        }
    }

    /// Update that flips the redemption flag, stamping or clearing `redeemed_date`.
    #[must_use]
    pub fn toggle_redeemed(current: &Award, now: DateTime<Utc>) -> Self {
        let redeemed = !current.redeemed;
        Self {
            redeemed: Some(redeemed),
            redeemed_date: Some(redeemed.then_some(now)),
            ..Self::default()
        }
    }

    /// Whether the update changes anything at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.value.is_none()
            && self.bank.is_none()
            && self.draw_date.is_none()
            && self.redeemed.is_none()
            && self.redeemed_date.is_none()
            && self.merchant.is_none()
            && self.notes.is_none()
    }

    /// Applies the update to a copy of `award`, validating changed fields the same way
    /// [`NewAward::into_award`] does.
    ///
    /// # Errors
    /// Same as [`NewAward::into_award`], for whichever fields are being changed.
    pub fn apply(self, award: &Award, config: &Config, today: NaiveDate) -> Result<Award> {
        let mut updated = award.clone();

        if let Some(value) = self.value {
            updated.value = check_value(value)?;
        }
        if let Some(bank) = self.bank {
            updated.bank = check_bank(&config.banks, &bank)?;
        }
        if let Some(draw_date) = self.draw_date {
            if draw_date != award.draw_date {
                calendar::validate_draw_date(
                    draw_date,
                    config.rules.draw_date_policy(),
                    today,
                )?;
                updated.draw_date = draw_date;
                updated.expiry_date = expiry_from_draw_date(draw_date, config.rules.expiry_policy());
            }
        }
        if let Some(redeemed) = self.redeemed {
            updated.redeemed = redeemed;
        }
        if let Some(redeemed_date) = self.redeemed_date {
            updated.redeemed_date = redeemed_date;
        }
        if let Some(merchant) = self.merchant {
            updated.merchant = normalize_text(merchant);
        }
        if let Some(notes) = self.notes {
            updated.notes = normalize_text(notes);
        }

        Ok(updated)
    }
}

/// Why a stored or imported record could not become an [`Award`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRejection {
    /// `id` missing or blank
    MissingId,
    /// `value` missing
    MissingValue,
    /// `value` is not one of the award face values
    UnsupportedValue,
    /// `bank` missing or blank
    MissingBank,
    /// `drawDate` missing
    MissingDrawDate,
    /// `expiryDate` missing
    MissingExpiryDate,
    /// A date field could not be parsed
    UnparsableDate,
    /// The record is not a JSON object of the expected shape
    NotAnAward,
}

impl fmt::Display for RecordRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingId => "missing id",
            Self::MissingValue => "missing value",
            Self::UnsupportedValue => "unsupported value",
            Self::MissingBank => "missing bank",
            Self::MissingDrawDate => "missing drawDate",
            Self::MissingExpiryDate => "missing expiryDate",
            Self::UnparsableDate => "unparsable date",
            Self::NotAnAward => "not an award record",
        };
        f.write_str(text)
    }
}

/// Lenient JSON shape of an award as persisted and exported.
///
/// `isThankYou` is written for compatibility with older readers but never trusted on
/// read; it is re-derived from `value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAward {
    /// Record id
    #[serde(default)]
    pub id: Option<String>,
    /// Face value
    #[serde(default)]
    pub value: Option<u32>,
    /// Stored "no prize" flag
    #[serde(default)]
    pub is_thank_you: Option<bool>,
    /// Bank name, possibly legacy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    /// Draw date as `YYYY-MM-DD` or an ISO timestamp
    #[serde(default)]
    pub draw_date: Option<String>,
    /// Expiry date as `YYYY-MM-DD` or an ISO timestamp
    #[serde(default)]
    pub expiry_date: Option<String>,
    /// Redemption flag
    #[serde(default)]
    pub redeemed: bool,
    /// Redemption timestamp (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeemed_date: Option<String>,
    /// Merchant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    /// Notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<Award> for StoredAward {
    fn from(award: Award) -> Self {
        Self {
            is_thank_you: Some(award.is_thank_you()),
            id: Some(award.id),
            value: Some(award.value),
            bank: Some(award.bank),
            draw_date: Some(award.draw_date.format("%Y-%m-%d").to_string()),
            expiry_date: Some(award.expiry_date.format("%Y-%m-%d").to_string()),
            redeemed: award.redeemed,
            redeemed_date: award.redeemed_date.map(|d| d.to_rfc3339()),
            merchant: award.merchant,
            notes: award.notes,
        }
    }
}

impl StoredAward {
    /// Applies read-time migrations: a missing bank gets the fallback bank, legacy bank
    /// names are mapped to current ones, and `isThankYou` is re-derived from `value`.
    #[must_use]
    pub fn migrate(mut self, banks: &BankRegistry) -> Self {
        self.bank = Some(match self.bank.as_deref().map(str::trim) {
            Some(bank) if !bank.is_empty() => banks.resolve(bank),
            _ => banks.fallback.clone(),
        });
        self.is_thank_you = self.value.map(|value| value == 0);
        self
    }

    /// Checks the fields an import record must carry: a non-blank id, a value,
    /// a bank, a draw date and an expiry date.
    pub fn check_required(&self) -> std::result::Result<(), RecordRejection> {
        if self.id.as_deref().is_none_or(|id| id.trim().is_empty()) {
            return Err(RecordRejection::MissingId);
        }
        if self.value.is_none() {
            return Err(RecordRejection::MissingValue);
        }
        if self.draw_date.is_none() {
            return Err(RecordRejection::MissingDrawDate);
        }
        if self.expiry_date.is_none() {
            return Err(RecordRejection::MissingExpiryDate);
        }
        if self.bank.as_deref().is_none_or(|bank| bank.trim().is_empty()) {
            return Err(RecordRejection::MissingBank);
        }
        Ok(())
    }

    /// Converts into a validated [`Award`]. Call [`StoredAward::migrate`] first.
    ///
    /// Values outside [`AWARD_VALUES`] are rejected.
    pub fn into_award(self) -> std::result::Result<Award, RecordRejection> {
        self.check_required()?;
        let (Some(id), Some(value), Some(bank), Some(draw), Some(expiry)) = (
            self.id,
            self.value,
            self.bank,
            self.draw_date,
            self.expiry_date,
        ) else {
            return Err(RecordRejection::NotAnAward);
        };
        if !is_valid_award_value(value) {
            return Err(RecordRejection::UnsupportedValue);
        }

        let draw_date = parse_day(&draw).ok_or(RecordRejection::UnparsableDate)?;
        let expiry_date = parse_day(&expiry).ok_or(RecordRejection::UnparsableDate)?;

        Ok(Award {
            id: id.trim().to_string(),
            value,
            bank,
            draw_date,
            expiry_date,
            redeemed: self.redeemed,
            // A stale timestamp on an unredeemed record carries no meaning
            redeemed_date: self
                .redeemed_date
                .filter(|_| self.redeemed)
                .as_deref()
                .and_then(parse_timestamp),
            merchant: normalize_text(self.merchant),
            notes: normalize_text(self.notes),
        })
    }
}

/// Parses a stored date at day precision.
///
/// Accepts `YYYY-MM-DD`, a naive `YYYY-MM-DDTHH:MM:SS[.fff]`, or an RFC 3339
/// timestamp. Timestamps with an offset are converted to the local calendar day
/// before the time is dropped.
#[must_use]
pub fn parse_day(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date_time) = DateTime::parse_from_rfc3339(text) {
        return Some(date_time.with_timezone(&Local).date_naive());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|date_time| date_time.date())
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|date_time| date_time.with_timezone(&Utc))
}
