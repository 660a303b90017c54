//! Weekly trend buckets, merchant rollups and the this-week bank status.
//!
//! Weeks run Monday to Sunday and an award belongs to the week of its draw date.

use crate::{
    config::BankRegistry,
    core::{
        award::Award,
        calendar::{WeekRange, week_range},
    },
};
use chrono::{NaiveDate, NaiveDateTime};
use std::{collections::BTreeMap, fmt};

/// Merchant key used when an award has no merchant.
pub const UNSPECIFIED_MERCHANT: &str = "未指定商戶";

/// Award value and spend attributed to one merchant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MerchantRollup {
    /// Sum of award values obtained
    pub obtained: u32,
    /// Spend implied by redeemed awards (value x 3)
    pub spent: u32,
    /// Number of awards
    pub count: usize,
}

impl MerchantRollup {
    fn add(&mut self, award: &Award) {
        self.obtained = self.obtained.saturating_add(award.value);
        if award.redeemed {
            self.spent = self.spent.saturating_add(award.consumption_value());
        }
        self.count += 1;
    }
}

/// Awards drawn in one week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekBucket {
    /// The week
    pub week: WeekRange,
    /// Every award drawn this week
    pub awards_obtained: Vec<Award>,
    /// The subset that has been redeemed
    pub awards_redeemed: Vec<Award>,
    /// Sum of values drawn
    pub total_award_value: u32,
    /// Sum of value x 3 over redeemed awards
    pub total_spent_value: u32,
    /// Per-merchant rollup for the week
    pub merchants: BTreeMap<String, MerchantRollup>,
}

impl WeekBucket {
    fn new(week: WeekRange) -> Self {
        Self {
            week,
            awards_obtained: Vec::new(),
            awards_redeemed: Vec::new(),
            total_award_value: 0,
            total_spent_value: 0,
            merchants: BTreeMap::new(),
        }
    }

    fn add(&mut self, award: &Award) {
        self.total_award_value = self.total_award_value.saturating_add(award.value);
        if award.redeemed {
            self.total_spent_value = self
                .total_spent_value
                .saturating_add(award.consumption_value());
            self.awards_redeemed.push(award.clone());
        }
        self.merchants
            .entry(award.merchant_or(UNSPECIFIED_MERCHANT).to_string())
            .or_default()
            .add(award);
        self.awards_obtained.push(award.clone());
    }

    /// Short label such as `09/01-09/07`.
    #[must_use]
    pub fn label(&self) -> String {
        self.week.label()
    }
}

/// Partitions awards into weekly buckets, ordered by week start ascending.
///
/// Every award lands in exactly one bucket; weeks without awards are not listed.
#[must_use]
pub fn weekly_trends(awards: &[Award]) -> Vec<WeekBucket> {
    let mut buckets: BTreeMap<NaiveDate, WeekBucket> = BTreeMap::new();
    for award in awards {
        let week = week_range(award.draw_date);
        buckets
            .entry(week.monday)
            .or_insert_with(|| WeekBucket::new(week))
            .add(award);
    }
    buckets.into_values().collect()
}

/// Merchant rollups across every week, sorted by merchant name.
#[must_use]
pub fn merchant_totals(awards: &[Award]) -> BTreeMap<String, MerchantRollup> {
    let mut totals: BTreeMap<String, MerchantRollup> = BTreeMap::new();
    for award in awards {
        totals
            .entry(award.merchant_or(UNSPECIFIED_MERCHANT).to_string())
            .or_default()
            .add(award);
    }
    totals
}

/// Progress of one bank in the current week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BankProgress {
    /// No award drawn this week
    NoAwards,
    /// At least one award still to be spent
    Pending,
    /// Every award this week has been spent
    Completed,
}

impl BankProgress {
    /// Status text for the bank overview.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoAwards => "❌尚未獲得獎品",
            Self::Pending => "⏳未消費",
            Self::Completed => "✅已消費",
        }
    }
}

impl fmt::Display for BankProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// This-week figures for one configured bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankWeekStatus {
    /// Bank name
    pub bank: String,
    /// Awards drawn this week
    pub total_awards: usize,
    /// How many of those are redeemed
    pub redeemed_awards: usize,
    /// How many are not
    pub pending_awards: usize,
    /// Sum of award values
    pub total_award_value: u32,
    /// Individual award values in entry order
    pub award_values: Vec<u32>,
    /// Spend still needed for unredeemed awards (value x 3)
    pub pending_spend: u32,
    /// Spend implied by redeemed awards (value x 3)
    pub redeemed_spend: u32,
    /// Overall progress
    pub progress: BankProgress,
}

impl BankWeekStatus {
    /// Award values as `total(v1/v2)`, or `0` when nothing of value was drawn.
    #[must_use]
    pub fn award_display(&self) -> String {
        if self.total_award_value == 0 {
            return "0".to_string();
        }
        let values: Vec<String> = self.award_values.iter().map(u32::to_string).collect();
        format!("{}({})", self.total_award_value, values.join("/"))
    }
}

/// Status of every configured bank for the week containing `now`.
///
/// Awards from banks outside the configured list are ignored.
#[must_use]
pub fn bank_week_status(
    awards: &[Award],
    banks: &BankRegistry,
    now: NaiveDateTime,
) -> Vec<BankWeekStatus> {
    let this_week = week_range(now.date());
    let week_awards: Vec<&Award> = awards
        .iter()
        .filter(|award| this_week.contains(award.draw_date))
        .collect();

    banks
        .names
        .iter()
        .map(|bank| {
            let bank_awards: Vec<&&Award> =
                week_awards.iter().filter(|award| &award.bank == bank).collect();
            let total_awards = bank_awards.len();
            let redeemed_awards = bank_awards.iter().filter(|award| award.redeemed).count();
            let pending_awards = total_awards - redeemed_awards;

            let progress = if total_awards == 0 {
                BankProgress::NoAwards
            } else if pending_awards > 0 {
                BankProgress::Pending
            } else {
                BankProgress::Completed
            };

            BankWeekStatus {
                bank: bank.clone(),
                total_awards,
                redeemed_awards,
                pending_awards,
                total_award_value: bank_awards
                    .iter()
                    .map(|award| award.value)
                    .fold(0, u32::saturating_add),
                award_values: bank_awards.iter().map(|award| award.value).collect(),
                pending_spend: bank_awards
                    .iter()
                    .filter(|award| !award.redeemed)
                    .map(|award| award.consumption_value())
                    .fold(0, u32::saturating_add),
                redeemed_spend: bank_awards
                    .iter()
                    .filter(|award| award.redeemed)
                    .map(|award| award.consumption_value())
                    .fold(0, u32::saturating_add),
                progress,
            }
        })
        .collect()
}

/// Configured banks with no award drawn in the week containing `now`, in configured order.
#[must_use]
pub fn this_week_bank_gaps(
    awards: &[Award],
    banks: &BankRegistry,
    now: NaiveDateTime,
) -> Vec<String> {
    bank_week_status(awards, banks, now)
        .into_iter()
        .filter(|status| status.progress == BankProgress::NoAwards)
        .map(|status| status.bank)
        .collect()
}
