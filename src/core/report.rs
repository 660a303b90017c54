//! Aggregation engine - totals, per-value and per-bank statistics.
//!
//! All functions are pure: they take the full award collection and an explicit `now`
//! and recompute everything from scratch. Collections are small (manual entry), so
//! nothing is cached.
//!
//! Raw award values and spend figures are kept apart. Any "spend" figure is the award
//! value multiplied by [`CONSUMPTION_MULTIPLIER`]; award values are never multiplied.

use crate::{
    config::BankRegistry,
    core::{
        award::{AWARD_VALUES, Award, CONSUMPTION_MULTIPLIER},
        eligibility::is_expired,
    },
};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Number of banks shown in the big-award ranking.
pub const TOP_BANK_COUNT: usize = 3;

/// A count of awards and the sum of their face values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Number of awards
    pub count: usize,
    /// Sum of face values in MOP
    pub value: u32,
}

impl Tally {
    fn add(&mut self, award: &Award) {
        self.count += 1;
        self.value = self.value.saturating_add(award.value);
    }

    /// Spend equivalent of the tallied value.
    #[must_use]
    pub const fn spend(&self) -> u32 {
        self.value.saturating_mul(CONSUMPTION_MULTIPLIER)
    }

    const fn minus(self, other: Self) -> Self {
        Self {
            count: self.count.saturating_sub(other.count),
            value: self.value.saturating_sub(other.value),
        }
    }
}

/// Collection-wide totals.
///
/// `pending` is everything not redeemed (so it includes expired awards);
/// `total == redeemed + pending` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    /// Every award
    pub total: Tally,
    /// Redeemed awards
    pub redeemed: Tally,
    /// Awards not redeemed
    pub pending: Tally,
    /// Unredeemed awards past their expiry date
    pub expired: Tally,
}

/// Spend-equivalent figures (value x 3) for the redeemed, pending and expired subsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumptionProjection {
    /// Spend implied by redeemed awards
    pub redeemed_spend: u32,
    /// Spend still needed to use pending awards
    pub pending_spend: u32,
    /// Spend that expired awards would have required
    pub expired_spend: u32,
}

impl Totals {
    /// Spend-equivalent view of these totals.
    #[must_use]
    pub const fn consumption(&self) -> ConsumptionProjection {
        ConsumptionProjection {
            redeemed_spend: self.redeemed.spend(),
            pending_spend: self.pending.spend(),
            expired_spend: self.expired.spend(),
        }
    }
}

fn tally_awards<'a>(awards: impl IntoIterator<Item = &'a Award>, now: NaiveDateTime) -> Totals {
    let mut totals = Totals::default();
    for award in awards {
        totals.total.add(award);
        if award.redeemed {
            totals.redeemed.add(award);
        }
        if is_expired(award, now) {
            totals.expired.add(award);
        }
    }
    totals.pending = totals.total.minus(totals.redeemed);
    totals
}

/// Totals across the whole collection.
#[must_use]
pub fn compute_totals(awards: &[Award], now: NaiveDateTime) -> Totals {
    tally_awards(awards, now)
}

/// Totals for one face value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueBreakdown {
    /// The face value
    pub value: u32,
    /// Totals for awards with this value
    pub totals: Totals,
}

/// Totals for each face value in [`AWARD_VALUES`], in ascending order.
///
/// Values outside the set are not listed.
#[must_use]
pub fn value_breakdown(awards: &[Award], now: NaiveDateTime) -> Vec<ValueBreakdown> {
    AWARD_VALUES
        .iter()
        .map(|&value| ValueBreakdown {
            value,
            totals: tally_awards(awards.iter().filter(|a| a.value == value), now),
        })
        .collect()
}

/// Number of awards per face value (only values that occur).
#[must_use]
pub fn value_distribution(awards: &[Award]) -> BTreeMap<u32, usize> {
    let mut distribution = BTreeMap::new();
    for award in awards {
        *distribution.entry(award.value).or_insert(0) += 1;
    }
    distribution
}

/// Number of awards per bank (only banks that occur, including unknown ones).
#[must_use]
pub fn bank_distribution(awards: &[Award]) -> BTreeMap<String, usize> {
    let mut distribution = BTreeMap::new();
    for award in awards {
        *distribution.entry(award.bank.clone()).or_insert(0) += 1;
    }
    distribution
}

/// Statistics for one bank.
#[derive(Debug, Clone, PartialEq)]
pub struct BankBreakdown {
    /// Bank name
    pub bank: String,
    /// Whether the bank is in the configured list
    pub configured: bool,
    /// Number of awards from this bank
    pub total_awards: usize,
    /// Sum of face values
    pub total_value: u32,
    /// Number of awards per face value
    pub value_histogram: BTreeMap<u32, usize>,
    /// Number of awards worth 100 MOP or more
    pub big_awards: usize,
    /// Sum of big award values
    pub big_award_value: u32,
    /// `big_awards / total_awards * 100`, 0 when there are no awards
    pub probability: f64,
}

impl BankBreakdown {
    fn new(bank: String, configured: bool) -> Self {
        Self {
            bank,
            configured,
            total_awards: 0,
            total_value: 0,
            value_histogram: BTreeMap::new(),
            big_awards: 0,
            big_award_value: 0,
            probability: 0.0,
        }
    }

    fn add(&mut self, award: &Award) {
        self.total_awards += 1;
        self.total_value = self.total_value.saturating_add(award.value);
        *self.value_histogram.entry(award.value).or_insert(0) += 1;
        if award.is_big_award() {
            self.big_awards += 1;
            self.big_award_value = self.big_award_value.saturating_add(award.value);
        }
    }
}

/// Big-award probability as a percentage, 0 for a bank without awards.
#[must_use]
pub fn big_award_probability(big_awards: usize, total_awards: usize) -> f64 {
    if total_awards == 0 {
        return 0.0;
    }

    // Cast safety: award counts are small, precision loss negligible
    #[allow(clippy::cast_precision_loss)]
    let probability = (big_awards as f64 / total_awards as f64) * 100.0;
    probability
}

/// Per-bank statistics.
///
/// Every configured bank appears, in configured order, even without awards. Banks
/// found on awards but missing from the configuration follow, sorted by name, with
/// `configured == false`.
#[must_use]
pub fn bank_breakdown(awards: &[Award], banks: &BankRegistry) -> Vec<BankBreakdown> {
    let mut configured: Vec<BankBreakdown> = banks
        .names
        .iter()
        .map(|name| BankBreakdown::new(name.clone(), true))
        .collect();
    let mut unknown: BTreeMap<String, BankBreakdown> = BTreeMap::new();

    for award in awards {
        if let Some(entry) = configured.iter_mut().find(|b| b.bank == award.bank) {
            entry.add(award);
        } else {
            unknown
                .entry(award.bank.clone())
                .or_insert_with(|| BankBreakdown::new(award.bank.clone(), false))
                .add(award);
        }
    }

    configured.extend(unknown.into_values());
    for breakdown in &mut configured {
        breakdown.probability = big_award_probability(breakdown.big_awards, breakdown.total_awards);
    }
    configured
}

/// A row of the big-award ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct TopBank {
    /// Bank name
    pub bank: String,
    /// Big-award probability rounded to two decimals
    pub probability: f64,
    /// Number of big awards
    pub big_awards: usize,
    /// Number of awards
    pub total_awards: usize,
    /// Sum of big award values
    pub big_award_value: u32,
}

/// Ranks configured banks with at least one award by big-award probability, ties
/// broken by the number of big awards, and keeps the first `limit`.
///
/// Banks outside the configured list never appear here.
#[must_use]
pub fn top_big_award_banks(breakdown: &[BankBreakdown], limit: usize) -> Vec<TopBank> {
    let mut ranked: Vec<&BankBreakdown> = breakdown
        .iter()
        .filter(|b| b.configured && b.total_awards > 0)
        .collect();

    ranked.sort_by(|a, b| {
        b.probability
            .total_cmp(&a.probability)
            .then_with(|| b.big_awards.cmp(&a.big_awards))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|b| TopBank {
            bank: b.bank.clone(),
            probability: (b.probability * 100.0).round() / 100.0,
            big_awards: b.big_awards,
            total_awards: b.total_awards,
            big_award_value: b.big_award_value,
        })
        .collect()
}

/// Everything the summary view shows, computed in one pass over the inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct AwardSummary {
    /// Collection-wide totals
    pub totals: Totals,
    /// Spend-equivalent figures
    pub consumption: ConsumptionProjection,
    /// Totals per face value
    pub by_value: Vec<ValueBreakdown>,
    /// Statistics per bank
    pub by_bank: Vec<BankBreakdown>,
    /// Best banks for big awards
    pub top_banks: Vec<TopBank>,
    /// Awards per face value
    pub value_distribution: BTreeMap<u32, usize>,
    /// Awards per bank
    pub bank_distribution: BTreeMap<String, usize>,
}

/// Builds the full summary for `awards` at `now`. An empty collection yields zeros.
#[must_use]
pub fn summarize(awards: &[Award], banks: &BankRegistry, now: NaiveDateTime) -> AwardSummary {
    let totals = compute_totals(awards, now);
    let by_bank = bank_breakdown(awards, banks);
    let top_banks = top_big_award_banks(&by_bank, TOP_BANK_COUNT);

    AwardSummary {
        consumption: totals.consumption(),
        totals,
        by_value: value_breakdown(awards, now),
        by_bank,
        top_banks,
        value_distribution: value_distribution(awards),
        bank_distribution: bank_distribution(awards),
    }
}

/// Formats an amount in MOP, e.g. `300 MOP`.
#[must_use]
pub fn format_mop(amount: u32) -> String {
    format!("{amount} MOP")
}

/// Formats a face value; 0 is shown as a thank-you draw.
#[must_use]
pub fn format_award_value(value: u32) -> String {
    if value == 0 {
        "謝謝參與".to_string()
    } else {
        format_mop(value)
    }
}

/// Formats a percentage with two decimals, e.g. `33.33%`.
#[must_use]
pub fn format_probability(probability: f64) -> String {
    format!("{probability:.2}%")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    const BANK_A: &str = "大豐銀行股份有限公司";
    const BANK_B: &str = "澳門通股份有限公司";
    const BANK_C: &str = "中國銀行股份有限公司澳門分行";

    fn now() -> NaiveDateTime {
        at(2025, 9, 10, 12)
    }

    fn mixed_collection() -> Vec<Award> {
        vec![
            // Week of 09/01, expired by 09/10 unless redeemed
            redeemed(sample_award_for_bank(100, BANK_A, date(2025, 9, 1))),
            sample_award_for_bank(50, BANK_A, date(2025, 9, 2)),
            sample_award_for_bank(0, BANK_B, date(2025, 9, 3)),
            // Week of 09/08, still valid
            sample_award_for_bank(200, BANK_B, date(2025, 9, 8)),
            redeemed(sample_award_for_bank(20, BANK_C, date(2025, 9, 9))),
        ]
    }

    #[test]
    fn test_empty_collection_yields_zeros() {
        let summary = summarize(&[], &test_config().banks, now());
        assert_eq!(summary.totals, Totals::default());
        assert_eq!(summary.consumption, ConsumptionProjection::default());
        assert!(summary.top_banks.is_empty());
        assert!(summary.by_value.iter().all(|v| v.totals == Totals::default()));
        assert!(summary.by_bank.iter().all(|b| b.total_awards == 0 && b.probability == 0.0));
        assert!(summary.value_distribution.is_empty());
    }

    #[test]
    fn test_totals() {
        let totals = compute_totals(&mixed_collection(), now());
        assert_eq!(totals.total, Tally { count: 5, value: 370 });
        assert_eq!(totals.redeemed, Tally { count: 2, value: 120 });
        assert_eq!(totals.pending, Tally { count: 3, value: 250 });
        assert_eq!(totals.expired, Tally { count: 2, value: 50 });
    }

    #[test]
    fn test_totals_are_additive() {
        let totals = compute_totals(&mixed_collection(), now());
        assert_eq!(totals.total.value, totals.redeemed.value + totals.pending.value);
        assert_eq!(totals.total.count, totals.redeemed.count + totals.pending.count);
    }

    #[test]
    fn test_oversized_values_saturate() {
        let awards = vec![
            sample_award(u32::MAX, date(2025, 9, 1)),
            sample_award(u32::MAX, date(2025, 9, 2)),
        ];
        let totals = compute_totals(&awards, now());
        assert_eq!(totals.total.value, u32::MAX);
        assert_eq!(totals.total.spend(), u32::MAX);
    }

    #[test]
    fn test_consumption_multiplier_only_on_spend() {
        let totals = compute_totals(&mixed_collection(), now());
        let consumption = totals.consumption();
        assert_eq!(consumption.redeemed_spend, 360);
        assert_eq!(consumption.pending_spend, 750);
        assert_eq!(consumption.expired_spend, 150);
        // raw values untouched
        assert_eq!(totals.pending.value, 250);
    }

    #[test]
    fn test_value_breakdown_covers_fixed_values() {
        let breakdown = value_breakdown(&mixed_collection(), now());
        let values: Vec<u32> = breakdown.iter().map(|b| b.value).collect();
        assert_eq!(values, AWARD_VALUES.to_vec());

        let hundred = breakdown.iter().find(|b| b.value == 100).map(|b| b.totals);
        assert_eq!(
            hundred,
            Some(Totals {
                total: Tally { count: 1, value: 100 },
                redeemed: Tally { count: 1, value: 100 },
                pending: Tally::default(),
                expired: Tally::default(),
            })
        );

        let fifty = breakdown.iter().find(|b| b.value == 50).map(|b| b.totals);
        assert_eq!(fifty.map(|t| t.expired), Some(Tally { count: 1, value: 50 }));
        assert_eq!(fifty.map(|t| t.pending), Some(Tally { count: 1, value: 50 }));
    }

    #[test]
    fn test_bank_breakdown_lists_every_configured_bank() {
        let banks = test_config().banks;
        let breakdown = bank_breakdown(&mixed_collection(), &banks);
        assert_eq!(breakdown.len(), banks.names.len());

        let a = breakdown.iter().find(|b| b.bank == BANK_A).cloned();
        let a = a.unwrap_or_else(|| BankBreakdown::new(String::new(), false));
        assert_eq!(a.total_awards, 2);
        assert_eq!(a.total_value, 150);
        assert_eq!(a.big_awards, 1);
        assert_eq!(a.big_award_value, 100);
        assert_eq!(a.probability, 50.0);
        assert_eq!(a.value_histogram.get(&50), Some(&1));

        for b in &breakdown {
            assert!((0.0..=100.0).contains(&b.probability));
            if b.total_awards == 0 {
                assert_eq!(b.probability, 0.0);
            }
        }
    }

    #[test]
    fn test_unknown_bank_is_reported_but_not_ranked() {
        let banks = test_config().banks;
        let mut awards = mixed_collection();
        awards.push(sample_award_for_bank(200, "Legacy Bank", date(2025, 9, 1)));

        let breakdown = bank_breakdown(&awards, &banks);
        let legacy = breakdown.iter().find(|b| b.bank == "Legacy Bank");
        assert!(legacy.is_some_and(|b| !b.configured && b.probability == 100.0));

        let top = top_big_award_banks(&breakdown, TOP_BANK_COUNT);
        assert!(top.iter().all(|t| t.bank != "Legacy Bank"));
    }

    #[test]
    fn test_top_banks_sorted_and_limited() {
        let banks = test_config().banks;
        let names = &banks.names;
        let awards = vec![
            // bank 0: 1/2 big
            sample_award_for_bank(100, &names[0], date(2025, 9, 1)),
            sample_award_for_bank(10, &names[0], date(2025, 9, 1)),
            // bank 1: 2/4 big (same probability, more big awards)
            sample_award_for_bank(100, &names[1], date(2025, 9, 1)),
            sample_award_for_bank(200, &names[1], date(2025, 9, 1)),
            sample_award_for_bank(10, &names[1], date(2025, 9, 1)),
            sample_award_for_bank(20, &names[1], date(2025, 9, 1)),
            // bank 2: 1/1 big
            sample_award_for_bank(200, &names[2], date(2025, 9, 1)),
            // bank 3: 0/3 big
            sample_award_for_bank(10, &names[3], date(2025, 9, 1)),
            sample_award_for_bank(10, &names[3], date(2025, 9, 1)),
            sample_award_for_bank(10, &names[3], date(2025, 9, 1)),
        ];

        let top = top_big_award_banks(&bank_breakdown(&awards, &banks), TOP_BANK_COUNT);
        let order: Vec<&str> = top.iter().map(|t| t.bank.as_str()).collect();
        assert_eq!(order, vec![names[2].as_str(), names[1].as_str(), names[0].as_str()]);
        assert_eq!(top[0].probability, 100.0);
        assert!(top.iter().all(|t| t.total_awards > 0));
    }

    #[test]
    fn test_top_bank_probability_rounded() {
        let banks = test_config().banks;
        let name = &banks.names[0];
        let awards = vec![
            sample_award_for_bank(100, name, date(2025, 9, 1)),
            sample_award_for_bank(10, name, date(2025, 9, 1)),
            sample_award_for_bank(10, name, date(2025, 9, 1)),
        ];
        let top = top_big_award_banks(&bank_breakdown(&awards, &banks), TOP_BANK_COUNT);
        assert_eq!(top[0].probability, 33.33);
    }

    #[test]
    fn test_distributions() {
        let awards = mixed_collection();
        let values = value_distribution(&awards);
        assert_eq!(values.get(&0), Some(&1));
        assert_eq!(values.get(&10), None);

        let banks = bank_distribution(&awards);
        assert_eq!(banks.get(BANK_A), Some(&2));
        assert_eq!(banks.get(BANK_B), Some(&2));
        assert_eq!(banks.get(BANK_C), Some(&1));
    }

    #[test]
    fn test_big_award_probability_zero_total() {
        assert_eq!(big_award_probability(0, 0), 0.0);
        assert_eq!(big_award_probability(1, 4), 25.0);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_mop(300), "300 MOP");
        assert_eq!(format_award_value(0), "謝謝參與");
        assert_eq!(format_award_value(50), "50 MOP");
        assert_eq!(format_probability(33.333), "33.33%");
    }
}
