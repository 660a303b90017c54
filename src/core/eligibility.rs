//! Eligibility and status engine.
//!
//! Status is never stored. It is recomputed on every query from the award and an
//! explicit `now`, so the same inputs always classify the same way.

use crate::core::{
    award::Award,
    calendar::{self, ExpiryPolicy},
};
use chrono::NaiveDateTime;
use std::fmt;

/// Display status of an award at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AwardStatus {
    /// Marked as used
    Redeemed,
    /// Past its expiry date without being used
    Expired,
    /// Within its validity and today is a usage day
    UsableNow,
    /// Valid, but today is not a usage day
    WaitingForUsageWindow,
}

impl AwardStatus {
    /// Short label for lists.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Redeemed => "已兌換",
            Self::Expired => "已過期",
            Self::UsableNow => "可使用",
            Self::WaitingForUsageWindow => "待使用",
        }
    }

    /// Status marker for compact views.
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Redeemed => "✅",
            Self::Expired => "❌",
            Self::UsableNow => "🟢",
            Self::WaitingForUsageWindow => "⏳",
        }
    }
}

impl fmt::Display for AwardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An award is expired when it is unredeemed and its expiry day is before today.
/// The expiry day itself is still valid.
#[must_use]
pub fn is_expired(award: &Award, now: NaiveDateTime) -> bool {
    !award.redeemed && award.expiry_date < now.date()
}

/// Whether awards can be spent at `now`. Weekly awards are spent on Saturdays and
/// Sundays only; fixed-window awards on any day.
#[must_use]
pub fn usage_window_open(policy: ExpiryPolicy, now: NaiveDateTime) -> bool {
    !policy.weekend_only() || calendar::is_weekend(now.date())
}

/// Classifies `award` at `now` under the configured expiry policy.
#[must_use]
pub fn status_of(award: &Award, policy: ExpiryPolicy, now: NaiveDateTime) -> AwardStatus {
    if award.redeemed {
        AwardStatus::Redeemed
    } else if is_expired(award, now) {
        AwardStatus::Expired
    } else if usage_window_open(policy, now) {
        AwardStatus::UsableNow
    } else {
        AwardStatus::WaitingForUsageWindow
    }
}

/// Whether the redeemed flag may be toggled at `now`.
///
/// Un-redeeming is always allowed. Redeeming an expired award is blocked here; the
/// data model itself does not enforce it.
#[must_use]
pub fn can_toggle_redeemed(award: &Award, now: NaiveDateTime) -> bool {
    award.redeemed || !is_expired(award, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{at, date, sample_award};

    const WEEKLY: ExpiryPolicy = ExpiryPolicy::NextSunday;
    const FIXED: ExpiryPolicy = ExpiryPolicy::FixedWindow { days: 30 };

    #[test]
    fn test_redeemed_award_is_never_expired() {
        let mut award = sample_award(100, date(2025, 9, 1));
        award.redeemed = true;
        assert!(!is_expired(&award, at(2030, 1, 1, 12)));
        assert_eq!(status_of(&award, WEEKLY, at(2030, 1, 1, 12)), AwardStatus::Redeemed);
    }

    #[test]
    fn test_expiry_day_is_still_valid() {
        let award = sample_award(100, date(2025, 9, 1)); // expires Sunday 2025-09-07
        assert!(!is_expired(&award, at(2025, 9, 7, 23)));
        assert!(is_expired(&award, at(2025, 9, 8, 0)));
    }

    #[test]
    fn test_usage_window() {
        assert!(!usage_window_open(WEEKLY, at(2025, 9, 5, 23))); // Friday
        assert!(usage_window_open(WEEKLY, at(2025, 9, 6, 0))); // Saturday
        assert!(usage_window_open(WEEKLY, at(2025, 9, 7, 12))); // Sunday
        assert!(!usage_window_open(WEEKLY, at(2025, 9, 8, 0))); // Monday
    }

    #[test]
    fn test_monday_award_usable_on_following_saturday() {
        let award = sample_award(100, date(2025, 9, 1));
        assert_eq!(award.expiry_date, date(2025, 9, 7));
        assert_eq!(status_of(&award, WEEKLY, at(2025, 9, 6, 10)), AwardStatus::UsableNow);
    }

    #[test]
    fn test_status_transitions_over_a_week() {
        let award = sample_award(50, date(2025, 9, 2));
        assert_eq!(
            status_of(&award, WEEKLY, at(2025, 9, 2, 9)),
            AwardStatus::WaitingForUsageWindow
        );
        assert_eq!(status_of(&award, WEEKLY, at(2025, 9, 6, 9)), AwardStatus::UsableNow);
        assert_eq!(status_of(&award, WEEKLY, at(2025, 9, 7, 21)), AwardStatus::UsableNow);
        assert_eq!(status_of(&award, WEEKLY, at(2025, 9, 8, 9)), AwardStatus::Expired);
    }

    #[test]
    fn test_unredeeming_returns_to_current_state() {
        let mut award = sample_award(50, date(2025, 9, 2));
        award.redeemed = true;
        assert_eq!(status_of(&award, WEEKLY, at(2025, 9, 6, 9)), AwardStatus::Redeemed);

        award.redeemed = false;
        assert_eq!(status_of(&award, WEEKLY, at(2025, 9, 6, 9)), AwardStatus::UsableNow);
        assert_eq!(status_of(&award, WEEKLY, at(2025, 9, 9, 9)), AwardStatus::Expired);
    }

    #[test]
    fn test_fixed_window_usable_on_weekdays() {
        let mut award = sample_award(50, date(2025, 9, 2)); // Tuesday
        award.expiry_date = FIXED.expiry_for(award.draw_date);
        assert_eq!(award.expiry_date, date(2025, 10, 2));

        assert!(usage_window_open(FIXED, at(2025, 9, 10, 9))); // Wednesday
        assert_eq!(status_of(&award, FIXED, at(2025, 9, 10, 9)), AwardStatus::UsableNow);
        assert_eq!(status_of(&award, FIXED, at(2025, 10, 2, 22)), AwardStatus::UsableNow);
        assert_eq!(status_of(&award, FIXED, at(2025, 10, 3, 9)), AwardStatus::Expired);

        // the same award under the weekly policy waits for the weekend
        assert_eq!(
            status_of(&award, WEEKLY, at(2025, 9, 10, 9)),
            AwardStatus::WaitingForUsageWindow
        );
    }

    #[test]
    fn test_can_toggle_redeemed() {
        let mut award = sample_award(50, date(2025, 9, 2));
        assert!(can_toggle_redeemed(&award, at(2025, 9, 6, 9)));
        assert!(!can_toggle_redeemed(&award, at(2025, 9, 9, 9)));

        award.redeemed = true;
        assert!(can_toggle_redeemed(&award, at(2025, 9, 9, 9)));
    }
}
