//! Award Discord commands - add, list, redeem, merchant, edit and delete.
//!
//! Validation failures from `core` propagate as errors and are shown to the user by
//! the framework error handler.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, Now, handlers::autocomplete},
        core::{
            award::{Award, AwardUpdate, NewAward, parse_day},
            calendar::ExpiryPolicy,
            eligibility, report, storage,
        },
        errors::Result,
    };
    use chrono::{NaiveDate, NaiveDateTime};
    use std::fmt::Write;

    const DEFAULT_LIST_LIMIT: usize = 15;
    const MAX_LIST_LIMIT: usize = 25;

    fn parse_date_arg(input: Option<&str>, today: NaiveDate) -> Option<NaiveDate> {
        input.map_or(Some(today), parse_day)
    }

    fn describe_award(award: &Award, policy: ExpiryPolicy, now: NaiveDateTime) -> String {
        let status = eligibility::status_of(award, policy, now);
        let mut line = format!(
            "{} `{}` {} → {} | **{}** | {} | {}",
            status.emoji(),
            award.id,
            award.draw_date,
            award.expiry_date,
            report::format_award_value(award.value),
            award.bank,
            status.label()
        );
        if let Some(merchant) = &award.merchant {
            line.push_str(&format!(" | 🏪 {merchant}"));
        }
        line
    }

    /// Parent command for recording and managing awards.
    #[poise::command(
        slash_command,
        subcommands(
            "award_add",
            "award_list",
            "award_redeem",
            "award_merchant",
            "award_edit",
            "award_delete"
        )
    )]
    pub async fn award(ctx: Context<'_>) -> Result<()> {
        let help_text = "Award commands. Available subcommands:\n\
            `/award add` - Record up to three awards drawn on the same day\n\
            `/award list` - List recorded awards\n\
            `/award redeem` - Mark an award as used (or undo)\n\
            `/award merchant` - Set where an award was spent\n\
            `/award edit` - Change value, bank, draw date or notes\n\
            `/award delete` - Delete an award";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Records one to three awards drawn on the same day.
    ///
    /// The expiry date is derived from the draw date. Either every award is valid and
    /// all are stored, or nothing is stored.
    #[allow(clippy::too_many_arguments)] // one slot per award in the batch
    #[poise::command(slash_command, rename = "add")]
    pub async fn award_add(
        ctx: Context<'_>,
        #[description = "Award value in MOP (0, 10, 20, 50, 100 or 200)"] value: u32,
        #[description = "Issuing bank"]
        #[autocomplete = "autocomplete::autocomplete_bank"]
        bank: String,
        #[description = "Draw date YYYY-MM-DD (default: today)"] draw_date: Option<String>,
        #[description = "Second award value"] second_value: Option<u32>,
        #[description = "Second award bank (default: same bank)"]
        #[autocomplete = "autocomplete::autocomplete_bank"]
        second_bank: Option<String>,
        #[description = "Third award value"] third_value: Option<u32>,
        #[description = "Third award bank (default: same bank)"]
        #[autocomplete = "autocomplete::autocomplete_bank"]
        third_bank: Option<String>,
        #[description = "Merchant, if already known"]
        #[autocomplete = "autocomplete::autocomplete_merchant"]
        merchant: Option<String>,
        #[description = "Notes"] notes: Option<String>,
    ) -> Result<()> {
        let now = Now::read();
        let data = ctx.data();
        let policy = data.config.rules.expiry_policy();

        let Some(draw_date) = parse_date_arg(draw_date.as_deref(), now.local.date()) else {
            ctx.say("❌ Invalid draw date. Use the format YYYY-MM-DD.")
                .await?;
            return Ok(());
        };

        let mut slots = vec![(value, bank.clone())];
        if let Some(value) = second_value {
            slots.push((value, second_bank.unwrap_or_else(|| bank.clone())));
        }
        if let Some(value) = third_value {
            slots.push((value, third_bank.unwrap_or_else(|| bank.clone())));
        }

        let new_awards = slots
            .into_iter()
            .map(|(value, bank)| NewAward {
                value,
                bank,
                draw_date,
                merchant: merchant.clone(),
                notes: notes.clone(),
            })
            .collect();

        let created =
            storage::create_awards(&data.database, &data.config, new_awards, now.local.date())
                .await?;

        let mut response = format!("✅ Recorded {} award(s):\n", created.len());
        for award in &created {
            writeln!(&mut response, "• {}", describe_award(award, policy, now.local))?;
        }
        ctx.say(response).await?;
        Ok(())
    }

    /// Lists recorded awards, newest draw first.
    #[poise::command(slash_command, rename = "list")]
    pub async fn award_list(
        ctx: Context<'_>,
        #[description = "Only awards from this bank"]
        #[autocomplete = "autocomplete::autocomplete_bank"]
        bank: Option<String>,
        #[description = "Only awards that are not redeemed"] pending_only: Option<bool>,
        #[description = "How many awards to show (default 15, max 25)"] limit: Option<u32>,
    ) -> Result<()> {
        let now = Now::read();
        let data = ctx.data();
        let policy = data.config.rules.expiry_policy();
        let mut awards = storage::list_awards(&data.database, &data.config.banks).await?;

        if awards.is_empty() {
            ctx.say("📂 No awards recorded yet. Add one with `/award add`.")
                .await?;
            return Ok(());
        }

        let bank = bank.map(|b| data.config.banks.resolve(&b));
        awards.retain(|award| {
            bank.as_ref().is_none_or(|b| &award.bank == b)
                && !(pending_only.unwrap_or(false) && award.redeemed)
        });
        awards.sort_by(|a, b| b.draw_date.cmp(&a.draw_date));

        let limit = limit
            .map_or(DEFAULT_LIST_LIMIT, |l| usize::try_from(l).unwrap_or(MAX_LIST_LIMIT))
            .clamp(1, MAX_LIST_LIMIT);
        let mut response = format!("📋 **Awards** ({} matching)\n\n", awards.len());
        for award in awards.iter().take(limit) {
            writeln!(&mut response, "{}", describe_award(award, policy, now.local))?;
        }
        if awards.len() > limit {
            writeln!(&mut response, "\n_…and {} more_", awards.len() - limit)?;
        }

        ctx.say(response).await?;
        Ok(())
    }

    /// Marks an award as redeemed, or undoes a redemption.
    ///
    /// Expired awards cannot be redeemed.
    #[poise::command(slash_command, rename = "redeem")]
    pub async fn award_redeem(
        ctx: Context<'_>,
        #[description = "Award"]
        #[autocomplete = "autocomplete::autocomplete_award_id"]
        id: String,
    ) -> Result<()> {
        let now = Now::read();
        let data = ctx.data();
        let policy = data.config.rules.expiry_policy();

        let Some(award) = storage::get_award(&data.database, &data.config.banks, &id).await?
        else {
            ctx.say(format!("❌ Award `{id}` not found.")).await?;
            return Ok(());
        };

        if !eligibility::can_toggle_redeemed(&award, now.local) {
            ctx.say(format!(
                "❌ Award `{id}` expired on {} and can no longer be redeemed.",
                award.expiry_date
            ))
            .await?;
            return Ok(());
        }

        let Some(updated) =
            storage::toggle_redeemed(&data.database, &data.config, &id, now.utc).await?
        else {
            ctx.say(format!("❌ Award `{id}` not found.")).await?;
            return Ok(());
        };

        let message = if updated.redeemed {
            format!(
                "✅ Redeemed {} ({} spend).",
                describe_award(&updated, policy, now.local),
                report::format_mop(updated.consumption_value())
            )
        } else {
            format!("↩️ Redemption undone: {}", describe_award(&updated, policy, now.local))
        };
        ctx.say(message).await?;
        Ok(())
    }

    /// Sets or clears the merchant where an award was spent.
    #[poise::command(slash_command, rename = "merchant")]
    pub async fn award_merchant(
        ctx: Context<'_>,
        #[description = "Award"]
        #[autocomplete = "autocomplete::autocomplete_award_id"]
        id: String,
        #[description = "Merchant (leave empty to clear)"]
        #[autocomplete = "autocomplete::autocomplete_merchant"]
        merchant: Option<String>,
    ) -> Result<()> {
        let now = Now::read();
        let data = ctx.data();
        let policy = data.config.rules.expiry_policy();

        match storage::set_merchant(&data.database, &data.config, &id, merchant, now.local.date())
            .await?
        {
            Some(updated) => {
                ctx.say(format!("✅ Updated {}", describe_award(&updated, policy, now.local)))
                    .await?;
            }
            None => {
                ctx.say(format!("❌ Award `{id}` not found.")).await?;
            }
        }
        Ok(())
    }

    /// Changes the value, bank, draw date or notes of an award.
    ///
    /// Changing the draw date re-derives the expiry date.
    #[poise::command(slash_command, rename = "edit")]
    pub async fn award_edit(
        ctx: Context<'_>,
        #[description = "Award"]
        #[autocomplete = "autocomplete::autocomplete_award_id"]
        id: String,
        #[description = "New value in MOP"] value: Option<u32>,
        #[description = "New bank"]
        #[autocomplete = "autocomplete::autocomplete_bank"]
        bank: Option<String>,
        #[description = "New draw date YYYY-MM-DD"] draw_date: Option<String>,
        #[description = "New notes (a single '-' clears them)"] notes: Option<String>,
    ) -> Result<()> {
        let now = Now::read();
        let data = ctx.data();
        let policy = data.config.rules.expiry_policy();

        let draw_date = match draw_date.as_deref().map(parse_day) {
            None => None,
            Some(Some(date)) => Some(date),
            Some(None) => {
                ctx.say("❌ Invalid draw date. Use the format YYYY-MM-DD.")
                    .await?;
                return Ok(());
            }
        };

        let update = AwardUpdate {
            value,
            bank,
            draw_date,
            notes: notes.map(|n| Some(n).filter(|n| n.trim() != "-")),
            ..AwardUpdate::default()
        };

        if update.is_empty() {
            ctx.say("❌ Please specify at least one field to change (value, bank, draw_date or notes).")
                .await?;
            return Ok(());
        }

        match storage::update_award(&data.database, &data.config, &id, update, now.local.date())
            .await?
        {
            Some(updated) => {
                ctx.say(format!("✅ Updated {}", describe_award(&updated, policy, now.local)))
                    .await?;
            }
            None => {
                ctx.say(format!("❌ Award `{id}` not found.")).await?;
            }
        }
        Ok(())
    }

    /// Deletes an award.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn award_delete(
        ctx: Context<'_>,
        #[description = "Award"]
        #[autocomplete = "autocomplete::autocomplete_award_id"]
        id: String,
    ) -> Result<()> {
        let data = ctx.data();

        if storage::delete_award(&data.database, &data.config.banks, &id).await? {
            ctx.say(format!("🗑️ Deleted award `{id}`.")).await?;
        } else {
            ctx.say(format!("❌ Award `{id}` not found.")).await?;
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::core::eligibility::AwardStatus;
        use crate::test_utils::*;

        #[test]
        fn test_parse_date_arg_defaults_to_today() {
            let today = date(2025, 9, 10);
            assert_eq!(parse_date_arg(None, today), Some(today));
            assert_eq!(
                parse_date_arg(Some("2025-09-01"), today),
                Some(date(2025, 9, 1))
            );
            assert_eq!(parse_date_arg(Some("yesterday"), today), None);
        }

        #[test]
        fn test_describe_award_shows_status_and_merchant() {
            let award = with_merchant(sample_award(100, date(2025, 9, 1)), "Cafe");
            let line = describe_award(&award, ExpiryPolicy::NextSunday, at(2025, 9, 6, 10));
            assert!(line.starts_with(AwardStatus::UsableNow.emoji()));
            assert!(line.contains("2025-09-01 → 2025-09-07"));
            assert!(line.contains("100 MOP"));
            assert!(line.ends_with("🏪 Cafe"));
        }

        #[test]
        fn test_describe_award_follows_expiry_policy() {
            let award = sample_award(50, date(2025, 9, 2));
            let wednesday = at(2025, 9, 3, 10);
            let weekly = describe_award(&award, ExpiryPolicy::NextSunday, wednesday);
            assert!(weekly.starts_with(AwardStatus::WaitingForUsageWindow.emoji()));
            let fixed = describe_award(&award, ExpiryPolicy::FixedWindow { days: 30 }, wednesday);
            assert!(fixed.starts_with(AwardStatus::UsableNow.emoji()));
        }
    }
}

// Re-export all commands
pub use inner::*;
