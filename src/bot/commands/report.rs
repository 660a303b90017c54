//! Reporting Discord commands - summary, weekly trend and this-week bank status.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, Now},
        core::{
            calendar::week_range,
            report::{self, AwardSummary, Tally},
            storage,
            trend::{self, BankWeekStatus, WeekBucket},
        },
        errors::Result,
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    const DEFAULT_TREND_WEEKS: usize = 8;
    const TOP_MERCHANTS_PER_WEEK: usize = 3;

    fn tally_line(label: &str, tally: Tally) -> String {
        format!(
            "{label}: {} ({} award{})",
            report::format_mop(tally.value),
            tally.count,
            if tally.count == 1 { "" } else { "s" }
        )
    }

    fn totals_field(summary: &AwardSummary) -> Result<String> {
        let totals = &summary.totals;
        let mut field = String::new();
        writeln!(&mut field, "{}", tally_line("🎁 Total", totals.total))?;
        writeln!(&mut field, "{}", tally_line("✅ Redeemed", totals.redeemed))?;
        writeln!(&mut field, "{}", tally_line("⏳ Pending", totals.pending))?;
        write!(&mut field, "{}", tally_line("❌ Expired", totals.expired))?;
        Ok(field)
    }

    fn consumption_field(summary: &AwardSummary) -> Result<String> {
        let consumption = &summary.consumption;
        let mut field = String::new();
        writeln!(
            &mut field,
            "Spent: {}",
            report::format_mop(consumption.redeemed_spend)
        )?;
        writeln!(
            &mut field,
            "Still to spend: {}",
            report::format_mop(consumption.pending_spend)
        )?;
        write!(
            &mut field,
            "Lost to expiry: {}",
            report::format_mop(consumption.expired_spend)
        )?;
        Ok(field)
    }

    fn value_field(summary: &AwardSummary) -> Result<String> {
        let mut field = String::new();
        for row in summary.by_value.iter().filter(|row| row.totals.total.count > 0) {
            writeln!(
                &mut field,
                "**{}** × {} | ✅ {} | ⏳ {} | ❌ {}",
                report::format_award_value(row.value),
                row.totals.total.count,
                row.totals.redeemed.count,
                row.totals.pending.count,
                row.totals.expired.count
            )?;
        }
        Ok(field)
    }

    fn bank_field(summary: &AwardSummary) -> Result<String> {
        let mut field = String::new();
        for bank in summary.by_bank.iter().filter(|bank| bank.total_awards > 0) {
            let marker = if bank.configured { "" } else { " ⚠️" };
            writeln!(
                &mut field,
                "{}{marker}: {} award(s), {} | big {} ({})",
                bank.bank,
                bank.total_awards,
                report::format_mop(bank.total_value),
                bank.big_awards,
                report::format_probability(bank.probability)
            )?;
        }
        Ok(field)
    }

    fn top_bank_field(summary: &AwardSummary) -> Result<String> {
        let mut field = String::new();
        for (rank, bank) in summary.top_banks.iter().enumerate() {
            writeln!(
                &mut field,
                "{}. {} - {} ({}/{} big, {})",
                rank + 1,
                bank.bank,
                report::format_probability(bank.probability),
                bank.big_awards,
                bank.total_awards,
                report::format_mop(bank.big_award_value)
            )?;
        }
        Ok(field)
    }

    fn week_block(week: &WeekBucket) -> Result<String> {
        let mut block = String::new();
        writeln!(
            &mut block,
            "**{}** | 🎁 {} award(s), {} | ✅ {} redeemed, {} spent",
            week.label(),
            week.awards_obtained.len(),
            report::format_mop(week.total_award_value),
            week.awards_redeemed.len(),
            report::format_mop(week.total_spent_value)
        )?;

        let mut merchants: Vec<_> = week.merchants.iter().collect();
        merchants.sort_by(|a, b| b.1.obtained.cmp(&a.1.obtained));
        for (name, rollup) in merchants.into_iter().take(TOP_MERCHANTS_PER_WEEK) {
            writeln!(
                &mut block,
                "  🏪 {name}: {} obtained, {} spent ({})",
                report::format_mop(rollup.obtained),
                report::format_mop(rollup.spent),
                rollup.count
            )?;
        }
        Ok(block)
    }

    fn bank_status_line(status: &BankWeekStatus) -> String {
        format!(
            "{} **{}** | {} | ⏳ {} | ✅ {}",
            status.progress,
            status.bank,
            status.award_display(),
            report::format_mop(status.pending_spend),
            report::format_mop(status.redeemed_spend)
        )
    }

    fn non_empty(field: String) -> String {
        if field.is_empty() {
            "-".to_string()
        } else {
            field
        }
    }

    /// Shows totals, spend projection, per-value and per-bank statistics.
    #[poise::command(slash_command, prefix_command)]
    pub async fn summary(ctx: Context<'_>) -> Result<()> {
        let now = Now::read();
        let data = ctx.data();
        let awards = storage::list_awards(&data.database, &data.config.banks).await?;
        let summary = report::summarize(&awards, &data.config.banks, now.local);

        let embed = serenity::CreateEmbed::default()
            .title("📊 Award Summary")
            .description(format!("As of: {}", now.local.format("%Y-%m-%d %H:%M")))
            .color(0x0034_98DB)
            .field("Totals", totals_field(&summary)?, false)
            .field("Spend (award value × 3)", consumption_field(&summary)?, false)
            .field("By value", non_empty(value_field(&summary)?), false)
            .field("By bank", non_empty(bank_field(&summary)?), false)
            .field(
                "🏆 Best banks for big awards (≥ 100 MOP)",
                non_empty(top_bank_field(&summary)?),
                false,
            )
            .footer(serenity::CreateEmbedFooter::new(format!(
                "AwardBuddy | {} award{}",
                awards.len(),
                if awards.len() == 1 { "" } else { "s" }
            )));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows weekly trends with the top merchants of each week.
    #[poise::command(slash_command, prefix_command)]
    pub async fn trend(
        ctx: Context<'_>,
        #[description = "Number of most recent weeks to show (default 8)"] weeks: Option<u32>,
    ) -> Result<()> {
        let data = ctx.data();
        let awards = storage::list_awards(&data.database, &data.config.banks).await?;
        let buckets = trend::weekly_trends(&awards);

        if buckets.is_empty() {
            ctx.say("📈 No awards recorded yet.").await?;
            return Ok(());
        }

        let weeks = weeks.map_or(DEFAULT_TREND_WEEKS, |w| {
            usize::try_from(w).unwrap_or(DEFAULT_TREND_WEEKS)
        });
        let skip = buckets.len().saturating_sub(weeks.max(1));

        let mut response = String::from("📈 **Weekly Trend**\n\n");
        for week in &buckets[skip..] {
            response.push_str(&week_block(week)?);
        }

        let merchants = trend::merchant_totals(&awards);
        writeln!(&mut response, "\n**All merchants**")?;
        for (name, rollup) in &merchants {
            writeln!(
                &mut response,
                "🏪 {name}: {} obtained, {} spent ({})",
                report::format_mop(rollup.obtained),
                report::format_mop(rollup.spent),
                rollup.count
            )?;
        }

        ctx.say(response).await?;
        Ok(())
    }

    /// Shows this week's progress for every bank, including banks without an award yet.
    #[poise::command(slash_command, prefix_command)]
    pub async fn banks(ctx: Context<'_>) -> Result<()> {
        let now = Now::read();
        let data = ctx.data();
        let awards = storage::list_awards(&data.database, &data.config.banks).await?;
        let statuses = trend::bank_week_status(&awards, &data.config.banks, now.local);
        let this_week = week_range(now.local.date());

        let mut response = format!("🏦 **Bank status this week** ({})\n\n", this_week.label());
        for status in &statuses {
            writeln!(&mut response, "{}", bank_status_line(status))?;
        }

        let gaps = trend::this_week_bank_gaps(&awards, &data.config.banks, now.local);
        if gaps.is_empty() {
            writeln!(&mut response, "\n🎉 Every bank has issued an award this week.")?;
        } else {
            writeln!(
                &mut response,
                "\n**Still to draw ({}):** {}",
                gaps.len(),
                gaps.join(", ")
            )?;
        }

        ctx.say(response).await?;
        Ok(())
    }

}

// Re-export all commands
pub use inner::*;
