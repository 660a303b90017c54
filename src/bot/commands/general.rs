//! General Discord commands - ping and help.
//! These commands don't touch the database. Help describes the configured expiry rules.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{bot::Context, core::calendar::ExpiryPolicy, errors::Result};

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: Context<'_>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    fn help_text(policy: ExpiryPolicy) -> String {
        format!(
            "**AwardBuddy Help**\n\
            Track spending-campaign awards: when they expire, when they can be used, and \
            which banks pay out the most.\n\n\
            **Awards**\n\
            • `/award add <value> <bank> [draw_date] ...` - Records up to three awards drawn on one day.\n\
            • `/award list [bank] [pending_only]` - Lists awards with their current status.\n\
            • `/award redeem <award>` - Marks an award as used, or undoes it.\n\
            • `/award merchant <award> [merchant]` - Records where an award was spent.\n\
            • `/award edit <award> ...` - Changes value, bank, draw date or notes.\n\
            • `/award delete <award>` - Deletes an award.\n\n\
            **Reports**\n\
            • `/summary` - Totals, spend needed (award value × 3) and best banks.\n\
            • `/trend [weeks]` - Weekly awards, spending and merchants.\n\
            • `/banks` - This week's status for every bank.\n\n\
            **Backup**\n\
            • `/export` - Downloads all awards as JSON.\n\
            • `/import <file> [confirm]` - Replaces all awards from a backup.\n\n\
            **Rules**\n\
            Awards are drawn on weekdays. {}\n\n\
            • `/ping` - Checks if the bot is responsive.\n\
            • `/help` - Shows this help message.",
            policy.describe()
        )
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        let policy = ctx.data().config.rules.expiry_policy();
        ctx.say(help_text(policy)).await?;
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_help_describes_configured_policy() {
            let weekly = help_text(ExpiryPolicy::NextSunday);
            assert!(weekly.contains("only be used on Saturday and Sunday"));
            assert!(weekly.contains("Sunday after its draw"));

            let fixed = help_text(ExpiryPolicy::FixedWindow { days: 30 });
            assert!(fixed.contains("any day"));
            assert!(fixed.contains("30 days after its draw"));
            assert!(!fixed.contains("Saturday and Sunday"));
        }
    }
}

// Re-export all commands
pub use inner::*;
