//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggestions are limited to 25 entries, the Discord maximum. Lookup failures
//! produce no suggestions instead of an error.

use crate::{
    bot::{Context, Now},
    core::{eligibility, storage},
};
use poise::serenity_prelude as serenity;

const MAX_SUGGESTIONS: usize = 25;

/// Suggests configured bank names containing the partial input.
#[allow(clippy::unused_async)] // poise awaits every autocomplete callback
pub async fn autocomplete_bank(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let partial_lower = partial.trim().to_lowercase();

    ctx.data()
        .config
        .banks
        .names
        .iter()
        .filter(|bank| bank.to_lowercase().contains(&partial_lower))
        .take(MAX_SUGGESTIONS)
        .cloned()
        .collect()
}

/// Suggests merchant names already used on earlier awards.
pub async fn autocomplete_merchant(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let data = ctx.data();
    let Ok(awards) = storage::list_awards(&data.database, &data.config.banks).await else {
        return Vec::new();
    };

    let mut merchants = storage::merchant_suggestions(&awards, partial);
    merchants.truncate(MAX_SUGGESTIONS);
    merchants
}

/// Suggests awards by id, newest draw first, labelled with date, value, bank and status.
pub async fn autocomplete_award_id(
    ctx: Context<'_>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let data = ctx.data();
    let Ok(mut awards) = storage::list_awards(&data.database, &data.config.banks).await else {
        return Vec::new();
    };

    let now = Now::read().local;
    let policy = data.config.rules.expiry_policy();
    let partial_lower = partial.trim().to_lowercase();
    awards.sort_by(|a, b| b.draw_date.cmp(&a.draw_date));

    awards
        .into_iter()
        .filter(|award| {
            award.id.contains(&partial_lower)
                || award.bank.to_lowercase().contains(&partial_lower)
                || award.draw_date.to_string().contains(&partial_lower)
        })
        .take(MAX_SUGGESTIONS)
        .map(|award| {
            let label = format!(
                "{} {} MOP {} {}",
                award.draw_date,
                award.value,
                award.bank,
                eligibility::status_of(&award, policy, now).label()
            );
            serenity::AutocompleteChoice::new(label, award.id)
        })
        .collect()
}
