//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the `AwardBuddy` application,
//! including all slash commands, autocomplete handlers, and bot context management.
//! Commands only parse input, call into `core` with plain data and an explicit
//! `now`, and render the result.

/// Discord command implementations (award, report, transfer, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{config::Config, errors::Error};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Award rules and bank list
    pub config: Arc<Config>,
}

impl BotData {
    /// Creates a new `BotData` instance with the given database connection and config.
    #[must_use]
    pub const fn new(database: DatabaseConnection, config: Arc<Config>) -> Self {
        Self { database, config }
    }
}

/// Poise context used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// The current instant, read once per command, as local wall-clock time and UTC.
#[derive(Debug, Clone, Copy)]
pub struct Now {
    /// Local date and time, used for every calendar rule
    pub local: NaiveDateTime,
    /// The same instant in UTC, used for timestamps
    pub utc: DateTime<Utc>,
}

impl Now {
    /// Reads the system clock.
    #[must_use]
    pub fn read() -> Self {
        let local = Local::now();
        Self {
            local: local.naive_local(),
            utc: local.with_timezone(&Utc),
        }
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_user_facing() {
                info!("Command `{}` rejected input: {error}", ctx.command().name);
            } else {
                error!("Error in command `{}`: {error:?}", ctx.command().name);
            }
            if let Err(e) = ctx.say(format!("❌ {error}")).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Builds the poise framework, connects to Discord and runs until the client stops.
#[instrument(skip(token, config, database))]
pub async fn run_bot(
    token: String,
    config: Arc<Config>,
    database: DatabaseConnection,
) -> Result<(), Error> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::award(),
                commands::summary(),
                commands::trend(),
                commands::banks(),
                commands::export(),
                commands::import(),
                commands::ping(),
                commands::help(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(BotData::new(database, config))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e:?}"))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e:?}"))?;
    Ok(())
}

pub use commands::*;
pub use handlers::*;
