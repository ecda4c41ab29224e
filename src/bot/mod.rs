//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for GarageBuddy, including all slash
//! commands, autocomplete handlers, and the bot context shared by every command.

/// Discord command implementations (garage, car, expense, report, general, admin)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;
/// Name resolution shared by commands
pub mod lookup;

use crate::{core::policy::AccessPolicy, errors::Error};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
/// This structure holds the database connection and the plan table that every gated
/// command consults.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Read-only plan table built once at startup
    pub policy: AccessPolicy,
}

impl BotData {
    /// Creates a new `BotData` instance with the given database connection and policy.
    #[must_use]
    pub const fn new(database: DatabaseConnection, policy: AccessPolicy) -> Self {
        Self { database, policy }
    }
}

/// Every command registered with Discord.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        commands::ping(),
        commands::help(),
        commands::plan(),
        commands::garage(),
        commands::car(),
        commands::sell(),
        commands::cancel_sale(),
        commands::expense(),
        commands::report(),
        commands::set_plan(),
    ]
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("❌ {error}")).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Connects to Discord and runs the bot until the gateway closes.
#[instrument(skip(token, data))]
pub async fn run_bot(token: String, data: BotData) -> Result<(), Error> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))?;
    Ok(())
}
