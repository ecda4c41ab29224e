//! General Discord commands - ping, help, and plan overview.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        core::{
            account, car, garage,
            policy::{ResourceKind, Role},
        },
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**GarageBuddy Help**\n\
        Track cars, log expenses, and settle sales with your partner.\n\n\
        **Garages**\n\
        • `/garage create <name>` - Creates a garage.\n\
        • `/garage list` / `/garage info <garage>` - Shows your garages.\n\
        • `/garage partner <garage> <name> <ratio> [user]` - Sets a partner and your profit %.\n\
        • `/garage remove_partner <garage>` - Removes the partner.\n\
        • `/garage invite <garage> <user> <role>` / `/garage kick <garage> <user>` - Manages members.\n\n\
        **Cars**\n\
        • `/car add <garage> <name>` - Adds a car.\n\
        • `/car list <garage>` / `/car info <garage> <car>` - Shows cars and their ledgers.\n\
        • `/car status <garage> <car> <status>` - Marks a car available or pending.\n\
        • `/sell <garage> <car> <price>` - Records a sale and shows the settlement.\n\
        • `/cancel_sale <garage> <car>` - Cancels a recorded sale.\n\n\
        **Expenses**\n\
        • `/expense add <garage> <car> <amount> <description> ...` - Logs an expense or income.\n\
        • `/expense edit <id> ...` / `/expense delete <id>` - Corrects the ledger.\n\n\
        **Other**\n\
        • `/report <garage>` - Garage report (Starter and above).\n\
        • `/plan` - Shows your plan and usage.\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Shows your subscription plan, its limits, and your current usage.
    #[poise::command(slash_command, prefix_command)]
    pub async fn plan(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let policy = &ctx.data().policy;
        let user_id = ctx.author().id.to_string();

        let Some(role) = account::role_for(db, &user_id).await? else {
            ctx.say("❌ Your account has an unrecognized plan. Please contact an admin.")
                .await?;
            return Ok(());
        };

        let owned = garage::get_owned_garages(db, &user_id).await?;
        let usage = [
            (ResourceKind::Garages, owned.len() as u64),
            (
                ResourceKind::Cars,
                car::count_cars_owned_by(db, &user_id).await?,
            ),
            (
                ResourceKind::Partners,
                owned.iter().filter(|g| g.has_partner).count() as u64,
            ),
        ];

        let mut response = format!("💳 **Plan: {}**\n\n", role.as_str().to_uppercase());
        for (resource, used) in usage {
            let limit = policy
                .limit(role, resource)
                .map_or_else(|| "none".to_string(), |l| l.to_string());
            let marker = if policy.check_limit(role, resource, used) {
                "🟢"
            } else {
                "🔴"
            };
            writeln!(&mut response, "{marker} **{resource}:** {used} / {limit}")?;
        }

        if let Some(definition) = policy.definition(role) {
            writeln!(
                &mut response,
                "\n**Features:** {}",
                definition.limits.features.join(", ")
            )?;
        }

        if !role.has_starter_access() {
            response.push_str("\nUpgrade to Starter to unlock partners and reports.");
        } else if !role.has_pro_access() && role != Role::Admin {
            response.push_str("\nUpgrade to Pro for unlimited garages and cars.");
        }

        ctx.say(response).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
