//! Garage Discord commands - the `garage` command group.
//!
//! Creating garages, inspecting them, and managing the partner and members are all
//! subcommands of `/garage`. Ownership checks and plan limits live in
//! [`crate::core::garage`]; these handlers only resolve names and format replies.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete, lookup},
        core::{car, garage, policy::MemberRole, report::format_amount},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    /// Member roles offered when inviting someone to a garage.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum MemberChoice {
        #[name = "Partner (adds and edits expenses)"]
        Partner,
        #[name = "Viewer (reports only)"]
        Viewer,
    }

    impl From<MemberChoice> for MemberRole {
        fn from(choice: MemberChoice) -> Self {
            match choice {
                MemberChoice::Partner => Self::Partner,
                MemberChoice::Viewer => Self::Viewer,
            }
        }
    }

    /// Parent command for managing garages.
    #[poise::command(
        slash_command,
        subcommands(
            "garage_create",
            "garage_list",
            "garage_info",
            "garage_partner",
            "garage_remove_partner",
            "garage_invite",
            "garage_kick"
        )
    )]
    pub async fn garage(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Garage management command. Available subcommands:\n\
            `/garage create` - Create a new garage\n\
            `/garage list` - List the garages you can access\n\
            `/garage info` - Show a garage's partner, members, and cars\n\
            `/garage partner` - Set the partner and profit split\n\
            `/garage remove_partner` - Make the garage solo again\n\
            `/garage invite` - Add a partner or viewer member\n\
            `/garage kick` - Remove a member";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Creates a new garage owned by you.
    #[poise::command(slash_command, rename = "create")]
    pub async fn garage_create(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Name of the garage"] name: String,
    ) -> Result<()> {
        let author_id = ctx.author().id.to_string();
        let data = ctx.data();

        match garage::create_garage(&data.database, &data.policy, &author_id, &name).await {
            Ok(created) => {
                ctx.say(format!(
                    "✅ Garage '{}' created. Add cars with `/car add`.",
                    created.name
                ))
                .await?;
                Ok(())
            }
            Err(e) => lookup::reply_failure(ctx, e).await,
        }
    }

    /// Lists the garages you own or are a member of.
    #[poise::command(slash_command, rename = "list")]
    pub async fn garage_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let author_id = ctx.author().id.to_string();
        let db = &ctx.data().database;

        let garages = garage::get_accessible_garages(db, &author_id).await?;
        if garages.is_empty() {
            ctx.say("You have no garages yet. Create one with `/garage create`.")
                .await?;
            return Ok(());
        }

        let mut response = String::from("🏠 **Your Garages:**\n");
        for g in &garages {
            let cars = car::get_cars_for_garage(db, g.id).await?;
            let relation = if g.owner_id == author_id {
                "owner".to_string()
            } else {
                garage::member_role(db, g.id, &author_id)
                    .await?
                    .map_or_else(|| "member".to_string(), |role| role.to_string())
            };
            writeln!(
                &mut response,
                "• **{}** - {} car(s) (you are {relation})",
                g.name,
                cars.len()
            )?;
        }

        ctx.say(response).await?;
        Ok(())
    }

    /// Shows a garage's partner, split, members, and cars.
    #[poise::command(slash_command, rename = "info")]
    pub async fn garage_info(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Garage name"]
        #[autocomplete = "autocomplete::autocomplete_garage_name"]
        garage_name: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let Some(g) = lookup::find_garage(ctx, &garage_name).await? else {
            ctx.say(lookup::garage_not_found(&garage_name)).await?;
            return Ok(());
        };

        let mut response = format!("🏠 **{}**\nOwner: <@{}>\n", g.name, g.owner_id);
        if g.has_partner {
            let partner = g.partner_name.as_deref().unwrap_or("Partner");
            let owner_ratio = g.split_ratio.unwrap_or(50);
            writeln!(
                &mut response,
                "Partner: {partner} (split {owner_ratio}% owner / {}% partner)",
                100 - owner_ratio
            )?;
        } else {
            response.push_str("Solo garage (no partner)\n");
        }

        let members = garage::get_members(db, g.id).await?;
        if !members.is_empty() {
            response.push_str("\n**Members:**\n");
            for member in &members {
                writeln!(&mut response, "• <@{}> - {}", member.user_id, member.role)?;
            }
        }

        let cars = car::get_cars_for_garage(db, g.id).await?;
        if cars.is_empty() {
            response.push_str("\nNo cars yet.");
        } else {
            response.push_str("\n**Cars:**\n");
            for model in cars {
                let summary = car::summarize_car(db, model).await?;
                writeln!(
                    &mut response,
                    "• {} [{}] - expenses {}",
                    summary.car.name,
                    summary.status,
                    format_amount(summary.total_expenses)
                )?;
            }
        }

        ctx.say(response).await?;
        Ok(())
    }

    /// Sets the partner of a garage and the owner's share of profit.
    #[poise::command(slash_command, rename = "partner")]
    pub async fn garage_partner(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Garage name"]
        #[autocomplete = "autocomplete::autocomplete_garage_name"]
        garage_name: String,
        #[description = "Partner's display name"] partner_name: String,
        #[description = "Your share of profit in percent (0-100)"] split_ratio: i32,
        #[description = "Partner's Discord account, to let them log expenses"]
        partner_user: Option<serenity::User>,
    ) -> Result<()> {
        let author_id = ctx.author().id.to_string();
        let data = ctx.data();

        let Some(g) = lookup::find_garage(ctx, &garage_name).await? else {
            ctx.say(lookup::garage_not_found(&garage_name)).await?;
            return Ok(());
        };

        let partner_user_id = partner_user.as_ref().map(|u| u.id.to_string());
        let result = garage::set_partner(
            &data.database,
            &data.policy,
            g.id,
            &author_id,
            &partner_name,
            partner_user_id.as_deref(),
            split_ratio,
        )
        .await;

        match result {
            Ok(updated) => {
                ctx.say(format!(
                    "✅ {} is now partnered with {}: you get {split_ratio}%, they get {}%.",
                    updated.name,
                    partner_name.trim(),
                    100 - split_ratio
                ))
                .await?;
                Ok(())
            }
            Err(e) => lookup::reply_failure(ctx, e).await,
        }
    }

    /// Removes the partner; future sales settle as solo.
    #[poise::command(slash_command, rename = "remove_partner")]
    pub async fn garage_remove_partner(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Garage name"]
        #[autocomplete = "autocomplete::autocomplete_garage_name"]
        garage_name: String,
    ) -> Result<()> {
        let author_id = ctx.author().id.to_string();
        let Some(g) = lookup::find_garage(ctx, &garage_name).await? else {
            ctx.say(lookup::garage_not_found(&garage_name)).await?;
            return Ok(());
        };

        match garage::remove_partner(&ctx.data().database, g.id, &author_id).await {
            Ok(updated) => {
                ctx.say(format!("✅ {} is now a solo garage.", updated.name))
                    .await?;
                Ok(())
            }
            Err(e) => lookup::reply_failure(ctx, e).await,
        }
    }

    /// Adds a member to a garage you own.
    #[poise::command(slash_command, rename = "invite")]
    pub async fn garage_invite(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Garage name"]
        #[autocomplete = "autocomplete::autocomplete_garage_name"]
        garage_name: String,
        #[description = "User to add"] user: serenity::User,
        #[description = "What the user may do"] role: MemberChoice,
    ) -> Result<()> {
        let author_id = ctx.author().id.to_string();
        let Some(g) = lookup::find_garage(ctx, &garage_name).await? else {
            ctx.say(lookup::garage_not_found(&garage_name)).await?;
            return Ok(());
        };

        let user_id = user.id.to_string();
        match garage::add_member(&ctx.data().database, g.id, &author_id, &user_id, role.into())
            .await
        {
            Ok(member) => {
                ctx.say(format!(
                    "✅ <@{}> joined {} as {}.",
                    member.user_id, g.name, member.role
                ))
                .await?;
                Ok(())
            }
            Err(e) => lookup::reply_failure(ctx, e).await,
        }
    }

    /// Removes a member from a garage you own.
    #[poise::command(slash_command, rename = "kick")]
    pub async fn garage_kick(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Garage name"]
        #[autocomplete = "autocomplete::autocomplete_garage_name"]
        garage_name: String,
        #[description = "User to remove"] user: serenity::User,
    ) -> Result<()> {
        let author_id = ctx.author().id.to_string();
        let Some(g) = lookup::find_garage(ctx, &garage_name).await? else {
            ctx.say(lookup::garage_not_found(&garage_name)).await?;
            return Ok(());
        };

        let user_id = user.id.to_string();
        match garage::remove_member(&ctx.data().database, g.id, &author_id, &user_id).await {
            Ok(()) => {
                ctx.say(format!("✅ <@{user_id}> was removed from {}.", g.name))
                    .await?;
                Ok(())
            }
            Err(e) => lookup::reply_failure(ctx, e).await,
        }
    }
}

// Re-export all commands
pub use inner::*;
