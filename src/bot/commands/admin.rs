//! Admin Discord commands - `set_plan`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        core::{account, policy::Role},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum PlanChoice {
        Free,
        Starter,
        Pro,
        Admin,
    }

    impl From<PlanChoice> for Role {
        fn from(choice: PlanChoice) -> Self {
            match choice {
                PlanChoice::Free => Self::Free,
                PlanChoice::Starter => Self::Starter,
                PlanChoice::Pro => Self::Pro,
                PlanChoice::Admin => Self::Admin,
            }
        }
    }

    /// Assigns a subscription plan to a user. Admins only.
    #[poise::command(slash_command)]
    pub async fn set_plan(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "User whose plan to change"] user: serenity::User,
        #[description = "New plan"] plan: PlanChoice,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let author_id = ctx.author().id.to_string();

        let is_admin = account::role_for(db, &author_id)
            .await?
            .is_some_and(Role::is_admin);
        if !is_admin {
            ctx.send(
                poise::CreateReply::default()
                    .content("❌ Only admins can change plans.")
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }

        let role = Role::from(plan);
        account::set_role(db, &user.id.to_string(), role).await?;

        ctx.say(format!("✅ <@{}> is now on the {} plan.", user.id, role))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
