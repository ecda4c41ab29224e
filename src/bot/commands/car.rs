//! Car Discord commands - the `car` command group plus `sell` and `cancel_sale`.
//!
//! Selling a car runs the settlement calculator and replies with the full breakdown of
//! who receives what.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete, lookup},
        core::{
            car::{self, CarStatus},
            report::{format_amount, format_settlement},
        },
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Statuses a user can set directly. Sold is reached through `/sell`.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum StatusChoice {
        Available,
        Pending,
    }

    impl From<StatusChoice> for CarStatus {
        fn from(choice: StatusChoice) -> Self {
            match choice {
                StatusChoice::Available => Self::Available,
                StatusChoice::Pending => Self::Pending,
            }
        }
    }

    /// Parent command for managing cars.
    #[poise::command(
        slash_command,
        subcommands("car_add", "car_list", "car_info", "car_status")
    )]
    pub async fn car(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Car management command. Available subcommands:\n\
            `/car add` - Add a car to a garage\n\
            `/car list` - List a garage's cars\n\
            `/car info` - Show a car's ledger and settlement\n\
            `/car status` - Mark a car available or pending";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Adds a car to a garage.
    #[poise::command(slash_command, rename = "add")]
    pub async fn car_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Garage name"]
        #[autocomplete = "autocomplete::autocomplete_garage_name"]
        garage_name: String,
        #[description = "Car name (e.g., '2012 Civic')"] name: String,
    ) -> Result<()> {
        let author_id = ctx.author().id.to_string();
        let data = ctx.data();

        let Some(g) = lookup::find_garage(ctx, &garage_name).await? else {
            ctx.say(lookup::garage_not_found(&garage_name)).await?;
            return Ok(());
        };

        match car::create_car(&data.database, &data.policy, g.id, &author_id, &name).await {
            Ok(created) => {
                ctx.say(format!("✅ Added '{}' to {}.", created.name, g.name))
                    .await?;
                Ok(())
            }
            Err(e) => lookup::reply_failure(ctx, e).await,
        }
    }

    /// Lists the cars in a garage.
    #[poise::command(slash_command, rename = "list")]
    pub async fn car_list(
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

        let cars = car::get_cars_for_garage(db, g.id).await?;
        if cars.is_empty() {
            ctx.say(format!("No cars in {} yet. Add one with `/car add`.", g.name))
                .await?;
            return Ok(());
        }

        let mut response = format!("🚗 **Cars in {}:**\n", g.name);
        for model in cars {
            let summary = car::summarize_car(db, model).await?;
            match &summary.settlement {
                Some(settlement) => writeln!(
                    &mut response,
                    "• **{}** [sold] - sold for {}, profit {}",
                    summary.car.name,
                    format_amount(settlement.sale_price),
                    format_amount(settlement.total_profit)
                )?,
                None => writeln!(
                    &mut response,
                    "• **{}** [{}] - expenses {}",
                    summary.car.name,
                    summary.status,
                    format_amount(summary.total_expenses)
                )?,
            }
        }

        ctx.say(response).await?;
        Ok(())
    }

    /// Shows a car's ledger and, when sold, its settlement.
    #[poise::command(slash_command, rename = "info")]
    pub async fn car_info(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Garage name"]
        #[autocomplete = "autocomplete::autocomplete_garage_name"]
        garage_name: String,
        #[description = "Car name"]
        #[autocomplete = "autocomplete::autocomplete_car_name"]
        car_name: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let Some((g, found)) = lookup::find_car(ctx, &garage_name, &car_name).await? else {
            ctx.say(lookup::car_not_found(&garage_name, &car_name))
                .await?;
            return Ok(());
        };

        let summary = car::summarize_car(db, found).await?;
        let mut response = format!("🚗 **{}** ({}) [{}]\n", summary.car.name, g.name, summary.status);

        if summary.expenses.is_empty() {
            response.push_str("No ledger entries yet.\n");
        } else {
            response.push_str("\n**Ledger:**\n");
            for entry in &summary.expenses {
                writeln!(
                    &mut response,
                    "`#{}` {} - {} {} ({}, paid by {}) - {}",
                    entry.id,
                    entry.date,
                    entry.entry_type,
                    format_amount(entry.amount),
                    entry.category,
                    entry.paid_by,
                    entry.description
                )?;
            }
        }

        writeln!(
            &mut response,
            "\nTotal expenses: {}",
            format_amount(summary.total_expenses)
        )?;
        if summary.total_income > 0.0 {
            writeln!(
                &mut response,
                "Total income: {}",
                format_amount(summary.total_income)
            )?;
        }

        if let Some(settlement) = &summary.settlement {
            writeln!(
                &mut response,
                "\n**Settlement:**\n{}",
                format_settlement(settlement, summary.sale_partner.as_deref())?
            )?;
        }

        ctx.say(response).await?;
        Ok(())
    }

    /// Marks a car as available or pending.
    #[poise::command(slash_command, rename = "status")]
    pub async fn car_status(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Garage name"]
        #[autocomplete = "autocomplete::autocomplete_garage_name"]
        garage_name: String,
        #[description = "Car name"]
        #[autocomplete = "autocomplete::autocomplete_car_name"]
        car_name: String,
        #[description = "New status"] status: StatusChoice,
    ) -> Result<()> {
        let author_id = ctx.author().id.to_string();
        let Some((_, found)) = lookup::find_car(ctx, &garage_name, &car_name).await? else {
            ctx.say(lookup::car_not_found(&garage_name, &car_name))
                .await?;
            return Ok(());
        };

        match car::set_status(&ctx.data().database, found.id, &author_id, status.into()).await {
            Ok(updated) => {
                ctx.say(format!("✅ '{}' is now {}.", updated.name, updated.status))
                    .await?;
                Ok(())
            }
            Err(e) => lookup::reply_failure(ctx, e).await,
        }
    }

    /// Records the sale of a car and shows how the proceeds are split.
    #[poise::command(slash_command, prefix_command)]
    pub async fn sell(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Garage name"]
        #[autocomplete = "autocomplete::autocomplete_garage_name"]
        garage_name: String,
        #[description = "Car name"]
        #[autocomplete = "autocomplete::autocomplete_car_name"]
        car_name: String,
        #[description = "Sale price"] price: f64,
    ) -> Result<()> {
        let author_id = ctx.author().id.to_string();
        let Some((_, found)) = lookup::find_car(ctx, &garage_name, &car_name).await? else {
            ctx.say(lookup::car_not_found(&garage_name, &car_name))
                .await?;
            return Ok(());
        };

        let db = &ctx.data().database;
        match car::sell_car(db, found.id, &author_id, price).await {
            Ok(settlement) => {
                let partner = car::get_sale(db, found.id)
                    .await?
                    .and_then(|record| record.partner_name);
                ctx.say(format!(
                    "💰 **{} sold!**\n{}",
                    found.name,
                    format_settlement(&settlement, partner.as_deref())?
                ))
                .await?;
                Ok(())
            }
            Err(e) => lookup::reply_failure(ctx, e).await,
        }
    }

    /// Cancels a recorded sale and puts the car back in stock.
    #[poise::command(slash_command, prefix_command)]
    pub async fn cancel_sale(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Garage name"]
        #[autocomplete = "autocomplete::autocomplete_garage_name"]
        garage_name: String,
        #[description = "Car name"]
        #[autocomplete = "autocomplete::autocomplete_car_name"]
        car_name: String,
    ) -> Result<()> {
        let author_id = ctx.author().id.to_string();
        let Some((_, found)) = lookup::find_car(ctx, &garage_name, &car_name).await? else {
            ctx.say(lookup::car_not_found(&garage_name, &car_name))
                .await?;
            return Ok(());
        };

        match car::cancel_sale(&ctx.data().database, found.id, &author_id).await {
            Ok(updated) => {
                ctx.say(format!(
                    "↩️ Sale of '{}' cancelled; it is {} again.",
                    updated.name, updated.status
                ))
                .await?;
                Ok(())
            }
            Err(e) => lookup::reply_failure(ctx, e).await,
        }
    }
}

// Re-export all commands
pub use inner::*;
