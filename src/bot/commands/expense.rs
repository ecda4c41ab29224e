//! Expense Discord commands - the `expense` command group.
//!
//! Entries are added against a car by name and edited or deleted by the id shown in
//! `/car info`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete, lookup},
        core::{
            expense::{self, ExpenseUpdate, NewExpense},
            report::format_amount,
            settlement::{EntryKind, Payer},
        },
        errors::{Error, Result},
    };
    use chrono::NaiveDate;

    const DATE_FORMAT: &str = "%Y-%m-%d";

    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum EntryChoice {
        Expense,
        Income,
    }

    impl From<EntryChoice> for EntryKind {
        fn from(choice: EntryChoice) -> Self {
            match choice {
                EntryChoice::Expense => Self::Expense,
                EntryChoice::Income => Self::Income,
            }
        }
    }

    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum PayerChoice {
        Owner,
        Partner,
    }

    impl From<PayerChoice> for Payer {
        fn from(choice: PayerChoice) -> Self {
            match choice {
                PayerChoice::Owner => Self::Owner,
                PayerChoice::Partner => Self::Partner,
            }
        }
    }

    /// Parses an optional `YYYY-MM-DD` date; `Ok(None)` when absent.
    fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
        raw.map(|s| {
            NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| Error::Validation {
                message: format!("Invalid date '{s}': use YYYY-MM-DD"),
            })
        })
        .transpose()
    }

    /// Parent command for the per-car ledger.
    #[poise::command(
        slash_command,
        subcommands("expense_add", "expense_edit", "expense_delete")
    )]
    pub async fn expense(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Expense ledger command. Available subcommands:\n\
            `/expense add` - Log an expense or income for a car\n\
            `/expense edit` - Change an entry (ids are shown in `/car info`)\n\
            `/expense delete` - Remove an entry";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Logs an expense or income entry for a car.
    #[poise::command(slash_command, rename = "add")]
    pub async fn expense_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Garage name"]
        #[autocomplete = "autocomplete::autocomplete_garage_name"]
        garage_name: String,
        #[description = "Car name"]
        #[autocomplete = "autocomplete::autocomplete_car_name"]
        car_name: String,
        #[description = "Amount"] amount: f64,
        #[description = "What the money was for"] description: String,
        #[description = "Expense or income (default: expense)"] entry_type: Option<EntryChoice>,
        #[description = "Category (default: general)"] category: Option<String>,
        #[description = "Who paid (default: owner)"] paid_by: Option<PayerChoice>,
        #[description = "Date as YYYY-MM-DD (default: today)"] date: Option<String>,
    ) -> Result<()> {
        let author_id = ctx.author().id.to_string();
        let Some((_, found)) = lookup::find_car(ctx, &garage_name, &car_name).await? else {
            ctx.say(lookup::car_not_found(&garage_name, &car_name))
                .await?;
            return Ok(());
        };

        let date = match parse_date(date.as_deref()) {
            Ok(date) => date.unwrap_or_else(|| chrono::Utc::now().date_naive()),
            Err(e) => return lookup::reply_failure(ctx, e).await,
        };

        let entry = NewExpense {
            description,
            amount,
            date,
            kind: entry_type.map_or(EntryKind::Expense, Into::into),
            category: category.unwrap_or_default(),
            paid_by: paid_by.map_or(Payer::Owner, Into::into),
        };

        match expense::add_expense(&ctx.data().database, found.id, &author_id, entry).await {
            Ok(created) => {
                ctx.say(format!(
                    "✅ Logged {} of {} for '{}' - {} (ID: {})",
                    created.entry_type,
                    format_amount(created.amount),
                    found.name,
                    created.description,
                    created.id
                ))
                .await?;
                Ok(())
            }
            Err(e) => lookup::reply_failure(ctx, e).await,
        }
    }

    /// Changes fields of an existing ledger entry.
    #[poise::command(slash_command, rename = "edit")]
    pub async fn expense_edit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Entry ID (see /car info)"] id: i64,
        #[description = "New amount"] amount: Option<f64>,
        #[description = "New description"] description: Option<String>,
        #[description = "New type"] entry_type: Option<EntryChoice>,
        #[description = "New category"] category: Option<String>,
        #[description = "New payer"] paid_by: Option<PayerChoice>,
        #[description = "New date as YYYY-MM-DD"] date: Option<String>,
    ) -> Result<()> {
        let author_id = ctx.author().id.to_string();

        let date = match parse_date(date.as_deref()) {
            Ok(date) => date,
            Err(e) => return lookup::reply_failure(ctx, e).await,
        };

        let update = ExpenseUpdate {
            description,
            amount,
            date,
            kind: entry_type.map(Into::into),
            category,
            paid_by: paid_by.map(Into::into),
        };
        if update == ExpenseUpdate::default() {
            ctx.say("Nothing to change. Pass at least one field to update.")
                .await?;
            return Ok(());
        }

        match expense::update_expense(&ctx.data().database, id, &author_id, update).await {
            Ok(updated) => {
                ctx.say(format!(
                    "✅ Entry #{} is now {} of {} ({}, paid by {}) - {}",
                    updated.id,
                    updated.entry_type,
                    format_amount(updated.amount),
                    updated.category,
                    updated.paid_by,
                    updated.description
                ))
                .await?;
                Ok(())
            }
            Err(e) => lookup::reply_failure(ctx, e).await,
        }
    }

    /// Deletes a ledger entry.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn expense_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Entry ID (see /car info)"] id: i64,
    ) -> Result<()> {
        let author_id = ctx.author().id.to_string();

        match expense::delete_expense(&ctx.data().database, id, &author_id).await {
            Ok(()) => {
                ctx.say(format!("🗑️ Entry #{id} deleted.")).await?;
                Ok(())
            }
            Err(e) => lookup::reply_failure(ctx, e).await,
        }
    }

}

// Re-export all commands
pub use inner::*;
