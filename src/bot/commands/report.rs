//! Report Discord command - `report`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete, lookup},
        core::report::{self, GarageReport, format_amount},
        errors::{Error, Result},
    };
    use std::fmt::Write;

    fn render(report: &GarageReport) -> Result<String> {
        let mut out = format!("📊 **Report: {}**\n\n", report.garage.name);
        writeln!(
            out,
            "**Inventory:** {} available, {} pending, {} sold",
            report.available_count, report.pending_count, report.sold_count
        )?;
        writeln!(
            out,
            "**Invested in stock:** {}",
            format_amount(report.invested_in_stock)
        )?;
        writeln!(out, "**Revenue:** {}", format_amount(report.total_revenue))?;
        writeln!(
            out,
            "**Realized profit:** {}",
            format_amount(report.realized_profit)
        )?;

        let sold_with_partner = report.cars.iter().any(|c| c.sale_partner.is_some());
        if report.garage.has_partner || sold_with_partner {
            let partner = report.garage.partner_name.as_deref().unwrap_or("Partner");
            writeln!(
                out,
                "• You: {}\n• {partner}: {}",
                format_amount(report.your_realized_profit),
                format_amount(report.partner_realized_profit)
            )?;
        }

        if let Some(categories) = &report.category_totals {
            if !categories.is_empty() {
                out.push_str("\n**Expenses by category:**\n");
                for (category, total) in categories {
                    writeln!(out, "• {category}: {}", format_amount(*total))?;
                }
            }
        }

        Ok(out)
    }

    /// Shows inventory, revenue, and profit for a garage.
    #[poise::command(slash_command, prefix_command)]
    pub async fn report(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Garage name"]
        #[autocomplete = "autocomplete::autocomplete_garage_name"]
        garage_name: String,
    ) -> Result<()> {
        let author_id = ctx.author().id.to_string();
        let data = ctx.data();

        let Some(g) = lookup::find_garage(ctx, &garage_name).await? else {
            ctx.say(lookup::garage_not_found(&garage_name)).await?;
            return Ok(());
        };

        match report::generate_garage_report(&data.database, &data.policy, g.id, &author_id)
            .await
        {
            Ok(garage_report) => {
                ctx.say(render(&garage_report)?).await?;
                Ok(())
            }
            Err(e) => lookup::reply_failure(ctx, e).await,
        }
    }
}

// Re-export all commands
pub use inner::*;
