//! Resolves the garage and car names users type into database rows.
//!
//! Garages are looked up among the ones the author can access; cars are looked up inside
//! the resolved garage. Misses are returned as `None` so commands can reply with a
//! friendly message instead of an error.

use crate::{
    bot::BotData,
    core::{car, garage},
    entities::{car as car_entity, garage as garage_entity},
    errors::{Error, Result},
};

/// Finds a garage the author can access by name.
pub async fn find_garage(
    ctx: poise::Context<'_, BotData, Error>,
    name: &str,
) -> Result<Option<garage_entity::Model>> {
    let author_id = ctx.author().id.to_string();
    garage::get_accessible_garage_by_name(&ctx.data().database, &author_id, name).await
}

/// Finds a car by name inside an accessible garage.
pub async fn find_car(
    ctx: poise::Context<'_, BotData, Error>,
    garage_name: &str,
    car_name: &str,
) -> Result<Option<(garage_entity::Model, car_entity::Model)>> {
    let Some(garage) = find_garage(ctx, garage_name).await? else {
        return Ok(None);
    };
    let car = car::get_car_by_name(&ctx.data().database, garage.id, car_name).await?;
    Ok(car.map(|car| (garage, car)))
}

/// Standard reply for an unknown garage.
#[must_use]
pub fn garage_not_found(name: &str) -> String {
    format!("❌ Garage '{name}' not found. Use `/garage list` to see your garages.")
}

/// Standard reply for an unknown car.
#[must_use]
pub fn car_not_found(garage_name: &str, car_name: &str) -> String {
    format!(
        "❌ Car '{car_name}' not found in garage '{garage_name}'. Use `/car list` to see its cars."
    )
}

/// Replies with a user-caused error and swallows it; other errors are returned for the
/// framework error handler.
pub async fn reply_failure(ctx: poise::Context<'_, BotData, Error>, error: Error) -> Result<()> {
    if error.is_user_facing() {
        ctx.say(format!("❌ {error}")).await?;
        Ok(())
    } else {
        Err(error)
    }
}
