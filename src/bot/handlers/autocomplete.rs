//! Autocomplete handlers for Discord slash command parameters.
//!
//! This module suggests garage and car names as the user types, limited to the garages
//! the user owns or is a member of.

use crate::{
    bot::BotData,
    core::{car, garage},
    errors::Error,
};

/// Provides autocomplete suggestions for garage names.
///
/// Returns up to 25 accessible garage names containing the partial input
/// (case-insensitive).
pub async fn autocomplete_garage_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;
    let user_id = ctx.author().id.to_string();

    let Ok(garages) = garage::get_accessible_garages(db, &user_id).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();
    garages
        .into_iter()
        .filter(|g| g.name.to_lowercase().contains(&partial_lower))
        .map(|g| g.name)
        .take(25) // Discord autocomplete limit
        .collect()
}

/// Provides autocomplete suggestions for car names.
///
/// Searches the cars of every accessible garage; duplicate names across garages are
/// listed once.
pub async fn autocomplete_car_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;
    let user_id = ctx.author().id.to_string();

    let Ok(garages) = garage::get_accessible_garages(db, &user_id).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();
    let mut matching = Vec::new();
    for g in garages {
        let Ok(cars) = car::get_cars_for_garage(db, g.id).await else {
            continue;
        };
        matching.extend(
            cars.into_iter()
                .map(|c| c.name)
                .filter(|name| name.to_lowercase().contains(&partial_lower)),
        );
    }

    matching.sort();
    matching.dedup();
    matching.truncate(25);
    matching
}
