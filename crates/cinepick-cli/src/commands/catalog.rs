use super::Context;
use crate::output::Output;
use chrono::{Duration, Local};
use cinepick_core::{
    genres, pick_random, recommend, search, SearchQuery, ANY_GENRE, RECOMMEND_LIMIT,
};
use cinepick_models::MovieRecord;
use color_eyre::Result;
use comfy_table::{presets, Attribute, Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;

fn load(context: &Context, output: &Output) -> Result<Vec<MovieRecord>> {
    let catalog = context.catalog();
    if !catalog.exists() {
        output.warn(format!(
            "No catalog at {}; run 'cinepick update' first",
            catalog.path().display()
        ));
        return Ok(Vec::new());
    }
    Ok(catalog.load()?)
}

pub fn run_search(
    context: &Context,
    query: Option<String>,
    min_year: Option<i32>,
    max_year: Option<i32>,
    min_rating: Option<f64>,
    output: &Output,
) -> Result<()> {
    let records = load(context, output)?;
    let defaults = SearchQuery::default();
    let query = SearchQuery {
        text: query,
        min_year: min_year.unwrap_or(defaults.min_year),
        max_year: max_year.unwrap_or(defaults.max_year),
        min_rating: min_rating.unwrap_or(defaults.min_rating),
        limit: defaults.limit,
    };
    tracing::debug!(?query, rows = records.len(), "Searching catalog");

    let results = search(&records, &query);
    output.movies(&format!("Top {} matches", results.len()), &results);
    Ok(())
}

pub fn run_recommend(context: &Context, genre: &str, random: bool, output: &Output) -> Result<()> {
    let records = load(context, output)?;
    let wanted = if genre.eq_ignore_ascii_case("any") { ANY_GENRE } else { genre };

    if random {
        let pick = pick_random(&records, Some(wanted), &mut rand::thread_rng());
        let picked: Vec<MovieRecord> = pick.into_iter().collect();
        output.movies(&format!("Random pick ({})", wanted), &picked);
    } else {
        let results = recommend(&records, Some(wanted), RECOMMEND_LIMIT);
        output.movies(&format!("Top rated ({})", wanted), &results);
    }
    Ok(())
}

pub fn run_genres(context: &Context, output: &Output) -> Result<()> {
    let records = load(context, output)?;
    let names = genres(&records);

    if !output.is_human() {
        output.json(&json!({ "genres": names }));
        return Ok(());
    }
    for name in &names {
        output.info(name);
    }
    Ok(())
}

pub fn run_status(context: &Context, output: &Output) -> Result<()> {
    let catalog = context.catalog();
    let exists = catalog.exists();
    let rows = if exists { catalog.load()?.len() } else { 0 };
    let last_updated = catalog.last_updated();
    let max_age = Duration::hours(context.config.catalog.stale_after_hours as i64);
    let stale = catalog.is_stale(max_age);

    if !output.is_human() {
        output.json(&json!({
            "catalog": catalog.path().display().to_string(),
            "exists": exists,
            "movies": rows,
            "last_updated": last_updated.map(|t| t.to_rfc3339()),
            "stale": stale,
            "stale_after_hours": context.config.catalog.stale_after_hours,
        }));
        return Ok(());
    }

    let updated = last_updated
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());
    let freshness = if !exists {
        "missing".red().to_string()
    } else if stale {
        "stale".yellow().to_string()
    } else {
        "fresh".green().to_string()
    };

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Catalog").add_attribute(Attribute::Bold),
        Cell::new(catalog.path().display().to_string()),
    ]);
    table.add_row(vec![Cell::new("Movies"), Cell::new(rows)]);
    table.add_row(vec![Cell::new("Last updated"), Cell::new(updated)]);
    table.add_row(vec![Cell::new("Freshness"), Cell::new(freshness)]);
    println!("{}", table);

    if stale {
        output.info("Run 'cinepick update' to refresh the catalog.");
    }
    Ok(())
}
