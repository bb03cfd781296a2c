use super::Context;
use crate::output::Output;
use cinepick_config::Config;
use color_eyre::Result;
use comfy_table::{presets, Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use serde_json::json;

pub fn show_config(context: &Context, output: &Output) -> Result<()> {
    let config_file = context.paths.config_file();
    let config = &context.config;

    if !output.is_human() {
        output.json(&json!({
            "config_file": config_file.display().to_string(),
            "config_file_exists": config_file.exists(),
            "catalog_file": config.catalog_file(&context.paths).display().to_string(),
            "static_dir": config.static_dir(&context.paths).display().to_string(),
            "config": serde_json::to_value(config)?,
        }));
        return Ok(());
    }

    if !config_file.exists() {
        output.warn(format!(
            "Configuration file not found at {}; showing defaults. \
             Run 'cinepick config init' to create it.",
            config_file.display()
        ));
    }

    println!("\n{}\n", "Configuration".bright_cyan().bold());

    let mut paths = section_table("Paths");
    paths.add_row(vec![Cell::new("Config file"), Cell::new(config_file.display())]);
    paths.add_row(vec![
        Cell::new("Catalog"),
        Cell::new(config.catalog_file(&context.paths).display()),
    ]);
    paths.add_row(vec![
        Cell::new("Images"),
        Cell::new(config.static_dir(&context.paths).display()),
    ]);
    paths.add_row(vec![
        Cell::new("Debug HTML"),
        Cell::new(config.debug_dir(&context.paths).display()),
    ]);
    println!("{}\n", paths);

    let scrape = &config.scrape;
    let mut scraping = section_table("Scraping");
    scraping.add_row(vec![Cell::new("Base URL"), Cell::new(&scrape.base_url)]);
    scraping.add_row(vec![Cell::new("Concurrency"), Cell::new(scrape.concurrency)]);
    scraping.add_row(vec![
        Cell::new("Settle delay"),
        Cell::new(format!("{} ms", scrape.settle_delay_ms)),
    ]);
    scraping.add_row(vec![Cell::new("Download posters"), Cell::new(check(scrape.download_images))]);
    scraping.add_row(vec![
        Cell::new("Full update"),
        Cell::new(format!(
            "{} per genre, {}",
            scrape.full.max_per_genre,
            scrape.full.genres.join(", ")
        )),
    ]);
    scraping.add_row(vec![
        Cell::new("Quick update"),
        Cell::new(format!(
            "{} per genre, {}",
            scrape.quick.max_per_genre,
            scrape.quick.genres.join(", ")
        )),
    ]);
    println!("{}\n", scraping);

    let mut browser = section_table("Browser");
    let executable = config
        .browser
        .chrome_executable
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "auto-detect".to_string());
    browser.add_row(vec![Cell::new("Executable"), Cell::new(executable)]);
    browser.add_row(vec![Cell::new("Headless"), Cell::new(check(config.browser.headless))]);
    browser.add_row(vec![Cell::new("Capture HTML"), Cell::new(check(config.debug.capture_html))]);
    println!("{}", browser);

    Ok(())
}

pub fn init_config(context: &Context, force: bool, output: &Output) -> Result<()> {
    let config_file = context.paths.config_file();
    if config_file.exists() && !force {
        output.warn(format!(
            "Configuration already exists at {}; use --force to overwrite",
            config_file.display()
        ));
        return Ok(());
    }

    Config::default()
        .save_to_file(&config_file)
        .map_err(|e| {
            color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e)
        })?;
    context
        .paths
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create data directories: {}", e))?;

    tracing::info!(path = %config_file.display(), "Default configuration written");
    output.success(format!("Configuration written to {}", config_file.display()));
    Ok(())
}

fn section_table(title: &str) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![Cell::new(title).fg(Color::Cyan).add_attribute(Attribute::Bold)]);
    table
}

fn check(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}
