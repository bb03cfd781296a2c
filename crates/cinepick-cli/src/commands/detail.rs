use super::Context;
use crate::output::Output;
use cinepick_core::ScrapeService;
use color_eyre::Result;
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_detail(
    context: &Context,
    movie_url: &str,
    no_save: bool,
    output: &Output,
) -> Result<()> {
    let service = ScrapeService::from_config(&context.config, &context.paths)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to set up scraper: {}", e))?;

    if no_save {
        let detail = service.fetch_detail(movie_url).await;
        if !output.is_human() {
            output.json(&json!({ "movie_url": movie_url, "detail": detail }));
            return Ok(());
        }
        if detail.is_error() {
            output.warn(format!("Could not load {}; try again later", detail.letterboxd_url));
        }
        print_description(&detail.description);
        output.info(detail.letterboxd_url);
        return Ok(());
    }

    let response = service.describe(movie_url).await?;
    if !output.is_human() {
        output.json(&json!(response));
        return Ok(());
    }

    println!("{} ({})", response.title.bright_cyan().bold(), response.year);
    print_description(&response.description);
    if let Some(path) = &response.large_image_path {
        let poster = context.config.static_dir(&context.paths).join(path);
        output.info(format!("Poster: {}", poster.display()));
    }
    output.info(response.letterboxd_url);
    Ok(())
}

/// Descriptions are stored as HTML fragments; render them for a terminal.
fn print_description(description: &str) {
    let text = description
        .replace("<br><br>", "\n\n")
        .replace("<i>", "")
        .replace("</i>", "")
        .replace("<b>", "")
        .replace("</b>", "");
    println!("\n{}\n", text);
}
