use clap::{ArgAction, Parser, Subcommand};
use commands::{catalog, config, detail, update};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "cinepick")]
#[command(about = "CinePick - Find something worth watching tonight")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape Letterboxd genre listings into the movie catalog
    #[command(long_about = "Rebuild or extend the movie catalog by scraping Letterboxd genre \
        listings with headless Chromium. A quick update (the default) adds new titles to the \
        existing catalog; a full update rebuilds it from scratch. Press Ctrl-C to stop; a \
        stopped run leaves the catalog untouched.")]
    Update {
        /// Rebuild the whole catalog (overwrites existing rows)
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "quick")]
        full: bool,

        /// Merge new titles into the existing catalog
        #[arg(long, action = ArgAction::SetTrue)]
        quick: bool,
    },
    /// Show the full description of one movie, fetching it on first use
    Detail {
        /// Catalog movie URL, e.g. /film/heat/
        movie_url: String,

        /// Fetch the page without touching the catalog
        #[arg(long, action = ArgAction::SetTrue)]
        no_save: bool,
    },
    /// Search the catalog by title or description
    Search {
        /// Text to look for in titles and descriptions
        #[arg(long)]
        query: Option<String>,

        /// Earliest release year
        #[arg(long)]
        min_year: Option<i32>,

        /// Latest release year
        #[arg(long)]
        max_year: Option<i32>,

        /// Minimum rating
        #[arg(long)]
        min_rating: Option<f64>,
    },
    /// Recommend top-rated movies in a genre ("any" for all genres)
    Recommend {
        /// Genre name, e.g. "science fiction" or "any"
        #[arg(default_value = "any")]
        genre: String,

        /// Pick one movie at random instead of listing the top rated
        #[arg(long, action = ArgAction::SetTrue)]
        random: bool,
    },
    /// List the genres present in the catalog
    Genres,
    /// Show catalog location, size and freshness
    Status,
    /// Show or initialise configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration and resolved paths
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let context = commands::Context::load()?;

    logging::init_logging_with_file(cli.verbose, cli.quiet, context.config.logging.file.clone())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Update { full, quick: _ } => update::run_update(&context, full, &output).await,
        Commands::Detail { movie_url, no_save } => {
            detail::run_detail(&context, &movie_url, no_save, &output).await
        }
        Commands::Search {
            query,
            min_year,
            max_year,
            min_rating,
        } => catalog::run_search(&context, query, min_year, max_year, min_rating, &output),
        Commands::Recommend { genre, random } => {
            catalog::run_recommend(&context, &genre, random, &output)
        }
        Commands::Genres => catalog::run_genres(&context, &output),
        Commands::Status => catalog::run_status(&context, &output),
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => config::show_config(&context, &output),
            ConfigCommands::Init { force } => config::init_config(&context, force, &output),
        },
    }
}
