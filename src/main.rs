use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use anirec::catalog::embedded::StaticCatalog;
use anirec::catalog::jikan::JikanClient;
use anirec::catalog::CatalogSource;
use anirec::config::{CatalogBackend, Config};
use anirec::output::terminal;
use anirec::recommend::genre::{GenreBrowser, DEFAULT_GENRE_COUNT};

/// anirec: find anime like the ones you love.
///
/// Recommends titles similar to a favorite, or the top titles in a genre,
/// using live MyAnimeList data (via Jikan) or a small built-in dataset.
#[derive(Parser)]
#[command(name = "anirec", version, about)]
struct Cli {
    /// Where to get anime data (overrides ANIREC_SOURCE)
    #[arg(long, global = true, value_enum)]
    source: Option<CatalogBackend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend anime similar to a favorite title
    Similar {
        /// Your favorite anime title
        title: String,

        /// How many recommendations to show (default: ANIREC_TOP_N or 5)
        #[arg(long)]
        top_n: Option<usize>,
    },

    /// Show the top-scored anime in a genre
    Genre {
        /// Genre name, e.g. "Action" or "Slice of Life"
        name: String,

        /// How many titles to show (default: 3)
        #[arg(long, default_value_t = DEFAULT_GENRE_COUNT)]
        count: usize,

        /// Which page of results to show
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// List the genres the catalog knows about
    Genres,

    /// Recommend by synopsis similarity over the built-in dataset (no network)
    Offline {
        /// A title from the built-in dataset
        title: String,

        /// How many titles to show (default: 5)
        #[arg(long, default_value = "5")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("anirec=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let backend = cli.source.unwrap_or(config.catalog_backend);

    match cli.command {
        Commands::Similar { title, top_n } => {
            let catalog = create_catalog(backend, &config)?;
            let top_n = top_n.unwrap_or(config.top_n);
            let settings = config.similar_settings();

            let spinner = spinner(format!("Fetching recommendations similar to '{title}'..."));
            let result = anirec::recommend::similar::recommend_similar(
                catalog.as_ref(),
                &title,
                top_n,
                &settings,
            )
            .await;
            spinner.finish_and_clear();

            match result {
                Ok(recommendations) => terminal::display_similar(&title, &recommendations),
                Err(e) => terminal::display_recommend_error(&e),
            }
        }

        Commands::Genre { name, count, page } => {
            let catalog = create_catalog(backend, &config)?;
            let browser = GenreBrowser::new(catalog.as_ref());

            let spinner = spinner(format!("Fetching recommendations for '{name}'..."));
            let result = browser.recommend_by_genre(&name, count, page).await;
            spinner.finish_and_clear();

            match result {
                Ok(genre_page) => terminal::display_genre_page(&genre_page),
                Err(e) => {
                    terminal::display_recommend_error(&e);
                    let featured = browser.featured_genres().await;
                    if !featured.is_empty() {
                        println!("  Try one of: {}", featured.join(", ").dimmed());
                    }
                }
            }
        }

        Commands::Genres => {
            let catalog = create_catalog(backend, &config)?;
            let browser = GenreBrowser::new(catalog.as_ref());

            let spinner = spinner("Loading genres...".to_string());
            let all = browser.available_genres().await;
            let featured = browser.featured_genres().await;
            spinner.finish_and_clear();

            terminal::display_genres(&featured, &all);
        }

        Commands::Offline { title, count } => {
            let catalog = StaticCatalog::embedded()?;
            match anirec::recommend::offline::recommend_offline(
                catalog.similarity(),
                &title,
                count,
            ) {
                Ok(similar) => terminal::display_offline(&title, &similar),
                Err(e) => {
                    terminal::display_recommend_error(&e);
                    let titles: Vec<&str> = catalog
                        .records()
                        .iter()
                        .filter_map(|r| r.title.as_deref())
                        .collect();
                    println!(
                        "  Built-in titles ({}): {}",
                        catalog.similarity().title_count(),
                        titles.join(", ").dimmed()
                    );
                }
            }
        }
    }

    Ok(())
}

/// Create the catalog for the chosen backend.
fn create_catalog(backend: CatalogBackend, config: &Config) -> Result<Box<dyn CatalogSource>> {
    let catalog: Box<dyn CatalogSource> = match backend {
        CatalogBackend::Jikan => {
            let client = JikanClient::new(&config.jikan_api_url, config.request_delay)?;
            info!(url = client.base_url(), "Using Jikan API");
            Box::new(client)
        }
        CatalogBackend::Static => Box::new(StaticCatalog::embedded()?),
    };
    info!(source = catalog.name(), "Using catalog");
    Ok(catalog)
}

/// A spinner shown while catalog calls are in flight.
fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
