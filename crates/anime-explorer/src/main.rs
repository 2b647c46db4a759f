//! anime-explorer CLI application.

use anime_explorer::{
    AnimeStatus, AnimeType, Controller, JikanClient, Outcome, RenderTarget, SearchCriteria,
    SortKey, TerminalRenderer, Transport,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::{Config, ConfigSource, LogConfig};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse the Jikan anime catalogue", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one page of search results
    Search {
        #[command(flatten)]
        filters: FilterArgs,

        /// Page to show
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Show the full details of one anime
    Detail {
        /// MyAnimeList ID
        mal_id: u32,
    },

    /// Page through results interactively
    Browse {
        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Search term
    #[arg(short, long, default_value = "")]
    query: String,

    /// Only this type
    #[arg(long = "type", value_enum)]
    anime_type: Option<AnimeType>,

    /// Only this airing status
    #[arg(long, value_enum)]
    status: Option<AnimeStatus>,

    /// Order by this field, descending
    #[arg(long, value_enum)]
    sort: Option<SortKey>,
}

impl From<FilterArgs> for SearchCriteria {
    fn from(args: FilterArgs) -> Self {
        Self {
            search_term: args.query,
            anime_type: args.anime_type,
            status: args.status,
            sort: args.sort,
        }
    }
}

/// A line typed at the browse prompt
#[derive(Debug, PartialEq, Eq)]
enum BrowseCommand {
    Next,
    Previous,
    Page(u32),
    Detail(u32),
    Search(String),
    Help,
    Quit,
}

impl BrowseCommand {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word {
            "n" | "next" => Some(Self::Next),
            "p" | "prev" | "previous" => Some(Self::Previous),
            "d" | "detail" => rest.parse().ok().map(Self::Detail),
            "s" | "search" => Some(Self::Search(rest.to_string())),
            "h" | "help" | "?" => Some(Self::Help),
            "q" | "quit" | "exit" => Some(Self::Quit),
            page => page.parse().ok().filter(|p| *p > 0).map(Self::Page),
        }
    }
}

const BROWSE_HELP: &str = "n: next page, p: previous page, <number>: go to page, \
d <id>: details, s <term>: new search, q: quit";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Load configuration
    let (config, config_source) = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let mut log_config = LogConfig::from_settings(&config.logging, "anime-explorer");
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    shared::logging::init(log_config)?;

    match config_source {
        ConfigSource::File => {
            info!(config_file = %args.config.display(), "Configuration loaded successfully");
        }
        ConfigSource::Defaults => {
            warn!(config_file = %args.config.display(), "Config file not found, using defaults");
        }
    }
    info!("anime-explorer starting");

    // Initialize API client
    let client = JikanClient::from_config(&config.api).context("Failed to create Jikan client")?;
    let controller = Controller::new(client, TerminalRenderer::stdout());

    let outcome = match args.command {
        Command::Search { filters, page } => controller.search_at(filters.into(), page).await,
        Command::Detail { mal_id } => controller.show_detail(mal_id).await,
        Command::Browse { filters } => browse(&controller, filters.into()).await?,
    };

    debug!(outcome = ?outcome, "anime-explorer finished");
    Ok(match outcome {
        Outcome::Failed => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

/// Interactive loop over stdin; returns the outcome of the last action
async fn browse<T, R>(controller: &Controller<T, R>, criteria: SearchCriteria) -> Result<Outcome>
where
    T: Transport,
    R: RenderTarget,
{
    let mut outcome = controller.search(criteria).await;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt(controller)?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let Some(command) = BrowseCommand::parse(&line) else {
            println!("Unknown command. {}", BROWSE_HELP);
            continue;
        };

        outcome = match command {
            BrowseCommand::Next => controller.next_page().await,
            BrowseCommand::Previous => controller.previous_page().await,
            BrowseCommand::Page(page) => controller.go_to_page(page).await,
            BrowseCommand::Detail(mal_id) => controller.show_detail(mal_id).await,
            BrowseCommand::Search(term) => {
                let criteria = SearchCriteria {
                    search_term: term,
                    ..controller.query().criteria
                };
                controller.search(criteria).await
            }
            BrowseCommand::Help => {
                println!("{}", BROWSE_HELP);
                continue;
            }
            BrowseCommand::Quit => break,
        };

        if outcome == Outcome::Skipped {
            println!("Nothing to load.");
        }
    }

    Ok(outcome)
}

fn prompt<T: Transport, R: RenderTarget>(controller: &Controller<T, R>) -> Result<()> {
    let pagination = controller.pagination();
    print!(
        "[page {}/{}] > ",
        pagination.current_page(),
        pagination.last_page()
    );
    std::io::stdout().flush().context("Failed to write prompt")
}
