mod commands;
mod config;
mod diagnostics;
mod entity;
mod error;
mod feed;
mod freshness;
mod listing;
mod resolver;
mod roads;
mod slug;
mod types;

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::types::{Category, Origin};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "warn,cityslug=info";

/// Default number of items per category for `list`.
const DEFAULT_LIST_LIMIT: usize = 5;

#[derive(Parser)]
#[command(name = "cityslug", about = "Deep-link slugs for map-anchored disruptions, events and inspectors")]
struct Cli {
    /// Command to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List linkable items near the origin
    List {
        /// Only this category (all four when omitted)
        category: Option<Category>,
        /// Print the items as JSON
        #[arg(long)]
        json: bool,
        /// Items per category
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
        /// Search origin
        #[command(flatten)]
        origin: OriginArgs,
    },
    /// Resolve a detail-page slug to its feed entity
    Resolve {
        /// Detail-page category (route prefix)
        category: Category,
        /// Slug from the detail-page URL
        slug: String,
        /// Print the entity as JSON
        #[arg(long)]
        json: bool,
        /// Search origin
        #[command(flatten)]
        origin: OriginArgs,
    },
    /// Parse a road description and print its roads in display order
    Roads {
        /// Free-text road description, e.g. "[A302] Kennington Park Road (SE11)"
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },
    /// Build the detail-page slug for a name and feed id
    Slug {
        /// Detail-page category (route prefix)
        category: Category,
        /// Display name
        name: String,
        /// Feed id, kept verbatim
        id: String,
    },
}

/// `--lat`/`--lon` pair overriding the configured origin.
#[derive(Args)]
struct OriginArgs {
    /// Origin latitude
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,
    /// Origin longitude
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,
}

impl OriginArgs {
    /// The origin, when both coordinates were given.
    fn origin(&self) -> Option<Origin> {
        return Some(Origin {
            lat: self.lat?,
            lon: self.lon?,
        });
    }
}

/// Send `tracing` output to stderr, filtered by `RUST_LOG`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| return EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List {
            category,
            json,
            limit,
            origin,
        } => commands::list(category, limit, origin.origin(), json).await,
        Commands::Resolve {
            category,
            json,
            origin,
            slug,
        } => commands::resolve(category, &slug, origin.origin(), json)
            .await
            .map(|()| return ExitCode::SUCCESS),
        Commands::Roads { description } => {
            commands::roads(&description.join(" "));
            Ok(ExitCode::SUCCESS)
        },
        Commands::Slug { category, id, name } => {
            commands::slug(category, &name, &id);
            Ok(ExitCode::SUCCESS)
        },
    };

    return match result {
        Err(e) => {
            diagnostics::print_error(&e);
            diagnostics::exit_code(&e)
        },
        Ok(code) => code,
    };
}
