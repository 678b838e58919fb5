//! Logo Review CLI - find visually similar logos and annotate them in bulk.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use logo_review_core::{from_query_string, SearchParams, DEFAULT_COUNT};
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;
use utils::ApiOptions;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Invalid search parameters
  69  Robotoff unavailable or request rejected
  78  Invalid configuration";

#[derive(Parser)]
#[command(name = "logo-review")]
#[command(author, version, about = "Search visually similar logos and annotate them in bulk", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Use an in-memory logo catalog instead of Robotoff (for testing)
    #[arg(long, global = true)]
    mock: bool,

    /// Robotoff API root (overrides ROBOTOFF_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    robotoff_url: Option<String>,

    /// Accept plain-HTTP endpoints
    #[arg(long, global = true)]
    allow_http: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Print results only
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Search parameters, given field by field or as a shared link.
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Reference logo id
    #[arg(long, value_name = "ID")]
    logo_id: Option<String>,

    /// Embedding index to query
    #[arg(long, value_name = "NAME")]
    index: Option<String>,

    /// Number of neighbors to fetch [default: 50]
    #[arg(long)]
    count: Option<u32>,

    /// Query string of a shared review link (e.g. "logo_id=42&count=100")
    #[arg(long, value_name = "QUERY", conflicts_with_all = ["logo_id", "index", "count"])]
    link: Option<String>,
}

impl SearchArgs {
    pub fn params(&self) -> SearchParams {
        match &self.link {
            Some(query) => from_query_string(&SearchParams::default(), query),
            None => SearchParams {
                logo_id: self.logo_id.clone(),
                index: self.index.clone(),
                count: self.count.unwrap_or(DEFAULT_COUNT),
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the logos closest to a reference logo
    Search {
        #[command(flatten)]
        search: SearchArgs,

        /// Widen the search this many times by 50 results
        #[arg(long, default_value_t = 0, value_name = "TIMES")]
        more: u32,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Annotate the reference logo and chosen neighbors in one batch
    Annotate {
        #[command(flatten)]
        search: SearchArgs,

        /// Widen the search this many times by 50 results before selecting
        #[arg(long, default_value_t = 0, value_name = "TIMES")]
        more: u32,

        /// Annotation type (defaults to the reference logo's)
        #[arg(long = "type", value_name = "TYPE")]
        annotation_type: Option<String>,

        /// Annotation value (defaults to the reference logo's)
        #[arg(long, value_name = "VALUE")]
        value: Option<String>,

        /// Neighbor ids to select besides the reference logo
        #[arg(long, value_delimiter = ',', num_args = 1.., value_name = "IDS")]
        select: Vec<u64>,

        /// Select every loaded logo
        #[arg(long, conflicts_with = "select")]
        all: bool,

        /// Log the batch instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Convert between search parameters and review link query strings
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },
}

#[derive(Subcommand)]
enum LinkAction {
    /// Print the query string for the given search
    Encode {
        #[command(flatten)]
        search: SearchArgs,
    },

    /// Print the search parameters a query string stands for
    Decode {
        /// Query string, with or without the leading '?'
        #[arg(value_name = "QUERY")]
        query: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let api = ApiOptions {
        mock: cli.mock,
        robotoff_url: cli.robotoff_url,
        allow_http: cli.allow_http,
    };

    let result = match cli.command {
        Commands::Search {
            search,
            more,
            format,
        } => commands::search::execute(&api, search.params(), more, format, cli.quiet).await,
        Commands::Annotate {
            search,
            more,
            annotation_type,
            value,
            select,
            all,
            dry_run,
        } => {
            let request = commands::annotate::AnnotateRequest {
                params: search.params(),
                more,
                annotation_type,
                value,
                select,
                all,
                dry_run,
            };
            commands::annotate::execute(&api, request, cli.quiet).await
        }
        Commands::Link { action } => match action {
            LinkAction::Encode { search } => commands::link::encode(&search.params()),
            LinkAction::Decode { query, format } => commands::link::decode(&query, format),
        },
    };

    let exit = match result {
        Ok(()) => ExitCode::success(),
        Err(err) => {
            let exit = ExitCode::from_anyhow(&err);
            if let Some(message) = &exit.message {
                eprintln!("{} {}", "Error:".red().bold(), message);
            }
            exit
        }
    };
    exit.into()
}
