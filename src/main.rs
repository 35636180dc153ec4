use anyhow::Result;
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use boxoffice::cli::collect::{self, CollectConfig};
use boxoffice::cli::rank::{self, OutputFormat, RankConfig};
use boxoffice::model::Dimension;
use boxoffice::util::env as env_util;

#[derive(Parser, Debug)]
#[command(name = "boxoffice", version, about = "Film financials pipeline and leaderboards")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Collect films released in a window, enrich them and write the table as JSON
    Collect {
        /// First release date (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last release date (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        /// Output file (stdout when absent)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Skip the ratings source
        #[arg(long, default_value_t = false)]
        no_ratings: bool,
    },
    /// Rank directors or actors from an enriched table
    Rank {
        /// Enriched table written by `collect`
        #[arg(long)]
        films: PathBuf,
        /// director or actor
        #[arg(long)]
        role: String,
        /// none, year or decade
        #[arg(long, default_value = "none")]
        by: Dimension,
        /// Keep the first N rows of each partition
        #[arg(long)]
        top: Option<usize>,
        /// csv or json
        #[arg(long, default_value = "csv")]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_util::init_env();
    boxoffice::tracing::init_tracing(boxoffice::tracing::filter_for_verbosity(cli.verbose))?;

    match cli.command {
        Commands::Collect {
            start,
            end,
            out,
            no_ratings,
        } => {
            collect::run(CollectConfig {
                start,
                end,
                out,
                no_ratings,
            })
            .await
        }
        Commands::Rank {
            films,
            role,
            by,
            top,
            format,
        } => {
            rank::run(RankConfig {
                films,
                role,
                by,
                top,
                format,
            })
            .await
        }
    }
}
