use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use user_search::{
    config::Config,
    indexing::{IndexPipeline, JsonLinesRecordSource, PipelineError},
    search::{ensure_user_index, ElasticsearchClient, SearchHit, UserSearchService},
    AppError,
};

#[derive(Parser)]
#[command(name = "user-search")]
#[command(about = "Reindex users into Elasticsearch and query them", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file layered over the built-in defaults
    #[arg(short, long, env = "USER_SEARCH_CONFIG")]
    config: Option<String>,

    /// Print Prometheus metrics after the command finishes
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the user index with its mapping if it does not exist
    EnsureIndex,

    /// Reindex every user from a JSON Lines file
    Reindex {
        /// File with one user object per line
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Bootstrap the index before indexing
        #[arg(long)]
        ensure_index: bool,
    },

    /// Typeahead lookup
    Search {
        #[arg(value_name = "QUERY")]
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Full results-page lookup
    Find {
        #[arg(value_name = "QUERY")]
        query: String,

        /// Results per page
        #[arg(short = 'p', long)]
        per_page: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    user_search::telemetry::init_tracing(&config.observability);

    if config.observability.prometheus_enabled {
        user_search::metrics::init_metrics();
    }

    let outcome = run(cli.command, &config).await;
    print_metrics(cli.metrics, &config);

    if let Err(e) = outcome {
        tracing::error!(code = e.error_code(), error = %e, "Command failed");
        if let AppError::Pipeline(ref failure) = e {
            if let Some(batch) = failure.batch() {
                tracing::error!(batch, "Index users failed; re-run reindex once the cause is fixed");
            }
        }
        return Err(e.into());
    }

    Ok(())
}

async fn run(command: Commands, config: &Config) -> user_search::Result<()> {
    let client = Arc::new(ElasticsearchClient::new(&config.elasticsearch)?);
    let index = config.elasticsearch.index_user.clone();

    match command {
        Commands::EnsureIndex => {
            if ensure_user_index(client.as_ref(), &index).await? {
                tracing::info!(index = %index, "Index created");
            } else {
                tracing::info!(index = %index, "Index already present");
            }
        }

        Commands::Reindex {
            input,
            ensure_index,
        } => {
            if ensure_index {
                ensure_user_index(client.as_ref(), &index).await?;
            }

            let source = JsonLinesRecordSource::open(&input)
                .await
                .map_err(|e| PipelineError::Source {
                    offset: 0,
                    message: format!("{}: {}", input.display(), e),
                })?;
            let pipeline = IndexPipeline::new(client.clone(), config.indexing.clone())?;

            let start = Instant::now();
            let indexed = pipeline.run(&source, &index).await?;
            tracing::info!(
                indexed,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "End index users"
            );
        }

        Commands::Search { query, limit } => {
            let service = UserSearchService::new(client.clone(), &index, config.search.clone());
            print_hits(&service.search_users(&query, limit).await)?;
        }

        Commands::Find { query, per_page } => {
            let service = UserSearchService::new(client.clone(), &index, config.search.clone());
            print_hits(&service.search_users_paginated(&query, per_page).await)?;
        }
    }

    Ok(())
}

fn print_hits(hits: &[SearchHit]) -> user_search::Result<()> {
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "data": hits }))?);
    Ok(())
}

fn print_metrics(requested: bool, config: &Config) {
    if requested && config.observability.prometheus_enabled {
        print!("{}", user_search::metrics::gather_metrics());
    }
}
