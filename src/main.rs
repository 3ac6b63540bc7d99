use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use assessment_recommender::crawlers::HttpPageFetcher;
use assessment_recommender::domain::assessment::QueryRequest;
use assessment_recommender::models::config::ServerConfig;
use assessment_recommender::processing::embedding::{Embedder, FastTextEmbedder, SentenceModel};
use assessment_recommender::processing::evaluation::{LabeledQuery, evaluate};
use assessment_recommender::processing::ingest::ingest_file;
use assessment_recommender::processing::insight::{GeminiClient, TextGenerator};
use assessment_recommender::processing::recommender::Recommender;
use assessment_recommender::processing::retriever::CatalogIndex;
use assessment_recommender::repository::{CatalogReader, DieselRepository, establish_connection_pool};
use assessment_recommender::server::{self, AppState};

#[derive(Parser, Debug)]
#[command(
    name = "assessment-recommender",
    about = "Semantic recommendations of assessment products for job descriptions"
)]
struct Cli {
    /// YAML configuration file; defaults to ./config.yaml when present.
    #[arg(long, env = "RECOMMENDER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API.
    Serve,
    /// Rebuild the catalog store from a JSON list of assessments.
    Ingest {
        /// Catalog JSON produced by the scraper.
        path: PathBuf,
    },
    /// Run a single query and print the JSON response.
    Recommend {
        /// Free-text query or job posting URL.
        text: String,
        /// Skip AI-generated insights.
        #[arg(long)]
        no_ai: bool,
    },
    /// Compute Mean Recall@K over a labeled query set.
    Evaluate {
        /// JSON list of `{query, relevant_urls}` objects.
        path: PathBuf,
        /// Cut-offs to evaluate.
        #[arg(short, long, default_values_t = vec![5, 10])]
        k: Vec<usize>,
    },
}

fn open_repository(config: &ServerConfig) -> Result<DieselRepository> {
    let pool = establish_connection_pool(&config.database_url)
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    DieselRepository::new(pool).context("failed to prepare catalog table")
}

fn load_embedder(config: &ServerConfig) -> Result<Arc<dyn Embedder>> {
    let model: SentenceModel = config.embedding_model.parse()?;
    let embedder = FastTextEmbedder::new(model).context("failed to load embedding model")?;
    Ok(Arc::new(embedder))
}

/// Gemini client when an API key is configured. Initialization failures
/// disable insights instead of aborting startup.
fn load_generator(config: &ServerConfig) -> Option<Arc<dyn TextGenerator>> {
    let Some(api_key) = config.gemini_api_key.clone() else {
        log::warn!("No Gemini API key configured; AI insights are disabled");
        return None;
    };
    match GeminiClient::new(
        api_key,
        &config.gemini_base_url,
        &config.gemini_model,
        config.generation_timeout(),
    ) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            log::warn!("Gemini initialization failed: {e}");
            None
        }
    }
}

fn build_recommender(config: &ServerConfig, repo: &DieselRepository) -> Result<Recommender> {
    let catalog = CatalogIndex::load(repo).context("failed to load catalog")?;
    if catalog.is_empty() {
        log::warn!("Catalog store is empty; run the ingest command before querying");
    } else {
        log::info!("Loaded {} assessments", catalog.len());
    }

    let embedder = load_embedder(config)?;
    catalog.ensure_compatible(embedder.as_ref())?;

    let fetcher = HttpPageFetcher::new(config.fetch_timeout())?;
    Ok(Recommender::new(
        Arc::new(catalog),
        embedder,
        Arc::new(fetcher),
        load_generator(config),
    )
    .with_candidate_count(config.candidate_count))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let repo = open_repository(&config)?;

    match cli.command {
        Command::Serve => {
            let recommender = build_recommender(&config, &repo)?;
            let state = AppState {
                recommender: Arc::new(recommender),
                ingested_at: repo.last_ingested_at()?,
            };
            server::serve(state, &config.bind_address)
                .await
                .with_context(|| format!("server on {} failed", config.bind_address))?;
        }
        Command::Ingest { path } => {
            let embedder = load_embedder(&config)?;
            let stats = ingest_file(&path, embedder.as_ref(), &repo)
                .with_context(|| format!("failed to ingest {}", path.display()))?;
            println!(
                "Stored {} assessments ({} skipped)",
                stats.accepted,
                stats.skipped_invalid + stats.skipped_incomplete
            );
        }
        Command::Recommend { text, no_ai } => {
            let recommender = build_recommender(&config, &repo)?;
            let response = recommender
                .recommend(&QueryRequest { text, use_ai: !no_ai })
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Evaluate { path, k } => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let queries: Vec<LabeledQuery> =
                serde_json::from_str(&raw).context("labeled queries must be a JSON list")?;
            let catalog = CatalogIndex::load(&repo).context("failed to load catalog")?;
            let embedder = load_embedder(&config)?;
            catalog.ensure_compatible(embedder.as_ref())?;

            for cutoff in k {
                let report = evaluate(embedder.as_ref(), &catalog, &queries, cutoff)?;
                log::info!(
                    "Mean Recall@{cutoff} = {:.4} over {} queries",
                    report.mean_recall,
                    report.total_queries
                );
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
    }

    Ok(())
}
