use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use data_loader::DataIndex;
use predictor::LatentFactorModel;
use server::{Recommendation, RecommendationService, RecommenderConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// seed-recs - recommendations from three seed movies
#[derive(Parser)]
#[command(name = "seed-recs")]
#[command(about = "Content and collaborative recommendations from three seed movies", long_about = None)]
struct Cli {
    /// Directory with movies.csv, ratings.csv and optionally imdb_data.csv
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Pretrained rating model artifact (JSON)
    #[arg(short, long, default_value = "data/model.json")]
    model: PathBuf,

    /// Optional recommender config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend movies with similar cast, keywords, director and genres
    Content {
        /// Seed movie title (exactly three)
        #[arg(long, required = true)]
        seeds: Vec<String>,

        /// Number of recommendations to return
        #[arg(long, default_value = "10")]
        top_n: usize,

        /// Show score and reason for each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Recommend movies liked by users with similar taste
    Collab {
        /// Seed movie title (exactly three)
        #[arg(long, required = true)]
        seeds: Vec<String>,

        /// Number of recommendations to return
        #[arg(long, default_value = "10")]
        top_n: usize,

        /// Show score and reason for each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Search for movies by title
    Search {
        /// Movie title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,

        /// Maximum number of results
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Strategy to benchmark
        #[arg(long, value_enum, default_value = "content")]
        strategy: Strategy,

        /// Number of recommendations per request
        #[arg(long, default_value = "10")]
        top_n: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    Content,
    Collab,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let service = load_service(&cli)?;

    match cli.command {
        Commands::Content {
            seeds,
            top_n,
            explain,
        } => handle_recommend(&service, Strategy::Content, seeds, top_n, explain)?,
        Commands::Collab {
            seeds,
            top_n,
            explain,
        } => handle_recommend(&service, Strategy::Collab, seeds, top_n, explain)?,
        Commands::Search { title, limit } => handle_search(&service, &title, limit),
        Commands::Benchmark {
            requests,
            strategy,
            top_n,
        } => handle_benchmark(service, requests, strategy, top_n).await?,
    }

    Ok(())
}

/// Load the dataset, the rating model and the config, and build the service
fn load_service(cli: &Cli) -> Result<RecommendationService> {
    let config = match &cli.config {
        Some(path) => RecommenderConfig::from_file(path)?,
        None => RecommenderConfig::default(),
    };

    println!("Loading dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let index = DataIndex::load_from_files(&cli.data_dir).context("Failed to load dataset")?;
    let (items, users, ratings) = index.counts();
    println!(
        "{} Loaded {} items, {} users, {} ratings in {:?}",
        "✓".green(),
        items,
        users,
        ratings,
        start.elapsed()
    );

    let model = LatentFactorModel::load(&cli.model).context("Failed to load rating model")?;
    info!("Loaded rating model from {}", cli.model.display());

    let start = Instant::now();
    let (catalog, ratings) = index.into_stores();
    let service = RecommendationService::new(
        Arc::new(catalog),
        Arc::new(ratings),
        Arc::new(model),
        config,
    )?;
    println!("{} Built recommender in {:?}", "✓".green(), start.elapsed());
    Ok(service)
}

fn parse_seeds(seeds: Vec<String>) -> Result<[String; 3]> {
    let count = seeds.len();
    seeds
        .try_into()
        .map_err(|_| anyhow!("Expected exactly 3 --seeds, got {}", count))
}

/// Handle the 'content' and 'collab' commands
fn handle_recommend(
    service: &RecommendationService,
    strategy: Strategy,
    seeds: Vec<String>,
    top_n: usize,
    explain: bool,
) -> Result<()> {
    let seeds = parse_seeds(seeds)?;
    let recommendations = match strategy {
        Strategy::Content => service.recommend_content_detailed(&seeds, top_n)?,
        Strategy::Collab => service.recommend_collaborative_detailed(&seeds, top_n)?,
    };

    if recommendations.is_empty() {
        println!("{}", "No recommendations found for these seeds.".yellow());
        return Ok(());
    }
    print_recommendations(&recommendations, explain);
    Ok(())
}

/// Handle the 'search' command
fn handle_search(service: &RecommendationService, title: &str, limit: usize) {
    let matches = service.search_titles(title, limit);
    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("  no matches");
        return;
    }
    for item in matches {
        let marker = if service.is_content_seed(item.id) {
            "".normal()
        } else {
            " (collaborative only)".dimmed()
        };
        println!(
            "{}: {} [{}]{}",
            item.id,
            item.title,
            item.genres.join(", "),
            marker
        );
    }
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    service: RecommendationService,
    requests: usize,
    strategy: Strategy,
    top_n: usize,
) -> Result<()> {
    let titles: Vec<String> = service
        .featured()
        .items()
        .iter()
        .map(|item| item.title.clone())
        .collect();
    if titles.is_empty() || requests == 0 {
        bail!("Nothing to benchmark");
    }

    // Random seed triples from the featured subset
    let seed_sets: Vec<[String; 3]> = (0..requests)
        .map(|_| {
            std::array::from_fn(|_| titles[rand::random_range(0..titles.len())].clone())
        })
        .collect();

    info!("Running {} benchmark requests, top {} each", requests, top_n);
    let start = Instant::now();
    let mut handles = vec![];
    for seeds in seed_sets {
        let service = service.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let count = match strategy {
                Strategy::Content => service.recommend_content(&seeds, top_n)?.len(),
                Strategy::Collab => service.recommend_collaborative(&seeds, top_n)?.len(),
            };
            Ok::<_, anyhow::Error>((start.elapsed(), count))
        });
        handles.push(handle);
    }

    let mut timings: Vec<Duration> = vec![];
    let mut empty = 0;
    for handle in handles {
        let (elapsed, count) = handle.await??;
        if count == 0 {
            empty += 1;
        }
        timings.push(elapsed);
    }
    let wall_time = start.elapsed();
    info!("Benchmark finished in {:?}", wall_time);

    timings.sort();
    let total: Duration = timings.iter().sum();
    let avg_latency = total / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} empty)", timings.len(), empty);
    println!("Wall time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!(
        "Throughput: {:.2} requests/second",
        timings.len() as f64 / wall_time.as_secs_f64()
    );

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(recommendations: &[Recommendation], explain: bool) {
    println!("{}", "Recommendations:".bold().blue());
    for (i, rec) in recommendations.iter().enumerate() {
        println!("{}. {}", (i + 1).to_string().green(), rec.title);
        if explain {
            println!(
                "   {:?} score {:.3}: {}",
                rec.source, rec.score, rec.explanation
            );
        }
    }
}
