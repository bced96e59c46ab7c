use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use newsquiz::config::Config;
use newsquiz::feed::{build_client, Aggregator, HttpTransport};
use newsquiz::pipeline::{self, LoadMode};
use newsquiz::quiz::{Question, QuizSession};
use newsquiz::relevance::Topic;
use newsquiz::storage::{Database, DatabaseError, FeedCache, MemoryCache};
use newsquiz::ui::{run_quiz, QuizRenderer, TerminalRenderer};

/// Get the config directory path (~/.config/newsquiz/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("newsquiz");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(name = "newsquiz", about = "Quiz yourself on the latest London and South-East news")]
struct Args {
    /// Topic: all, transport, health, crime, politics, business, culture, environment
    #[arg(long, value_name = "TOPIC")]
    topic: Option<String>,

    /// Config file (default ~/.config/newsquiz/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fetch feeds even if the cache is fresh
    #[arg(long)]
    refresh: bool,

    /// Keep the feed cache in memory only
    #[arg(long)]
    no_cache: bool,

    /// Empty the persistent feed cache before loading
    #[arg(long)]
    clear_cache: bool,

    /// Seed for question generation (same seed and items, same quiz)
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Print the quiz as JSON instead of starting the interactive quiz
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct JsonQuiz<'a> {
    topic: Topic,
    status: String,
    from_cache: bool,
    failed_sources: usize,
    total_sources: usize,
    questions: &'a [Question],
}

/// Opens the persistent cache, or an in-memory one with `--no-cache`.
async fn open_cache(args: &Args, config_dir: &std::path::Path) -> Result<Arc<dyn FeedCache>> {
    if args.no_cache {
        return Ok(Arc::new(MemoryCache::new()));
    }

    let db_path = config_dir.join("cache.db");
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of newsquiz appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    if args.clear_cache {
        let removed = db.clear_cache().await.context("Failed to clear cache")?;
        tracing::info!(removed, "Cleared feed cache");
        // stdout carries only the JSON document with --json
        if !args.json {
            println!("Cleared {} cached entries.", removed);
        }
    } else {
        match db.evict_expired().await {
            Ok(0) => {}
            Ok(n) => tracing::debug!(evicted = n, "Evicted expired cache entries"),
            Err(e) => tracing::warn!(error = %e, "Failed to evict expired cache entries"),
        }
    }

    Ok(Arc::new(db))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for --json
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Set up config directory
    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // SEC-007: Set directory permissions on Unix (user-only access)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let topic = args
        .topic
        .as_deref()
        .map(Topic::from_selector)
        .unwrap_or_else(|| config.topic());

    let sources = config.sources();
    if sources.is_empty() {
        anyhow::bail!("No usable feeds configured in {}", config_path.display());
    }

    let proxy = config.proxy().context("Invalid proxy configuration")?;
    let client = build_client(config.fetch_timeout()).context("Failed to build HTTP client")?;
    let transport = Arc::new(HttpTransport::new(client, proxy));
    let cache = open_cache(&args, &config_dir).await?;

    let aggregator = Aggregator::new(transport, cache, sources)
        .with_ttl(config.cache_ttl())
        .with_fetch_timeout(config.fetch_timeout())
        .with_max_concurrent(config.max_concurrent_fetches);

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mode = if args.refresh {
        LoadMode::Refresh
    } else {
        LoadMode::PreferCache
    };

    if !args.json {
        println!("Loading latest RSS items…");
    }
    let run = pipeline::run(&aggregator, topic, mode, Utc::now(), &mut rng).await;
    let status = run.status_line();

    if args.json {
        let output = JsonQuiz {
            topic,
            status,
            from_cache: run.feed.from_cache,
            failed_sources: run.feed.failed_sources,
            total_sources: run.feed.total_sources,
            questions: &run.quiz,
        };
        let json = serde_json::to_string_pretty(&output).context("Failed to serialize quiz")?;
        println!("{json}");
        return Ok(());
    }

    if run.quiz.is_empty() {
        println!("{status}");
        return Ok(());
    }

    let mut session = QuizSession::new(run.quiz);
    let score = {
        let mut renderer = TerminalRenderer::new()?;
        renderer.status(&status).await?;
        // Terminal restored when the renderer drops at the end of this block
        run_quiz(&mut session, &mut renderer).await?
    };

    println!("{status}");
    println!("Your score: {}/{}", score.correct, score.total);
    Ok(())
}
