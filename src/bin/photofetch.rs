//! photofetch CLI: fetch every photo, retrying failures, then print them.

use clap::{Parser, Subcommand};
use photofetch::config::Config;
use photofetch::decode::{Decoder, JsonDecoder};
use photofetch::engine::{Engine, worker};
use photofetch::fetch::HttpFetcher;
use photofetch::model::photo::Photo;
use photofetch::model::{Item, ItemId, Outcome, sequential_ids};
use photofetch::report;
use photofetch::telemetry::{TelemetryConfig, init_telemetry};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photofetch", about = "Concurrent photo fetcher with bounded retries")]
struct Cli {
    /// TOML config file (defaults to FETCH_* environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Endpoint prefix; ids are appended as a path segment
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Per-attempt deadline in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch ids 1..=total and print the stored photos
    Run {
        /// Number of sequential ids to fetch
        #[arg(long)]
        total: Option<u64>,
        /// Retries allowed per id after its first failure
        #[arg(long)]
        retry_limit: Option<u32>,
        /// Maximum attempts in flight at once
        #[arg(long)]
        concurrency: Option<usize>,
        /// Print stats and photos as JSON
        #[arg(long)]
        json: bool,
    },
    /// Make a single attempt for one id and print the decoded photo
    Fetch {
        /// Photo id
        id: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => Config::from_toml_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(ms) = cli.timeout_ms {
        anyhow::ensure!(ms > 0, "--timeout-ms must be positive");
        config.attempt_timeout = std::time::Duration::from_millis(ms);
    }

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "photofetch".to_string(),
        default_filter: config.log_level.clone(),
    })?;

    match cli.command {
        Command::Run {
            total,
            retry_limit,
            concurrency,
            json,
        } => {
            if let Some(total) = total {
                config.total = total;
            }
            if let Some(limit) = retry_limit {
                config.retry_limit = limit;
            }
            if let Some(n) = concurrency {
                anyhow::ensure!(n > 0, "--concurrency must be at least 1");
                config.concurrency = n;
            }
            cmd_run(config, json).await
        }
        Command::Fetch { id } => cmd_fetch(config, ItemId(id)).await,
    }
}

fn http_fetcher(config: &mut Config) -> anyhow::Result<HttpFetcher> {
    let fetcher = HttpFetcher::new(&config.base_url)?;
    Ok(match config.api_token.take() {
        Some(token) => fetcher.with_api_token(token),
        None => fetcher,
    })
}

async fn cmd_run(mut config: Config, json: bool) -> anyhow::Result<()> {
    let engine = Engine::new(
        http_fetcher(&mut config)?,
        JsonDecoder::<Photo>::new(),
        config.engine_config(),
    );

    let output = engine.run(sequential_ids(config.total)).await?;

    let mut stdout = std::io::stdout().lock();
    if json {
        report::write_json(&mut stdout, &output.store, &output.stats)?;
    } else {
        report::write_photos(&mut stdout, &output.store, output.stats.elapsed)?;
    }
    Ok(())
}

async fn cmd_fetch(mut config: Config, id: ItemId) -> anyhow::Result<()> {
    let fetcher = http_fetcher(&mut config)?;

    match worker::attempt(&fetcher, Item::new(id), config.attempt_timeout).await {
        Outcome::Success(success) => {
            let photo = JsonDecoder::<Photo>::new().decode(&success.payload)?;
            println!("{}", serde_json::to_string_pretty(&photo)?);
            println!("Latency: {}ms", success.latency.as_millis());
            Ok(())
        }
        Outcome::Failure(_) => anyhow::bail!("fetching {id} failed (LOG_LEVEL=debug shows why)"),
    }
}
