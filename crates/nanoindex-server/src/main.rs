use clap::Parser;
use nanoindex_core::{AgentAlgorithm, NanoIndexConfig};
use nanoindex_server::{router, AppState};
use nanoindex_service::SearchService;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// NanoIndex server — thin HTTP transport over `SearchService` (spec.md §6).
#[derive(Parser, Debug)]
#[command(name = "nanoindex-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Root directory for persistence (spec.md §6 `data_dir`).
    #[arg(long, default_value = "./data", env = "NANOINDEX_DATA_DIR")]
    data_dir: String,

    /// Vector dimension. Required at store creation; validated on reopen.
    #[arg(long, env = "NANOINDEX_DIM")]
    dim: usize,

    /// Initial row capacity.
    #[arg(long, default_value_t = 1024)]
    initial_capacity: usize,

    /// Bandit algorithm.
    #[arg(long, value_enum, default_value = "epsilon-greedy")]
    agent_algorithm: AgentAlgorithmArg,

    /// Epsilon for epsilon-greedy selection.
    #[arg(long, default_value_t = 0.1)]
    agent_epsilon: f64,

    /// Checkpoint the agent's statistics every N updates.
    #[arg(long, default_value_t = 10)]
    checkpoint_every: u64,

    /// Host address to bind to.
    #[arg(long, default_value = "0.0.0.0", env = "NANOINDEX_HOST")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = 8080, env = "NANOINDEX_PORT")]
    port: u16,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum AgentAlgorithmArg {
    EpsilonGreedy,
    Ucb1,
}

impl From<AgentAlgorithmArg> for AgentAlgorithm {
    fn from(v: AgentAlgorithmArg) -> Self {
        match v {
            AgentAlgorithmArg::EpsilonGreedy => AgentAlgorithm::EpsilonGreedy,
            AgentAlgorithmArg::Ucb1 => AgentAlgorithm::Ucb1,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = NanoIndexConfig::new(args.data_dir.clone(), args.dim);
    config.initial_capacity = args.initial_capacity;
    config.agent_algorithm = args.agent_algorithm.into();
    config.agent_epsilon = args.agent_epsilon;
    config.checkpoint_every = args.checkpoint_every;

    tracing::info!(data_dir = %args.data_dir, dim = args.dim, "opening NanoIndex store");
    let service = SearchService::open(config)?;
    let state = Arc::new(AppState { service });

    let app = router(state);
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "nanoindex-server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
