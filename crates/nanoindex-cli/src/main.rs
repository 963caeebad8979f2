//! Thin command-line runner over `SearchService` (spec.md §1: the CLI is a
//! collaborator, not specified here). It opens a store directly — no
//! network hop — and prints JSON to stdout, one call per invocation.

use clap::{Parser, Subcommand};
use nanoindex_core::NanoIndexConfig;
use nanoindex_service::SearchService;

#[derive(Parser)]
#[command(name = "nanoindex", author, version, about, long_about = None)]
struct Cli {
    /// Root directory for persistence (spec.md §6 `data_dir`).
    #[arg(long, default_value = "./data", global = true)]
    data_dir: String,

    /// Vector dimension. Required on first use of a fresh `data_dir`.
    #[arg(long, global = true)]
    dim: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append a batch of vectors with caller-supplied external ids.
    Add {
        /// Flat row-major list of floats, `ids.len() * dim` entries.
        #[arg(long, value_delimiter = ',')]
        vectors: Vec<f32>,
        /// External ids, one per vector.
        #[arg(long, value_delimiter = ',')]
        ids: Vec<i64>,
    },
    /// (Re)build the IVF index over every row currently in the store.
    Train {
        /// Number of clusters (centroids).
        n_cells: usize,
        /// K-means RNG seed, for reproducible training.
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Run a top-k nearest neighbor query.
    Search {
        #[arg(long, value_delimiter = ',')]
        vector: Vec<f32>,
        #[arg(long, default_value_t = 10)]
        top_k: usize,
        #[arg(long)]
        use_index: bool,
        #[arg(long)]
        use_agent: bool,
    },
    /// Clear the store and drop the IVF index.
    Reset,
    /// Print the adaptive agent's per-arm statistics.
    AgentStats,
    /// Zero the adaptive agent's statistics.
    AgentReset,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = NanoIndexConfig::new(cli.data_dir, cli.dim);
    let service = SearchService::open(config)?;

    match cli.command {
        Command::Add { vectors, ids } => {
            let outcome = service.add(&vectors, &ids)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Train { n_cells, seed } => {
            let outcome = service.train(n_cells, seed)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Search {
            vector,
            top_k,
            use_index,
            use_agent,
        } => {
            let outcome = service.search(&vector, top_k, use_index, use_agent)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Reset => {
            service.reset()?;
            println!("{{\"ok\":true}}");
        }
        Command::AgentStats => {
            let stats: Vec<_> = service
                .agent_stats()
                .into_iter()
                .map(|(name, s)| serde_json::json!({"arm": name, "pulls": s.pulls, "total_reward": s.total_reward, "avg_reward": s.avg_reward, "avg_latency_ms": s.avg_latency_ms}))
                .collect();
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::AgentReset => {
            service.agent_reset();
            println!("{{\"ok\":true}}");
        }
    }

    Ok(())
}
