use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "gts")]
#[command(about = "Gated trade simulator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a plan against a market path; persist the run, write artifacts
    Simulate {
        /// Initial state JSON (defaults to the stored current state, then config)
        #[arg(long)]
        state: Option<PathBuf>,

        /// Plan JSON: [{"type": "PlaceBuy", "symbol": "AAPL", "quantity": 1.0}, ...]
        #[arg(long)]
        plan: PathBuf,

        /// Market path fixture JSON
        #[arg(long)]
        path: PathBuf,

        /// Policy JSON (defaults to the stored "default" policy, then config limits)
        #[arg(long)]
        policy: Option<PathBuf>,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Data dir for state/run/policy stores (overrides storage.data_dir)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Root dir for per-run artifacts
        #[arg(long)]
        artifacts: Option<PathBuf>,

        /// Decision tape JSONL to append to
        #[arg(long)]
        tape: Option<PathBuf>,

        /// Planner name recorded as provenance
        #[arg(long)]
        planner: Option<String>,
    },

    /// Promote an approved run's final state to the current state
    Execute {
        #[arg(long)]
        data_dir: PathBuf,

        #[arg(long)]
        run_id: String,
    },

    /// Run tool requests through the budgeted tool loop
    Tools {
        /// Tool requests JSON: [{"name": "get_price_context", "args": {"step": 0}}, ...]
        #[arg(long)]
        requests: PathBuf,

        /// Market path fixture JSON
        #[arg(long)]
        path: PathBuf,

        /// Layered config paths in merge order (budget, memory, initial cash)
        #[arg(long = "config")]
        config_paths: Vec<String>,
    },

    /// Print a policy with version and hash filled in
    PolicyHash {
        path: PathBuf,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Verify a decision tape's hash chain
    TapeVerify {
        path: PathBuf,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    // Optional; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Simulate {
            state,
            plan,
            path,
            policy,
            config_paths,
            data_dir,
            artifacts,
            tape,
            planner,
        } => commands::simulate::run(commands::simulate::SimulateArgs {
            state,
            plan,
            path,
            policy,
            config_paths,
            data_dir,
            artifacts,
            tape,
            planner,
        }),

        Commands::Execute { data_dir, run_id } => commands::execute::run(&data_dir, &run_id),

        Commands::Tools {
            requests,
            path,
            config_paths,
        } => commands::tools::run(&requests, &path, &config_paths),

        Commands::PolicyHash { path } => commands::integrity::policy_hash(&path),

        Commands::ConfigHash { paths } => commands::integrity::config_hash(&paths),

        Commands::TapeVerify { path } => commands::integrity::tape_verify(&path),
    }
}
