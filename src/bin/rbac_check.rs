//! rbac-check
//!
//! Evaluates a request (or a bulk operation list) against a set of policies,
//! for policy authors checking what their statements actually do.

use anyhow::{bail, Context};
use clap::Parser;
use rbac_guard::{
    AuthorizationEngine, AuthorizationRequest, Decision, EngineConfig, InMemoryPolicyStore,
    Session,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "rbac-check")]
#[command(about = "Evaluate RBAC policies against an authorization request")]
struct Args {
    /// JSON file holding an array of policies (all attached globally)
    #[arg(short = 'p', long)]
    policies: PathBuf,

    /// JSON file holding the authorization request
    #[arg(short = 'r', long, required_unless_present = "bulk")]
    request: Option<PathBuf>,

    /// Engine configuration (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Comma-separated operation ids for a coarse bulk verdict
    #[arg(long, value_delimiter = ',', requires = "session")]
    bulk: Vec<String>,

    /// JSON file holding the session used for --bulk
    #[arg(long)]
    session: Option<PathBuf>,
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_engine(args: &Args) -> anyhow::Result<AuthorizationEngine<InMemoryPolicyStore>> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    debug!("Engine config: {:?}", config);

    let store = InMemoryPolicyStore::new();
    let count = store
        .load_json(&read_file(&args.policies)?)
        .with_context(|| format!("loading policies {}", args.policies.display()))?;
    info!("Loaded {} policies from {:?}", count, args.policies);

    Ok(AuthorizationEngine::with_config(store, config))
}

fn run_bulk(engine: &AuthorizationEngine<InMemoryPolicyStore>, args: &Args) -> anyhow::Result<()> {
    let Some(path) = &args.session else {
        bail!("--bulk requires --session");
    };
    let session: Session = serde_json::from_str(&read_file(path)?)
        .with_context(|| format!("parsing session {}", path.display()))?;

    for (operation_id, allowed) in engine.evaluate_permissions(&args.bulk, &session) {
        println!("{}\t{}", operation_id, if allowed { "ALLOWED" } else { "DENIED" });
    }
    Ok(())
}

fn run_check(
    engine: &AuthorizationEngine<InMemoryPolicyStore>,
    path: &Path,
) -> anyhow::Result<ExitCode> {
    let request: AuthorizationRequest = serde_json::from_str(&read_file(path)?)
        .with_context(|| format!("parsing request {}", path.display()))?;

    match engine.decide(&request) {
        Ok(Decision::Allowed) => {
            println!("ALLOWED");
            Ok(ExitCode::SUCCESS)
        }
        Ok(Decision::Bypassed(reason)) => {
            println!("BYPASSED ({})", reason);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_denial() => {
            println!("DENIED: {}", e);
            Ok(ExitCode::from(1))
        }
        Err(e) => Err(e).context("evaluating request"),
    }
}

fn run(args: &Args) -> anyhow::Result<ExitCode> {
    let engine = load_engine(args)?;

    if !args.bulk.is_empty() {
        run_bulk(&engine, args)?;
    }

    match &args.request {
        Some(path) => run_check(&engine, path),
        None => Ok(ExitCode::SUCCESS),
    }
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
