//! # gradlock-cli
//!
//! Command-line entry point: load the dependency graph documents and the
//! verification metadata, run the merge, write the lockfile JSON. The only
//! fatal condition is a hash conflict; every other anomaly is a warning and
//! the lockfile is best effort.

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use gradlock_cache::ComponentVerifier;
use gradlock_config::graph::load_dependency_graph;
use gradlock_config::verification::{read_verification_metadata, VerificationIndex};
use gradlock_config::DependencyGraph;
use gradlock_core::types::VersionCache;
use gradlock_registry::HttpClient;
use gradlock_resolver::{merge_graphs, MergeContext};

/// Build a content-addressed lockfile from a resolved Gradle dependency graph
#[derive(Parser)]
#[command(name = "gradlock", version)]
struct Cli {
    /// Path to the project root
    #[arg(short = 'd', long, value_name = "PROJECT-DIR", default_value = ".")]
    project_dir: PathBuf,

    /// Dependency graph document, one per constituent build
    /// (default: PROJECT-DIR/build/reports/dependency-graph/dependency-graph.json)
    #[arg(short, long = "graph", value_name = "FILE")]
    graphs: Vec<PathBuf>,

    /// Gradle user home containing the module cache
    #[arg(long, value_name = "DIR", env = "GRADLE_USER_HOME")]
    gradle_home: Option<PathBuf>,

    /// Local mirror URL prefix standing in for the network
    #[arg(long, value_name = "URL", env = "GRADLOCK_M2")]
    m2: Option<String>,

    /// Directory to write the lockfile to (default: PROJECT-DIR)
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Basename for the lockfile
    #[arg(short, long, value_name = "FILENAME", default_value = "gradle-lock")]
    env: String,

    /// Disable the network fetch-and-hash fallback
    #[arg(long)]
    offline: bool,

    /// Bound on concurrent network fetches
    #[arg(long, value_name = "N", default_value_t = 8)]
    fetch_concurrency: usize,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let runtime = tokio::runtime::Runtime::new().context("failed to create async runtime")?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let project_dir = &cli.project_dir;
    if !project_dir.is_dir() {
        bail!("project directory {} does not exist", project_dir.display());
    }

    let graph_paths = if cli.graphs.is_empty() {
        vec![project_dir.join("build/reports/dependency-graph/dependency-graph.json")]
    } else {
        cli.graphs.clone()
    };

    let mut graphs: Vec<DependencyGraph> = Vec::with_capacity(graph_paths.len());
    for path in &graph_paths {
        graphs.push(
            load_dependency_graph(path)
                .with_context(|| format!("loading dependency graph {}", path.display()))?,
        );
    }

    let metadata_path = project_dir.join("gradle/verification-metadata.xml");
    let versions = VersionCache::new();
    let index = match read_verification_metadata(&metadata_path) {
        Some(metadata) => VerificationIndex::from_metadata(&metadata, &versions),
        None => VerificationIndex::default(),
    };

    let gradle_home = cli
        .gradle_home
        .clone()
        .unwrap_or_else(default_gradle_home);
    let verifier = ComponentVerifier::new(&index, gradle_home, cli.m2.as_deref().map(m2_path));

    let client = if cli.offline {
        None
    } else {
        Some(HttpClient::new().context("failed to create HTTP client")?)
    };

    let mut ctx = MergeContext::new(&verifier, &versions);
    if let Some(client) = &client {
        ctx = ctx.with_client(client);
    }
    if let Some(m2) = &cli.m2 {
        ctx = ctx.with_m2_override(m2.clone());
    }
    ctx.fetch_concurrency = cli.fetch_concurrency;

    let lockfile = merge_graphs(&graphs, &ctx).await?;

    let out_dir = cli.out_dir.as_ref().unwrap_or(project_dir);
    let out_path = out_dir.join(format!("{}.json", cli.env));
    info!(
        "writing {} modules ({} files) to {}",
        lockfile.modules.len(),
        lockfile.file_count(),
        out_path.display()
    );

    let file = File::create(&out_path)
        .with_context(|| format!("creating {}", out_path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &lockfile)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    Ok(())
}

/// The local filesystem path behind an m2 mirror prefix.
fn m2_path(m2: &str) -> PathBuf {
    PathBuf::from(m2.strip_prefix("file://").unwrap_or(m2))
}

fn default_gradle_home() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| Path::new(&home).join(".gradle"))
        .unwrap_or_else(|| PathBuf::from(".gradle"))
}

fn setup_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
