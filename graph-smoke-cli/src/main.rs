mod config;

use clap::{Parser, ValueEnum};
use graph_smoke::{GraphDriver, Harness, MemoryDriver, Neo4jDriver, RunPlan, RunReport, WorkRange};
use tracing::{error, info};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Live server over Bolt, configured from `NEO4J_*` variables.
    Neo4j,
    /// In-process emulation; needs no server.
    Memory,
}

/// Populate a graph, build its cache, and tear it down again, timing each phase.
#[derive(Debug, Parser)]
#[command(name = "graph-smoke", version)]
struct Cli {
    #[arg(long, value_enum, default_value_t = Backend::Neo4j)]
    backend: Backend,

    /// First populate value (inclusive).
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    start: i64,

    /// Last populate value (exclusive).
    #[arg(long, default_value_t = 500, allow_negative_numbers = true)]
    end: i64,

    /// Value slots per populate call.
    #[arg(long, default_value_t = 1_000)]
    step: i64,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    calc_start: i64,

    #[arg(long, default_value_t = 80_000, allow_negative_numbers = true)]
    calc_end: i64,

    #[arg(long)]
    skip_indexes: bool,

    #[arg(long)]
    skip_populate: bool,

    #[arg(long)]
    skip_calculate: bool,

    #[arg(long)]
    skip_clean: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn plan(&self) -> RunPlan {
        RunPlan {
            populate_range: WorkRange::new(self.start, self.end),
            step: self.step,
            calculate_range: WorkRange::new(self.calc_start, self.calc_end),
            create_indexes: !self.skip_indexes,
            populate: !self.skip_populate,
            calculate: !self.skip_calculate,
            clean: !self.skip_clean,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // ── Tracing ───────────────────────────────────────────────────────────────
    init_tracing()?;

    let cli = Cli::parse();
    let plan = cli.plan();

    // ── Backend ───────────────────────────────────────────────────────────────
    let report = match cli.backend {
        Backend::Memory => {
            info!("using in-memory backend");
            run(MemoryDriver::new(), &plan).await?
        }
        Backend::Neo4j => {
            let config = Config::from_env().map_err(|e| {
                error!("Configuration error: {}", e);
                e
            })?;
            info!(uri = %config.uri, user = %config.user, "connecting to neo4j");

            let driver = Neo4jDriver::connect(&config.neo4j()).await.map_err(|e| {
                error!("Failed to establish connection: {}", e);
                e
            })?;
            run(driver, &plan).await?
        }
    };

    // ── Report ────────────────────────────────────────────────────────────────
    if cli.json {
        println!("{}", report.to_json()?);
    }

    info!("run finished");
    Ok(())
}

/// Execute `plan` and close the driver.
async fn run<D: GraphDriver>(driver: D, plan: &RunPlan) -> anyhow::Result<RunReport> {
    let harness = Harness::new(driver);
    let report = harness.run(plan).await.map_err(|e| {
        error!("Run aborted: {}", e);
        e
    })?;
    harness.driver().close().await?;
    Ok(report)
}

/// Human-readable logs on stderr; JSON lines when `LOG_FORMAT=json`.
fn init_tracing() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("graph_smoke=info".parse()?)
        .add_directive("graph_smoke_cli=info".parse()?);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
