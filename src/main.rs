//! Command line front end for the cover-free family search

use anyhow::{Context, Result};
use cff_sat::{
    cff::{CffParams, CoverFreeVerifier, Probe, SearchCursor, SearchDriver, SearchLimits},
    config::{CliOverrides, Settings},
    sat::{CadicalOracle, CffEncoder},
    store::{ResultStore, Status},
    utils::{ColorOutput, RecordFormatter},
};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cff_sat")]
#[command(about = "Search for d-cover-free families with a SAT solver")]
#[command(version = "0.1.0")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config/default.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides shared by the solving commands
#[derive(Args, Debug)]
struct SolveArgs {
    /// Result store path (overrides config)
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Per-attempt timeout in seconds (overrides config)
    #[arg(long)]
    timeout: Option<u64>,

    /// Verify SAT families before storing them
    #[arg(long)]
    verify: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the (t, n) lattice for a fixed d, caching every verdict
    FindAll {
        #[arg(short)]
        d: Option<usize>,

        #[arg(short)]
        t: Option<usize>,

        #[arg(short)]
        n: Option<usize>,

        /// Stop after this many probes
        #[arg(long)]
        max_probes: Option<usize>,

        /// Stop once t exceeds this value
        #[arg(long)]
        max_t: Option<usize>,

        /// Cursor file written after every step (overrides config)
        #[arg(long)]
        cursor: Option<PathBuf>,

        /// Start from the saved cursor instead of the configured point
        #[arg(long)]
        resume: bool,

        #[command(flatten)]
        solve: SolveArgs,
    },

    /// Answer a single (d, t, n) triple
    FindOne {
        #[arg(short)]
        d: usize,

        #[arg(short)]
        t: usize,

        #[arg(short)]
        n: usize,

        /// Print the incidence matrix of a SAT family
        #[arg(long)]
        matrix: bool,

        #[command(flatten)]
        solve: SolveArgs,
    },

    /// Answer a list of (t, n) pairs for one d
    Batch {
        #[arg(short)]
        d: usize,

        /// Pairs as "t:n,t:n,..."
        #[arg(short, long)]
        pairs: String,

        #[command(flatten)]
        solve: SolveArgs,
    },

    /// Re-check a stored SAT family with the brute-force verifier
    Verify {
        #[arg(short)]
        d: usize,

        #[arg(short)]
        t: usize,

        #[arg(short)]
        n: usize,

        /// Result store path (overrides config)
        #[arg(short, long)]
        store: Option<PathBuf>,
    },

    /// Print the largest SAT n per t as LaTeX table rows
    Table {
        #[arg(short)]
        d: usize,

        /// Also write the rows to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Result store path (overrides config)
        #[arg(short, long)]
        store: Option<PathBuf>,
    },

    /// Show the encoding size of a triple without solving it
    Analyze {
        #[arg(short)]
        d: usize,

        #[arg(short)]
        t: usize,

        #[arg(short)]
        n: usize,
    },

    /// Create a default configuration
    Setup {
        /// Directory to create files in
        #[arg(long, default_value = ".")]
        directory: PathBuf,

        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::FindAll {
            d,
            t,
            n,
            max_probes,
            max_t,
            cursor,
            resume,
            solve,
        } => {
            let settings = load_settings(&cli.config)?;
            let limits = SearchLimits { max_probes, max_t };
            find_all_command(settings, overrides(&solve, d, t, n), cursor, resume, limits)
        }
        Commands::FindOne { d, t, n, matrix, solve } => {
            let settings = load_settings(&cli.config)?;
            let params = CffParams::new(d, t, n);
            find_one_command(settings, overrides(&solve, None, None, None), params, matrix)
        }
        Commands::Batch { d, pairs, solve } => {
            let settings = load_settings(&cli.config)?;
            batch_command(settings, overrides(&solve, None, None, None), d, &pairs)
        }
        Commands::Verify { d, t, n, store } => {
            let settings = with_store(load_settings(&cli.config)?, store);
            verify_command(&settings, CffParams::new(d, t, n))
        }
        Commands::Table { d, output, store } => {
            let settings = with_store(load_settings(&cli.config)?, store);
            table_command(&settings, d, output)
        }
        Commands::Analyze { d, t, n } => {
            analyze_command(&load_settings(&cli.config)?, CffParams::new(d, t, n))
        }
        Commands::Setup { directory, force } => setup_command(directory, force),
    }
}

fn load_settings(config_path: &Path) -> Result<Settings> {
    if config_path.exists() {
        Settings::from_file(&config_path.to_path_buf())
            .with_context(|| format!("Failed to load config from {}", config_path.display()))
    } else {
        let message = format!(
            "Config file {} not found, using defaults",
            config_path.display()
        );
        println!("{}", ColorOutput::warning(&message));
        Ok(Settings::default())
    }
}

fn overrides(
    solve: &SolveArgs,
    d: Option<usize>,
    t: Option<usize>,
    n: Option<usize>,
) -> CliOverrides {
    CliOverrides {
        d,
        t,
        n,
        timeout_seconds: solve.timeout,
        store_path: solve.store.clone(),
        verify: solve.verify,
    }
}

fn with_store(mut settings: Settings, store: Option<PathBuf>) -> Settings {
    if let Some(path) = store {
        settings.store.path = path;
    }
    settings
}

fn driver(settings: &Settings) -> SearchDriver<CadicalOracle> {
    SearchDriver::from_settings(CadicalOracle::new(), settings)
}

/// Parse "t:n,t:n" into pairs
fn parse_pairs(pairs: &str) -> Result<Vec<(usize, usize)>> {
    pairs
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (t, n) = pair
                .split_once(':')
                .with_context(|| format!("Expected t:n, got '{}'", pair))?;
            let t = t.trim().parse().with_context(|| format!("Invalid t in '{}'", pair))?;
            let n = n.trim().parse().with_context(|| format!("Invalid n in '{}'", pair))?;
            Ok((t, n))
        })
        .collect()
}

fn find_all_command(
    mut settings: Settings,
    overrides: CliOverrides,
    cursor_path: Option<PathBuf>,
    resume: bool,
    limits: SearchLimits,
) -> Result<()> {
    settings.merge_with_cli(&overrides);
    if cursor_path.is_some() {
        settings.store.cursor_path = cursor_path;
    }
    settings.validate().context("Configuration validation failed")?;

    let mut start = settings.start_cursor();
    if resume {
        let path = settings
            .store
            .cursor_path
            .as_ref()
            .context("--resume needs a cursor file (--cursor or store.cursor_path)")?;
        match SearchCursor::load(path)? {
            Some(saved) => start = saved,
            None => {
                let message = format!(
                    "No saved cursor at {}, starting from the configured point",
                    path.display()
                );
                println!("{}", ColorOutput::warning(&message));
            }
        }
    }

    let message = format!(
        "🔄 Searching from {} (store: {})",
        start.params(),
        settings.store.path.display()
    );
    println!("{}", ColorOutput::info(&message));

    let start_time = Instant::now();
    let mut driver = driver(&settings);
    let next = driver.find_all(start, limits).context("Search failed")?;

    let message = format!(
        "✅ Stopped after {:.1}s; next point is {}",
        start_time.elapsed().as_secs_f64(),
        next.params()
    );
    println!("{}", ColorOutput::success(&message));

    let best = driver.store().best_known(start.d)?;
    if !best.is_empty() {
        println!("\n{}", RecordFormatter::format_best_known(&best));
    }
    Ok(())
}

fn find_one_command(
    mut settings: Settings,
    overrides: CliOverrides,
    params: CffParams,
    show_matrix: bool,
) -> Result<()> {
    settings.merge_with_cli(&overrides);
    settings.validate().context("Configuration validation failed")?;

    println!("{}", ColorOutput::info(&format!("🧮 Looking for a CFF with {}", params)));

    let mut driver = driver(&settings);
    let probe = driver.find_one(params).context("Failed to answer triple")?;

    if probe.is_cached() {
        println!("{}", ColorOutput::info("Answer taken from the result store"));
    }
    println!("{}", RecordFormatter::format_record(probe.record(), show_matrix));

    if let (Probe::Solved(_), Some(stats)) = (&probe, driver.oracle().last_statistics()) {
        println!("{}", stats);
    }
    Ok(())
}

fn batch_command(
    mut settings: Settings,
    overrides: CliOverrides,
    d: usize,
    pairs: &str,
) -> Result<()> {
    settings.merge_with_cli(&overrides);
    settings.validate().context("Configuration validation failed")?;

    let pairs = parse_pairs(pairs)?;
    if pairs.is_empty() {
        println!("{}", ColorOutput::warning("No pairs given"));
        return Ok(());
    }

    let mut driver = driver(&settings);
    let probes = driver.find_batch(d, &pairs).context("Batch failed")?;

    for probe in &probes {
        println!("{}", RecordFormatter::format_probe(probe));
    }
    let records: Vec<_> = probes.into_iter().map(|p| p.record().clone()).collect();
    println!("\n{}", RecordFormatter::format_summary(&records));
    Ok(())
}

fn verify_command(settings: &Settings, params: CffParams) -> Result<()> {
    println!("{}", ColorOutput::info(&format!("🔍 Verifying stored family for {}", params)));

    let store = ResultStore::open(&settings.store.path, settings.store.upsert_policy);
    let Some(record) = store.get(params)? else {
        println!("{}", ColorOutput::warning("No record stored for this triple"));
        return Ok(());
    };
    if record.status != Status::Sat {
        let message = format!("Stored status is {}, nothing to verify", record.status);
        println!("{}", ColorOutput::warning(&message));
        return Ok(());
    }

    let verifier = CoverFreeVerifier::new(settings.verifier.max_blocks);
    let verdict = verifier
        .verify(&record.solution, params.d)
        .context("Verification failed")?;
    println!("{}", RecordFormatter::format_verdict(&verdict, params.d));
    Ok(())
}

fn table_command(settings: &Settings, d: usize, output: Option<PathBuf>) -> Result<()> {
    let store = ResultStore::open(&settings.store.path, settings.store.upsert_policy);
    let best = store.best_known(d)?;

    if best.is_empty() {
        println!("{}", ColorOutput::warning(&format!("No SAT records for d={}", d)));
        return Ok(());
    }
    println!("{}", RecordFormatter::format_best_known(&best));

    if let Some(path) = output {
        RecordFormatter::save_best_known(&best, &path)?;
        println!("{}", ColorOutput::success(&format!("Table saved to {}", path.display())));
    }
    Ok(())
}

fn analyze_command(settings: &Settings, params: CffParams) -> Result<()> {
    println!("{}", ColorOutput::info(&format!("🔬 Analyzing {}", params)));

    let encoder = CffEncoder::with_clause_limit(settings.solver.max_clauses);
    let stats = encoder.estimate(params)?;
    println!("{}", RecordFormatter::format_estimate(&stats));
    Ok(())
}

fn setup_command(directory: PathBuf, force: bool) -> Result<()> {
    println!("{}", ColorOutput::info("🛠️  Setting up project structure..."));

    let config_dir = directory.join("config");
    let examples_dir = config_dir.join("examples");
    std::fs::create_dir_all(&examples_dir)
        .with_context(|| format!("Failed to create directory {}", examples_dir.display()))?;

    let config_path = config_dir.join("default.yaml");
    if !config_path.exists() || force {
        Settings::default()
            .to_file(&config_path)
            .context("Failed to create default configuration")?;
        println!("Created: {}", config_path.display());
    } else {
        println!("Skipped: {} (already exists)", config_path.display());
    }

    // Small triples with verification on
    let mut quick = Settings::default();
    quick.search.d = 1;
    quick.search.t = 3;
    quick.search.n = 3;
    quick.solver.timeout_seconds = 5;
    quick.verifier.verify_solutions = true;
    quick.to_file(&examples_dir.join("quick.yaml"))?;

    let mut long_run = Settings::default();
    long_run.search.d = 3;
    long_run.search.t = 4;
    long_run.search.n = 4;
    long_run.solver.timeout_seconds = 600;
    long_run.store.cursor_path = Some(PathBuf::from("cursor_d3.json"));
    long_run.to_file(&examples_dir.join("long_run.yaml"))?;

    println!("Created example configurations in: {}", examples_dir.display());

    println!("\n{}", ColorOutput::success("✅ Setup complete!"));
    println!("\nNext steps:");
    println!("1. Edit configuration files in {}", config_dir.display());
    println!("2. Run: cargo run -- find-all --max-t 8");

    Ok(())
}
