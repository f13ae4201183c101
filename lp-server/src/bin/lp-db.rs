//! Database administration utility
//!
//! **Usage:**
//! ```bash
//! lp-db [-init] [-seed] [-verify] [--root-folder <dir>] [--seed-dir <dir>]
//! ```
//!
//! Phases run in the order init, seed, verify. Without any phase the usage
//! text is printed and the process exits with status 2.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use lp_common::config::{ConfigOverrides, PortalConfig};
use lp_common::db::{groups::words_count_mismatches, open_database, Database};
use lp_common::pagination::PageRequest;
use lp_common::queries::{self, WordListQuery};
use lp_common::seed::{self, InitOutcome};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PHASE_FLAGS: [&str; 3] = ["init", "seed", "verify"];

/// Language portal database utility
#[derive(Parser, Debug)]
#[clap(name = "lp-db")]
#[clap(about = "Create, seed and verify the language portal database")]
struct Args {
    /// Create the schema and seed an empty database
    #[clap(long)]
    init: bool,

    /// Load the seed corpus, skipping rows that already exist
    #[clap(long)]
    seed: bool,

    /// Print table counts and check group word counts
    #[clap(long)]
    verify: bool,

    /// Folder holding the database file
    #[clap(long, value_name = "DIR")]
    root_folder: Option<PathBuf>,

    /// Folder holding the seed JSON files
    #[clap(long, value_name = "DIR")]
    seed_dir: Option<PathBuf>,
}

impl Args {
    fn has_phase(&self) -> bool {
        self.init || self.seed || self.verify
    }
}

/// Accept `-init` style flags alongside `--init`
fn normalize_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
    args.into_iter()
        .map(|arg| match arg.strip_prefix('-') {
            Some(name) if PHASE_FLAGS.contains(&name) => format!("--{}", name),
            _ => arg,
        })
        .collect()
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lp_db=info,lp_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse_from(normalize_args(std::env::args()));
    if !args.has_phase() {
        eprintln!("{}", Args::command().render_help());
        return ExitCode::from(2);
    }

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `false` when verification found a problem
async fn run(args: Args) -> Result<bool> {
    let config = PortalConfig::resolve(&ConfigOverrides {
        root_folder: args.root_folder.clone(),
        seed_dir: args.seed_dir.clone(),
        ..Default::default()
    });
    config
        .ensure_root_folder()
        .context("Failed to prepare root folder")?;

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());
    let db = open_database(&db_path)
        .await
        .context("Failed to open database")?;

    if args.init {
        match seed::init_and_seed(&db, &config.seed_dir)
            .await
            .context("Init failed")?
        {
            InitOutcome::Seeded(report) => info!("Initialized database: {:?}", report),
            InitOutcome::AlreadyPopulated => info!("Database already populated, init skipped"),
        }
    }

    if args.seed {
        let report = seed::seed(&db, &config.seed_dir)
            .await
            .context("Seed failed")?;
        info!("Seed complete: {:?}", report);
    }

    if args.verify {
        return verify(&db).await;
    }
    Ok(true)
}

async fn verify(db: &Database) -> Result<bool> {
    let counts = seed::inspect(db).await.context("Failed to count rows")?;
    println!("words:                      {}", counts.words);
    println!("groups:                     {}", counts.groups);
    println!("word_groups:                {}", counts.word_group_links);
    println!("study_activities:           {}", counts.study_activities);
    println!("study_sessions:             {}", counts.study_sessions);
    println!("word_reviews:               {}", counts.word_reviews);
    println!("sentence_practice_attempts: {}", counts.sentence_practice_attempts);

    let sample_query = WordListQuery {
        page: PageRequest::new(1, 1)?,
        ..Default::default()
    };
    let sample = queries::list_words(db.pool(), &sample_query).await?;
    match sample.items.first() {
        Some(entry) => println!(
            "sample word: {} ({}) = {}",
            entry.word.hangul,
            entry.word.romanization,
            entry.word.english.join(", ")
        ),
        None => println!("sample word: <none>"),
    }

    let mismatches = words_count_mismatches(db.pool()).await?;
    for (id, name, stored, actual) in &mismatches {
        println!(
            "MISMATCH group {} '{}': words_count={} but {} linked words",
            id, name, stored, actual
        );
    }
    if mismatches.is_empty() {
        println!("group word counts: ok");
    }
    Ok(mismatches.is_empty())
}
