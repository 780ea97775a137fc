pub mod config;
pub mod model;
pub mod render;
pub mod search;
pub mod storage;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

use config::SearchConfig;
use model::types::{SearchRequest, Term};
use search::SearchEngine;
use storage::sqlite::{LazyDb, SqliteStorage};

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "asdb",
    version,
    about = "Boolean search over a biosynthetic gene cluster catalog"
)]
pub struct Cli {
    /// Path to the SQLite catalog (defaults to platform data dir)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Path to a config.toml (defaults to platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a paged search and print the response as JSON
    Search {
        /// Entity kind to return: cluster, gene or domain
        domain: String,

        #[command(flatten)]
        terms: TermsArg,

        /// Output format (json, csv, fasta-nucleotide, fasta-protein)
        #[arg(long, short)]
        format: Option<String>,

        /// Index of the first row to return
        #[arg(long)]
        offset: Option<usize>,

        /// Rows per page (defaults to the configured page size)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the full result set as tab-separated values
    Export {
        domain: String,

        #[command(flatten)]
        terms: TermsArg,
    },
    /// List known values of a category starting with a prefix
    Available {
        category: String,

        /// Prefix to complete (empty lists everything up to the limit)
        #[arg(default_value = "")]
        term: String,
    },
    /// Show every region on one sequence accession
    Genome { acc: String },
    /// Catalog overview: counts, types and best-sampled taxon
    Summary,
    /// BGC types with the regions assigned to each, as a flat node list
    TypeTree,
    /// Create an empty catalog with the current schema
    Init,
    /// Print version, build and SQLite details
    Version,
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate man page to stdout
    Man,
}

/// Where a search expression comes from.
#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
pub struct TermsArg {
    /// Search expression as JSON
    #[arg(long)]
    pub terms: Option<String>,

    /// File holding the search expression as JSON (`-` for stdin)
    #[arg(long)]
    pub terms_file: Option<PathBuf>,
}

impl TermsArg {
    pub fn load(&self) -> Result<Term> {
        let raw = match (&self.terms, &self.terms_file) {
            (Some(json), _) => json.clone(),
            (None, Some(path)) if path.as_os_str() == "-" => {
                std::io::read_to_string(std::io::stdin()).context("reading terms from stdin")?
            }
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("reading terms file {}", path.display()))?,
            (None, None) => bail!("either --terms or --terms-file is required"),
        };
        serde_json::from_str(&raw).context("parsing search terms JSON")
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg = SearchConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(db) = cli.db {
        cfg.db_path = Some(db);
    }
    let db_path = cfg.db_path.clone().unwrap_or_else(default_db_path);
    let lazy = LazyDb::new(db_path);

    match cli.command {
        Commands::Search {
            domain,
            terms,
            format,
            offset,
            limit,
        } => {
            let request = SearchRequest {
                domain,
                terms: terms.load()?,
                offset,
                limit,
                format,
            };
            let db = lazy.get("search")?;
            let response = SearchEngine::new(db.raw(), &cfg).search(&request)?;
            print_json(&response)
        }
        Commands::Export { domain, terms } => {
            let terms = terms.load()?;
            let db = lazy.get("export")?;
            let lines = SearchEngine::new(db.raw(), &cfg).export(&domain, &terms)?;
            let mut out = std::io::stdout().lock();
            for line in lines {
                writeln!(out, "{line}")?;
            }
            Ok(())
        }
        Commands::Available { category, term } => {
            let db = lazy.get("available")?;
            let values = SearchEngine::new(db.raw(), &cfg).available_terms(&category, &term)?;
            print_json(&values)
        }
        Commands::Genome { acc } => {
            let db = lazy.get("genome")?;
            let regions = SearchEngine::new(db.raw(), &cfg).genome(&acc)?;
            print_json(&regions)
        }
        Commands::Summary => {
            let db = lazy.get("summary")?;
            print_json(&db.summary()?)
        }
        Commands::TypeTree => {
            let db = lazy.get("type-tree")?;
            print_json(&db.type_tree()?)
        }
        Commands::Init => init_catalog(lazy.path()),
        Commands::Version => {
            let mut out = std::io::stdout().lock();
            for line in version_lines() {
                writeln!(out, "{line}")?;
            }
            Ok(())
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "asdb", &mut std::io::stdout());
            Ok(())
        }
        Commands::Man => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            let mut out = std::io::stdout();
            man.render(&mut out)?;
            Ok(())
        }
    }
}

/// Lines printed by `asdb version`; build fields read `unknown` when
/// vergen could not embed them.
pub fn version_lines() -> Vec<String> {
    let embedded = |value: Option<&'static str>| value.unwrap_or("unknown");
    vec![
        format!("asdb-search {}", env!("CARGO_PKG_VERSION")),
        format!("built: {}", embedded(option_env!("VERGEN_BUILD_TIMESTAMP"))),
        format!(
            "target: {}",
            embedded(option_env!("VERGEN_CARGO_TARGET_TRIPLE"))
        ),
        format!(
            "profile: opt-level {} (debug {})",
            embedded(option_env!("VERGEN_CARGO_OPT_LEVEL")),
            embedded(option_env!("VERGEN_CARGO_DEBUG"))
        ),
        format!("sqlite: {}", rusqlite::version()),
    ]
}

fn init_catalog(path: &Path) -> Result<()> {
    let storage = SqliteStorage::open(path)?;
    tracing::info!(
        path = %path.display(),
        schema_version = storage.schema_version()?,
        "catalog initialized"
    );
    println!("{}", path.display());
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn default_db_path() -> PathBuf {
    default_data_dir().join("catalog.db")
}

pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("org", "antismash", "asdb-search")
        .expect("project dirs available")
        .data_dir()
        .to_path_buf()
}
