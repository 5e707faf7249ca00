//! Grove CLI: command-line interface for the Grove vocabulary engine
//!
//! Works directly on the configured RocksDB data path; every mutating command
//! checkpoints the store before exiting.

use anyhow::{anyhow, bail, Context as _};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use grove::persistence::PersistenceManager;
use grove::rdf::{PrefixRegistry, RdfFormat};
use grove::vocab::{
    import_file, load_predicates_file, publication_state, serialize_vocabulary, Publisher, VocabStore, VocabularyId,
};
use grove::GroveConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grove", version, about = "Grove vocabulary CLI")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "GROVE_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Import an RDF file into a vocabulary
    Import {
        /// Vocabulary URI (must end in '/' or '#')
        #[arg(long)]
        uri: String,

        /// RDF format alias or media type
        #[arg(long, default_value = "turtle")]
        format: String,

        file: PathBuf,
    },
    /// Print a vocabulary in one RDF format
    Export {
        #[arg(long)]
        uri: String,

        #[arg(long, default_value = "json-ld")]
        format: String,
    },
    /// Write a vocabulary to the output directory in every format
    Publish {
        #[arg(long)]
        uri: String,
    },
    /// Remove a vocabulary's published files
    Unpublish {
        #[arg(long)]
        uri: String,
    },
    /// List vocabularies and their publication state
    Status,
    /// Load predicate definitions from a CSV file
    LoadPredicates {
        #[arg(long)]
        file: PathBuf,
    },
    /// List known namespace prefixes
    Prefixes,
}

/// Store opened from the data path, plus what commands need around it
struct Session {
    store: VocabStore,
    persistence: PersistenceManager,
    registry: PrefixRegistry,
    publisher: Publisher,
}

impl Session {
    fn open(config: &GroveConfig) -> anyhow::Result<Self> {
        let data_path = config
            .data_path
            .as_ref()
            .ok_or_else(|| anyhow!("no data_path configured (set it in the config file or GROVE_DATA_PATH)"))?;
        let persistence = PersistenceManager::new(data_path)
            .with_context(|| format!("opening data path {}", data_path.display()))?;
        let store = persistence.recover(std::sync::Arc::new(grove::SystemClock))?;
        Ok(Self {
            store,
            persistence,
            registry: config.prefix_registry(),
            publisher: Publisher::new(&config.output_dir),
        })
    }

    fn vocabulary_id(&self, uri: &str) -> anyhow::Result<VocabularyId> {
        match self.store.vocabulary_by_uri(uri) {
            Some(vocabulary) => Ok(vocabulary.id),
            None => bail!("no vocabulary with URI {}", uri),
        }
    }

    fn checkpoint(&self) -> anyhow::Result<()> {
        self.persistence.checkpoint(&self.store)?;
        Ok(())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = GroveConfig::load(cli.config.as_deref())
        .map_err(anyhow::Error::from)
        .and_then(|config| match cli.command {
            Commands::Import { uri, format, file } => run_import(&config, &uri, &format, &file, &cli.output),
            Commands::Export { uri, format } => run_export(&config, &uri, &format),
            Commands::Publish { uri } => run_publish(&config, &uri, &cli.output),
            Commands::Unpublish { uri } => run_unpublish(&config, &uri),
            Commands::Status => run_status(&config, &cli.output),
            Commands::LoadPredicates { file } => run_load_predicates(&config, &file, &cli.output),
            Commands::Prefixes => run_prefixes(&config, &cli.output),
        });

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_import(
    config: &GroveConfig,
    uri: &str,
    format: &str,
    file: &Path,
    output: &OutputFormat,
) -> anyhow::Result<()> {
    let mut session = Session::open(config)?;
    let outcome = import_file(&mut session.store, file, uri, format)?;
    session.checkpoint()?;

    let counters = outcome.counters;
    match output {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "uri": uri,
                "is_new": outcome.is_new,
                "counters": counters,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Vocabulary", "New", "Subjects", "New terms", "New properties", "Ignored"]);
            table.add_row(vec![
                uri.to_string(),
                outcome.is_new.to_string(),
                counters.subjects.to_string(),
                counters.new_terms.to_string(),
                counters.new_properties.to_string(),
                counters.ignored_subjects.to_string(),
            ]);
            println!("{table}");
        }
    }
    Ok(())
}

fn run_export(config: &GroveConfig, uri: &str, format: &str) -> anyhow::Result<()> {
    let session = Session::open(config)?;
    let format = RdfFormat::from_alias(format)?;
    let id = session.vocabulary_id(uri)?;
    let document = serialize_vocabulary(&session.store, id, &session.registry, format)?;
    print!("{}", document);
    Ok(())
}

fn run_publish(config: &GroveConfig, uri: &str, output: &OutputFormat) -> anyhow::Result<()> {
    let mut session = Session::open(config)?;
    let id = session.vocabulary_id(uri)?;
    let paths = session.publisher.publish(&mut session.store, id, &session.registry)?;
    session.checkpoint()?;

    match output {
        OutputFormat::Json => {
            let paths: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
            println!("{}", serde_json::to_string_pretty(&paths)?);
        }
        OutputFormat::Table => {
            for path in &paths {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}

fn run_unpublish(config: &GroveConfig, uri: &str) -> anyhow::Result<()> {
    let mut session = Session::open(config)?;
    let id = session.vocabulary_id(uri)?;
    session.publisher.unpublish(&mut session.store, id)?;
    session.checkpoint()?;
    println!("Unpublished {}", uri);
    Ok(())
}

fn run_status(config: &GroveConfig, output: &OutputFormat) -> anyhow::Result<()> {
    let session = Session::open(config)?;
    let store = &session.store;

    let mut rows = Vec::new();
    for vocabulary in store.vocabularies() {
        rows.push((vocabulary, store.term_count(vocabulary.id), publication_state(store, vocabulary.id)?));
    }

    match output {
        OutputFormat::Json => {
            let body: Vec<serde_json::Value> = rows
                .iter()
                .map(|(vocabulary, terms, state)| {
                    serde_json::json!({
                        "uri": vocabulary.uri,
                        "label": vocabulary.label,
                        "term_count": terms,
                        "state": state,
                        "published": vocabulary.published,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["URI", "Label", "Terms", "State", "Published"]);
            for (vocabulary, terms, state) in &rows {
                table.add_row(vec![
                    vocabulary.uri.clone(),
                    vocabulary.label.clone(),
                    terms.to_string(),
                    format!("{:?}", state),
                    vocabulary
                        .published
                        .map(|at| at.to_rfc3339())
                        .unwrap_or_else(|| "-".to_string()),
                ]);
            }
            println!("{table}");
            println!("{} vocabularies", rows.len());
        }
    }
    Ok(())
}

fn run_load_predicates(config: &GroveConfig, file: &Path, output: &OutputFormat) -> anyhow::Result<()> {
    let mut session = Session::open(config)?;
    let summary = load_predicates_file(file, &session.registry, &mut session.store)?;
    session.checkpoint()?;

    match output {
        OutputFormat::Json => {
            let body = serde_json::json!({ "rows": summary.rows, "created": summary.created });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Table => println!("{} rows read, {} predicates created", summary.rows, summary.created),
    }
    Ok(())
}

fn run_prefixes(config: &GroveConfig, output: &OutputFormat) -> anyhow::Result<()> {
    let namespaces = config.prefix_registry().sorted();

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&namespaces)?),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Prefix", "Namespace"]);
            for namespace in &namespaces {
                table.add_row(vec![namespace.prefix.clone(), namespace.iri.clone()]);
            }
            println!("{table}");
        }
    }
    Ok(())
}
