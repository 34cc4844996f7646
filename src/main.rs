//! structura CLI: induce annotation schemas and validate document graphs.

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use miette::Result;

use structura::config::StructuraConfig;
use structura::corpus::Corpus;
use structura::schema::{Schema, SchemaInducer};
use structura::validate::Validator;

#[derive(Parser)]
#[command(name = "structura", version, about = "Annotation schema induction and validation")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log every removed element.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the schema file lives: an explicit path or a model directory.
#[derive(Args)]
struct SchemaLocation {
    /// Schema file path.
    #[arg(long, conflicts_with = "model_dir")]
    schema: Option<PathBuf>,

    /// Model directory holding the schema under its configured file name.
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

impl SchemaLocation {
    fn resolve(&self, config: &StructuraConfig) -> Option<PathBuf> {
        self.schema
            .clone()
            .or_else(|| self.model_dir.as_ref().map(|dir| config.schema_path(dir)))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Induce a schema from one or more JSON corpora.
    Analyze {
        /// Corpus files.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        location: SchemaLocation,
    },

    /// Validate a JSON corpus against a saved schema.
    Validate {
        /// Corpus to validate.
        #[arg(long)]
        input: PathBuf,

        /// Where to write the cleaned corpus.
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        location: SchemaLocation,

        /// Count removals without modifying the corpus.
        #[arg(long)]
        simulate: bool,

        /// Enforce argument maxima above one literally.
        #[arg(long)]
        strict_max: bool,

        /// Validate documents on all cores.
        #[arg(long)]
        parallel: bool,
    },

    /// Print a saved schema and its summary.
    Show {
        #[command(flatten)]
        location: SchemaLocation,

        /// Also list the legal edge types per type pair.
        #[arg(long)]
        edges: bool,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => StructuraConfig::load(path)?,
        None => StructuraConfig::default(),
    };

    match cli.command {
        Commands::Analyze { inputs, location } => {
            let mut inducer = SchemaInducer::new();
            for input in &inputs {
                let corpus = Corpus::load(input)?;
                if corpus.is_empty() {
                    tracing::warn!(path = %input.display(), "corpus has no documents");
                }
                tracing::info!(path = %input.display(), documents = corpus.len(), "analyzing");
                for document in &corpus.documents {
                    inducer.add_document(document)?;
                }
            }
            let schema = inducer.finish();

            match location.resolve(&config) {
                Some(path) => {
                    schema.save(&path)?;
                    println!("Saved schema to {}", path.display());
                    println!("{}", schema.stats());
                }
                None => print!("{}", schema.to_text()?),
            }
        }

        Commands::Validate {
            input,
            output,
            location,
            simulate,
            strict_max,
            parallel,
        } => {
            let Some(schema_path) = location.resolve(&config) else {
                miette::bail!("no schema given: pass --schema or --model-dir");
            };
            let schema = Schema::load(&schema_path)?;
            let mut corpus = Corpus::load(&input)?;

            let mut policy = config.validate;
            policy.simulation |= simulate;
            policy.unbounded_beyond_one &= !strict_max;
            let validator = Validator::with_config(&schema, policy);

            let report = if parallel {
                validator.par_validate_corpus(&mut corpus)
            } else {
                validator.validate_corpus(&mut corpus)
            }?;

            println!("Validated {} documents", report.documents);
            if report.is_clean() {
                println!("Nothing removed.");
            } else {
                println!("Removed entities:");
                for (entity_type, count) in &report.removed_entities {
                    println!("  {entity_type}: {count}");
                }
                println!("Removed interactions:");
                for (interaction_type, count) in &report.removed_interactions {
                    println!("  {interaction_type}: {count}");
                }
            }

            if let Some(output) = output {
                corpus.save(&output)?;
                println!("Wrote cleaned corpus to {}", output.display());
            }
        }

        Commands::Show { location, edges } => {
            let Some(schema_path) = location.resolve(&config) else {
                miette::bail!("no schema given: pass --schema or --model-dir");
            };
            let schema = Schema::load(&schema_path)?;
            println!("{}", schema.stats());
            println!();
            print!("{}", schema.to_text()?);

            if edges {
                println!();
                println!("Edge types:");
                let index = schema.edge_index();
                let types: BTreeSet<&str> = schema
                    .entity_types()
                    .map(|t| t.name.as_str())
                    .chain(schema.event_types().map(|t| t.name.as_str()))
                    .collect();
                for source in index.source_types() {
                    for target in &types {
                        let valid = index.valid_edge_types(source, target, false);
                        if !valid.is_empty() {
                            let valid: Vec<&str> = valid.into_iter().collect();
                            println!("  {source} -> {target}: {}", valid.join(","));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
