//! symptomrank: symptom-based differential diagnosis from the command line.
//!
//! # Usage
//!
//! ```bash
//! symptomrank seed
//! symptomrank symptoms [--offset N] [--limit N]
//! symptomrank diseases [--category C] [--offset N] [--limit N]
//! symptomrank categories
//! symptomrank disease <id>
//! symptomrank replace <disease_id> <symptom_id>:<probability>[:primary]...
//! symptomrank predict <symptom_id>...
//! symptomrank counts
//! ```
//!
//! Results are printed as JSON on stdout. Logs go to stderr or to a file,
//! see [`symptomrank::config`].

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use symptomrank::adapters::sqlite::SqliteStorage;
use symptomrank::application::seed::seed_sample_knowledge;
use symptomrank::application::{
    AssociationService, CatalogService, PredictionService, DEFAULT_PAGE_LIMIT,
};
use symptomrank::config::{AppConfig, LogMode};
use symptomrank::domain::{AssociationInput, DiseaseId, SymptomId};

const USAGE: &str = "Usage: symptomrank <command> [args]

Commands:
  seed                                      Load the sample knowledge base
  symptoms [--offset N] [--limit N]         List symptoms
  diseases [--category C] [--offset N] [--limit N]
                                            List diseases
  categories                                List disease categories
  disease <id>                              Show a disease and its symptoms
  replace <disease_id> <symptom_id>:<probability>[:primary]...
                                            Replace a disease's associations
  predict <symptom_id>...                   Rank diseases for the given symptoms
  counts                                    Association count per disease";

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };
    if matches!(command.as_str(), "-h" | "--help" | "help") {
        println!("{USAGE}");
        return Ok(());
    }
    let rest: Vec<String> = args.collect();

    let config = AppConfig::from_env()?;
    let _guard = init_logging(&config)?;

    tracing::debug!("Opening knowledge base at {}", config.db_path.display());
    let storage = Arc::new(SqliteStorage::new(&config.db_path)?);
    let catalog = CatalogService::new(Arc::clone(&storage));
    let associations = AssociationService::new(Arc::clone(&storage));

    match command.as_str() {
        "seed" => print_json(&seed_sample_knowledge(Arc::clone(&storage))?),
        "symptoms" => {
            let paging = Paging::parse(&rest, false)?;
            let page = catalog.list_symptoms(paging.offset, paging.limit)?;
            hint_next_page(page.next_offset());
            print_json(&page)
        }
        "diseases" => {
            let paging = Paging::parse(&rest, true)?;
            let page =
                catalog.list_diseases(paging.category.as_deref(), paging.offset, paging.limit)?;
            hint_next_page(page.next_offset());
            print_json(&page)
        }
        "categories" => print_json(&catalog.list_categories()?),
        "disease" => {
            let id: DiseaseId = parse_id(single_arg(&rest, "disease <id>")?)?;
            let disease = catalog.get_disease(id)?;
            let symptoms = associations.disease_associations(id)?.symptoms;
            print_json(&serde_json::json!({ "disease": disease, "symptoms": symptoms }))
        }
        "replace" => {
            let (disease, items) = rest.split_first().ok_or_else(|| {
                anyhow!("Usage: symptomrank replace <disease_id> <symptom_id>:<probability>[:primary]...")
            })?;
            let disease_id: DiseaseId = parse_id(disease)?;
            let items = items
                .iter()
                .map(|item| parse_association(item))
                .collect::<Result<Vec<_>>>()?;
            print_json(&associations.replace_disease_associations(disease_id, items)?)
        }
        "predict" => {
            let symptom_ids = rest
                .iter()
                .map(|id| parse_id(id))
                .collect::<Result<Vec<SymptomId>>>()?;
            let predictions = PredictionService::with_config(storage, config.scoring)?;
            print_json(&predictions.predict(&symptom_ids)?)
        }
        "counts" => print_json(&associations.association_counts()?),
        other => {
            eprintln!("Unknown command: {other}\n{USAGE}");
            std::process::exit(2);
        }
    }
}

/// Install the global subscriber. The returned guard flushes buffered logs on drop.
fn init_logging(config: &AppConfig) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let (writer, guard) = match config.log_mode {
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                // Best-effort: OpenOptions reports the real failure below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("Opening log file {}", config.log_file.display()))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();

    Ok(guard)
}

fn hint_next_page(next_offset: Option<usize>) {
    if let Some(next) = next_offset {
        tracing::info!("More results available: rerun with --offset {}", next);
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

struct Paging {
    category: Option<String>,
    offset: usize,
    limit: usize,
}

impl Paging {
    fn parse(args: &[String], allow_category: bool) -> Result<Self> {
        let mut paging = Self {
            category: None,
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        };
        let mut args = args.iter();
        while let Some(arg) = args.next() {
            let mut value = || args.next().ok_or_else(|| anyhow!("Missing value for {arg}"));
            match arg.as_str() {
                "--category" if allow_category => paging.category = Some(value()?.clone()),
                "--offset" => paging.offset = value()?.parse().context("--offset must be a number")?,
                "--limit" => paging.limit = value()?.parse().context("--limit must be a number")?,
                _ => bail!("Unknown arg: {arg}"),
            }
        }
        Ok(paging)
    }
}

fn single_arg<'a>(args: &'a [String], usage: &str) -> Result<&'a str> {
    match args {
        [only] => Ok(only),
        _ => bail!("Usage: symptomrank {usage}"),
    }
}

fn parse_id(value: &str) -> Result<i64> {
    value
        .parse()
        .with_context(|| format!("Invalid id: {value:?}"))
}

/// `<symptom_id>:<probability>[:primary]`
fn parse_association(item: &str) -> Result<AssociationInput> {
    let mut parts = item.split(':');
    let (Some(symptom), Some(probability)) = (parts.next(), parts.next()) else {
        bail!("Expected <symptom_id>:<probability>[:primary], got {item:?}");
    };
    let is_primary = match parts.next() {
        None => false,
        Some("primary") => true,
        Some(flag) => bail!("Unknown association flag {flag:?} in {item:?}"),
    };
    if parts.next().is_some() {
        bail!("Too many fields in {item:?}");
    }

    Ok(AssociationInput {
        symptom_id: parse_id(symptom)?,
        probability: probability
            .parse()
            .with_context(|| format!("Invalid probability in {item:?}"))?,
        is_primary,
    })
}
