//! Command line interface.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use dialoguer::Confirm;
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;

use flowdoc::storage::DynamoDbTables;
use flowdoc::{
    create_table, Config, Document, DocumentStorage, DocumentStore, GetManyOptions, Keys, Many,
    Outcome, PutOptions,
};

/// flowdoc - Revisioned document storage for workflow engines
#[derive(Debug, clap::Parser)]
#[command(name = "flowdoc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: Global,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Table prefix, the table is `<prefix>.documents`
    #[arg(long, global = true, env = "FLOWDOC_TABLE_PREFIX")]
    pub table_prefix: Option<String>,

    /// Custom DynamoDB endpoint (e.g. http://localhost:8000)
    #[arg(long, global = true, env = "AWS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// AWS region
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,
}

impl Global {
    /// Overrides configuration values with the ones given on the command line.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(prefix) = &self.table_prefix {
            config.table_prefix = prefix.clone();
        }
        if let Some(url) = &self.endpoint_url {
            config.endpoint_url = Some(url.clone());
        }
        if let Some(region) = &self.region {
            config.region = region.clone();
        }
        config
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Create the document table and wait until it is active.
    CreateTable(CreateTableCommand),

    /// Print the current revision of a document.
    Get {
        /// Document type
        doc_type: String,
        /// Document id
        id: String,
    },

    /// Store a JSON document read from a file or stdin.
    Put(PutCommand),

    /// Delete a document at a given revision.
    Delete {
        /// Document type
        doc_type: String,
        /// Document id
        id: String,
        /// Revision the document is expected to be at
        rev: u64,
    },

    /// List or count the documents of a type.
    List(ListCommand),

    /// Print the sorted ids of the documents of a type.
    Ids {
        /// Document type
        doc_type: String,
    },

    /// Delete every document, or every document of a type.
    Purge(PurgeCommand),
}

#[derive(Debug, clap::Parser)]
pub struct CreateTableCommand {
    /// Delete the table first if it exists. ALL DATA WILL BE LOST.
    #[arg(long)]
    pub recreate: bool,

    /// Read capacity units
    #[arg(long, env = "FLOWDOC_READ_CAPACITY")]
    pub read_capacity: Option<i64>,

    /// Write capacity units
    #[arg(long, env = "FLOWDOC_WRITE_CAPACITY")]
    pub write_capacity: Option<i64>,
}

#[derive(Debug, clap::Parser)]
pub struct PutCommand {
    /// JSON file holding the document, `-` or nothing for stdin
    pub file: Option<PathBuf>,

    /// Print the document with its new revision
    #[arg(long)]
    pub update_rev: bool,
}

#[derive(Debug, clap::Parser)]
pub struct ListCommand {
    /// Document type
    pub doc_type: String,

    /// Only documents of these workflow instances
    #[arg(long = "wfid", value_name = "WFID", conflicts_with = "patterns")]
    pub wfids: Vec<String>,

    /// Only documents whose id matches one of these regular expressions
    #[arg(long = "pattern", value_name = "REGEX")]
    pub patterns: Vec<String>,

    /// Sort by id, descending
    #[arg(long)]
    pub descending: bool,

    /// Skip this many documents
    #[arg(long)]
    pub skip: Option<usize>,

    /// Return at most this many documents
    #[arg(long)]
    pub limit: Option<usize>,

    /// Print the number of matching documents instead
    #[arg(long)]
    pub count: bool,
}

impl ListCommand {
    fn keys(&self) -> Result<Option<Keys>> {
        if !self.wfids.is_empty() {
            return Ok(Some(Keys::wfids(self.wfids.iter().cloned())));
        }
        if !self.patterns.is_empty() {
            let keys = Keys::patterns(&self.patterns).context("Invalid --pattern")?;
            return Ok(Some(keys));
        }
        Ok(None)
    }

    fn options(&self) -> GetManyOptions {
        GetManyOptions {
            count: self.count,
            skip: self.skip,
            limit: self.limit,
            descending: self.descending,
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct PurgeCommand {
    /// Only purge this document type
    #[arg(long = "type", value_name = "TYPE")]
    pub doc_type: Option<String>,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,
}

/// Main entry point for the command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.global.apply(Config::from_env());
    let aws_config = config.aws_config();
    tracing::info!(
        target_env = %aws_config.target_display(),
        table = %config.table_name(),
        "Using table"
    );

    let service = DynamoDbTables::connect(&aws_config).await;
    let open_store = || DocumentStore::open(service.clone(), &config.table_prefix);

    match cli.command {
        Commands::CreateTable(cmd) => {
            let mut options = config.provision_options();
            if let Some(read) = cmd.read_capacity {
                options.read_capacity_units = read;
            }
            if let Some(write) = cmd.write_capacity {
                options.write_capacity_units = write;
            }
            let name =
                create_table(&service, &config.table_prefix, cmd.recreate, &options).await?;
            print_json(&json!({ "table": name, "status": "active" }))
        }
        Commands::Get { doc_type, id } => {
            let store = open_store().await?;
            let doc = store.get(&doc_type, &id).await?;
            print_json(&doc.map(Value::from).unwrap_or(Value::Null))
        }
        Commands::Put(cmd) => {
            let store = open_store().await?;
            let mut doc = read_document(cmd.file.as_ref()).await?;
            let opts = PutOptions {
                update_rev: cmd.update_rev,
            };
            let outcome = store.put(&mut doc, opts).await?;
            let stored = (cmd.update_rev && outcome.is_success()).then_some(doc);
            print_json(&outcome_json(outcome, stored))
        }
        Commands::Delete { doc_type, id, rev } => {
            let store = open_store().await?;
            let doc = Document::new()
                .with("_id", id)
                .with("type", doc_type)
                .with("_rev", rev);
            let outcome = store.delete(&doc).await?;
            print_json(&outcome_json(outcome, None))
        }
        Commands::List(cmd) => {
            let keys = cmd.keys()?;
            let store = open_store().await?;
            let many = store
                .get_many(&cmd.doc_type, keys.as_ref(), cmd.options())
                .await?;
            print_json(&many_json(many))
        }
        Commands::Ids { doc_type } => {
            let store = open_store().await?;
            print_json(&json!(store.ids(&doc_type).await?))
        }
        Commands::Purge(cmd) => {
            let store = open_store().await?;
            let scope = match &cmd.doc_type {
                Some(doc_type) => format!("every '{doc_type}' document"),
                None => "every document".to_string(),
            };

            if !cmd.force {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Delete {scope} in {}? ALL DATA WILL BE LOST",
                        store.table_name()
                    ))
                    .default(false)
                    .interact()?;

                if !confirmed {
                    bail!("Purge cancelled");
                }
            }

            match &cmd.doc_type {
                Some(doc_type) => store.purge_type(doc_type).await?,
                None => store.purge().await?,
            }
            print_json(&json!({ "purged": store.table_name(), "type": cmd.doc_type }))
        }
    }
}

async fn read_document(file: Option<&PathBuf>) -> Result<Document> {
    let input = match file {
        Some(path) if path.as_os_str() != "-" => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            buf
        }
    };

    let value: Value = serde_json::from_str(&input).context("Document is not valid JSON")?;
    Ok(Document::from_value(value)?)
}

/// Renders a write outcome, with the stored document when there is one.
pub fn outcome_json(outcome: Outcome, stored: Option<Document>) -> Value {
    match outcome {
        Outcome::Success => match stored {
            Some(doc) => json!({ "outcome": "success", "document": Value::from(doc) }),
            None => json!({ "outcome": "success" }),
        },
        Outcome::AlreadyGone => json!({ "outcome": "already_gone" }),
        Outcome::Conflict(current) => {
            json!({ "outcome": "conflict", "current": Value::from(current) })
        }
    }
}

pub fn many_json(many: Many) -> Value {
    match many {
        Many::Count(n) => json!({ "count": n }),
        Many::Documents(docs) => Value::Array(docs.into_iter().map(Value::from).collect()),
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
