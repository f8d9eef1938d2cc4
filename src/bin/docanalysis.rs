//! docanalysis CLI: register documents, run analyses and commit reviews.
//!
//! Usage:
//!   docanalysis register <file> [--title T] [--db path] [--uploads dir]
//!   docanalysis list
//!   docanalysis show <id>
//!   docanalysis analyze <id> [--timeout secs] [--frames file]
//!   docanalysis commit <id> (--approve | --reject) [--notes text]
//!   docanalysis delete <id>

use clap::{ArgGroup, Parser, Subcommand};
use docanalysis::config::Config;
use docanalysis::extraction::{FramePipeline, OpenRouterClient};
use docanalysis::{
    register_document, AnalysisError, AnalysisLifecycle, AnalysisOrchestrator, DocumentId,
    DocumentStore, OpenStore, SqliteStore, UploadDir,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(
    name = "docanalysis",
    version,
    about = "Document analysis with LLM-backed entity and relation extraction"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to SQLite database file
    #[arg(long, global = true, env = "DOCANALYSIS_DB")]
    db: Option<PathBuf>,

    /// Directory holding uploaded document files
    #[arg(long, global = true, env = "DOCANALYSIS_UPLOADS")]
    uploads: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a file as a new draft document
    Register {
        /// File to upload
        file: PathBuf,
        /// Document title (defaults to the file name)
        #[arg(long)]
        title: Option<String>,
    },
    /// List all documents
    List,
    /// Show the analysis of a document
    Show {
        /// Document ID
        id: String,
    },
    /// Run an analysis on a document
    Analyze {
        /// Document ID
        id: String,
        /// Model used for extraction
        #[arg(long, env = "OPENROUTER_MODEL")]
        model: Option<String>,
        /// Give up on extraction after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// YAML file with custom extraction passes
        #[arg(long)]
        frames: Option<PathBuf>,
    },
    /// Commit a review decision on a completed analysis
    #[command(group(ArgGroup::new("decision").required(true).args(["approve", "reject"])))]
    Commit {
        /// Document ID
        id: String,
        #[arg(long)]
        approve: bool,
        #[arg(long)]
        reject: bool,
        /// Reviewer notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a document and its stored file
    Delete {
        /// Document ID
        id: String,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(config: &Config) -> Result<Arc<SqliteStore>, String> {
    SqliteStore::open(&config.db_path)
        .map(Arc::new)
        .map_err(|e| format!("Failed to open database: {}", e))
}

fn parse_id(raw: &str) -> Result<DocumentId, String> {
    DocumentId::from_str(raw).map_err(|_| format!("'{}' is not a valid document ID", raw))
}

/// Print an analysis error and map it to an exit code
fn report(err: AnalysisError) -> i32 {
    eprintln!("Error: {}", err);
    if err.is_retryable() {
        eprintln!("The request can be retried.");
    }
    match err {
        AnalysisError::NotFound(_) => 2,
        AnalysisError::Conflict(_) => 3,
        _ => 1,
    }
}

async fn cmd_register(config: &Config, file: &Path, title: Option<String>) -> Result<i32, String> {
    let meta = std::fs::metadata(file)
        .map_err(|e| format!("cannot read '{}': {}", file.display(), e))?;
    if meta.len() > config.max_file_size_bytes() {
        return Err(format!(
            "'{}' exceeds the {} MB upload limit",
            file.display(),
            config.max_file_size_mb
        ));
    }

    let store = open_store(config)?;
    let uploads = UploadDir::new(&config.upload_dir);
    let title = title.unwrap_or_else(|| {
        file.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string())
    });

    let document = register_document(store.as_ref(), &uploads, DocumentId::new(), file, title)
        .await
        .map_err(|e| format!("Failed to register '{}': {}", file.display(), e))?;

    println!("Registered '{}' ({})", document.title, document.id);
    Ok(0)
}

async fn cmd_list(config: &Config) -> Result<i32, String> {
    let store = open_store(config)?;
    let documents = store.list().await.map_err(|e| e.to_string())?;
    if documents.is_empty() {
        println!("No documents registered.");
        return Ok(0);
    }
    println!("{:<36}  {:<10}  {:<20}  {}", "ID", "STATUS", "UPDATED", "TITLE");
    println!("{}", "-".repeat(90));
    for doc in documents {
        println!(
            "{:<36}  {:<10}  {:<20}  {}",
            doc.id,
            doc.status,
            doc.updated_date.format("%Y-%m-%d %H:%M:%S"),
            doc.title
        );
    }
    Ok(0)
}

async fn cmd_show(config: &Config, id: &str) -> Result<i32, String> {
    let id = parse_id(id)?;
    let lifecycle = AnalysisLifecycle::new(open_store(config)?);
    match lifecycle.get_analysis(&id).await {
        Ok(view) => {
            let json = serde_json::to_string_pretty(&view).map_err(|e| e.to_string())?;
            println!("{}", json);
            Ok(0)
        }
        Err(e) => Ok(report(e)),
    }
}

async fn cmd_analyze(config: &Config, id: &str) -> Result<i32, String> {
    let id = parse_id(id)?;
    let store = open_store(config)?;

    let frames = config.frames().map_err(|e| e.to_string())?;
    let api_key = config.api_key().map_err(|e| e.to_string())?;
    let client = OpenRouterClient::new(api_key, config.llm.clone()).map_err(|e| e.to_string())?;
    info!(model = %client.settings().model, "extraction client ready");
    let pipeline = FramePipeline::with_frames(Arc::new(client), frames);

    let mut orchestrator = AnalysisOrchestrator::new(
        store,
        Arc::new(UploadDir::new(&config.upload_dir)),
        Arc::new(pipeline),
    );
    if let Some(timeout) = config.extraction_timeout() {
        orchestrator = orchestrator.with_timeout(timeout);
    }

    match orchestrator.run_analysis(&id).await {
        Ok(document) => {
            let (entities, relations) = document
                .analysis
                .as_ref()
                .map(|a| (a.entities.len(), a.relations.len()))
                .unwrap_or_default();
            println!(
                "Analysis completed for '{}': {} entities, {} relations",
                document.title, entities, relations
            );
            Ok(0)
        }
        Err(e) => Ok(report(e)),
    }
}

async fn cmd_commit(
    config: &Config,
    id: &str,
    approved: bool,
    notes: Option<String>,
) -> Result<i32, String> {
    let id = parse_id(id)?;
    let lifecycle = AnalysisLifecycle::new(open_store(config)?);
    match lifecycle.commit_analysis(&id, approved, notes).await {
        Ok(view) => {
            println!("Document {} is now {}", view.document_id, view.status);
            Ok(0)
        }
        Err(e) => Ok(report(e)),
    }
}

async fn cmd_delete(config: &Config, id: &str) -> Result<i32, String> {
    let id = parse_id(id)?;
    let lifecycle = AnalysisLifecycle::new(open_store(config)?);
    let uploads = UploadDir::new(&config.upload_dir);
    match lifecycle.delete_document(&id, &uploads).await {
        Ok(document) => {
            println!("Deleted '{}' ({})", document.title, document.id);
            Ok(0)
        }
        Err(e) => Ok(report(e)),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::default();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(uploads) = cli.uploads {
        config.upload_dir = uploads;
    }

    let result = match cli.command {
        Commands::Register { file, title } => cmd_register(&config, &file, title).await,
        Commands::List => cmd_list(&config).await,
        Commands::Show { id } => cmd_show(&config, &id).await,
        Commands::Analyze {
            id,
            model,
            timeout,
            frames,
        } => {
            if let Some(model) = model {
                config.llm.model = model;
            }
            config.extraction_timeout_secs = timeout;
            config.frames_path = frames;
            cmd_analyze(&config, &id).await
        }
        Commands::Commit {
            id,
            approve,
            reject: _,
            notes,
        } => cmd_commit(&config, &id, approve, notes).await,
        Commands::Delete { id } => cmd_delete(&config, &id).await,
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };
    std::process::exit(code);
}
