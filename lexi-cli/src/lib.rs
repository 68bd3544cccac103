//! Command-line front end for Lexi.
//!
//! `lexi ingest` indexes files and reports what was loaded; `lexi ask`
//! additionally assembles the context for a question and prints the exact
//! messages a model would receive.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lexi_chat::{ChatConfig, prompt};
use lexi_core::{ChatMessage, ConversationHistory};
use lexi_rag::{
    ContextAssembler, EmbeddingProvider, HashingEmbedder, IndexManager, IndexReport, SearchResult,
    SkippedDocument, UploadedDocument,
};
use serde::Serialize;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "lexi", version, about = "Ask plain-language questions about legal documents")]
pub struct Cli {
    /// JSON file with chat and retrieval settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load and index documents
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Retrieve passages for a question and show the prompt
    Ask {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(short, long)]
        query: String,
        /// Number of passages to retrieve
        #[arg(long)]
        top_k: Option<usize>,
        /// Number of recent dialogue turns to include
        #[arg(long)]
        history_window: Option<usize>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Units loaded from one source.
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub source_id: String,
    pub units: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub document_set: String,
    pub fingerprint: String,
    pub sources: Vec<SourceSummary>,
    pub skipped: Vec<SkippedDocument>,
}

impl IngestSummary {
    fn from_report(report: &IndexReport) -> Self {
        let set = &report.document_set;
        let sources = set
            .source_names()
            .iter()
            .map(|source_id| SourceSummary {
                source_id: source_id.clone(),
                units: set.units().iter().filter(|u| &u.source_id == source_id).count(),
            })
            .collect();
        Self {
            document_set: set.id().to_string(),
            fingerprint: set.fingerprint().to_string(),
            sources,
            skipped: report.skipped.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AskReport {
    pub query: String,
    pub passages: Vec<SearchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval_error: Option<String>,
    pub messages: Vec<ChatMessage>,
}

/// Read the settings file, or the defaults without one.
pub fn load_config(path: Option<&Path>) -> Result<ChatConfig> {
    let Some(path) = path else {
        return Ok(ChatConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: ChatConfig = serde_json::from_str(&raw)
        .with_context(|| format!("invalid config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Read files as an upload batch named by file name.
pub fn read_documents(files: &[PathBuf]) -> Result<Vec<UploadedDocument>> {
    files
        .iter()
        .map(|path| {
            let bytes =
                std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            let source_id = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            debug!(source_id, bytes = bytes.len(), "read document");
            Ok(UploadedDocument::new(source_id, bytes))
        })
        .collect()
}

async fn index(config: &ChatConfig, embedder: Arc<dyn EmbeddingProvider>, files: &[PathBuf]) -> Result<IndexReport> {
    let batch = read_documents(files)?;
    let mut manager = IndexManager::new(config.rag.clone(), embedder);
    Ok(manager.ensure_index(&batch).await?)
}

pub async fn ingest(config: &ChatConfig, files: &[PathBuf]) -> Result<IngestSummary> {
    let report = index(config, Arc::new(HashingEmbedder::default()), files).await?;
    Ok(IngestSummary::from_report(&report))
}

pub async fn ask(config: &ChatConfig, files: &[PathBuf], query: &str) -> Result<AskReport> {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbedder::default());
    let report = index(config, embedder.clone(), files).await?;

    let assembler = ContextAssembler::new(embedder, &config.rag);
    let payload = assembler
        .assemble_default(query, &ConversationHistory::new(), Some(&report.document_set))
        .await;

    Ok(AskReport {
        query: query.to_string(),
        citation: prompt::citation_line(&payload.source_names),
        retrieval_error: payload.retrieval_error.clone(),
        messages: prompt::build_messages(&config.directive, &payload, query),
        passages: payload.retrieved,
    })
}

/// Execute a parsed command, writing results to `out`.
pub async fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Ingest { files, json } => {
            let summary = ingest(&config, &files).await?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
            } else {
                write_ingest(out, &summary)?;
            }
        }
        Command::Ask { files, query, top_k, history_window, json } => {
            if let Some(top_k) = top_k {
                config.rag.top_k = top_k;
            }
            if let Some(window) = history_window {
                config.rag.history_window = window;
            }
            config.validate()?;

            let report = ask(&config, &files, &query).await?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            } else {
                write_ask(out, &report)?;
            }
        }
    }
    Ok(())
}

fn write_ingest<W: Write>(out: &mut W, summary: &IngestSummary) -> Result<()> {
    writeln!(out, "document set {} (fingerprint {})", summary.document_set, summary.fingerprint)?;
    for source in &summary.sources {
        writeln!(out, "  {}: {} units", source.source_id, source.units)?;
    }
    for skipped in &summary.skipped {
        writeln!(out, "  skipped {}: {}", skipped.source_id, skipped.reason)?;
    }
    Ok(())
}

fn write_ask<W: Write>(out: &mut W, report: &AskReport) -> Result<()> {
    if let Some(error) = &report.retrieval_error {
        writeln!(out, "retrieval failed: {error}")?;
    }
    for (rank, passage) in report.passages.iter().enumerate() {
        let unit = &passage.unit;
        writeln!(
            out,
            "{}. [{:.3}] {} (position {}, page {})",
            rank + 1,
            passage.score,
            unit.source_id,
            unit.position,
            unit.page
        )?;
        writeln!(out, "   {}", unit.content.replace('\n', " "))?;
    }
    if let Some(citation) = &report.citation {
        writeln!(out, "{citation}")?;
    }
    writeln!(out)?;
    for message in &report.messages {
        writeln!(out, "--- {} ---", message.role)?;
        writeln!(out, "{}", message.content)?;
    }
    Ok(())
}
