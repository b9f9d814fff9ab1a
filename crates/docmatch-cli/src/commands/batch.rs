//! Batch processing command for documents and message manifests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::debug;

use docmatch_core::{
    Attachment, ExtractionOutcome, Message, Pipeline, ReportSummary, classify_message,
    group_by_message, resolve_recipient, routing_kind,
};

use super::process::OutputFormat;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern (each document becomes one message)
    #[arg(required_unless_present = "manifest")]
    input: Option<String>,

    /// JSON message manifest (alternative to a glob)
    #[arg(long, conflicts_with = "input")]
    manifest: Option<PathBuf>,

    /// Population snapshot CSV (falls back to the config)
    #[arg(short, long)]
    population: Option<PathBuf>,

    /// Output directory for outcome and status tables
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for the outcome table
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Also print a summary report
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers (overrides the config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,
}

/// One message in a JSON manifest. Attachment paths are resolved
/// relative to the manifest file.
#[derive(Deserialize)]
struct ManifestMessage {
    id: String,
    #[serde(default)]
    folder_id: Option<String>,
    sender: String,
    subject: String,
    received_at: DateTime<Utc>,
    #[serde(default)]
    is_read: bool,
    #[serde(default)]
    flagged: bool,
    #[serde(default)]
    attachments: Vec<ManifestAttachment>,
}

#[derive(Deserialize)]
struct ManifestAttachment {
    #[serde(default)]
    id: Option<String>,
    name: String,
    path: PathBuf,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    if let Some(jobs) = args.jobs {
        config.pipeline.jobs = jobs;
    }
    let snapshot = super::load_snapshot(args.population.as_ref(), &config)?;

    let messages = match (&args.manifest, &args.input) {
        (Some(manifest), _) => load_manifest(manifest)?,
        (None, Some(pattern)) => load_glob(pattern)?,
        (None, None) => unreachable!("clap enforces input or manifest"),
    };
    if messages.is_empty() {
        anyhow::bail!("no messages to process");
    }

    let attachment_count: usize = messages.iter().map(|m| m.attachments.len()).sum();
    println!(
        "{} {} message(s), {} attachment(s), {} population record(s)",
        style("ℹ").blue(),
        messages.len(),
        attachment_count,
        snapshot.len()
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(format!("processing {} message(s)...", messages.len()));

    let pipeline = Arc::new(Pipeline::new(&config, snapshot)?);
    let outcomes = pipeline.process_batch(messages).await;

    pb.finish_with_message("done");

    write_outcomes(&args, &outcomes)?;
    print_statuses(&args, &outcomes, &config)?;

    if args.summary {
        println!();
        println!("{}", ReportSummary::from_outcomes(&outcomes));
    }

    println!();
    println!(
        "{} {} outcome record(s) in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );

    Ok(())
}

/// Expand a glob pattern; every matching file becomes a one-attachment
/// message, in glob order.
fn load_glob(pattern: &str) -> anyhow::Result<Vec<Message>> {
    let mut messages = Vec::new();

    for entry in glob(pattern)? {
        let path = entry?;
        if !path.is_file() {
            continue;
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        let content = fs::read(&path)?;
        debug!(file = %path.display(), bytes = content.len(), "loaded document");

        messages.push(Message {
            id: path.display().to_string(),
            folder_id: None,
            sender: "local".to_string(),
            subject: name.clone(),
            received_at: Utc::now(),
            is_read: false,
            flagged: false,
            attachments: vec![Attachment::new(name.clone(), name, content)],
        });
    }

    Ok(messages)
}

/// Read a JSON manifest of messages with attachment file paths.
fn load_manifest(path: &Path) -> anyhow::Result<Vec<Message>> {
    let base = path.parent().unwrap_or(Path::new("."));
    let content = fs::read_to_string(path)?;
    let manifest: Vec<ManifestMessage> = serde_json::from_str(&content)?;

    let mut messages = Vec::with_capacity(manifest.len());
    for entry in manifest {
        let mut attachments = Vec::with_capacity(entry.attachments.len());
        for (index, attachment) in entry.attachments.into_iter().enumerate() {
            let file = if attachment.path.is_absolute() {
                attachment.path.clone()
            } else {
                base.join(&attachment.path)
            };
            let content = fs::read(&file)
                .map_err(|e| anyhow::anyhow!("attachment {}: {}", file.display(), e))?;
            let id = attachment
                .id
                .unwrap_or_else(|| format!("{}-{}", entry.id, index + 1));
            attachments.push(Attachment::new(id, attachment.name, content));
        }

        messages.push(Message {
            id: entry.id,
            folder_id: entry.folder_id,
            sender: entry.sender,
            subject: entry.subject,
            received_at: entry.received_at,
            is_read: entry.is_read,
            flagged: entry.flagged,
            attachments,
        });
    }

    Ok(messages)
}

fn write_outcomes(args: &BatchArgs, outcomes: &[ExtractionOutcome]) -> anyhow::Result<()> {
    let content = super::process::format_outcomes(outcomes, args.format)?;

    match &args.output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let extension = match args.format {
                OutputFormat::Json => "json",
                OutputFormat::Csv => "csv",
                OutputFormat::Text => "txt",
            };
            let path = dir.join(format!("outcomes.{}", extension));
            fs::write(&path, content)?;
            println!(
                "{} Outcomes written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Classify each message group and report its routing.
fn print_statuses(
    args: &BatchArgs,
    outcomes: &[ExtractionOutcome],
    config: &docmatch_core::DocmatchConfig,
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["message_id", "status", "routing", "recipient"])?;

    println!();
    for group in group_by_message(outcomes) {
        let status = classify_message(group);
        let kind = routing_kind(status, group);
        let recipient = resolve_recipient(kind, group, &config.forwarder);

        let status_label = format!("{:?}", status);
        let kind_label = format!("{:?}", kind);
        println!(
            "  {} {} -> {}{}",
            style(&group[0].message_id).dim(),
            status_label,
            kind_label,
            recipient
                .as_deref()
                .map(|r| format!(" ({})", r))
                .unwrap_or_default()
        );

        wtr.write_record([
            group[0].message_id.as_str(),
            &status_label,
            &kind_label,
            recipient.as_deref().unwrap_or(""),
        ])?;
    }

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)?;
        let path = dir.join("statuses.csv");
        let data = String::from_utf8(wtr.into_inner()?)?;
        fs::write(&path, data)?;
        println!(
            "{} Statuses written to {}",
            style("✓").green(),
            path.display()
        );
    }

    Ok(())
}
