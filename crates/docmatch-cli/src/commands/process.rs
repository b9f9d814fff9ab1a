//! Process command - run the pipeline over a single document file.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use console::style;
use tracing::info;

use docmatch_core::{Attachment, ExtractionOutcome, Message, Pipeline, TerminalStage};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input document (PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Population snapshot CSV (falls back to the config)
    #[arg(short, long)]
    population: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV table
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("input file not found: {}", args.input.display());
    }

    let config = super::load_config(config_path)?;
    let snapshot = super::load_snapshot(args.population.as_ref(), &config)?;
    info!(records = snapshot.len(), "population snapshot loaded");

    let name = args
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();
    let content = fs::read(&args.input)?;

    // A loose file is treated as a one-attachment message.
    let message = Message {
        id: args.input.display().to_string(),
        folder_id: None,
        sender: "local".to_string(),
        subject: name.clone(),
        received_at: Utc::now(),
        is_read: false,
        flagged: false,
        attachments: vec![Attachment::new(name.clone(), name, content)],
    };

    let pipeline = Pipeline::new(&config, snapshot)?;
    let outcomes = pipeline.process_message(&message).await;

    let output = format_outcomes(&outcomes, args.format)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    let matched = outcomes.iter().filter(|o| o.stage.is_matched()).count();
    println!(
        "{} {} outcome record(s), {} matched",
        style("✓").green(),
        outcomes.len(),
        matched
    );

    Ok(())
}

pub(crate) fn stage_label(stage: TerminalStage) -> &'static str {
    match stage {
        TerminalStage::NoAttachments => "no_attachments",
        TerminalStage::NotPdf => "not_pdf",
        TerminalStage::NotParsed => "not_parsed",
        TerminalStage::NoDates => "no_dates",
        TerminalStage::NoValidDate => "no_valid_date",
        TerminalStage::NoCandidates => "no_candidates",
        TerminalStage::NoNameMatch => "no_name_match",
        TerminalStage::Matched => "matched",
    }
}

pub(crate) fn format_outcomes(
    outcomes: &[ExtractionOutcome],
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(outcomes)?),
        OutputFormat::Csv => outcomes_csv(outcomes),
        OutputFormat::Text => Ok(outcomes_text(outcomes)),
    }
}

pub(crate) fn outcomes_csv(outcomes: &[ExtractionOutcome]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "message_id",
        "attachment_id",
        "attachment_name",
        "stage",
        "is_pdf",
        "is_parsed",
        "institutes",
        "amounts",
        "date_candidates_found",
        "search_date",
        "has_candidates",
        "resolver_error",
        "found_student",
        "match_count",
        "match_index",
        "student_number",
        "surname",
        "birth_date",
        "enrollment_type",
        "program",
        "faculty",
        "status",
    ])?;

    for outcome in outcomes {
        let institutes = outcome.institutes.iter().cloned().collect::<Vec<_>>().join(", ");
        let amounts = outcome.amounts.iter().cloned().collect::<Vec<_>>().join(", ");
        let student = outcome.student.as_ref();

        wtr.write_record([
            outcome.message_id.as_str(),
            outcome.attachment_id.as_deref().unwrap_or(""),
            outcome.attachment_name.as_deref().unwrap_or(""),
            stage_label(outcome.stage),
            &outcome.is_pdf.to_string(),
            &outcome.is_parsed.to_string(),
            &institutes,
            &amounts,
            &outcome.date_candidates_found.to_string(),
            &outcome
                .search_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            &outcome.has_candidates.to_string(),
            &outcome.resolver_error.to_string(),
            &outcome.found_student.to_string(),
            &outcome.match_count.to_string(),
            &outcome
                .match_index
                .map(|i| i.to_string())
                .unwrap_or_default(),
            student.map(|s| s.student_number.as_str()).unwrap_or(""),
            student.map(|s| s.surname.as_str()).unwrap_or(""),
            &student
                .map(|s| s.birth_date.to_string())
                .unwrap_or_default(),
            student.map(|s| s.enrollment_type.as_str()).unwrap_or(""),
            student.and_then(|s| s.program.as_deref()).unwrap_or(""),
            student.and_then(|s| s.faculty.as_deref()).unwrap_or(""),
            student.and_then(|s| s.status.as_deref()).unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn outcomes_text(outcomes: &[ExtractionOutcome]) -> String {
    let mut output = String::new();

    for outcome in outcomes {
        let subject = match outcome.attachment_name.as_deref() {
            Some(name) => format!(
                "{} ({})",
                name,
                outcome.attachment_id.as_deref().unwrap_or("-")
            ),
            None => "(no attachments)".to_string(),
        };
        output.push_str(&format!("{} -> {}\n", subject, stage_label(outcome.stage)));

        if !outcome.institutes.is_empty() {
            let institutes = outcome.institutes.iter().cloned().collect::<Vec<_>>();
            output.push_str(&format!("  institutes: {}\n", institutes.join(", ")));
        }
        if !outcome.amounts.is_empty() {
            let amounts = outcome.amounts.iter().cloned().collect::<Vec<_>>();
            output.push_str(&format!("  amounts: {}\n", amounts.join(", ")));
        }
        if let Some(date) = outcome.search_date {
            output.push_str(&format!(
                "  search date: {} ({} candidate substrings)\n",
                date, outcome.date_candidates_found
            ));
        }
        if let Some(student) = &outcome.student {
            output.push_str(&format!(
                "  student: {} {} ({}), program {}, faculty {}\n",
                student.student_number,
                student.surname,
                student.enrollment_id,
                student.program.as_deref().unwrap_or("-"),
                student.faculty.as_deref().unwrap_or("-"),
            ));
        }
    }

    output
}
