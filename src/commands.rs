//! CLI command handlers. Results go to stdout; diagnostics go through
//! `tracing` to stderr.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use docqa_core::models::Answer;

use crate::config::Config;
use crate::ingest::IngestReport;
use crate::migrate;
use crate::pipeline::{IndexStatus, Pipeline};

pub async fn run_init(config: &Config) -> Result<()> {
    migrate::run_migrations(config).await?;
    println!("Index initialized at {}", config.index.path.display());
    Ok(())
}

pub async fn run_ingest(config: &Config, dir: Option<&Path>) -> Result<()> {
    let dir = dir.unwrap_or(config.ingest.upload_dir.as_path());
    let pipeline = Pipeline::from_config(config).await?;
    let report = pipeline.ingest_all(dir).await;
    print_report(dir, &report);
    Ok(())
}

pub async fn run_ask(config: &Config, question: &str, json: bool) -> Result<()> {
    let pipeline = Pipeline::from_config(config).await?;
    let answer = pipeline.answer(question).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        print_answer(&answer);
    }
    Ok(())
}

pub async fn run_status(config: &Config, json: bool) -> Result<()> {
    let pipeline = Pipeline::from_config(config).await?;
    let status = pipeline.status().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(config, &status);
    }
    Ok(())
}

/// Ingest the upload directory, then answer one question per stdin line
/// until EOF or `exit`.
pub async fn run_interactive(config: &Config) -> Result<()> {
    let pipeline = Pipeline::from_config(config).await?;
    let report = pipeline.ingest_all(&config.ingest.upload_dir).await;
    print_report(&config.ingest.upload_dir, &report);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nquestion> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        match pipeline.answer(question).await {
            Ok(answer) => print_answer(&answer),
            Err(e) => tracing::error!("Failed to answer: {:#}", e),
        }
    }

    Ok(())
}

fn print_report(dir: &Path, report: &IngestReport) {
    println!("ingest {}", dir.display());
    println!("  files ingested: {}", report.ingested.len());
    for file in &report.ingested {
        println!("    {} ({} chunks)", file.name, file.chunks);
    }
    println!("  chunks written: {}", report.total_chunks());
    if !report.failed.is_empty() {
        println!("  files failed: {}", report.failed.len());
        for file in &report.failed {
            println!("    {}: {}", file.name, file.error);
        }
    }
    if report.skipped > 0 {
        println!("  entries skipped: {}", report.skipped);
    }
}

fn print_answer(answer: &Answer) {
    println!("{}", answer.text);
    println!();
    if answer.sources.is_empty() {
        println!("Sources: none");
    } else {
        println!("Sources:");
        for source in &answer.sources {
            println!("  - {}", source);
        }
    }
}

fn print_status(config: &Config, status: &IndexStatus) {
    println!("index {}", config.index.path.display());
    println!("  records: {}", status.records);
    println!("  documents: {}", status.sources.len());
    for source in &status.sources {
        println!("    {} ({} chunks)", source.source, source.records);
    }
}
