use crate::commands::chat_request;
use crate::config::RunConfig;
use crate::output::{write_text_file, StreamSink};
use crate::prompts;
use anyhow::{Context, Result};
use std::path::Path;
use triage_capture::CaptureFile;
use triage_prompt::{ChatTemplate, TemplateVars};

/// Per-record batch analysis of a session capture.
///
/// Each record gets its own model call; a transport failure on one record
/// is logged and the batch moves on. The accumulated report is written in
/// one overwrite at the end.
pub async fn session(config: &RunConfig, capture_path: &Path, out: Option<&Path>) -> Result<()> {
    let capture = CaptureFile::open(capture_path)
        .with_context(|| format!("cannot open capture file {}", capture_path.display()))?;
    let records = capture.records_lossy(|err| log::warn!("{err}"))?;
    eprintln!("Parsing {} requests", records.len());

    let chat = ChatTemplate::parse(
        Some(prompts::SESSION_ANALYST_SYSTEM),
        prompts::REQUEST_ANALYSIS_QUESTION,
    )?;
    let client = config.llm_client()?;

    let total = records.len();
    let mut report = String::new();
    let mut failed = 0usize;

    for (position, record) in records.iter().enumerate() {
        eprintln!("=> {}/{}: {}", position + 1, total, record.url);
        report.push_str(&format!("Request {}:\n", record.url));

        // Template gaps are a configuration fault and abort the batch.
        let rendered = chat.render(
            &TemplateVars::new()
                .with("context", record.request.as_str())
                .with("content", record.request.as_str()),
        )?;

        let sink = StreamSink::new();
        match client
            .complete_streaming(chat_request(config, &rendered), sink.handler())
            .await
        {
            Ok(_) => {
                println!();
                report.push_str(&sink.take());
                report.push_str("\n\n");
                eprintln!("=> Complete\n");
            }
            Err(err) => {
                failed += 1;
                report.push('\n');
                log::error!(
                    "analysis failed for record {} ({}): {err}",
                    record.index,
                    record.url
                );
            }
        }
    }

    if failed > 0 {
        eprintln!("{failed} of {total} request(s) failed and were skipped");
    }
    if let Some(path) = out {
        write_text_file(path, &report)?;
    }
    Ok(())
}

/// Re-rank a prior batch report. Single-shot: any failure is fatal.
pub async fn prioritize(config: &RunConfig, analysis_path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(analysis_path)
        .with_context(|| format!("cannot read analysis file {}", analysis_path.display()))?;

    let chat = ChatTemplate::parse(Some(prompts::PRIORITIZE_SYSTEM), prompts::PRIORITIZE_QUESTION)?;
    let rendered = chat.render(&TemplateVars::new().with("content", content))?;

    let client = config.llm_client()?;
    let sink = StreamSink::new();
    client
        .complete_streaming(chat_request(config, &rendered), sink.handler())
        .await
        .context("prioritization call failed")?;
    println!();
    Ok(())
}
