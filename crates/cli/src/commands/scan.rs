use crate::commands::{chat_request, index};
use crate::config::RunConfig;
use crate::output::StreamSink;
use crate::prompts;
use anyhow::Result;
use std::path::Path;
use triage_capture::NormalizedDocument;
use triage_prompt::{ChatTemplate, TemplateVars};

/// Review every source file with the model, then index the review texts
/// so later questions can retrieve across the whole scan.
pub async fn repo(config: &RunConfig, dir: &Path, store_path: &Path) -> Result<()> {
    let files = index::collect_source_files(dir)?;
    anyhow::ensure!(
        !files.is_empty(),
        "no reviewable source files under {}",
        dir.display()
    );

    let chat = ChatTemplate::parse(Some(prompts::CODE_REVIEW_SYSTEM), prompts::QUESTION_USER)?;
    let client = config.llm_client()?;

    let mut reviews = Vec::new();
    for path in &files {
        let code = match std::fs::read_to_string(path) {
            Ok(code) => code,
            Err(err) => {
                log::warn!("skipping unreadable {}: {err}", path.display());
                continue;
            }
        };

        let title = format!("Analyzing code from {}", path.display());
        eprintln!("\n{title}");
        eprintln!("{}", "=".repeat(title.len()));

        let rendered = chat.render(
            &TemplateVars::new()
                .with("context", code)
                .with("question", prompts::CODE_REVIEW_QUESTION),
        )?;

        let sink = StreamSink::new();
        match client
            .complete_streaming(chat_request(config, &rendered), sink.handler())
            .await
        {
            Ok(_) => {
                println!();
                reviews.push(NormalizedDocument::from_text(
                    sink.take(),
                    path.display().to_string(),
                ));
            }
            Err(err) => {
                log::error!("review failed for {}: {err}", path.display());
            }
        }
    }

    anyhow::ensure!(!reviews.is_empty(), "no files were successfully reviewed");
    index::index_documents(config, reviews, store_path).await
}
