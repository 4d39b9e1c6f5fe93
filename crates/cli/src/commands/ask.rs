use crate::commands::chat_request;
use crate::config::RunConfig;
use crate::output::{write_text_file, StreamSink};
use crate::prompts;
use anyhow::{Context, Result};
use std::path::Path;
use triage_prompt::{ChatTemplate, TemplateVars};
use triage_vector_store::{SearchResult, VectorStore};

/// Retrieval-augmented question answering over an indexed store.
pub async fn run(
    config: &RunConfig,
    question: &str,
    store_path: &Path,
    k: usize,
    out: Option<&Path>,
) -> Result<()> {
    let embedder = config.embedder()?;
    let store = VectorStore::load(store_path, embedder).await.with_context(|| {
        format!(
            "failed to load store {}; run `triage index` first",
            store_path.display()
        )
    })?;

    let hits = store.search(question, k).await?;
    anyhow::ensure!(!hits.is_empty(), "store {} is empty", store_path.display());
    log::info!("retrieved {} chunks for the question", hits.len());

    let chat = ChatTemplate::parse(Some(prompts::SESSION_ANALYST_SYSTEM), prompts::QUESTION_USER)?;
    let rendered = chat.render(
        &TemplateVars::new()
            .with("context", format_context(&hits))
            .with("question", question),
    )?;

    let client = config.llm_client()?;
    let sink = StreamSink::new();
    client
        .complete_streaming(chat_request(config, &rendered), sink.handler())
        .await
        .context("model call failed")?;
    println!();

    if let Some(path) = out {
        write_text_file(path, &sink.take())?;
    }
    Ok(())
}

/// Two-step chain: the first answer feeds the second question.
pub async fn chain(config: &RunConfig, question: &str, next_question: &str) -> Result<()> {
    let client = config.llm_client()?;

    let first = ChatTemplate::parse(Some(prompts::CHAIN_SYSTEM), prompts::CHAIN_FIRST_USER)?
        .render(&TemplateVars::new().with("question", question))?;
    let first_answer = client
        .complete(chat_request(config, &first))
        .await
        .context("first chain step failed")?
        .text();
    log::debug!("first step answered with {} chars", first_answer.len());

    let second = ChatTemplate::parse(Some(prompts::CHAIN_SYSTEM), prompts::CHAIN_SECOND_USER)?
        .render(
            &TemplateVars::new()
                .with("previous_response", first_answer)
                .with("next_question", next_question),
        )?;

    let sink = StreamSink::new();
    client
        .complete_streaming(chat_request(config, &second), sink.handler())
        .await
        .context("second chain step failed")?;
    println!();
    Ok(())
}

/// Retrieved chunks as a citation-friendly context block.
fn format_context(hits: &[SearchResult]) -> String {
    hits.iter()
        .map(|hit| {
            let meta = &hit.chunk.meta;
            if meta.index > 0 {
                format!(
                    "# request {} {} {}\n{}",
                    meta.index, meta.method, meta.url, hit.chunk.content
                )
            } else {
                format!("# {}\n{}", meta.url, hit.chunk.content)
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_capture::DocMeta;
    use triage_chunker::Chunk;

    fn hit(index: usize, url: &str, content: &str) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                content: content.to_string(),
                meta: DocMeta {
                    index,
                    method: if index > 0 { "GET".to_string() } else { String::new() },
                    url: url.to_string(),
                },
                part: 1,
                of: 1,
            },
            score: 0.9,
            id: format!("{url}#{index}"),
        }
    }

    #[test]
    fn context_cites_capture_records_by_index() {
        let rendered = format_context(&[
            hit(3, "http://vtm.example/search", "GET /search?q=x"),
            hit(0, "repo/views.py", "def index(): ..."),
        ]);
        assert!(rendered.contains("# request 3 GET http://vtm.example/search"));
        assert!(rendered.contains("# repo/views.py"));
        assert!(rendered.contains("GET /search?q=x"));
    }
}
