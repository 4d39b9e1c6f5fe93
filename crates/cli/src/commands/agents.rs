use crate::config::RunConfig;
use crate::prompts;
use anyhow::{Context, Result};
use std::path::Path;
use triage_agent::tools::{HttpRequestTool, ListFilesTool, ViewFileTool};
use triage_agent::{AgentConfig, AgentExecutor, Tool};
use triage_prompt::{PromptTemplate, TemplateVars};

/// Agentic static review: the loop explores the tree with the listing and
/// viewing tools and answers with structured findings.
pub async fn audit(config: &RunConfig, dir: &Path) -> Result<()> {
    anyhow::ensure!(
        dir.is_dir(),
        "target directory {} does not exist",
        dir.display()
    );

    let tools: Vec<Box<dyn Tool>> = vec![Box::new(ListFilesTool::new()), Box::new(ViewFileTool)];
    let outcome = run_agent(config, prompts::AUDIT_INSTRUCTIONS, tools, &dir.display().to_string())
        .await
        .context("security audit did not complete")?;
    println!("{}", outcome.answer);
    eprintln!("Audit completed in {} iteration(s)", outcome.iterations);
    Ok(())
}

/// Agentic dynamic probe of one URL through the outbound request tool.
pub async fn probe(config: &RunConfig, url: &str) -> Result<()> {
    let tools: Vec<Box<dyn Tool>> = vec![Box::new(HttpRequestTool::new())];
    let outcome = run_agent(config, prompts::PROBE_INSTRUCTIONS, tools, url)
        .await
        .context("probe did not complete")?;
    println!("{}", outcome.answer);
    eprintln!("Probe completed in {} iteration(s)", outcome.iterations);
    Ok(())
}

async fn run_agent(
    config: &RunConfig,
    instructions: &str,
    tools: Vec<Box<dyn Tool>>,
    task: &str,
) -> Result<triage_agent::AgentOutcome> {
    // Instructions go through the template layer so malformed braces or a
    // forgotten placeholder fail before any model call.
    let instructions = PromptTemplate::parse(instructions)?.render(&TemplateVars::new())?;

    let executor = AgentExecutor::new(
        config.llm_client()?,
        tools,
        AgentConfig {
            model: config.model.clone(),
            max_iterations: config.agent_max_iterations,
            temperature: Some(config.agent_temperature),
            max_tokens: config.max_tokens,
        },
    );
    Ok(executor.run(&instructions, task).await?)
}
