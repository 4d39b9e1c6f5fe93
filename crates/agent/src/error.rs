use thiserror::Error;

/// Result type for agent runs
pub type Result<T> = std::result::Result<T, AgentError>;

/// Failures of the loop itself; tool failures never surface here.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The model call behind an iteration failed
    #[error("model call failed: {0}")]
    Llm(#[from] triage_llm::LlmError),

    /// The loop did not reach a final answer within the iteration budget
    #[error("no final answer after {0} iterations")]
    IterationLimit(usize),
}
