use thiserror::Error;

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Errors raised while parsing or rendering a prompt template
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateError {
    /// The template references a placeholder with no supplied value
    #[error("no value supplied for placeholder '{name}'")]
    MissingPlaceholder { name: String },

    /// A `{` or `}` is not paired with a closing brace or an escape
    #[error("unbalanced brace at offset {offset}")]
    UnbalancedBrace { offset: usize },

    /// A placeholder name is empty or contains braces
    #[error("invalid placeholder name '{name}'")]
    InvalidName { name: String },
}
