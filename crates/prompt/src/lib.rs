//! # Triage Prompt
//!
//! Instruction templates with named placeholders.
//!
//! A [`PromptTemplate`] is parsed once from a string containing `{name}`
//! slots (`{{` and `}}` escape literal braces, since review instructions
//! often embed JSON examples). Rendering substitutes values from a
//! [`TemplateVars`] map and fails with [`TemplateError::MissingPlaceholder`]
//! when a referenced name has no value — before any model call is made.
//! Rendering is pure: the same template and values always produce the same
//! string.

mod error;
mod template;

pub use error::{Result, TemplateError};
pub use template::{ChatTemplate, PromptTemplate, RenderedPrompt, TemplateVars};
