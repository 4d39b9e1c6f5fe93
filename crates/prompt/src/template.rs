use crate::error::{Result, TemplateError};
use std::collections::BTreeMap;

/// An immutable instruction template with named `{placeholder}` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(String),
}

impl PromptTemplate {
    /// Parse a template string. `{{` and `}}` produce literal braces.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.char_indices().peekable();

        while let Some((offset, ch)) = chars.next() {
            match ch {
                '{' => {
                    if matches!(chars.peek(), Some((_, '{'))) {
                        chars.next();
                        literal.push('{');
                        continue;
                    }
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        name.push(inner);
                    }
                    if !closed {
                        return Err(TemplateError::UnbalancedBrace { offset });
                    }
                    let name = name.trim().to_string();
                    if name.is_empty() || name.contains(['{', '}']) || name.contains(char::is_whitespace)
                    {
                        return Err(TemplateError::InvalidName { name });
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(name));
                }
                '}' => {
                    if matches!(chars.peek(), Some((_, '}'))) {
                        chars.next();
                        literal.push('}');
                    } else {
                        return Err(TemplateError::UnbalancedBrace { offset });
                    }
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Names the template references, in first-appearance order, deduplicated.
    pub fn required_placeholders(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for segment in &self.segments {
            if let Segment::Slot(name) = segment {
                if !seen.contains(&name.as_str()) {
                    seen.push(name.as_str());
                }
            }
        }
        seen
    }

    /// Substitute every slot. Fails on the first referenced name with no
    /// value; supplying extra values is allowed.
    pub fn render(&self, vars: &TemplateVars) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(name) => {
                    let value =
                        vars.get(name)
                            .ok_or_else(|| TemplateError::MissingPlaceholder {
                                name: name.clone(),
                            })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

/// Placeholder values for one render.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    values: BTreeMap<String, String>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// A system + user template pair rendered against one set of values.
#[derive(Debug, Clone)]
pub struct ChatTemplate {
    pub system: Option<PromptTemplate>,
    pub user: PromptTemplate,
}

/// The fully substituted prompt, ready to become chat messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: Option<String>,
    pub user: String,
}

impl ChatTemplate {
    /// Parse both slots up front so render can only fail on missing values.
    pub fn parse(system: Option<&str>, user: &str) -> Result<Self> {
        Ok(Self {
            system: system.map(PromptTemplate::parse).transpose()?,
            user: PromptTemplate::parse(user)?,
        })
    }

    pub fn render(&self, vars: &TemplateVars) -> Result<RenderedPrompt> {
        Ok(RenderedPrompt {
            system: self
                .system
                .as_ref()
                .map(|template| template.render(vars))
                .transpose()?,
            user: self.user.render(vars)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn substitutes_named_placeholders() {
        let template = PromptTemplate::parse("Analyze {target} for {issue}.").unwrap();
        let vars = TemplateVars::new()
            .with("target", "login.py")
            .with("issue", "SQL injection");
        assert_eq!(
            template.render(&vars).unwrap(),
            "Analyze login.py for SQL injection."
        );
    }

    #[test]
    fn missing_placeholder_is_an_error() {
        let template = PromptTemplate::parse("<context>{context}</context>").unwrap();
        let err = template.render(&TemplateVars::new()).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingPlaceholder {
                name: "context".to_string()
            }
        );
    }

    #[test]
    fn render_is_deterministic() {
        let template =
            PromptTemplate::parse("{question}\n\n{context}\n\n{question}").unwrap();
        let vars = TemplateVars::new()
            .with("question", "is this exploitable?")
            .with("context", "GET /search?q=1");
        let first = template.render(&vars).unwrap();
        let second = template.render(&vars).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn double_braces_escape_json_examples() {
        let template =
            PromptTemplate::parse("Respond with {{\"finding\": \"{kind}\"}}").unwrap();
        let vars = TemplateVars::new().with("kind", "XSS");
        assert_eq!(
            template.render(&vars).unwrap(),
            "Respond with {\"finding\": \"XSS\"}"
        );
    }

    #[test]
    fn reports_required_placeholders_once_each() {
        let template =
            PromptTemplate::parse("{a} then {b} then {a} again").unwrap();
        assert_eq!(template.required_placeholders(), vec!["a", "b"]);
    }

    #[test]
    fn unbalanced_braces_fail_at_parse_time() {
        assert!(matches!(
            PromptTemplate::parse("dangling {context"),
            Err(TemplateError::UnbalancedBrace { .. })
        ));
        assert!(matches!(
            PromptTemplate::parse("stray } brace"),
            Err(TemplateError::UnbalancedBrace { .. })
        ));
    }

    #[test]
    fn chat_template_renders_both_slots() {
        let chat = ChatTemplate::parse(
            Some("You are a code review assistant.\n<context>{context}</context>"),
            "<question>{question}</question>",
        )
        .unwrap();
        let rendered = chat
            .render(
                &TemplateVars::new()
                    .with("context", "def login(): ...")
                    .with("question", "any flaws?"),
            )
            .unwrap();
        assert_eq!(
            rendered.system.as_deref(),
            Some("You are a code review assistant.\n<context>def login(): ...</context>")
        );
        assert_eq!(rendered.user, "<question>any flaws?</question>");
    }
}
