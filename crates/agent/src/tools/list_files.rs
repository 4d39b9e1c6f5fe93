use crate::tool::{schema_value, Tool};
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

/// Extensions worth reviewing in a web application tree.
const REVIEW_EXTENSIONS: &[&str] = &["py", "rb", "js", "php", "html"];

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListFilesArgs {
    /// Directory path to list contents from
    pub directory: String,
}

/// Recursive, gitignore-aware listing of reviewable source files.
pub struct ListFilesTool {
    matcher: GlobSet,
}

impl ListFilesTool {
    pub fn new() -> Self {
        let mut builder = GlobSetBuilder::new();
        for ext in REVIEW_EXTENSIONS {
            if let Ok(glob) = Glob::new(&format!("*.{ext}")) {
                builder.add(glob);
            }
        }
        Self {
            matcher: builder.build().unwrap_or_else(|_| GlobSet::empty()),
        }
    }

    fn list(&self, directory: &str) -> String {
        let mut files = Vec::new();
        let mut walk_error = None;

        for result in WalkBuilder::new(directory).build() {
            match result {
                Ok(entry) => {
                    let is_file = entry.file_type().map(|ft| ft.is_file()).unwrap_or(false);
                    if !is_file {
                        continue;
                    }
                    let path = entry.path();
                    let name = path.file_name().unwrap_or_default();
                    if self.matcher.is_match(name) {
                        files.push(format!("File: {}", path.display()));
                    }
                }
                Err(err) => {
                    log::debug!("walk error under {directory}: {err}");
                    walk_error.get_or_insert(err.to_string());
                }
            }
        }

        if files.is_empty() {
            if let Some(err) = walk_error {
                return format!("Error listing directory: {err}");
            }
            return format!("No reviewable files found under {directory}");
        }

        files.sort();
        files.join("\n")
    }
}

impl Default for ListFilesTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &'static str {
        "list_files"
    }

    fn description(&self) -> &'static str {
        "Lists reviewable source files in the specified directory"
    }

    fn schema(&self) -> Value {
        schema_value::<ListFilesArgs>()
    }

    async fn call(&self, args: Value) -> String {
        let args: ListFilesArgs = match serde_json::from_value(args) {
            Ok(args) => args,
            Err(err) => return format!("Error: invalid arguments for list_files: {err}"),
        };
        self.list(&args.directory)
    }
}
