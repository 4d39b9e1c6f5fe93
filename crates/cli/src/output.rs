use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use triage_llm::StreamDeltaHandler;

/// Streams fragments to stdout as they arrive while accumulating the full
/// text for optional persistence.
#[derive(Clone, Default)]
pub struct StreamSink {
    accumulated: Arc<Mutex<String>>,
}

impl StreamSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragment callback: print, flush, accumulate — in arrival order.
    pub fn handler(&self) -> StreamDeltaHandler {
        let accumulated = self.accumulated.clone();
        Arc::new(move |fragment: &str| {
            let mut stdout = std::io::stdout();
            let _ = stdout.write_all(fragment.as_bytes());
            let _ = stdout.flush();
            if let Ok(mut text) = accumulated.lock() {
                text.push_str(fragment);
            }
        })
    }

    /// The full text seen so far, leaving the sink reusable.
    pub fn take(&self) -> String {
        self.accumulated
            .lock()
            .map(|mut text| std::mem::take(&mut *text))
            .unwrap_or_default()
    }
}

/// Whole-file overwrite of a run's accumulated output.
pub fn write_text_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!("Output saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_accumulates_fragments_in_order() {
        let sink = StreamSink::new();
        let handler = sink.handler();
        handler("Possible ");
        handler("Injection: ");
        handler("Yes");
        assert_eq!(sink.take(), "Possible Injection: Yes");
        assert_eq!(sink.take(), "");
    }

    #[test]
    fn write_creates_parent_directories() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("out").join("analysis.txt");
        write_text_file(&path, "Request http://x/:\nNo\n").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Request http://x/:\nNo\n"
        );
    }
}
