use serde::{Deserialize, Serialize};
use triage_capture::DocMeta;

/// A bounded slice of one document's text, ready for embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// The window text
    pub content: String,

    /// Citation metadata of the originating document
    pub meta: DocMeta,

    /// Position of this window within its document (1-based)
    pub part: usize,

    /// Total windows produced from the document
    pub of: usize,
}

impl Chunk {
    /// Stable identifier used as the store key: source, window position and
    /// a short content fingerprint.
    pub fn id(&self) -> String {
        format!("{}#{}:{}/{}", self.meta.url, self.meta.index, self.part, self.of)
    }

    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
