use serde::{Deserialize, Serialize};

/// One logged HTTP transaction, decoded to text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    /// Position in the capture file (1-based)
    pub index: usize,

    /// Full request URL
    pub url: String,

    /// HTTP method
    pub method: String,

    /// Request text, base64-decoded when the capture flagged it
    pub request: String,

    /// Response text, base64-decoded when the capture flagged it
    pub response: String,
}

/// Citation metadata carried from a record through chunking and retrieval
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    /// Source sequence index (1-based), 0 for non-capture documents
    pub index: usize,

    /// HTTP method, empty for non-capture documents
    pub method: String,

    /// Request URL or source path
    pub url: String,
}

/// A record flattened into indexable text plus its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    pub text: String,
    pub meta: DocMeta,
}

impl NormalizedDocument {
    /// Build a document from arbitrary text (repo files, prior run output)
    pub fn from_text(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            meta: DocMeta {
                index: 0,
                method: String::new(),
                url: source.into(),
            },
        }
    }
}

impl From<CaptureRecord> for NormalizedDocument {
    fn from(record: CaptureRecord) -> Self {
        let text = format!("{}\n\n{}", record.request, record.response);
        Self {
            text,
            meta: DocMeta {
                index: record.index,
                method: record.method,
                url: record.url,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_joins_request_and_response() {
        let record = CaptureRecord {
            index: 3,
            url: "http://example.com/login".to_string(),
            method: "POST".to_string(),
            request: "POST /login HTTP/1.1".to_string(),
            response: "HTTP/1.1 302 Found".to_string(),
        };

        let doc = NormalizedDocument::from(record);
        assert_eq!(doc.text, "POST /login HTTP/1.1\n\nHTTP/1.1 302 Found");
        assert_eq!(doc.meta.index, 3);
        assert_eq!(doc.meta.method, "POST");
        assert_eq!(doc.meta.url, "http://example.com/login");
    }

    #[test]
    fn text_documents_carry_their_source() {
        let doc = NormalizedDocument::from_text("fn main() {}", "src/main.rs");
        assert_eq!(doc.meta.index, 0);
        assert_eq!(doc.meta.url, "src/main.rs");
        assert!(doc.meta.method.is_empty());
    }
}
