use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use crate::types::Chunk;
use triage_capture::NormalizedDocument;
use unicode_segmentation::UnicodeSegmentation;

/// Splits documents into bounded windows with a configured overlap.
///
/// Cut points are chosen per window, best first: a paragraph break, a
/// sentence boundary, a line break, then a hard cutoff at the size limit.
/// Windows never cross document boundaries.
pub struct TextChunker {
    config: ChunkerConfig,
}

impl TextChunker {
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split one document. Errors on empty (or whitespace-only) text.
    pub fn split_document(&self, doc: &NormalizedDocument) -> Result<Vec<Chunk>> {
        if doc.text.trim().is_empty() {
            return Err(ChunkerError::EmptyContent);
        }

        let spans = self.split_spans(&doc.text);
        let of = spans.len();
        Ok(spans
            .into_iter()
            .enumerate()
            .map(|(i, (start, end))| Chunk {
                content: doc.text[start..end].to_string(),
                meta: doc.meta.clone(),
                part: i + 1,
                of,
            })
            .collect())
    }

    /// Split a batch of documents, dropping empty ones with a log line
    /// instead of aborting the batch.
    pub fn split_documents(&self, docs: &[NormalizedDocument]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for doc in docs {
            match self.split_document(doc) {
                Ok(mut split) => chunks.append(&mut split),
                Err(ChunkerError::EmptyContent) => {
                    log::debug!("skipping empty document from {}", doc.meta.url);
                }
                Err(err) => {
                    // Config errors are caught in new(); nothing else is raised.
                    log::warn!("failed to chunk document from {}: {err}", doc.meta.url);
                }
            }
        }
        chunks
    }

    /// Compute byte spans of the windows over `text`.
    fn split_spans(&self, text: &str) -> Vec<(usize, usize)> {
        // Char-index -> byte-offset table; the size limits are char counts.
        let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        bounds.push(text.len());
        let total = bounds.len() - 1;

        let max = self.config.max_chars;
        let overlap = self.config.overlap;

        if total <= max {
            return vec![(0, text.len())];
        }

        let mut spans = Vec::new();
        let mut start = 0usize;
        loop {
            if total - start <= max {
                spans.push((bounds[start], bounds[total]));
                break;
            }

            let hard_end = start + max;
            let cut = self.find_cut(text, &bounds, start, hard_end);
            spans.push((bounds[start], bounds[cut]));

            let next = cut.saturating_sub(overlap);
            // A short natural-boundary chunk must still move the cursor.
            start = if next > start { next } else { cut };
        }

        spans
    }

    /// Pick the cut position (char index) for the window starting at
    /// `start`, bounded by `hard_end`. Cuts are only considered in the
    /// later part of the window so no window degenerates below half size.
    fn find_cut(&self, text: &str, bounds: &[usize], start: usize, hard_end: usize) -> usize {
        let floor = start + (self.config.max_chars / 2).max(self.config.overlap + 1);
        if floor >= hard_end {
            return hard_end;
        }

        let region_start_byte = bounds[floor];
        let region = &text[region_start_byte..bounds[hard_end]];

        // Paragraph break wins outright.
        if let Some(pos) = region.rfind("\n\n") {
            return char_index_for(bounds, region_start_byte + pos + 2);
        }

        // Last sentence boundary inside the region.
        if let Some((offset, _)) = region.split_sentence_bound_indices().last() {
            if offset > 0 {
                return char_index_for(bounds, region_start_byte + offset);
            }
        }

        // Line break, for line-structured transcripts without prose.
        if let Some(pos) = region.rfind('\n') {
            return char_index_for(bounds, region_start_byte + pos + 1);
        }

        hard_end
    }
}

/// Map a byte offset back to its char index. The offset is always produced
/// from valid boundaries, so the lookup cannot miss.
fn char_index_for(bounds: &[usize], byte_offset: usize) -> usize {
    bounds
        .binary_search(&byte_offset)
        .unwrap_or_else(|insert| insert)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use triage_capture::NormalizedDocument;

    fn doc(text: &str) -> NormalizedDocument {
        NormalizedDocument::from_text(text, "test://doc")
    }

    fn chunker(max: usize, overlap: usize) -> TextChunker {
        TextChunker::new(ChunkerConfig::new(max, overlap).unwrap()).unwrap()
    }

    #[test]
    fn short_document_yields_single_identical_chunk() {
        let text = "GET /health HTTP/1.1\n\nHTTP/1.1 200 OK";
        let chunks = chunker(8_000, 100).split_document(&doc(text)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, text);
        assert_eq!(chunks[0].part, 1);
        assert_eq!(chunks[0].of, 1);
    }

    #[test]
    fn boundary_free_text_splits_with_exact_overlap() {
        // 10,000 chars with no break of any kind.
        let text: String = std::iter::repeat('x').take(10_000).collect();
        let chunks = chunker(8_000, 100).split_document(&doc(text.as_str())).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content.len(), 8_000);
        assert_eq!(chunks[1].content.len(), 2_100);

        let tail: String = chunks[0].content.chars().rev().take(100).collect();
        let head: String = chunks[1].content.chars().take(100).collect();
        let tail: String = tail.chars().rev().collect();
        assert_eq!(tail, head);
    }

    #[test]
    fn every_chunk_respects_the_limit() {
        let mut text = String::new();
        for i in 0..400 {
            text.push_str(&format!("line {i} with some parameter payloads\n"));
        }
        let chunker = chunker(500, 50);
        let chunks = chunker.split_document(&doc(&text)).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 500, "chunk of {} chars exceeds limit", chunk.len());
            assert!(!chunk.is_empty());
        }
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let first = "a".repeat(600);
        let second = "b".repeat(600);
        let text = format!("{first}\n\n{second}");
        let chunks = chunker(1_000, 10).split_document(&doc(&text)).unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content.ends_with("a\n\n"));
        assert!(chunks[1].content.starts_with('b') || chunks[1].content.contains('b'));
    }

    #[test]
    fn prefers_sentence_over_hard_cut() {
        let filler = "word ".repeat(150); // 750 chars, no terminator
        let text = format!("{filler}End of thought. {}", "Y".repeat(600));
        let chunks = chunker(1_000, 10).split_document(&doc(&text)).unwrap();

        assert!(chunks.len() >= 2);
        assert!(
            chunks[0].content.trim_end().ends_with("End of thought."),
            "unexpected cut: ...{:?}",
            &chunks[0].content[chunks[0].content.len().saturating_sub(30)..]
        );
    }

    #[test]
    fn multibyte_text_is_never_severed_mid_scalar() {
        let text: String = std::iter::repeat('é').take(5_000).collect();
        let chunks = chunker(2_000, 100).split_document(&doc(&text)).unwrap();
        for chunk in &chunks {
            assert!(chunk.content.chars().all(|c| c == 'é'));
            assert!(chunk.len() <= 2_000);
        }
    }

    #[test]
    fn empty_document_is_rejected() {
        let err = chunker(100, 10).split_document(&doc("   \n  ")).unwrap_err();
        assert!(matches!(err, ChunkerError::EmptyContent));
    }

    #[test]
    fn chunks_keep_their_source_metadata() {
        let record = triage_capture::CaptureRecord {
            index: 7,
            url: "http://vtm.example/taskManager/".to_string(),
            method: "GET".to_string(),
            request: "r".repeat(300),
            response: "s".repeat(300),
        };
        let normalized = NormalizedDocument::from(record);
        let chunks = chunker(250, 25).split_document(&normalized).unwrap();

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.meta.index, 7);
            assert_eq!(chunk.meta.method, "GET");
            assert_eq!(chunk.part, i + 1);
            assert_eq!(chunk.of, chunks.len());
        }
    }

    #[test]
    fn batch_split_skips_empty_documents() {
        let docs = vec![
            NormalizedDocument::from_text("useful content here", "a"),
            NormalizedDocument::from_text("  ", "b"),
            NormalizedDocument::from_text("more useful content", "c"),
        ];
        let chunks = chunker(1_000, 10).split_documents(&docs);
        assert_eq!(chunks.len(), 2);
    }
}
