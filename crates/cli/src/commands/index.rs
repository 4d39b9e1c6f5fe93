use crate::config::RunConfig;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use triage_capture::{CaptureFile, NormalizedDocument};
use triage_chunker::TextChunker;
use triage_vector_store::VectorStore;

/// Extensions ingested from application source trees.
const SOURCE_EXTENSIONS: &[&str] = &["py", "rb", "js", "php", "html"];

const EMBED_BATCH: usize = 64;

/// Index an HTTP session capture: parse, normalize, chunk, embed, save.
pub async fn session(config: &RunConfig, capture_path: &Path, store_path: &Path) -> Result<()> {
    let capture = CaptureFile::open(capture_path)
        .with_context(|| format!("cannot open capture file {}", capture_path.display()))?;

    let mut skipped = 0usize;
    let records = capture.records_lossy(|_| skipped += 1)?;
    eprintln!(
        "Parsed {} requests from {}",
        records.len(),
        capture_path.display()
    );
    if skipped > 0 {
        eprintln!("Skipped {skipped} record(s) with undecodable payloads");
    }

    let docs: Vec<NormalizedDocument> = records.into_iter().map(Into::into).collect();
    index_documents(config, docs, store_path).await
}

/// Index the reviewable source files of a checked-out tree, one document
/// per file.
pub async fn repo(config: &RunConfig, dir: &Path, store_path: &Path) -> Result<()> {
    let files = collect_source_files(dir)?;
    anyhow::ensure!(
        !files.is_empty(),
        "no reviewable source files under {}",
        dir.display()
    );
    eprintln!("Found {} source files under {}", files.len(), dir.display());

    let mut docs = Vec::with_capacity(files.len());
    for path in files {
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                docs.push(NormalizedDocument::from_text(
                    contents,
                    path.display().to_string(),
                ));
            }
            Err(err) => log::warn!("skipping unreadable {}: {err}", path.display()),
        }
    }

    index_documents(config, docs, store_path).await
}

/// Index one plain-text document (e.g. a pre-extracted guide).
pub async fn text(config: &RunConfig, file: &Path, store_path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let doc = NormalizedDocument::from_text(contents, file.display().to_string());
    index_documents(config, vec![doc], store_path).await
}

/// Shared tail of every ingestion: chunk, embed with progress, snapshot.
pub(crate) async fn index_documents(
    config: &RunConfig,
    docs: Vec<NormalizedDocument>,
    store_path: &Path,
) -> Result<()> {
    let chunker = TextChunker::new(config.chunker_config())?;
    let chunks = chunker.split_documents(&docs);
    anyhow::ensure!(!chunks.is_empty(), "nothing to index");
    eprintln!("Split {} document(s) into {} chunks", docs.len(), chunks.len());

    let embedder = config.embedder()?;
    let mut store = VectorStore::new(store_path, embedder);

    let bar = ProgressBar::new(chunks.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} chunks embedded")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    for batch in chunks.chunks(EMBED_BATCH) {
        store.add_chunks(batch.to_vec()).await?;
        bar.inc(batch.len() as u64);
    }
    bar.finish_and_clear();

    store.save().await?;
    eprintln!("Indexed {} chunks into {}", store.len(), store_path.display());
    Ok(())
}

/// Gitignore-aware walk for reviewable sources, in stable order.
pub(crate) fn collect_source_files(root: &Path) -> Result<Vec<PathBuf>> {
    anyhow::ensure!(
        root.is_dir(),
        "target directory {} does not exist",
        root.display()
    );

    let mut files = Vec::new();
    for result in WalkBuilder::new(root).build() {
        match result {
            Ok(entry) => {
                let is_file = entry.file_type().map(|ft| ft.is_file()).unwrap_or(false);
                if !is_file {
                    continue;
                }
                let path = entry.path();
                let matches = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| SOURCE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                    .unwrap_or(false);
                if matches {
                    files.push(path.to_path_buf());
                }
            }
            Err(err) => log::warn!("failed to read entry: {err}"),
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn collects_only_reviewable_sources_in_order() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("b_views.py"), "x").unwrap();
        fs::write(temp.path().join("a_app.js"), "x").unwrap();
        fs::write(temp.path().join("README.md"), "x").unwrap();
        fs::create_dir(temp.path().join("templates")).unwrap();
        fs::write(temp.path().join("templates").join("index.html"), "x").unwrap();

        let files = collect_source_files(temp.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a_app.js", "b_views.py", "index.html"]);
    }

    #[test]
    fn missing_directory_is_fatal() {
        assert!(collect_source_files(Path::new("/no/such/tree")).is_err());
    }

    #[tokio::test]
    async fn session_ingestion_builds_a_searchable_store() {
        let temp = tempdir().unwrap();
        let capture_path = temp.path().join("session.xml");
        fs::write(
            &capture_path,
            r#"<items>
                <item>
                    <url>http://vtm.example/taskManager/search</url>
                    <method>GET</method>
                    <request base64="true">cT0xJyBPUiAnMSc9JzEn</request>
                    <response base64="false">HTTP/1.1 200 OK</response>
                </item>
            </items>"#,
        )
        .unwrap();

        let store_path = temp.path().join("stores").join("session.json");
        let config = crate::config::RunConfig {
            embeddings_mode: triage_vector_store::EmbeddingMode::Stub,
            ..Default::default()
        };

        session(&config, &capture_path, &store_path).await.unwrap();

        let store =
            VectorStore::load(&store_path, config.embedder().unwrap()).await.unwrap();
        assert_eq!(store.len(), 1);
        let hits = store.search("OR 1 1 injection", 1).await.unwrap();
        // The indexed text carries the decoded payload, not the base64 form.
        assert!(hits[0].chunk.content.contains("q=1' OR '1'='1'"));
        assert!(!hits[0].chunk.content.contains("cT0xJyBPUiAnMSc9JzEn"));
    }

    #[tokio::test]
    async fn missing_capture_file_is_fatal() {
        let config = crate::config::RunConfig {
            embeddings_mode: triage_vector_store::EmbeddingMode::Stub,
            ..Default::default()
        };
        let err = session(
            &config,
            Path::new("/no/such/session.xml"),
            Path::new("/tmp/unused.json"),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("cannot open capture file"));
    }
}
