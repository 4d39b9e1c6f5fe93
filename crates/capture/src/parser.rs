use crate::error::{CaptureError, Result};
use crate::record::CaptureRecord;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Handle to a session capture on disk.
///
/// Holds only the path; every call to [`CaptureFile::records`] re-reads the
/// file, so the sequence is restartable.
pub struct CaptureFile {
    path: PathBuf,
}

impl CaptureFile {
    /// Open a capture file, failing early when it cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        File::open(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse every transaction; any record-level failure aborts the parse.
    pub fn records(&self) -> Result<Vec<CaptureRecord>> {
        let reader = BufReader::new(File::open(&self.path)?);
        parse_reader(reader)
    }

    /// Parse transactions for batch processing: records whose payload fails
    /// base64 decoding are reported through `on_skip` and dropped, while
    /// structural errors still abort.
    pub fn records_lossy(
        &self,
        mut on_skip: impl FnMut(&CaptureError),
    ) -> Result<Vec<CaptureRecord>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        for entry in parse_entries(reader)? {
            match entry {
                Ok(record) => records.push(record),
                Err(err) if err.is_record_scoped() => {
                    log::warn!("skipping capture record: {err}");
                    on_skip(&err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(records)
    }
}

/// Parse a capture document from any buffered reader.
pub fn parse_reader(reader: impl BufRead) -> Result<Vec<CaptureRecord>> {
    parse_entries(reader)?.into_iter().collect()
}

/// Accumulates the children of one transaction element.
#[derive(Default)]
struct PendingTransaction {
    url: Option<String>,
    method: Option<String>,
    request: Option<(String, bool)>,
    response: Option<(String, bool)>,
}

/// Which transaction child the cursor is inside.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Url,
    Method,
    Request,
    Response,
    Other,
}

impl Field {
    fn from_name(name: &[u8]) -> Self {
        match name {
            b"url" => Self::Url,
            b"method" => Self::Method,
            b"request" => Self::Request,
            b"response" => Self::Response,
            _ => Self::Other,
        }
    }
}

fn parse_entries(
    reader: impl BufRead,
) -> Result<Vec<std::result::Result<CaptureRecord, CaptureError>>> {
    let mut xml = Reader::from_reader(reader);
    let mut buf = Vec::new();

    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut index = 0usize;
    let mut saw_root = false;

    let mut current = PendingTransaction::default();
    let mut field = Field::Other;
    let mut field_b64: Option<bool> = None;
    let mut text = String::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Err(err) => return Err(CaptureError::malformed(err.to_string())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(start)) => {
                depth += 1;
                match depth {
                    1 => saw_root = true,
                    2 => {
                        index += 1;
                        current = PendingTransaction::default();
                    }
                    3 => {
                        field = Field::from_name(start.name().as_ref());
                        field_b64 = read_base64_flag(&start, index)?;
                        text.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(start)) => match depth {
                0 => saw_root = true,
                1 => {
                    // Self-closing transaction carries no fields at all.
                    index += 1;
                    entries.push(Err(CaptureError::MissingField {
                        index,
                        field: "url",
                    }));
                }
                2 => {
                    let empty = Field::from_name(start.name().as_ref());
                    let flag = read_base64_flag(&start, index)?;
                    store_field(&mut current, empty, String::new(), flag);
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if depth == 3 && field != Field::Other {
                    let unescaped = t
                        .unescape()
                        .map_err(|err| CaptureError::malformed(err.to_string()))?;
                    text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(t)) => {
                if depth == 3 && field != Field::Other {
                    text.push_str(&String::from_utf8_lossy(t.as_ref()));
                }
            }
            Ok(Event::End(_)) => {
                match depth {
                    3 => {
                        store_field(&mut current, field, std::mem::take(&mut text), field_b64);
                        field = Field::Other;
                        field_b64 = None;
                    }
                    2 => {
                        entries.push(finish_transaction(
                            index,
                            std::mem::take(&mut current),
                        ));
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Ok(_) => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(CaptureError::malformed("capture file has no root element"));
    }

    Ok(entries)
}

/// Read the `base64` attribute; only request/response are expected to carry
/// one, so absence is reported by the caller when it matters.
fn read_base64_flag(start: &BytesStart<'_>, index: usize) -> Result<Option<bool>> {
    for attr in start.attributes() {
        let attr = attr.map_err(|err| CaptureError::malformed(err.to_string()))?;
        if attr.key.as_ref() != b"base64" {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|err| CaptureError::malformed(err.to_string()))?;
        return match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            other => Err(CaptureError::malformed(format!(
                "transaction {index}: unrecognized base64 flag '{other}'"
            ))),
        };
    }
    Ok(None)
}

fn store_field(current: &mut PendingTransaction, field: Field, text: String, b64: Option<bool>) {
    match field {
        Field::Url => current.url = Some(text),
        Field::Method => current.method = Some(text),
        Field::Request => current.request = Some((text, b64.unwrap_or(false))),
        Field::Response => current.response = Some((text, b64.unwrap_or(false))),
        Field::Other => {}
    }
}

fn finish_transaction(
    index: usize,
    pending: PendingTransaction,
) -> std::result::Result<CaptureRecord, CaptureError> {
    let url = require_text(pending.url, index, "url")?;
    let method = require_text(pending.method, index, "method")?;
    let (request_raw, request_b64) = pending
        .request
        .ok_or(CaptureError::MissingField {
            index,
            field: "request",
        })?;
    let (response_raw, response_b64) = pending
        .response
        .ok_or(CaptureError::MissingField {
            index,
            field: "response",
        })?;

    let request = decode_field(request_raw, request_b64, index, "request")?;
    let response = decode_field(response_raw, response_b64, index, "response")?;

    Ok(CaptureRecord {
        index,
        url,
        method,
        request,
        response,
    })
}

fn require_text(
    value: Option<String>,
    index: usize,
    field: &'static str,
) -> std::result::Result<String, CaptureError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(CaptureError::MissingField { index, field }),
    }
}

fn decode_field(
    raw: String,
    is_b64: bool,
    index: usize,
    field: &'static str,
) -> std::result::Result<String, CaptureError> {
    if !is_b64 {
        return Ok(raw);
    }
    let compact: String = raw.split_whitespace().collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|_| CaptureError::Decode { index, field })?;
    String::from_utf8(bytes).map_err(|_| CaptureError::Decode { index, field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn parse_str(xml: &str) -> Result<Vec<CaptureRecord>> {
        parse_reader(Cursor::new(xml.as_bytes()))
    }

    #[test]
    fn yields_records_in_file_order_with_sequential_indices() {
        let xml = r#"<items>
            <item>
                <url>http://a.example/one</url>
                <method>GET</method>
                <request base64="false">GET /one HTTP/1.1</request>
                <response base64="false">HTTP/1.1 200 OK</response>
            </item>
            <item>
                <url>http://a.example/two</url>
                <method>POST</method>
                <request base64="false">POST /two HTTP/1.1</request>
                <response base64="false">HTTP/1.1 302 Found</response>
            </item>
        </items>"#;

        let records = parse_str(xml).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].index, 1);
        assert_eq!(records[1].index, 2);
        assert_eq!(records[0].url, "http://a.example/one");
        assert_eq!(records[1].method, "POST");
    }

    #[test]
    fn decodes_base64_flagged_fields() {
        // "cT0xJyBPUiAnMSc9JzEn" is base64 for a classic injection probe.
        let xml = r#"<items>
            <item>
                <url>http://a.example/search</url>
                <method>GET</method>
                <request base64="true">cT0xJyBPUiAnMSc9JzEn</request>
                <response base64="false">HTTP/1.1 200 OK</response>
            </item>
        </items>"#;

        let records = parse_str(xml).unwrap();
        assert_eq!(records[0].request, "q=1' OR '1'='1'");
    }

    #[test]
    fn bad_base64_names_the_record() {
        let xml = r#"<items>
            <item>
                <url>http://a.example/</url>
                <method>GET</method>
                <request base64="true">!!! not base64 !!!</request>
                <response base64="false">ok</response>
            </item>
        </items>"#;

        let err = parse_str(xml).unwrap_err();
        match err {
            CaptureError::Decode { index, field } => {
                assert_eq!(index, 1);
                assert_eq!(field, "request");
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn missing_field_is_fatal() {
        let xml = r#"<items>
            <item>
                <url>http://a.example/</url>
                <request base64="false">x</request>
                <response base64="false">y</response>
            </item>
        </items>"#;

        let err = parse_str(xml).unwrap_err();
        match err {
            CaptureError::MissingField { index, field } => {
                assert_eq!(index, 1);
                assert_eq!(field, "method");
            }
            other => panic!("expected missing field error, got {other:?}"),
        }
    }

    #[test]
    fn truncated_markup_is_malformed() {
        let xml = r#"<items><item><url>http://a.example/</url>"#;
        // quick-xml reports the dangling elements at EOF
        let result = parse_str(xml);
        assert!(matches!(result, Err(CaptureError::Malformed(_))) || result.unwrap().is_empty());
    }

    #[test]
    fn unknown_children_are_ignored() {
        let xml = r#"<items>
            <item>
                <time>Mon Jan 1</time>
                <url>http://a.example/</url>
                <method>GET</method>
                <request base64="false">req</request>
                <response base64="false">resp</response>
                <comment/>
            </item>
        </items>"#;

        let records = parse_str(xml).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].request, "req");
    }
}
