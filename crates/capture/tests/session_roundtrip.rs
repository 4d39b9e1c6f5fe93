use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::fs;
use tempfile::tempdir;
use triage_capture::{CaptureFile, NormalizedDocument};

fn transaction(url: &str, method: &str, request: &str, b64: bool) -> String {
    let (flag, body) = if b64 {
        ("true", BASE64.encode(request))
    } else {
        ("false", request.to_string())
    };
    format!(
        "<item>\n  <url>{url}</url>\n  <method>{method}</method>\n  \
         <request base64=\"{flag}\">{body}</request>\n  \
         <response base64=\"false\">HTTP/1.1 200 OK</response>\n</item>"
    )
}

#[test]
fn capture_files_parse_in_order_and_decode_payloads() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("session.xml");

    let payload = "q=1' OR '1'='1'";
    let body = [
        transaction("http://vtm.example/login", "POST", "username=admin", false),
        transaction("http://vtm.example/search", "GET", payload, true),
        transaction("http://vtm.example/logout", "GET", "session=abc", false),
    ]
    .join("\n");
    fs::write(&path, format!("<items>\n{body}\n</items>")).unwrap();

    let capture = CaptureFile::open(&path).unwrap();
    let records = capture.records().unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(
        records.iter().map(|r| r.index).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(records[1].request, payload);

    // Normalization keeps the decoded text, not the transport encoding.
    let doc = NormalizedDocument::from(records[1].clone());
    assert!(doc.text.contains(payload));
    assert!(!doc.text.contains(&BASE64.encode(payload)));

    // Parsing is restartable: a second pass sees the same sequence.
    let again = capture.records().unwrap();
    assert_eq!(again, records);
}

#[test]
fn lossy_parsing_skips_undecodable_records_and_reports_them() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("session.xml");

    let good = transaction("http://vtm.example/a", "GET", "ok=1", false);
    let bad = "<item>\n  <url>http://vtm.example/b</url>\n  <method>GET</method>\n  \
               <request base64=\"true\">%%%not-base64%%%</request>\n  \
               <response base64=\"false\">x</response>\n</item>";
    let tail = transaction("http://vtm.example/c", "GET", "ok=3", false);
    fs::write(&path, format!("<items>{good}{bad}{tail}</items>")).unwrap();

    let capture = CaptureFile::open(&path).unwrap();

    // Strict parsing refuses the batch outright.
    assert!(capture.records().is_err());

    // Lossy parsing keeps the good records and names the skipped one.
    let mut skipped = Vec::new();
    let records = capture
        .records_lossy(|err| skipped.push(err.to_string()))
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].url, "http://vtm.example/a");
    assert_eq!(records[1].url, "http://vtm.example/c");
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].contains("transaction 2"));
}

#[test]
fn opening_a_missing_capture_fails() {
    assert!(CaptureFile::open("/no/such/session.xml").is_err());
}
