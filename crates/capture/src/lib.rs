//! # Triage Capture
//!
//! Parser for logged HTTP session captures.
//!
//! A capture file is an XML document whose root holds one element per
//! recorded transaction, each carrying `url`, `method`, `request` and
//! `response` children. Request and response bodies may be base64-encoded,
//! indicated by a `base64` attribute on the element. Parsing yields
//! [`CaptureRecord`]s in file order with 1-based sequence indices, which
//! normalize 1:1 into [`NormalizedDocument`]s ready for chunking and
//! indexing.
//!
//! ## Example
//!
//! ```no_run
//! use triage_capture::CaptureFile;
//!
//! fn main() -> Result<(), triage_capture::CaptureError> {
//!     let capture = CaptureFile::open("data/session.xml")?;
//!     for record in capture.records()? {
//!         println!("{} {} {}", record.index, record.method, record.url);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod parser;
mod record;

pub use error::{CaptureError, Result};
pub use parser::{parse_reader, CaptureFile};
pub use record::{CaptureRecord, DocMeta, NormalizedDocument};
