//! Trip reports under construction: fields, free-text parsing, drafts and
//! the field-completion session that turns a conversation into a report.

mod draft;
mod field;
pub mod parse;
mod session;

pub use draft::ReportError;
pub use field::ReportField;
pub use session::{ReportSession, Step};
