//! Turns semicolon-separated CSV exports into one PDF report per group of records.
//!
//! Records are read in file order and split into groups wherever the value of the grouping
//! column changes. Each group is laid out on A4 pages as label/value rows, written as a PDF,
//! and optionally mailed as an attachment.

pub mod config;
pub mod delivery;
pub mod error;
pub mod fonts;
pub mod grouping;
pub mod layout;
pub mod pipeline;
pub mod render;
pub mod source;

pub use config::{Config, MailSettings};
pub use delivery::{DeliveryDispatcher, DeliveryOutcome, MailTransport, SmtpMailTransport};
pub use error::{ReportError, Result};
pub use grouping::{Group, GroupPartitioner};
pub use layout::{LaidOutDocument, PageGeometry, PageLayoutEngine};
pub use pipeline::{FileSummary, GroupOutcome, ReportPipeline, RunSummary};
pub use source::{Record, RecordSource};
