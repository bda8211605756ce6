pub mod fixtures;
pub mod pdf_assertions;

use csv_to_pdf::{MailTransport, ReportError};
use lettre::Message;
use lopdf::Document as LopdfDocument;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Wrapper around a generated PDF with helper methods
pub struct GeneratedPdf {
    pub doc: LopdfDocument,
}

impl GeneratedPdf {
    pub fn open(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let doc = LopdfDocument::load_mem(&std::fs::read(path)?)?;
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Raw content stream of a 1-based page.
    pub fn page_content(&self, page: u32) -> Vec<u8> {
        let pages = self.doc.get_pages();
        pages
            .get(&page)
            .and_then(|id| self.doc.get_page_content(*id).ok())
            .unwrap_or_default()
    }
}

/// A message handed to [`RecordingTransport`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub recipients: Vec<String>,
    pub raw: String,
}

/// Records messages instead of talking SMTP. Messages whose attachment name contains
/// `fail_on` are rejected.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    pub sent: Arc<Mutex<Vec<SentMessage>>>,
    pub fail_on: Option<String>,
}

impl RecordingTransport {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_on: Some(marker.to_string()),
            ..Default::default()
        }
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl MailTransport for RecordingTransport {
    fn send(&self, message: &Message) -> csv_to_pdf::Result<()> {
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        if let Some(marker) = &self.fail_on {
            if raw.contains(marker.as_str()) {
                return Err(ReportError::Delivery("554 transaction failed".into()));
            }
        }
        let recipients = message.envelope().to().iter().map(|a| a.to_string()).collect();
        self.sent.lock().unwrap().push(SentMessage { recipients, raw });
        Ok(())
    }
}
