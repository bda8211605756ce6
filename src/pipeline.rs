// src/pipeline.rs
//! Drives input files through grouping, layout, rendering and delivery.
//!
//! Processing is strictly sequential: one file at a time, and within a file one group at a
//! time, each group rendered and delivered before the next one is read.
//!
//! Failure scopes:
//! - an invalid configuration or input pattern stops the run before any file is read;
//! - a missing grouping column or an undecodable row stops the current file;
//! - a failed write or delivery is reported and the next group is processed.

use crate::config::Config;
use crate::delivery::{DeliveryDispatcher, DeliveryOutcome, MailTransport};
use crate::error::{ReportError, Result};
use crate::grouping::{Group, GroupPartitioner};
use crate::layout::PageLayoutEngine;
use crate::render::render_to_file;
use crate::source::RecordSource;
use chrono::{Local, NaiveDateTime};
use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// What happened to one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOutcome {
    pub key: String,
    pub document: PathBuf,
    pub pages: usize,
    pub delivery: DeliveryOutcome,
    /// False when the document was ephemeral and has been removed.
    pub kept: bool,
}

/// What happened to one input file. Groups finished before an abort are still listed.
#[derive(Debug, Default)]
pub struct FileSummary {
    pub groups: Vec<GroupOutcome>,
    pub failed_groups: usize,
    /// The error that stopped the file early, if any.
    pub error: Option<ReportError>,
}

impl FileSummary {
    pub fn delivered(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| g.delivery == DeliveryOutcome::Sent)
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_processed: usize,
    pub files_failed: usize,
    pub documents_written: usize,
    pub documents_delivered: usize,
    pub failed_groups: usize,
}

impl RunSummary {
    fn add_file(&mut self, file: &FileSummary) {
        if file.error.is_some() {
            self.files_failed += 1;
        } else {
            self.files_processed += 1;
        }
        self.documents_written += file.groups.len();
        self.documents_delivered += file.delivered();
        self.failed_groups += file.failed_groups;
    }

    pub fn has_failures(&self) -> bool {
        self.files_failed > 0 || self.failed_groups > 0
    }
}

/// The report generator for one configuration.
pub struct ReportPipeline {
    config: Config,
    layout: PageLayoutEngine,
    dispatcher: DeliveryDispatcher,
    /// Holds ephemeral documents when no output directory is configured; removed on drop.
    scratch: Option<TempDir>,
}

impl ReportPipeline {
    /// Creates a pipeline that mails through SMTP when mail is configured.
    pub fn new(config: Config) -> Result<Self> {
        let dispatcher = DeliveryDispatcher::from_config(&config);
        Self::build(config, dispatcher)
    }

    /// Creates a pipeline that hands messages to `transport` instead of SMTP.
    pub fn with_transport(config: Config, transport: Box<dyn MailTransport>) -> Result<Self> {
        let dispatcher = DeliveryDispatcher::with_transport(&config, Some(transport));
        Self::build(config, dispatcher)
    }

    fn build(config: Config, dispatcher: DeliveryDispatcher) -> Result<Self> {
        config.validate()?;
        let scratch = if config.is_ephemeral() {
            Some(tempfile::Builder::new().prefix("csv-to-pdf-").tempdir()?)
        } else {
            None
        };
        Ok(Self {
            config,
            layout: PageLayoutEngine::default(),
            dispatcher,
            scratch,
        })
    }

    /// Directory documents are written to.
    pub fn output_dir(&self) -> &Path {
        match (&self.config.output_directory, &self.scratch) {
            (Some(dir), _) => dir.as_path(),
            (None, Some(scratch)) => scratch.path(),
            (None, None) => Path::new("."),
        }
    }

    /// Processes every file matching `pattern`, in the order the pattern expands to.
    ///
    /// Errors confined to one file are logged and counted; only an invalid pattern fails the run.
    pub fn run(&self, pattern: &str) -> Result<RunSummary> {
        let paths = glob::glob(pattern).map_err(|e| {
            ReportError::ConfigValidation(format!("Invalid input pattern '{}': {}", pattern, e))
        })?;

        let mut summary = RunSummary::default();
        let mut matched = 0;
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Skipping unreadable path: {}", e);
                    continue;
                }
            };
            if path.is_dir() {
                debug!("Skipping directory {}", path.display());
                continue;
            }
            matched += 1;
            let file = self.convert_file(&path);
            if let Some(e) = &file.error {
                error!("{}", e);
            }
            summary.add_file(&file);
        }

        if matched == 0 {
            warn!("No input files match '{}'", pattern);
        }
        info!(
            "Finished: {} file(s), {} document(s) written, {} mailed, {} failed group(s), {} failed file(s)",
            summary.files_processed,
            summary.documents_written,
            summary.documents_delivered,
            summary.failed_groups,
            summary.files_failed
        );
        Ok(summary)
    }

    /// Converts one input file. Group-level failures are logged and counted in the summary.
    pub fn process_file(&self, input: &Path) -> Result<FileSummary> {
        let mut summary = self.convert_file(input);
        match summary.error.take() {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    /// Like [`ReportPipeline::process_file`], but an error that stops the file is stored in
    /// the summary next to the groups completed before it.
    pub fn convert_file(&self, input: &Path) -> FileSummary {
        let mut summary = FileSummary::default();
        if let Err(e) = self.convert_groups(input, &mut summary) {
            summary.error = Some(e);
        }
        summary
    }

    fn convert_groups(&self, input: &Path, summary: &mut FileSummary) -> Result<()> {
        info!("Processing: {}", input.display());
        let source = RecordSource::open(input)?;
        if !source.headers().contains(&self.config.grouping_column) {
            return Err(ReportError::MissingColumn {
                column: self.config.grouping_column.clone(),
                file: input.to_path_buf(),
            });
        }
        let groups = GroupPartitioner::new(
            source,
            &self.config.grouping_column,
            &self.config.columns,
            input,
        );

        for group in groups {
            let group = group?;
            let key = group.key.clone();
            match self.process_group(input, group) {
                Ok(outcome) => summary.groups.push(outcome),
                Err(e) => {
                    error!("Group '{}' of {}: {}", key, input.display(), e);
                    summary.failed_groups += 1;
                }
            }
        }
        Ok(())
    }

    /// Lays out, writes and delivers the document for one group.
    pub fn process_group(&self, input: &Path, group: Group) -> Result<GroupOutcome> {
        let laid_out = self
            .layout
            .layout(&self.config.grouping_column, &self.config.columns, &group);
        debug!(
            "Group '{}': {} record(s) on {} page(s)",
            group.key,
            group.records.len(),
            laid_out.pages.len()
        );

        let file_name = document_file_name(&Local::now().naive_local(), &group.key, input);
        let document = unique_path(self.output_dir(), &file_name);
        if let Err(e) = render_to_file(&laid_out, &document) {
            let _ = fs::remove_file(&document);
            return Err(e);
        }
        info!("Created {}", document.display());

        let delivery = self.dispatcher.deliver(&document)?;
        Ok(GroupOutcome {
            key: group.key,
            pages: laid_out.pages.len(),
            kept: !self.config.is_ephemeral(),
            document,
            delivery,
        })
    }
}

/// `<YYYYMMDD_HHMMSS>_<group key>_<input stem>.pdf`
pub fn document_file_name(timestamp: &NaiveDateTime, key: &str, input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(
        "{}_{}_{}.pdf",
        timestamp.format("%Y%m%d_%H%M%S"),
        sanitize_file_component(key),
        stem
    )
}

/// Replaces characters that cannot appear in a file name.
fn sanitize_file_component(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// `dir/name`, or `dir/name` with `_2`, `_3`, ... before the extension if that file exists.
fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let stem = name.strip_suffix(".pdf").unwrap_or(name);
    (2..)
        .map(|n| dir.join(format!("{}_{}.pdf", stem, n)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}
