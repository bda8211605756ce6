// src/config.rs
//! Conversion settings read from the INI file.
//!
//! All keys live in the `[Options]` section. The values are resolved and validated once,
//! before any input file is opened, and are read-only afterwards.

use crate::error::{ReportError, Result};
use ini::{Ini, ParseOption, Properties};
use std::path::{Path, PathBuf};

const SECTION: &str = "Options";

pub const DEFAULT_SMTP_PORT: u16 = 25;
pub const DEFAULT_SUBJECT: &str = "CSV to PDF";
pub const DEFAULT_BODY: &str =
    "FYI\n\nDie Mail wurde automatisch erzeugt, bitte nicht darauf antworten.\n";

/// Mail gateway settings. Delivery only happens when [`MailSettings::is_complete`] holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub gateway: String,
    pub port: u16,
    pub sender: String,
    /// When set, the connection is upgraded with STARTTLS and authenticated as `sender`.
    pub password: Option<String>,
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            gateway: String::new(),
            port: DEFAULT_SMTP_PORT,
            sender: String::new(),
            password: None,
            recipients: Vec::new(),
            subject: DEFAULT_SUBJECT.to_string(),
            body: DEFAULT_BODY.to_string(),
        }
    }
}

impl MailSettings {
    pub fn is_complete(&self) -> bool {
        !self.gateway.is_empty() && !self.sender.is_empty() && !self.recipients.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The column whose value change starts a new document.
    pub grouping_column: String,
    /// Columns printed for every record, in this order.
    pub columns: Vec<String>,
    /// Where documents are kept. `None` means documents are only mailed and then removed.
    pub output_directory: Option<PathBuf>,
    pub mail: MailSettings,
    pub verbose: bool,
}

impl Config {
    /// Reads and validates the configuration file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ini = Ini::load_from_file_opt(path, parse_option()).map_err(|e| match e {
            ini::Error::Io(io) => ReportError::Io(io),
            ini::Error::Parse(parse) => ReportError::ConfigValidation(format!(
                "'{}' is not a valid INI file: {}",
                path.display(),
                parse
            )),
        })?;
        Self::from_ini(&ini)
    }

    /// Parses configuration from INI text. Used for embedded configurations and tests.
    pub fn from_ini_str(source: &str) -> Result<Self> {
        let ini = Ini::load_from_str_opt(source, parse_option())
            .map_err(|e| ReportError::ConfigValidation(format!("Invalid INI data: {}", e)))?;
        Self::from_ini(&ini)
    }

    pub fn from_ini(ini: &Ini) -> Result<Self> {
        let empty = Properties::new();
        let options = ini.section(Some(SECTION)).unwrap_or(&empty);
        let value = |key: &str| options.get(key).map(str::trim).unwrap_or("");

        let port = match value("MailgatewayPort") {
            "" => DEFAULT_SMTP_PORT,
            raw => raw.parse::<u16>().map_err(|_| {
                ReportError::ConfigValidation(format!(
                    "MailgatewayPort must be a port number, got '{}'.",
                    raw
                ))
            })?,
        };

        let mail = MailSettings {
            gateway: value("Mailgateway").to_string(),
            port,
            sender: value("MailSender").to_string(),
            password: Some(value("MailSenderPasswort"))
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            recipients: split_list(value("MailEmpfaenger"))
                .into_iter()
                .map(|r| r.to_lowercase())
                .collect(),
            subject: options
                .get("Betreff")
                .map(unescape_newlines)
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            body: options
                .get("Mailtext")
                .map(unescape_newlines)
                .unwrap_or_else(|| DEFAULT_BODY.to_string()),
        };

        let config = Config {
            grouping_column: value("Gruppierungsspalte").to_string(),
            columns: split_list(value("Spalten")),
            output_directory: Some(value("Ausgabeverzeichnis"))
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            mail,
            verbose: is_truthy(value("Debug")),
        };
        config.validate()?;
        Ok(config)
    }

    /// Enables verbose diagnostics regardless of what the file says.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = self.verbose || verbose;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.grouping_column.is_empty() {
            return Err(ReportError::ConfigValidation(
                "The entry Gruppierungsspalte must not be empty.".into(),
            ));
        }
        if self.columns.is_empty() {
            return Err(ReportError::ConfigValidation(
                "No columns were given for the PDF document, the entry Spalten is empty.".into(),
            ));
        }
        if self.output_directory.is_none() && !self.mail.is_complete() {
            return Err(ReportError::ConfigValidation(
                "Neither Ausgabeverzeichnis nor Mailgateway / MailEmpfaenger / MailSender are set."
                    .into(),
            ));
        }
        Ok(())
    }

    pub fn send_mail(&self) -> bool {
        self.mail.is_complete()
    }

    /// Documents are ephemeral when there is no directory to keep them in.
    pub fn is_ephemeral(&self) -> bool {
        self.output_directory.is_none()
    }

    /// A copy that is safe to log: the password is masked.
    pub fn redacted(&self) -> Config {
        let mut copy = self.clone();
        if copy.mail.password.is_some() {
            copy.mail.password = Some("***".into());
        }
        copy
    }
}

/// Values are taken verbatim; indented lines continue the previous value.
fn parse_option() -> ParseOption {
    ParseOption {
        enabled_escape: false,
        enabled_indented_mutiline_value: true,
        ..Default::default()
    }
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins continuation lines without their indentation and turns a literal `\n` into a newline.
fn unescape_newlines(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .replace("\\n", "\n")
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
