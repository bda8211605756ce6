use csv_to_pdf::Config;
use encoding_rs::WINDOWS_1252;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch directory holding input files and an `out` directory for documents.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("out")).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn out_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    /// Writes `lines` as a Windows-1252 encoded CSV file.
    pub fn write_csv(&self, name: &str, lines: &[&str]) -> PathBuf {
        let text = lines.join("\r\n") + "\r\n";
        let (bytes, _, _) = WINDOWS_1252.encode(&text);
        let path = self.dir.path().join(name);
        fs::write(&path, bytes.as_ref()).unwrap();
        path
    }

    /// Writes raw bytes, for input that is not valid Windows-1252.
    pub fn write_bytes(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    /// Every PDF in the output directory, sorted by name.
    pub fn documents(&self) -> Vec<PathBuf> {
        let mut docs: Vec<PathBuf> = fs::read_dir(self.out_dir())
            .unwrap()
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "pdf"))
            .collect();
        docs.sort();
        docs
    }

    /// Configuration that keeps documents in the output directory.
    pub fn keeping_config(&self, grouping: &str, columns: &str) -> Config {
        Config::from_ini_str(&format!(
            "[Options]\nGruppierungsspalte={}\nSpalten={}\nAusgabeverzeichnis={}\n",
            grouping,
            columns,
            self.out_dir().display()
        ))
        .unwrap()
    }

    /// Configuration that mails documents, keeping them only when `keep` is set.
    pub fn mailing_config(&self, grouping: &str, columns: &str, keep: bool) -> Config {
        let mut ini = format!(
            "[Options]\nGruppierungsspalte={}\nSpalten={}\nMailgateway=smtp.example.com\n\
             MailSender=reports@example.com\nMailEmpfaenger=Ann@Example.com, bob@example.com\n\
             Betreff=Weekly report\nMailtext=Attached.\\n\\nRegards\n",
            grouping, columns
        );
        if keep {
            ini.push_str(&format!("Ausgabeverzeichnis={}\n", self.out_dir().display()));
        }
        Config::from_ini_str(&ini).unwrap()
    }
}

/// The `id;name` file used throughout: ids 1, 1, 2.
pub const PEOPLE: &[&str] = &["id;name", "1;Ann", "1;Bea", "2;Cid"];
