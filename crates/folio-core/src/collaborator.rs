//! Seams for the external collaborators: the classifier that proposes a
//! destination for a file, and the optional folder renamer. Their output is
//! an untrusted hint; dedup and merge guarantees never depend on it.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const RENAMER_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub suggested_folder: String,
    pub entity: Option<String>,
    pub entity_type: Option<String>,
}

pub trait Classifier: Send + Sync {
    fn classify(&self, file: &Path) -> Result<Classification, Error>;
}

pub trait FolderRenamer: Send + Sync {
    /// Propose a short descriptive folder label from a sample of file names.
    /// `Ok(None)` means keep the current name.
    fn suggest_name(&self, folder_name: &str, sample: &[String]) -> Result<Option<String>, Error>;
}

/// Offline classifier that files by extension family.
#[derive(Debug, Default, Clone)]
pub struct ExtensionClassifier;

impl ExtensionClassifier {
    fn category_for(extension: &str) -> &'static str {
        match extension {
            "pdf" => "documents/pdf",
            "doc" | "docx" | "docm" | "odt" | "rtf" | "txt" | "md" => "documents",
            "xls" | "xlsx" | "xlsm" | "ods" | "csv" | "tsv" => "spreadsheets",
            "ppt" | "pptx" | "pptm" | "odp" | "key" => "presentations",
            "jpg" | "jpeg" | "png" | "gif" | "heic" | "webp" | "svg" | "tif" | "tiff" => "images",
            "mp3" | "wav" | "flac" | "m4a" | "ogg" => "audio",
            "mp4" | "mov" | "mkv" | "avi" | "webm" => "video",
            "zip" | "tar" | "gz" | "tgz" | "7z" | "rar" => "archives",
            _ => "other",
        }
    }
}

impl Classifier for ExtensionClassifier {
    fn classify(&self, file: &Path) -> Result<Classification, Error> {
        let extension = file
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Ok(Classification {
            suggested_folder: Self::category_for(&extension).to_string(),
            entity: None,
            entity_type: None,
        })
    }
}

/// Renamer backed by an external program. File names are written to its
/// stdin one per line; the first non-empty stdout line is the new label.
#[derive(Debug, Clone)]
pub struct CommandRenamer {
    argv: Vec<String>,
    timeout: Duration,
}

impl CommandRenamer {
    pub fn new(argv: Vec<String>) -> Result<Self, Error> {
        if argv.is_empty() {
            return Err(Error::validation("rename command is empty"));
        }
        Ok(Self {
            argv,
            timeout: Duration::from_secs(30),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl FolderRenamer for CommandRenamer {
    fn suggest_name(&self, folder_name: &str, sample: &[String]) -> Result<Option<String>, Error> {
        let mut child = Command::new(&self.argv[0])
            .args(&self.argv[1..])
            .env("FOLIO_FOLDER_NAME", folder_name)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Collaborator(format!("failed to start {}: {}", self.argv[0], e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            for name in sample {
                writeln!(stdin, "{}", name)
                    .map_err(|e| Error::Collaborator(format!("failed to write sample: {}", e)))?;
            }
        }

        let stdout = child.stdout.take();
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(mut out) = stdout {
                let _ = out.read_to_end(&mut buf);
            }
            buf
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    if let Err(e) = child.kill() {
                        warn!("Could not kill renamer {}: {}", self.argv[0], e);
                    }
                    let _ = child.wait();
                    return Err(Error::Collaborator(format!(
                        "renamer timed out after {:?} for '{}'",
                        self.timeout, folder_name
                    )));
                }
                Ok(None) => thread::sleep(RENAMER_POLL_INTERVAL),
                Err(e) => {
                    return Err(Error::Collaborator(format!("renamer did not finish: {}", e)))
                }
            }
        };
        if !status.success() {
            return Err(Error::Collaborator(format!("renamer exited with {}", status)));
        }

        let output = reader
            .join()
            .map_err(|_| Error::Collaborator("renamer output reader panicked".to_string()))?;
        let stdout = String::from_utf8_lossy(&output);
        let label = stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string);
        debug!("Renamer suggested {:?} for '{}'", label, folder_name);
        Ok(label)
    }
}
