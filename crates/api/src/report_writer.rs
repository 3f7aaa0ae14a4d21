// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Writing report sheets to disk.
//!
//! A [`ReportSink`] receives the sheets of one export. The CSV sink stages
//! every file under a temporary name and only renames them into place once
//! all of them have been written, so a failed export leaves nothing behind.

use std::fs;
use std::path::{Path, PathBuf};

use patrol::{REPORT_HEADERS, ReportSheet};
use patrol_domain::ShiftCalendar;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::passphrase::{PassphraseError, PassphrasePolicy};

/// Errors raised while writing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The export passphrase does not satisfy the passphrase policy.
    #[error("Encryption setup failed: {0}")]
    EncryptionSetup(#[from] PassphraseError),

    /// A file could not be written, renamed or removed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The passphrase could not key the seal.
    #[error("Seal key rejected: {0}")]
    SealKey(#[from] hmac::digest::InvalidLength),

    /// A sheet could not be encoded as CSV.
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Files produced by one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReport {
    pub files: Vec<PathBuf>,
    /// The seal file, when a passphrase is configured.
    pub seal: Option<PathBuf>,
}

/// Destination for the sheets of an export.
pub trait ReportSink {
    /// Writes every sheet of one export.
    ///
    /// # Errors
    ///
    /// Returns an error if any sheet cannot be written. No file of this
    /// export is left in place then.
    fn write_report(
        &mut self,
        file_stem: &str,
        sheets: &[ReportSheet],
    ) -> Result<WrittenReport, ExportError>;
}

/// Builds `inspection_<route>_<yyyyMMdd-HHmmss>_to_<yyyyMMdd-HHmmss>`, with
/// characters outside `[A-Za-z0-9_-]` replaced by `_`.
#[must_use]
pub fn report_file_stem(
    calendar: &ShiftCalendar,
    route_label: &str,
    start_ms: i64,
    end_ms: i64,
) -> String {
    let stamp = |at_ms: i64| {
        calendar
            .local_datetime(at_ms)
            .format("%Y%m%d-%H%M%S")
            .to_string()
    };
    sanitize_file_component(&format!(
        "inspection_{route_label}_{}_to_{}",
        stamp(start_ms),
        stamp(end_ms)
    ))
}

fn sanitize_file_component(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Writes each sheet as a CSV file inside one directory.
pub struct CsvReportSink {
    dir: PathBuf,
    passphrase: Option<String>,
}

impl std::fmt::Debug for CsvReportSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvReportSink")
            .field("dir", &self.dir)
            .field("sealed", &self.passphrase.is_some())
            .finish()
    }
}

impl CsvReportSink {
    /// Prepares a sink writing into `dir`, creating it if needed.
    ///
    /// # Arguments
    ///
    /// * `dir` - The export directory
    /// * `passphrase` - Key for the seal file; `None` writes no seal
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::EncryptionSetup`] if the passphrase fails the
    /// passphrase policy, or an I/O error if the directory cannot be created.
    pub fn new(dir: &Path, passphrase: Option<&str>) -> Result<Self, ExportError> {
        if let Some(passphrase) = passphrase {
            PassphrasePolicy::default().validate(passphrase)?;
        }
        fs::create_dir_all(dir).map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        Ok(Self {
            dir: dir.to_path_buf(),
            passphrase: passphrase.map(str::to_string),
        })
    }

    fn encode(sheet: &ReportSheet) -> Result<Vec<u8>, ExportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(REPORT_HEADERS)?;
        for row in &sheet.rows {
            writer.write_record(row.cells())?;
        }
        writer
            .into_inner()
            .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))
    }

    /// One `<hex hmac-sha256>  <file name>` line per file, keyed with the
    /// passphrase over the file name, a NUL byte and the file contents.
    fn seal(
        &self,
        passphrase: &str,
        files: &[(String, Vec<u8>)],
    ) -> Result<Vec<u8>, ExportError> {
        let mut lines: Vec<String> = Vec::with_capacity(files.len());
        for (name, contents) in files {
            lines.push(format!("{}  {name}", seal_digest(passphrase, name, contents)?));
        }
        debug!(files = files.len(), dir = %self.dir.display(), "Computed export seal");
        let mut body: String = lines.join("\n");
        body.push('\n');
        Ok(body.into_bytes())
    }

    fn stage(&self, name: &str, contents: &[u8]) -> Result<(PathBuf, PathBuf), ExportError> {
        let staged: PathBuf = self.dir.join(format!(".{name}.partial"));
        let target: PathBuf = self.dir.join(name);
        fs::write(&staged, contents).map_err(|source| ExportError::Io {
            path: staged.clone(),
            source,
        })?;
        Ok((staged, target))
    }
}

impl ReportSink for CsvReportSink {
    fn write_report(
        &mut self,
        file_stem: &str,
        sheets: &[ReportSheet],
    ) -> Result<WrittenReport, ExportError> {
        let mut encoded: Vec<(String, Vec<u8>)> = Vec::with_capacity(sheets.len());
        for sheet in sheets {
            let name: String = if sheets.len() == 1 {
                format!("{file_stem}.csv")
            } else {
                format!("{file_stem}_{}.csv", sanitize_file_component(&sheet.name))
            };
            encoded.push((name, Self::encode(sheet)?));
        }

        let seal: Option<(String, Vec<u8>)> = match self.passphrase.as_deref() {
            Some(passphrase) => Some((
                format!("{file_stem}.seal"),
                self.seal(passphrase, &encoded)?,
            )),
            None => None,
        };

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();
        for (name, contents) in encoded.iter().chain(seal.iter()) {
            match self.stage(name, contents) {
                Ok(pair) => staged.push(pair),
                Err(err) => {
                    discard(staged.iter().map(|(from, _)| from));
                    return Err(err);
                }
            }
        }

        let mut placed: Vec<PathBuf> = Vec::with_capacity(staged.len());
        for (from, to) in &staged {
            if let Err(source) = fs::rename(from, to) {
                discard(staged.iter().map(|(from, _)| from));
                discard(placed.iter());
                return Err(ExportError::Io {
                    path: to.clone(),
                    source,
                });
            }
            placed.push(to.clone());
        }

        let seal_path: Option<PathBuf> = seal.as_ref().and_then(|_| placed.pop());
        info!(files = placed.len(), sealed = seal_path.is_some(), stem = file_stem, "Wrote report");
        Ok(WrittenReport {
            files: placed,
            seal: seal_path,
        })
    }
}

/// Removes files of a failed export. Files already gone are ignored.
fn discard<'p>(paths: impl Iterator<Item = &'p PathBuf>) {
    for path in paths {
        if let Err(err) = fs::remove_file(path)
            && err.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %path.display(), error = %err, "Could not remove export file");
        }
    }
}

/// Hex HMAC-SHA256 of `name`, a NUL byte and `contents`, keyed with
/// `passphrase`.
///
/// # Errors
///
/// Returns [`ExportError::SealKey`] if the key is rejected.
pub fn seal_digest(passphrase: &str, name: &str, contents: &[u8]) -> Result<String, ExportError> {
    let mut mac: Hmac<Sha256> = Hmac::<Sha256>::new_from_slice(passphrase.as_bytes())?;
    mac.update(name.as_bytes());
    mac.update(&[0_u8]);
    mac.update(contents);
    Ok(hex::encode(mac.finalize().into_bytes()))
}
