//! Per-epoch CSV training log
//!
//! One header line followed by one row per epoch:
//!
//! ```text
//! epoch, categorical_crossentropy, accuracy, val_categorical_crossentropy, val_accuracy, save
//! 0, 2.2741, 0.148, 2.2803, 0.1391, *
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Column header of the log file
pub const LOG_HEADER: &str =
    "epoch, categorical_crossentropy, accuracy, val_categorical_crossentropy, val_accuracy, save";

/// One row of the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: usize,
    #[serde(rename = "categorical_crossentropy")]
    pub crossentropy: f32,
    pub accuracy: f32,
    #[serde(rename = "val_categorical_crossentropy")]
    pub val_crossentropy: f32,
    pub val_accuracy: f32,
    #[serde(rename = "save", with = "save_marker")]
    pub saved: bool,
}

impl EpochRecord {
    // csv::Writer only takes single-byte delimiters, not the ", " this format uses
    fn to_line(&self) -> String {
        format!(
            "{}, {}, {}, {}, {}, {}",
            self.epoch,
            self.crossentropy,
            self.accuracy,
            self.val_crossentropy,
            self.val_accuracy,
            if self.saved { "*" } else { "-" }
        )
    }
}

/// `*` marks an epoch whose weights were saved
mod save_marker {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(saved: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(if *saved { "*" } else { "-" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        match String::deserialize(d)?.as_str() {
            "*" => Ok(true),
            "-" => Ok(false),
            other => Err(de::Error::custom(format!("invalid save marker '{other}'"))),
        }
    }
}

/// Append-only log, flushed after every row
pub struct EpochLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl EpochLog {
    /// Create (or truncate) the log and write the header
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut writer = BufWriter::new(File::create(&path)?);
        writeln!(writer, "{LOG_HEADER}")?;
        writer.flush()?;
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row and flush it to disk
    pub fn append(&mut self, record: &EpochRecord) -> Result<()> {
        writeln!(self.writer, "{}", record.to_line())?;
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and close the file
    pub fn close(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Read every row of a log written by [`EpochLog`]
pub fn read_log(path: impl AsRef<Path>) -> Result<Vec<EpochRecord>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| Error::Serialization(format!("{}: {e}", path.display())))?;
    reader
        .deserialize()
        .map(|row| row.map_err(Error::from))
        .collect()
}
