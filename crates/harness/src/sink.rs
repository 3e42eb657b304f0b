//! Append-only CSV result store.

use crate::error::Result;
use serde::{Serialize, Serializer};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

pub const HEADER: [&str; 5] = ["Kernel", "WorldSize", "Run", "StatName", "StatValue"];

/// One persisted observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatRecord {
    #[serde(rename = "Kernel")]
    pub kernel: String,
    #[serde(rename = "WorldSize")]
    pub world_size: usize,
    #[serde(rename = "Run")]
    pub run: usize,
    #[serde(rename = "StatName")]
    pub stat_name: String,
    #[serde(rename = "StatValue", serialize_with = "two_decimals")]
    pub stat_value: f64,
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}", value))
}

/// Result file for one backend and kernel family.
///
/// Creation truncates and writes the header; every [`ResultSink::append`]
/// is flushed to the OS before it returns, so an aborted run leaves a
/// readable prefix behind.
pub struct ResultSink {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl ResultSink {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut header = csv::Writer::from_path(&path)?;
        header.write_record(HEADER)?;
        header.flush()?;
        drop(header);

        let file = OpenOptions::new().append(true).open(&path)?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        Ok(Self {
            path,
            writer,
            rows: 0,
        })
    }

    pub fn append(&mut self, record: &StatRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.rows += 1;
        Ok(())
    }

    pub fn close(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        Ok(self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}
