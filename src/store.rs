//! Append-only CSV persistence for customer records
//!
//! The store is a single CSV file. The header row is written once, when the
//! first record is appended; later appends add one row each. `clear` keeps
//! the header and drops every row by rewriting the file through a sibling
//! temp file and a rename.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::data::{CustomerRecord, HEADER};
use crate::error::SegmentError;

/// Result of [`RecordStore::clear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// Rows were removed; the header was kept.
    Cleared { removed: usize },
    /// The store held no rows, nothing was written.
    AlreadyEmpty,
}

/// Handle to the customer CSV file. Holds no open file between calls.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Append one record, writing the header first if the file is new or
    /// zero bytes long.
    #[instrument(level = "debug", skip(self, record), fields(path = %self.path.display()))]
    pub fn append(&self, record: &CustomerRecord) -> crate::Result<()> {
        let needs_header = match fs::metadata(&self.path) {
            Ok(metadata) => metadata.len() == 0,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => return Err(SegmentError::access(&self.path, e)),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SegmentError::access(&self.path, e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer
            .serialize(record)
            .map_err(|e| self.write_error(e))?;
        writer
            .flush()
            .map_err(|e| SegmentError::access(&self.path, e))?;

        info!(
            first_name = %record.first_name,
            last_name = %record.last_name,
            created = needs_header,
            "appended customer record"
        );
        Ok(())
    }

    /// Every stored record, in insertion order.
    ///
    /// A header-only or zero-byte file yields an empty vector. A header that
    /// is not the customer header, or a row that does not parse, is a
    /// [`SegmentError::MalformedStore`].
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub fn load_all(&self) -> crate::Result<Vec<CustomerRecord>> {
        let file = File::open(&self.path).map_err(|e| SegmentError::from_io(&self.path, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|e| SegmentError::from_csv(&self.path, e))?
            .clone();
        if headers.is_empty() {
            return Ok(Vec::new());
        }
        if headers.iter().ne(HEADER.iter().copied()) {
            return Err(SegmentError::MalformedStore {
                path: self.path.display().to_string(),
                message: format!(
                    "unexpected header {:?}, expected {:?}",
                    headers.iter().collect::<Vec<_>>(),
                    HEADER
                ),
            });
        }

        let records = reader
            .deserialize()
            .collect::<Result<Vec<CustomerRecord>, _>>()
            .map_err(|e| SegmentError::from_csv(&self.path, e))?;

        debug!(count = records.len(), "loaded customer records");
        Ok(records)
    }

    /// Remove every data row while keeping the header.
    ///
    /// Rows are counted without parsing them, so a store with damaged rows
    /// can still be cleared.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub fn clear(&self) -> crate::Result<ClearOutcome> {
        let file = File::open(&self.path).map_err(|e| SegmentError::from_io(&self.path, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let mut rows = 0usize;
        for row in reader.byte_records() {
            row.map_err(|e| SegmentError::from_csv(&self.path, e))?;
            rows += 1;
        }

        if rows == 0 {
            info!("customer data file is already empty");
            return Ok(ClearOutcome::AlreadyEmpty);
        }

        self.rewrite_header_only()?;
        info!(removed = rows, "cleared customer data");
        Ok(ClearOutcome::Cleared { removed: rows })
    }

    fn rewrite_header_only(&self) -> crate::Result<()> {
        let temp_path = self.path.with_extension("tmp");

        let file = File::create(&temp_path).map_err(|e| SegmentError::access(&temp_path, e))?;
        let mut writer = csv::Writer::from_writer(file);
        writer
            .write_record(HEADER)
            .map_err(|e| self.write_error(e))?;
        let file = writer
            .into_inner()
            .map_err(|e| SegmentError::access(&temp_path, e.into_error()))?;
        file.sync_all()
            .map_err(|e| SegmentError::access(&temp_path, e))?;

        fs::rename(&temp_path, &self.path).map_err(|e| SegmentError::access(&self.path, e))?;
        Ok(())
    }

    /// I/O failures are `Permission`; a row the csv encoder refuses is
    /// `MalformedStore`.
    fn write_error(&self, err: csv::Error) -> SegmentError {
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(source) => SegmentError::access(&self.path, source),
            _ => SegmentError::MalformedStore {
                path: self.path.display().to_string(),
                message,
            },
        }
    }
}
