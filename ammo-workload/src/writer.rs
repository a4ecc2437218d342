//! Persisting ammo records to a byte sink.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::request::{AmmoRecord, Tag};

/// Counters describing what an [`AmmoWriter`] has written.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WriteStats {
    /// Total number of records.
    pub records: u64,
    /// Number of `put` records.
    pub puts: u64,
    /// Number of `get` records.
    pub gets: u64,
    /// Bytes written, header lines included.
    pub bytes: u64,
}

impl WriteStats {
    fn add(&mut self, record: &AmmoRecord) {
        self.records += 1;
        match record.tag() {
            Tag::Put => self.puts += 1,
            Tag::Get => self.gets += 1,
        }
        self.bytes += record.encoded_len() as u64;
    }
}

/// Writes records verbatim and in order to a buffered sink.
#[derive(Debug)]
pub struct AmmoWriter<W: Write> {
    sink: BufWriter<W>,
    stats: WriteStats,
}

impl AmmoWriter<File> {
    /// Creates or truncates the file at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> AmmoWriter<W> {
    /// Wraps `sink` into a buffered writer.
    pub fn new(sink: W) -> Self {
        Self {
            sink: BufWriter::new(sink),
            stats: WriteStats::default(),
        }
    }

    /// Appends a single record.
    pub fn write_record(&mut self, record: &AmmoRecord) -> io::Result<()> {
        record.write_to(&mut self.sink)?;
        self.stats.add(record);
        Ok(())
    }

    /// Appends all records of `records`, stopping at the first failure.
    pub fn write_records<I>(&mut self, records: I) -> io::Result<()>
    where
        I: IntoIterator<Item = AmmoRecord>,
    {
        for record in records {
            tracing::trace!(tag = %record.tag(), len = record.len(), "writing record");
            self.write_record(&record)?;
        }
        Ok(())
    }

    /// What has been written so far.
    pub fn stats(&self) -> WriteStats {
        self.stats
    }

    /// Flushes buffered records and returns the final counters.
    pub fn finish(mut self) -> io::Result<WriteStats> {
        self.sink.flush()?;
        Ok(self.stats)
    }
}
