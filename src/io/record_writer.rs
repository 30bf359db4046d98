//! Buffered line output for headers and records; file or stdout.

use crate::{
    core::{header::Schema, record::Record},
    utils::util::Result,
};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

pub struct RecordWriter<W: Write> {
    out: W,
}

impl RecordWriter<BufWriter<Box<dyn Write>>> {
    /// `None` selects stdout.
    pub fn from_path(path: Option<&str>) -> Result<Self> {
        let out: Box<dyn Write> = match path {
            Some(path) => Box::new(File::create(path).map_err(|error| {
                crate::svlink_error!("Failed to create output file {path}: {error}")
            })?),
            None => Box::new(io::stdout()),
        };
        Ok(Self::new(BufWriter::new(out)))
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_header(&mut self, schema: &Schema, include_samples: bool) -> Result<()> {
        writeln!(self.out, "{}", schema.render_header(include_samples))?;
        Ok(())
    }

    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        writeln!(self.out, "{}", record.serialize())?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
