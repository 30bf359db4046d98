//! Streaming reader for VCF/BEDPE inputs: scans the header block into a
//! [`Schema`], then yields one parsed [`Record`] per data line.

use crate::{
    core::{
        header::Schema,
        record::{Record, RecordKind},
    },
    io::readers::open_input_reader,
    utils::util::Result,
};
use std::{io::BufRead, path::Path};

pub struct RecordReader<R: BufRead> {
    reader: R,
    kind: RecordKind,
    pub schema: Schema,
}

impl RecordReader<Box<dyn BufRead>> {
    pub fn from_path(path: Option<&Path>, kind: RecordKind) -> Result<Self> {
        Self::new(open_input_reader(path)?, kind)
    }
}

impl<R: BufRead> RecordReader<R> {
    /// Consumes the header block (everything up to and including the
    /// `#CHROM` column line) and builds the stream's schema from it.
    pub fn new(mut reader: R, kind: RecordKind) -> Result<Self> {
        let mut header_lines: Vec<String> = Vec::new();
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim_end_matches(['\n', '\r']);
            header_lines.push(trimmed.to_string());
            if trimmed.starts_with('#') && !trimmed.starts_with("##") {
                break;
            }
        }
        let mut schema = Schema::for_kind(kind);
        schema.add_header(&header_lines)?;
        log::debug!(
            "Header consumed: {} lines, {} samples",
            header_lines.len(),
            schema.sample_count()
        );
        Ok(Self {
            reader,
            kind,
            schema,
        })
    }

    /// The next data record, or `None` at end of stream. Blank lines are
    /// skipped; a malformed line is a fatal parse error.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed.is_empty() {
                continue;
            }
            return Record::parse(trimmed, &self.schema, self.kind).map(Some);
        }
    }
}
