//! Per-record allele frequency annotation: `AF` (alt allele frequency),
//! `NSAMP` (samples with a called non-reference genotype) and `MSQ` (mean
//! sample quality of positively genotyped samples), computed from the
//! genotype columns. No cross-record state.

use crate::{
    cli::FrequencyArgs,
    core::record::{Record, RecordKind},
    io::{readers::open_input_reader, record_reader::RecordReader, record_writer::RecordWriter},
    utils::util::Result,
};
use std::io::{BufRead, Write};

#[derive(Debug, Default, PartialEq)]
struct FrequencyStats {
    called_alleles: u64,
    alt_alleles: u64,
    nsamp: u64,
    sq_sum: f64,
    sq_count: u64,
}

impl FrequencyStats {
    fn af(&self) -> String {
        if self.called_alleles == 0 {
            return ".".to_string();
        }
        format!("{:.4}", self.alt_alleles as f64 / self.called_alleles as f64)
    }

    fn msq(&self) -> String {
        if self.sq_count == 0 {
            return ".".to_string();
        }
        format!("{:.2}", self.sq_sum / self.sq_count as f64)
    }
}

/// Walks the genotype columns once. A sample is "called" when no allele in
/// its GT sub-field is missing; it counts towards NSAMP (and MSQ, when its
/// SQ sub-field parses) if any called allele is non-reference.
fn collect_stats(record: &Record, sample_count: usize) -> FrequencyStats {
    let mut stats = FrequencyStats::default();
    let Some(format_spec) = record.format_spec() else {
        return stats;
    };
    let fields: Vec<&str> = format_spec.split(':').collect();
    let gt_idx = fields.iter().position(|field| *field == "GT");
    let sq_idx = fields.iter().position(|field| *field == "SQ");

    for sample_idx in 0..sample_count {
        let Some(value) = record.sample_value(sample_idx) else {
            continue;
        };
        let subs: Vec<&str> = value.split(':').collect();
        let Some(gt) = gt_idx.and_then(|idx| subs.get(idx)) else {
            continue;
        };
        let alleles: Vec<&str> = gt.split(['/', '|']).collect();
        if alleles.iter().any(|allele| *allele == ".") {
            continue;
        }
        stats.called_alleles += alleles.len() as u64;
        let alt = alleles.iter().filter(|allele| **allele != "0").count() as u64;
        stats.alt_alleles += alt;
        if alt > 0 {
            stats.nsamp += 1;
            if let Some(sq) = sq_idx.and_then(|idx| subs.get(idx)) {
                if let Ok(sq) = sq.parse::<f64>() {
                    stats.sq_sum += sq;
                    stats.sq_count += 1;
                }
            }
        }
    }
    stats
}

pub fn run_frequency<R: BufRead, W: Write>(input: R, writer: &mut RecordWriter<W>) -> Result<()> {
    let mut reader = RecordReader::new(input, RecordKind::Vcf)?;
    reader.schema.register_info(
        "AF",
        "A",
        "Float",
        "Allele Frequency, for each ALT allele, in the same order as listed",
    );
    reader.schema.register_info(
        "NSAMP",
        "1",
        "Integer",
        "Number of samples with non-reference genotypes",
    );
    reader.schema.register_info(
        "MSQ",
        "1",
        "Float",
        "Mean sample quality of positively genotyped samples",
    );
    writer.write_header(&reader.schema, true)?;

    let sample_count = reader.schema.sample_count();
    while let Some(mut record) = reader.next_record()? {
        let stats = collect_stats(&record, sample_count);
        record.set_tag("AF", &stats.af());
        record.set_tag("NSAMP", &stats.nsamp.to_string());
        record.set_tag("MSQ", &stats.msq());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn frequency(args: FrequencyArgs) -> Result<()> {
    let input = open_input_reader(args.input.as_deref())?;
    let mut writer = RecordWriter::from_path(args.output.as_deref())?;
    run_frequency(input, &mut writer)
}
