//! Cross-file overlap filter: emit the input variants whose origin set
//! intersects that of at least one variant in the filter file, annotating
//! the first matching filter id in the `FOUND` tag. With `--complement` the
//! non-matching variants are emitted instead.

use crate::{
    cli::OverlapArgs,
    constants::FOUND_TAG,
    core::{provenance, record::RecordKind},
    io::{record_reader::RecordReader, record_writer::RecordWriter},
    utils::util::Result,
};
use std::{collections::HashSet, io::BufRead, io::Write, path::Path};

/// One filter-file entry: the variant id and its origin set.
pub type FilterEntry = (String, HashSet<String>);

/// Loads the filter file up front; it is scanned once per input record, so
/// it must fit in memory (the input stream itself is not buffered).
pub fn load_filter_entries(path: &Path, provenance_tag: &str) -> Result<Vec<FilterEntry>> {
    let mut reader = RecordReader::from_path(Some(path), RecordKind::Vcf)?;
    let mut entries = Vec::new();
    while let Some(record) = reader.next_record()? {
        // A filter variant without the provenance tag cannot be matched
        // against; that is a malformed filter file, not a soft miss.
        let origins = provenance::origin_set(&record, provenance_tag)?;
        entries.push((record.id(), origins));
    }
    log::debug!("Loaded {} filter entries", entries.len());
    Ok(entries)
}

pub fn run_overlap<R: BufRead, W: Write>(
    input: R,
    filter_entries: &[FilterEntry],
    writer: &mut RecordWriter<W>,
    complement: bool,
    provenance_tag: &str,
) -> Result<()> {
    let mut reader = RecordReader::new(input, RecordKind::Vcf)?;
    reader
        .schema
        .register_info(FOUND_TAG, ".", "String", "Variant id in other file");
    writer.write_header(&reader.schema, true)?;

    let mut n_records = 0u64;
    let mut n_emitted = 0u64;
    while let Some(mut record) = reader.next_record()? {
        n_records += 1;
        let mut found = false;
        for (id, origins) in filter_entries {
            if provenance::matches_and_annotate(&mut record, id, origins, provenance_tag, FOUND_TAG)
            {
                // First match wins; later filter entries are not recorded.
                found = true;
                break;
            }
        }
        if found != complement {
            n_emitted += 1;
            writer.write_record(&record)?;
        }
    }
    writer.flush()?;
    log::info!("Emitted {n_emitted} of {n_records} records");
    Ok(())
}

pub fn overlap(args: OverlapArgs) -> Result<()> {
    let filter_entries = load_filter_entries(&args.filter, &args.provenance_tag)?;
    let input = crate::io::readers::open_input_reader(args.input.as_deref())?;
    let mut writer = RecordWriter::from_path(args.output.as_deref())?;
    run_overlap(
        input,
        &filter_entries,
        &mut writer,
        args.complement,
        &args.provenance_tag,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "\
##fileformat=VCFv4.2
##INFO=<ID=SNAME,Number=.,Type=String,Description=\"Source sample name\">
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
";

    fn filter_entries() -> Vec<FilterEntry> {
        vec![
            (
                "other_1".to_string(),
                ["s1".to_string(), "s2".to_string()].into_iter().collect(),
            ),
            ("other_2".to_string(), ["s2".to_string()].into_iter().collect()),
        ]
    }

    fn run(input: &str, complement: bool) -> String {
        let mut writer = RecordWriter::new(Vec::new());
        run_overlap(
            Cursor::new(input),
            &filter_entries(),
            &mut writer,
            complement,
            "SNAME",
        )
        .expect("overlap should succeed");
        String::from_utf8(writer.into_inner()).unwrap()
    }

    fn body(output: &str) -> Vec<&str> {
        output
            .lines()
            .filter(|line| !line.starts_with('#'))
            .collect()
    }

    #[test]
    fn test_matching_records_are_annotated_with_first_match() {
        let input = format!(
            "{HEADER}chr1\t100\tcall_1\tN\t<DEL>\t.\tPASS\tSNAME=s2\n\
             chr1\t200\tcall_2\tN\t<DEL>\t.\tPASS\tSNAME=s9\n"
        );
        let output = run(&input, false);
        let lines = body(&output);
        // call_1 intersects both filter entries; only the first id is kept.
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("SNAME=s2;FOUND=other_1"));
    }

    #[test]
    fn test_complement_emits_non_matching_records() {
        let input = format!(
            "{HEADER}chr1\t100\tcall_1\tN\t<DEL>\t.\tPASS\tSNAME=s2\n\
             chr1\t200\tcall_2\tN\t<DEL>\t.\tPASS\tSNAME=s9\n"
        );
        let output = run(&input, true);
        let lines = body(&output);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("call_2"));
        assert!(!lines[0].contains("FOUND"));
    }

    #[test]
    fn test_record_without_provenance_never_matches() {
        let input = format!("{HEADER}chr1\t100\tcall_1\tN\t<DEL>\t.\tPASS\tSVTYPE=DEL\n");
        assert!(body(&run(&input, false)).is_empty());
        assert_eq!(body(&run(&input, true)).len(), 1);
    }

    #[test]
    fn test_header_declares_found_tag() {
        let output = run(HEADER, false);
        assert!(output.contains(
            "##INFO=<ID=FOUND,Number=.,Type=String,Description=\"Variant id in other file\">"
        ));
    }
}
