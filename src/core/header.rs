//! Header/schema registry for VCF-style streams.
//!
//! Accumulates the INFO/FORMAT/ALT tag definitions declared across input
//! headers, deduplicating by tag id while preserving registration order so
//! header emission is deterministic. One registry is built per input stream
//! and passed by reference into the record model and the writers; there is no
//! process-wide header state.

use crate::{
    core::record::RecordKind, error::SvlinkError, utils::util::Result,
    BEDPE_FIRST_SAMPLE_COLUMN, VCF_FIRST_SAMPLE_COLUMN,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDef {
    pub id: String,
    pub number: String,
    pub tag_type: String,
    pub description: String,
}

impl TagDef {
    fn render(&self, kind: &str) -> String {
        format!(
            "##{}=<ID={},Number={},Type={},Description=\"{}\">",
            kind, self.id, self.number, self.tag_type, self.description
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AltDef {
    pub id: String,
    pub description: String,
}

impl AltDef {
    fn render(&self) -> String {
        format!("##ALT=<ID={},Description=\"{}\">", self.id, self.description)
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub file_format: String,
    pub reference: String,
    kind: RecordKind,
    info_defs: Vec<TagDef>,
    format_defs: Vec<TagDef>,
    alt_defs: Vec<AltDef>,
    sample_list: Vec<String>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    pub fn new() -> Self {
        Self::for_kind(RecordKind::Vcf)
    }

    pub fn for_kind(kind: RecordKind) -> Self {
        let mut schema = Self {
            file_format: "VCFv4.2".to_string(),
            reference: String::new(),
            kind,
            info_defs: Vec::new(),
            format_defs: Vec::new(),
            alt_defs: Vec::new(),
            sample_list: Vec::new(),
        };
        // GT is always declared, matching upstream VCF tooling.
        schema.register_format("GT", "1", "String", "Genotype");
        schema
    }

    /// Index of the first sample column in the column-header line; BEDPE's
    /// paired-breakend block pushes the genotype section right.
    fn first_sample_column(&self) -> usize {
        match self.kind {
            RecordKind::Vcf => VCF_FIRST_SAMPLE_COLUMN,
            RecordKind::Bedpe => BEDPE_FIRST_SAMPLE_COLUMN,
        }
    }

    /// Consumes the raw header lines of one stream. Meta-lines may appear in
    /// any order; the single `#CHROM...` column line must be present and
    /// supplies the sample list.
    pub fn add_header(&mut self, lines: &[String]) -> Result<()> {
        let mut saw_column_line = false;
        for line in lines {
            let line = line.trim_end_matches(['\r', '\n']);
            if let Some(value) = line.strip_prefix("##fileformat=") {
                self.file_format = value.to_string();
            } else if let Some(value) = line.strip_prefix("##reference=") {
                self.reference = value.to_string();
            } else if line.starts_with("##INFO=") {
                let def = parse_structured_meta(line, 4)?;
                self.register_info(&def[0], &def[1], &def[2], &def[3]);
            } else if line.starts_with("##FORMAT=") {
                let def = parse_structured_meta(line, 4)?;
                self.register_format(&def[0], &def[1], &def[2], &def[3]);
            } else if line.starts_with("##ALT=") {
                let def = parse_structured_meta(line, 2)?;
                self.register_alt(&def[0], &def[1]);
            } else if line.starts_with('#') && !line.starts_with("##") {
                if saw_column_line {
                    return Err(SvlinkError::header_format(
                        "more than one #CHROM column line",
                    ));
                }
                saw_column_line = true;
                let columns: Vec<&str> = line.split('\t').collect();
                for sample in columns.iter().skip(self.first_sample_column()) {
                    self.add_sample(sample);
                }
            }
            // Unrecognized ##meta lines are carried by upstream tools but not
            // needed here; they are intentionally skipped.
        }
        if !saw_column_line {
            return Err(SvlinkError::header_format("missing #CHROM column line"));
        }
        Ok(())
    }

    /// Idempotent: registering an existing id is a no-op.
    pub fn register_info(&mut self, id: &str, number: &str, tag_type: &str, description: &str) {
        if self.info_defs.iter().any(|def| def.id == id) {
            return;
        }
        self.info_defs.push(TagDef {
            id: id.to_string(),
            number: number.to_string(),
            tag_type: tag_type.to_string(),
            description: description.to_string(),
        });
    }

    /// Inserts an INFO definition immediately after `anchor_id`. Silently a
    /// no-op when the anchor is absent or the id is already registered.
    pub fn register_info_after(
        &mut self,
        anchor_id: &str,
        id: &str,
        number: &str,
        tag_type: &str,
        description: &str,
    ) {
        if self.info_defs.iter().any(|def| def.id == id) {
            return;
        }
        if let Some(anchor) = self.info_defs.iter().position(|def| def.id == anchor_id) {
            self.info_defs.insert(
                anchor + 1,
                TagDef {
                    id: id.to_string(),
                    number: number.to_string(),
                    tag_type: tag_type.to_string(),
                    description: description.to_string(),
                },
            );
        }
    }

    pub fn register_format(&mut self, id: &str, number: &str, tag_type: &str, description: &str) {
        if self.format_defs.iter().any(|def| def.id == id) {
            return;
        }
        self.format_defs.push(TagDef {
            id: id.to_string(),
            number: number.to_string(),
            tag_type: tag_type.to_string(),
            description: description.to_string(),
        });
    }

    pub fn register_alt(&mut self, id: &str, description: &str) {
        if self.alt_defs.iter().any(|def| def.id == id) {
            return;
        }
        self.alt_defs.push(AltDef {
            id: id.to_string(),
            description: description.to_string(),
        });
    }

    pub fn add_sample(&mut self, name: &str) {
        self.sample_list.push(name.to_string());
    }

    pub fn sample_list(&self) -> &[String] {
        &self.sample_list
    }

    pub fn sample_count(&self) -> usize {
        self.sample_list.len()
    }

    /// The output column index of a sample (0-based over the whole line).
    pub fn sample_column(&self, name: &str) -> Option<usize> {
        self.sample_list
            .iter()
            .position(|sample| sample == name)
            .map(|idx| idx + self.first_sample_column())
    }

    /// Serializes the canonical header block: fileformat, fileDate,
    /// reference, then INFO, ALT and FORMAT definitions in registration
    /// order, then the column line (with FORMAT + samples when requested).
    pub fn render_header(&self, include_samples: bool) -> String {
        let mut lines = vec![
            format!("##fileformat={}", self.file_format),
            format!("##fileDate={}", chrono::Local::now().format("%Y%m%d")),
            format!("##reference={}", self.reference),
        ];
        lines.extend(self.info_defs.iter().map(|def| def.render("INFO")));
        lines.extend(self.alt_defs.iter().map(AltDef::render));
        lines.extend(self.format_defs.iter().map(|def| def.render("FORMAT")));

        let mut columns = match self.kind {
            RecordKind::Vcf => vec![
                "#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO",
            ],
            RecordKind::Bedpe => vec![
                "#CHROM_A", "START_A", "END_A", "CHROM_B", "START_B", "END_B", "ID", "QUAL",
                "STRAND_A", "STRAND_B", "TYPE", "FILTER", "INFO_A", "INFO_B",
            ],
        };
        if include_samples {
            columns.push("FORMAT");
            columns.extend(self.sample_list.iter().map(String::as_str));
        }
        lines.push(columns.join("\t"));
        lines.join("\n")
    }

    pub fn info_defs(&self) -> &[TagDef] {
        &self.info_defs
    }

    pub fn format_defs(&self) -> &[TagDef] {
        &self.format_defs
    }
}

/// Extracts the ordered field values from a `##KIND=<ID=...,...>` meta-line.
/// Commas inside quoted descriptions do not split fields; surrounding quotes
/// are stripped (they are re-added on render).
fn parse_structured_meta(line: &str, min_fields: usize) -> Result<Vec<String>> {
    let open = line.find('<');
    let close = line.rfind('>');
    let payload = match (open, close) {
        (Some(open), Some(close)) if open < close => &line[open + 1..close],
        _ => {
            return Err(SvlinkError::header_format(format!(
                "meta-line is not <...>-bracketed: {line}"
            )))
        }
    };

    let mut values = Vec::new();
    for field in split_quoted(payload) {
        let value = match field.split_once('=') {
            Some((_, value)) => value,
            None => {
                return Err(SvlinkError::header_format(format!(
                    "meta-line field is not key=value: {field}"
                )))
            }
        };
        let value = value.strip_prefix('"').unwrap_or(value);
        let value = value.strip_suffix('"').unwrap_or(value);
        values.push(value.to_string());
    }
    if values.len() < min_fields {
        return Err(SvlinkError::header_format(format!(
            "meta-line has {} structured fields, expected at least {}: {}",
            values.len(),
            min_fields,
            line
        )));
    }
    Ok(values)
}

/// Splits on commas outside double quotes.
fn split_quoted(payload: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (idx, ch) in payload.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(&payload[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    fields.push(&payload[start..]);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SvlinkError;

    fn header_lines() -> Vec<String> {
        vec![
            "##fileformat=VCFv4.2".to_string(),
            "##reference=GRCh38".to_string(),
            "##INFO=<ID=SVTYPE,Number=1,Type=String,Description=\"Type of structural variant\">"
                .to_string(),
            "##INFO=<ID=SNAME,Number=.,Type=String,Description=\"Source sample name\">"
                .to_string(),
            "##ALT=<ID=DEL,Description=\"Deletion\">".to_string(),
            "##FORMAT=<ID=GQ,Number=1,Type=Integer,Description=\"Genotype quality\">".to_string(),
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tsampleA\tsampleB".to_string(),
        ]
    }

    #[test]
    fn test_add_header_collects_definitions_and_samples() {
        let mut schema = Schema::new();
        schema.add_header(&header_lines()).unwrap();
        assert_eq!(schema.file_format, "VCFv4.2");
        assert_eq!(schema.reference, "GRCh38");
        assert_eq!(schema.info_defs().len(), 2);
        assert_eq!(schema.info_defs()[0].id, "SVTYPE");
        assert_eq!(
            schema.info_defs()[1].description,
            "Source sample name"
        );
        // GT is pre-seeded, GQ comes from the header.
        assert_eq!(schema.format_defs().len(), 2);
        assert_eq!(schema.sample_list(), &["sampleA", "sampleB"]);
        assert_eq!(schema.sample_column("sampleA"), Some(9));
        assert_eq!(schema.sample_column("sampleB"), Some(10));
        assert_eq!(schema.sample_column("missing"), None);
    }

    #[test]
    fn test_bedpe_column_line_samples_start_after_info_b() {
        let mut schema = Schema::for_kind(RecordKind::Bedpe);
        let lines = vec![
            "##fileformat=VCFv4.2".to_string(),
            "#CHROM_A\tSTART_A\tEND_A\tCHROM_B\tSTART_B\tEND_B\tID\tQUAL\tSTRAND_A\tSTRAND_B\
             \tTYPE\tFILTER\tINFO_A\tINFO_B\tFORMAT\tsampleA"
                .to_string(),
        ];
        schema.add_header(&lines).unwrap();
        assert_eq!(schema.sample_list(), &["sampleA"]);
        assert_eq!(schema.sample_column("sampleA"), Some(15));
    }

    #[test]
    fn test_bedpe_render_header_column_line() {
        let mut schema = Schema::for_kind(RecordKind::Bedpe);
        schema.add_sample("sampleA");
        let header = schema.render_header(true);
        assert!(header.ends_with(
            "#CHROM_A\tSTART_A\tEND_A\tCHROM_B\tSTART_B\tEND_B\tID\tQUAL\tSTRAND_A\tSTRAND_B\
             \tTYPE\tFILTER\tINFO_A\tINFO_B\tFORMAT\tsampleA"
        ));
        let header = schema.render_header(false);
        assert!(header.ends_with("INFO_A\tINFO_B"));
    }

    #[test]
    fn test_add_header_requires_column_line() {
        let mut schema = Schema::new();
        let lines = vec!["##fileformat=VCFv4.2".to_string()];
        assert!(matches!(
            schema.add_header(&lines),
            Err(SvlinkError::HeaderFormat { .. })
        ));
    }

    #[test]
    fn test_add_header_rejects_underspecified_meta() {
        let mut schema = Schema::new();
        let lines = vec![
            "##INFO=<ID=SVTYPE,Number=1>".to_string(),
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO".to_string(),
        ];
        assert!(matches!(
            schema.add_header(&lines),
            Err(SvlinkError::HeaderFormat { .. })
        ));
    }

    #[test]
    fn test_registration_is_idempotent() {
        let mut schema = Schema::new();
        schema.register_info("SNAME", ".", "String", "Source sample name");
        schema.register_info("SNAME", "1", "Integer", "Different definition");
        assert_eq!(schema.info_defs().len(), 1);
        assert_eq!(schema.info_defs()[0].number, ".");
    }

    #[test]
    fn test_register_info_after() {
        let mut schema = Schema::new();
        schema.register_info("AF", "A", "Float", "Allele frequency");
        schema.register_info("MSQ", "1", "Float", "Mean sample quality");
        schema.register_info_after("AF", "NSAMP", "1", "Integer", "Non-reference samples");
        let ids: Vec<&str> = schema.info_defs().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["AF", "NSAMP", "MSQ"]);
        // Absent anchor and duplicate id are both silent no-ops.
        schema.register_info_after("MISSING", "X", "1", "Integer", "x");
        schema.register_info_after("AF", "NSAMP", "1", "Integer", "duplicate");
        let ids: Vec<&str> = schema.info_defs().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["AF", "NSAMP", "MSQ"]);
    }

    #[test]
    fn test_render_header_orders_blocks() {
        let mut schema = Schema::new();
        schema.add_header(&header_lines()).unwrap();
        let header = schema.render_header(true);
        let lines: Vec<&str> = header.lines().collect();
        assert_eq!(lines[0], "##fileformat=VCFv4.2");
        assert!(lines[1].starts_with("##fileDate="));
        assert_eq!(lines[2], "##reference=GRCh38");
        assert_eq!(
            lines[3],
            "##INFO=<ID=SVTYPE,Number=1,Type=String,Description=\"Type of structural variant\">"
        );
        assert_eq!(
            lines[5],
            "##ALT=<ID=DEL,Description=\"Deletion\">"
        );
        assert!(lines[6].starts_with("##FORMAT=<ID=GT,"));
        assert_eq!(
            lines.last().unwrap(),
            &"#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tsampleA\tsampleB"
        );
    }

    #[test]
    fn test_render_header_without_samples() {
        let mut schema = Schema::new();
        schema.add_header(&header_lines()).unwrap();
        let header = schema.render_header(false);
        assert!(header.ends_with("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO"));
    }

    #[test]
    fn test_quoted_description_keeps_commas() {
        let mut schema = Schema::new();
        let lines = vec![
            "##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele frequency, per ALT\">"
                .to_string(),
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO".to_string(),
        ];
        schema.add_header(&lines).unwrap();
        assert_eq!(schema.info_defs()[0].description, "Allele frequency, per ALT");
        let header = schema.render_header(false);
        assert!(header.contains("Description=\"Allele frequency, per ALT\""));
    }
}
