//! The record model for a single structural-variant call line.
//!
//! VCF and BEDPE lines share the same machinery: an ordered column buffer, a
//! 0-based coordinate column, and one INFO-style column holding
//! semicolon-delimited tags. The raw INFO string is kept verbatim and only
//! re-rendered after a mutation, so an unmodified record round-trips
//! byte-for-byte through parse -> serialize.

use crate::{
    constants::*,
    core::header::Schema,
    error::SvlinkError,
    utils::util::Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Vcf,
    Bedpe,
}

/// Column layout of a record kind. BEDPE carries paired breakends, so its
/// fixed block is wider and its tags live in the `INFO_A` column.
#[derive(Debug)]
struct Layout {
    fixed: usize,
    chrom: usize,
    pos: usize,
    id: usize,
    qual: usize,
    info: usize,
    format: usize,
}

static VCF_LAYOUT: Layout = Layout {
    fixed: VCF_FIXED_COLUMNS,
    chrom: 0,
    pos: 1,
    id: 2,
    qual: 5,
    info: 7,
    format: VCF_FORMAT_COLUMN,
};

// CHROM_A START_A END_A CHROM_B START_B END_B ID QUAL STRAND_A STRAND_B
// TYPE FILTER INFO_A INFO_B
static BEDPE_LAYOUT: Layout = Layout {
    fixed: BEDPE_FIXED_COLUMNS,
    chrom: 0,
    pos: 1,
    id: 6,
    qual: 7,
    info: 12,
    format: BEDPE_FORMAT_COLUMN,
};

#[derive(Debug, Clone)]
struct InfoTag {
    name: String,
    value: Option<String>,
}

/// Ordered key-value view over a semicolon-delimited tag column. Flag tags
/// carry no value. Mutations preserve the relative order of all other tags.
#[derive(Debug, Clone)]
struct InfoField {
    raw: String,
    tags: Vec<InfoTag>,
    dirty: bool,
}

impl InfoField {
    fn parse(raw: &str) -> Self {
        let tags = if raw.is_empty() || raw == "." {
            Vec::new()
        } else {
            raw.split(';')
                .map(|entry| match entry.split_once('=') {
                    Some((name, value)) => InfoTag {
                        name: name.to_string(),
                        value: Some(value.to_string()),
                    },
                    None => InfoTag {
                        name: entry.to_string(),
                        value: None,
                    },
                })
                .collect()
        };
        Self {
            raw: raw.to_string(),
            tags,
            dirty: false,
        }
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.name == name)
            .map(|tag| tag.value.as_deref().unwrap_or(""))
    }

    fn set(&mut self, name: &str, value: &str) {
        match self.tags.iter_mut().find(|tag| tag.name == name) {
            Some(tag) => tag.value = Some(value.to_string()),
            None => self.tags.push(InfoTag {
                name: name.to_string(),
                value: Some(value.to_string()),
            }),
        }
        self.dirty = true;
    }

    fn remove(&mut self, name: &str) {
        let before = self.tags.len();
        self.tags.retain(|tag| tag.name != name);
        if self.tags.len() != before {
            self.dirty = true;
        }
    }

    fn render(&self) -> String {
        if !self.dirty {
            return self.raw.clone();
        }
        if self.tags.is_empty() {
            return ".".to_string();
        }
        self.tags
            .iter()
            .map(|tag| match &tag.value {
                Some(value) => format!("{}={}", tag.name, value),
                None => tag.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Shared storage behind both record kinds.
#[derive(Debug, Clone)]
struct Line {
    fields: Vec<String>,
    pos: i64,
    info: InfoField,
}

impl Line {
    fn parse(raw: &str, schema: &Schema, layout: &Layout) -> Result<Self> {
        let fields: Vec<String> = raw.split('\t').map(str::to_string).collect();
        if fields.len() < layout.fixed {
            return Err(SvlinkError::malformed_record(
                format!(
                    "expected at least {} columns, found {}",
                    layout.fixed,
                    fields.len()
                ),
                raw,
            ));
        }
        if fields.len() > layout.fixed {
            let sample_columns = fields.len() - layout.format - 1;
            if sample_columns != schema.sample_count() {
                return Err(SvlinkError::malformed_record(
                    format!(
                        "found {} sample columns but the header declares {} samples",
                        sample_columns,
                        schema.sample_count()
                    ),
                    raw,
                ));
            }
        }
        let pos: i64 = fields[layout.pos].parse().map_err(|_| {
            SvlinkError::malformed_record(
                format!("invalid coordinate `{}`", fields[layout.pos]),
                raw,
            )
        })?;
        let info = InfoField::parse(&fields[layout.info]);
        Ok(Self { fields, pos, info })
    }

    fn has_genotypes(&self, layout: &Layout) -> bool {
        self.fields.len() > layout.fixed
    }

    fn sample_value(&self, layout: &Layout, sample_idx: usize) -> Option<&str> {
        self.fields
            .get(layout.format + 1 + sample_idx)
            .map(String::as_str)
    }

    fn set_sample_value(&mut self, layout: &Layout, sample_idx: usize, value: String) -> Result<()> {
        let column = layout.format + 1 + sample_idx;
        match self.fields.get_mut(column) {
            Some(field) => {
                *field = value;
                Ok(())
            }
            None => Err(crate::svlink_error!(
                "Record has no genotype column for sample index {sample_idx}"
            )),
        }
    }

    fn push_genotypes(&mut self, layout: &Layout, format_spec: &str, sample_columns: Vec<String>) {
        debug_assert!(!self.has_genotypes(layout));
        self.fields.push(format_spec.to_string());
        self.fields.extend(sample_columns);
    }

    fn serialize(&self, layout: &Layout) -> String {
        let info = self.info.render();
        let mut fields: Vec<&str> = self.fields.iter().map(String::as_str).collect();
        fields[layout.info] = &info;
        fields.join("\t")
    }
}

#[derive(Debug, Clone)]
pub struct VcfRecord {
    line: Line,
}

impl VcfRecord {
    pub fn parse(raw: &str, schema: &Schema) -> Result<Self> {
        Ok(Self {
            line: Line::parse(raw, schema, &VCF_LAYOUT)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BedpeRecord {
    line: Line,
}

impl BedpeRecord {
    pub fn parse(raw: &str, schema: &Schema) -> Result<Self> {
        Ok(Self {
            line: Line::parse(raw, schema, &BEDPE_LAYOUT)?,
        })
    }

    /// BEDPE name columns are frequently `.`; synthesize a stable id from the
    /// paired breakend coordinates in that case.
    fn id(&self) -> String {
        let fields = &self.line.fields;
        if fields[BEDPE_LAYOUT.id] != "." {
            return fields[BEDPE_LAYOUT.id].clone();
        }
        format!("{}:{}-{}:{}", fields[0], fields[1], fields[3], fields[4])
    }
}

/// One structural-variant call line, either VCF or BEDPE. The two layouts
/// expose the same capability set; callers pick the kind up front (file kind
/// is declared, never auto-detected).
#[derive(Debug, Clone)]
pub enum Record {
    Vcf(VcfRecord),
    Bedpe(BedpeRecord),
}

impl Record {
    pub fn parse(raw: &str, schema: &Schema, kind: RecordKind) -> Result<Self> {
        match kind {
            RecordKind::Vcf => Ok(Record::Vcf(VcfRecord::parse(raw, schema)?)),
            RecordKind::Bedpe => Ok(Record::Bedpe(BedpeRecord::parse(raw, schema)?)),
        }
    }

    fn parts(&self) -> (&Line, &'static Layout) {
        match self {
            Record::Vcf(record) => (&record.line, &VCF_LAYOUT),
            Record::Bedpe(record) => (&record.line, &BEDPE_LAYOUT),
        }
    }

    fn parts_mut(&mut self) -> (&mut Line, &'static Layout) {
        match self {
            Record::Vcf(record) => (&mut record.line, &VCF_LAYOUT),
            Record::Bedpe(record) => (&mut record.line, &BEDPE_LAYOUT),
        }
    }

    pub fn chrom(&self) -> &str {
        let (line, layout) = self.parts();
        &line.fields[layout.chrom]
    }

    /// The clustering coordinate: POS for VCF, START_A for BEDPE.
    pub fn pos(&self) -> i64 {
        self.parts().0.pos
    }

    pub fn id(&self) -> String {
        match self {
            Record::Vcf(record) => record.line.fields[VCF_LAYOUT.id].clone(),
            Record::Bedpe(record) => record.id(),
        }
    }

    pub fn qual(&self) -> Option<f64> {
        let (line, layout) = self.parts();
        line.fields[layout.qual].parse().ok()
    }

    /// The current value of a tag. A flag tag yields the empty string; an
    /// absent tag is `TagNotFound` so callers can tell absence from empty.
    pub fn get_tag(&self, name: &str) -> Result<&str> {
        self.parts()
            .0
            .info
            .get(name)
            .ok_or_else(|| SvlinkError::tag_not_found(name))
    }

    /// Overwrites the tag if present, appends it otherwise; the relative
    /// order of all other tags is untouched.
    pub fn set_tag(&mut self, name: &str, value: &str) {
        self.parts_mut().0.info.set(name, value);
    }

    pub fn remove_tag(&mut self, name: &str) {
        self.parts_mut().0.info.remove(name);
    }

    /// The tag column as it would currently serialize.
    pub fn info_string(&self) -> String {
        self.parts().0.info.render()
    }

    /// Replaces the whole tag column with an externally rebuilt string.
    pub fn set_info_string(&mut self, raw: &str) {
        self.parts_mut().0.info = InfoField::parse(raw);
    }

    pub fn has_genotypes(&self) -> bool {
        let (line, layout) = self.parts();
        line.has_genotypes(layout)
    }

    pub fn format_spec(&self) -> Option<&str> {
        let (line, layout) = self.parts();
        if !line.has_genotypes(layout) {
            return None;
        }
        line.fields.get(layout.format).map(String::as_str)
    }

    pub fn sample_value(&self, sample_idx: usize) -> Option<&str> {
        let (line, layout) = self.parts();
        line.sample_value(layout, sample_idx)
    }

    pub fn set_sample_value(&mut self, sample_idx: usize, value: String) -> Result<()> {
        let (line, layout) = self.parts_mut();
        line.set_sample_value(layout, sample_idx, value)
    }

    /// Appends a genotype section (FORMAT plus one column per sample) to a
    /// record that has none.
    pub fn push_genotypes(&mut self, format_spec: &str, sample_columns: Vec<String>) {
        let (line, layout) = self.parts_mut();
        line.push_genotypes(layout, format_spec, sample_columns);
    }

    pub fn serialize(&self) -> String {
        let (line, layout) = self.parts();
        line.serialize(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SvlinkError;

    fn schema_with_samples(samples: &[&str]) -> Schema {
        let mut schema = Schema::new();
        for sample in samples {
            schema.add_sample(sample);
        }
        schema
    }

    const VCF_LINE: &str =
        "chr1\t1000\tcall_1\tN\t<DEL>\t90\tPASS\tSVTYPE=DEL;SNAME=s1;IMPRECISE\tGT:GQ\t0/1:20\t./.:.";

    #[test]
    fn test_vcf_round_trip_is_byte_identical() {
        let schema = schema_with_samples(&["s1", "s2"]);
        let record = Record::parse(VCF_LINE, &schema, RecordKind::Vcf).unwrap();
        assert_eq!(record.serialize(), VCF_LINE);
    }

    #[test]
    fn test_vcf_accessors() {
        let schema = schema_with_samples(&["s1", "s2"]);
        let record = Record::parse(VCF_LINE, &schema, RecordKind::Vcf).unwrap();
        assert_eq!(record.chrom(), "chr1");
        assert_eq!(record.pos(), 1000);
        assert_eq!(record.id(), "call_1");
        assert_eq!(record.qual(), Some(90.0));
        assert_eq!(record.format_spec(), Some("GT:GQ"));
        assert_eq!(record.sample_value(0), Some("0/1:20"));
        assert_eq!(record.sample_value(1), Some("./.:."));
        assert_eq!(record.get_tag("SVTYPE").unwrap(), "DEL");
        // Flag tags are present with an empty value; absent is an error.
        assert_eq!(record.get_tag("IMPRECISE").unwrap(), "");
        assert!(matches!(
            record.get_tag("MISSING"),
            Err(SvlinkError::TagNotFound { .. })
        ));
    }

    #[test]
    fn test_set_tag_preserves_order_of_other_tags() {
        let schema = schema_with_samples(&["s1", "s2"]);
        let mut record = Record::parse(VCF_LINE, &schema, RecordKind::Vcf).unwrap();
        record.set_tag("SNAME", "s1:0,s2:1");
        assert_eq!(
            record.serialize(),
            "chr1\t1000\tcall_1\tN\t<DEL>\t90\tPASS\tSVTYPE=DEL;SNAME=s1:0,s2:1;IMPRECISE\tGT:GQ\t0/1:20\t./.:."
        );
        record.set_tag("NEW", "1");
        assert!(record
            .info_string()
            .ends_with("SVTYPE=DEL;SNAME=s1:0,s2:1;IMPRECISE;NEW=1"));
    }

    #[test]
    fn test_remove_tag_keeps_remaining_tags() {
        let schema = schema_with_samples(&["s1", "s2"]);
        let mut record = Record::parse(VCF_LINE, &schema, RecordKind::Vcf).unwrap();
        record.remove_tag("SNAME");
        assert_eq!(record.info_string(), "SVTYPE=DEL;IMPRECISE");
        // Removing an absent tag is a no-op.
        record.remove_tag("SNAME");
        assert_eq!(record.info_string(), "SVTYPE=DEL;IMPRECISE");
    }

    #[test]
    fn test_parse_rejects_short_lines() {
        let schema = Schema::new();
        let result = Record::parse("chr1\t1000\tcall_1", &schema, RecordKind::Vcf);
        assert!(matches!(
            result,
            Err(SvlinkError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_sample_count_mismatch() {
        let schema = schema_with_samples(&["s1"]);
        let result = Record::parse(VCF_LINE, &schema, RecordKind::Vcf);
        assert!(matches!(
            result,
            Err(SvlinkError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_non_numeric_coordinate() {
        let schema = Schema::new();
        let line = "chr1\txyz\tcall_1\tN\t<DEL>\t.\tPASS\tSVTYPE=DEL";
        let result = Record::parse(line, &schema, RecordKind::Vcf);
        assert!(matches!(
            result,
            Err(SvlinkError::MalformedRecord { .. })
        ));
    }

    const BEDPE_LINE: &str = "chr1\t999\t1000\tchr1\t2999\t3000\t.\t90\t+\t-\tDEL\tPASS\tSVTYPE=DEL;SNAME=s1\t.";

    #[test]
    fn test_bedpe_round_trip_and_accessors() {
        let schema = Schema::for_kind(RecordKind::Bedpe);
        let record = Record::parse(BEDPE_LINE, &schema, RecordKind::Bedpe).unwrap();
        assert_eq!(record.serialize(), BEDPE_LINE);
        assert_eq!(record.chrom(), "chr1");
        assert_eq!(record.pos(), 999);
        assert_eq!(record.get_tag("SNAME").unwrap(), "s1");
        assert_eq!(record.id(), "chr1:999-chr1:2999");
        assert!(!record.has_genotypes());
    }

    #[test]
    fn test_bedpe_mutation_leaves_info_b_untouched() {
        let schema = Schema::for_kind(RecordKind::Bedpe);
        let mut record = Record::parse(BEDPE_LINE, &schema, RecordKind::Bedpe).unwrap();
        record.set_tag("SNAME", "s1:0");
        let serialized = record.serialize();
        assert!(serialized.ends_with("SVTYPE=DEL;SNAME=s1:0\t."));
    }

    #[test]
    fn test_push_genotypes() {
        let schema = schema_with_samples(&["s1", "s2"]);
        let line = "chr1\t1000\tcall_1\tN\t<DEL>\t90\tPASS\tSVTYPE=DEL";
        let mut record = Record::parse(line, &schema, RecordKind::Vcf).unwrap();
        assert!(!record.has_genotypes());
        record.push_genotypes("GT:GQ", vec!["./.:.".to_string(), "./.:.".to_string()]);
        assert!(record.has_genotypes());
        assert_eq!(record.format_spec(), Some("GT:GQ"));
        assert_eq!(
            record.serialize(),
            "chr1\t1000\tcall_1\tN\t<DEL>\t90\tPASS\tSVTYPE=DEL\tGT:GQ\t./.:.\t./.:."
        );
    }
}
