/// Maximum coordinate span between a cluster member and an incoming record.
pub const DEFAULT_WINDOW: i64 = 1000;
/// Distance tolerance for "same position"; 0 requires exact equality.
pub const DEFAULT_SLOP: f64 = 0.0;
pub const DEFAULT_USE_MAX_QUAL: bool = false;
pub const DEFAULT_COMPLEMENT: bool = false;

/// INFO tag carrying the comma-separated origin identifiers of a call.
pub const PROVENANCE_TAG: &str = "SNAME";
/// INFO tag recording matching variant ids from the filter file.
pub const FOUND_TAG: &str = "FOUND";

pub const VCF_FIXED_COLUMNS: usize = 8;
pub const VCF_FORMAT_COLUMN: usize = 8;
pub const VCF_FIRST_SAMPLE_COLUMN: usize = 9;

pub const BEDPE_FIXED_COLUMNS: usize = 14;
pub const BEDPE_FORMAT_COLUMN: usize = 14;
pub const BEDPE_FIRST_SAMPLE_COLUMN: usize = 15;
