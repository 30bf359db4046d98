//! Single-pass clustering of a coordinate-sorted record stream.
//!
//! The engine keeps a sliding window of open clusters keyed by genomic
//! proximity and provenance linkage. Because the input is sorted, a cluster
//! whose span has fallen more than `window` behind the current coordinate can
//! never gain another member; it is merged and emitted at that point, in
//! cluster-open order, which keeps the output stream coordinate-sorted with
//! memory bounded by the window.

use crate::{
    constants::*,
    core::{
        format::{clip_out_tag, is_null_genotype, null_format_string, update_origin_tag},
        header::Schema,
        provenance,
        record::Record,
    },
    error::SvlinkError,
    utils::util::Result,
};
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone)]
pub struct ClusterSettings {
    /// Maximum coordinate span between an incoming record and a cluster
    /// member. Also drives the flush trigger.
    pub window: i64,
    /// Distance tolerance for "same position"; 0 requires exact equality.
    pub slop: f64,
    pub provenance_tag: String,
    /// Pick the highest-QUAL member as the merge template instead of the
    /// first member by input order.
    pub use_max_qual: bool,
    /// Caller-specific `NAME=` tags clipped from merged records.
    pub drop_tags: Vec<String>,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            slop: DEFAULT_SLOP,
            provenance_tag: PROVENANCE_TAG.to_string(),
            use_max_qual: DEFAULT_USE_MAX_QUAL,
            drop_tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterState {
    /// Accepting members.
    Open,
    /// The window has moved past the cluster; flush is pending.
    Closing,
    /// Consensus record emitted; the cluster is discarded.
    Flushed,
}

/// A group of mutually provenance-linked records within the proximity
/// window, destined to be merged into one consensus record.
#[derive(Debug)]
pub struct Cluster {
    members: Vec<Record>,
    origin_sets: Vec<HashSet<String>>,
    positions: Vec<i64>,
    min_pos: i64,
    max_pos: i64,
    state: ClusterState,
}

impl Cluster {
    fn new(record: Record, origins: HashSet<String>) -> Self {
        let pos = record.pos();
        Self {
            members: vec![record],
            origin_sets: vec![origins],
            positions: vec![pos],
            min_pos: pos,
            max_pos: pos,
            state: ClusterState::Open,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn state(&self) -> ClusterState {
        self.state
    }

    pub fn bounds(&self) -> (i64, i64) {
        (self.min_pos, self.max_pos)
    }

    /// Membership test: at least one member must be within distance *and*
    /// share an origin with the incoming record.
    fn accepts(&self, pos: i64, origins: &HashSet<String>, settings: &ClusterSettings) -> bool {
        let near: Vec<(usize, HashSet<String>)> = self
            .positions
            .iter()
            .enumerate()
            .filter(|(_, &member_pos)| positions_match(pos, member_pos, settings))
            .map(|(idx, _)| (idx, self.origin_sets[idx].clone()))
            .collect();
        !provenance::overlapping_ids(origins, &near).is_empty()
    }

    fn admit(&mut self, record: Record, origins: HashSet<String>) {
        let pos = record.pos();
        self.members.push(record);
        self.origin_sets.push(origins);
        self.positions.push(pos);
        self.min_pos = self.min_pos.min(pos);
        self.max_pos = self.max_pos.max(pos);
    }
}

/// Distance predicate between two breakend start coordinates. Both must lie
/// within the window; `slop` then decides how close counts as the same
/// position, with 0 demanding exact equality.
fn positions_match(a: i64, b: i64, settings: &ClusterSettings) -> bool {
    let dist = (a - b).abs();
    if dist > settings.window {
        return false;
    }
    if settings.slop == 0.0 {
        dist == 0
    } else {
        dist as f64 <= settings.slop
    }
}

pub struct ClusterEngine {
    settings: ClusterSettings,
    open: VecDeque<Cluster>,
    current_chrom: Option<String>,
    last_pos: i64,
    finished_chroms: HashSet<String>,
}

impl ClusterEngine {
    pub fn new(settings: ClusterSettings) -> Self {
        Self {
            settings,
            open: VecDeque::new(),
            current_chrom: None,
            last_pos: 0,
            finished_chroms: HashSet::new(),
        }
    }

    pub fn open_clusters(&self) -> usize {
        self.open.len()
    }

    /// Feeds the next record of the sorted stream. Returns the consensus
    /// records of every cluster that became unreachable, in cluster-open
    /// order. Out-of-order input is unrecoverable here (re-sorting is the
    /// caller's job) and fails fast.
    pub fn push(&mut self, record: Record, schema: &Schema) -> Result<Vec<Record>> {
        let chrom = record.chrom().to_string();
        let pos = record.pos();

        let mut flushed = Vec::new();
        match &self.current_chrom {
            Some(current) if *current == chrom => {
                if pos < self.last_pos {
                    return Err(SvlinkError::OrderViolation {
                        chrom,
                        pos,
                        previous: self.last_pos,
                    });
                }
            }
            _ => {
                if self.finished_chroms.contains(&chrom) {
                    return Err(SvlinkError::OrderViolation {
                        chrom,
                        pos,
                        previous: self.last_pos,
                    });
                }
                if let Some(previous) = self.current_chrom.take() {
                    self.finished_chroms.insert(previous);
                    flushed.extend(self.flush_all(schema)?);
                }
                self.current_chrom = Some(chrom);
            }
        }
        self.last_pos = pos;

        // Clusters more than a window behind can never be reached again.
        let mut idx = 0;
        while idx < self.open.len() {
            if pos - self.open[idx].max_pos > self.settings.window {
                let mut cluster = self.open.remove(idx).expect("index is in bounds");
                cluster.state = ClusterState::Closing;
                flushed.push(self.merge_cluster(cluster, schema)?);
            } else {
                idx += 1;
            }
        }

        let origins = provenance::origin_set(&record, &self.settings.provenance_tag)
            .unwrap_or_default();
        let target = if origins.is_empty() {
            // No provenance: the record can never be linked, it clusters alone.
            None
        } else {
            self.open
                .iter()
                .position(|cluster| cluster.accepts(pos, &origins, &self.settings))
        };
        match target {
            Some(idx) => self.open[idx].admit(record, origins),
            None => self.open.push_back(Cluster::new(record, origins)),
        }

        Ok(flushed)
    }

    /// Flushes every remaining cluster at end of stream.
    pub fn finish(&mut self, schema: &Schema) -> Result<Vec<Record>> {
        self.flush_all(schema)
    }

    fn flush_all(&mut self, schema: &Schema) -> Result<Vec<Record>> {
        let mut flushed = Vec::new();
        while let Some(mut cluster) = self.open.pop_front() {
            cluster.state = ClusterState::Closing;
            flushed.push(self.merge_cluster(cluster, schema)?);
        }
        Ok(flushed)
    }

    /// Merges a closing cluster into its consensus record.
    fn merge_cluster(&self, mut cluster: Cluster, schema: &Schema) -> Result<Record> {
        debug_assert_eq!(cluster.state, ClusterState::Closing);
        let members = std::mem::take(&mut cluster.members);

        let template_idx = if self.settings.use_max_qual {
            max_qual_index(&members)
        } else {
            0
        };

        // Every contributing origin id enters the merged provenance tag with
        // its member ordinal as numeric disambiguator, so repeated origin
        // names from different members stay distinct.
        let mut merged_origins: Vec<String> = Vec::new();
        for (ordinal, member) in members.iter().enumerate() {
            let info = member.info_string();
            if let Some((_, original)) =
                update_origin_tag(&info, &self.settings.provenance_tag, &ordinal.to_string())
            {
                for origin in original.split(',').filter(|origin| !origin.is_empty()) {
                    merged_origins.push(format!("{origin}:{ordinal}"));
                }
            }
        }

        let mut others = members;
        let mut template = others.remove(template_idx);
        log::trace!(
            "Flushing cluster {}:{}-{} with {} members, template {}",
            template.chrom(),
            cluster.min_pos,
            cluster.max_pos,
            others.len() + 1,
            template.id()
        );

        self.merge_genotypes(&mut template, &others, schema)?;

        if !merged_origins.is_empty() {
            template.set_tag(&self.settings.provenance_tag, &merged_origins.join(","));
        }
        for tag in &self.settings.drop_tags {
            let clipped = clip_out_tag(&template.info_string(), &format!("{tag}="));
            template.set_info_string(&clipped);
        }

        cluster.state = ClusterState::Flushed;
        Ok(template)
    }

    /// Per-sample genotype synthesis: the template's value wins unless it is
    /// null, in which case the first member carrying a non-null value for
    /// that sample supplies it. Samples no member covers keep a synthesized
    /// all-missing string matching the template FORMAT.
    fn merge_genotypes(
        &self,
        template: &mut Record,
        others: &[Record],
        schema: &Schema,
    ) -> Result<()> {
        let format_spec = match template.format_spec() {
            Some(spec) => Some(spec.to_string()),
            None => others
                .iter()
                .find_map(|member| member.format_spec())
                .map(str::to_string),
        };
        let Some(format_spec) = format_spec else {
            // No member carries genotype columns.
            return Ok(());
        };

        let null_value = null_format_string(&format_spec);
        if !template.has_genotypes() {
            template.push_genotypes(
                &format_spec,
                vec![null_value.clone(); schema.sample_count()],
            );
        }

        for sample_idx in 0..schema.sample_count() {
            let is_null = template
                .sample_value(sample_idx)
                .map(is_null_genotype)
                .unwrap_or(true);
            if !is_null {
                continue;
            }
            let replacement = others
                .iter()
                .filter_map(|member| member.sample_value(sample_idx))
                .find(|value| !is_null_genotype(value))
                .map(str::to_string);
            if let Some(value) = replacement {
                template.set_sample_value(sample_idx, value)?;
            }
        }
        Ok(())
    }
}

/// Index of the highest-QUAL member; missing QUAL ranks lowest, ties keep
/// the earliest member.
fn max_qual_index(members: &[Record]) -> usize {
    let mut best = 0;
    let mut best_qual = members[0].qual().unwrap_or(f64::NEG_INFINITY);
    for (idx, member) in members.iter().enumerate().skip(1) {
        let qual = member.qual().unwrap_or(f64::NEG_INFINITY);
        if qual > best_qual {
            best = idx;
            best_qual = qual;
        }
    }
    best
}
