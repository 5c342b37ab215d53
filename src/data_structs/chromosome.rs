use std::cmp::Ordering;

use hashbrown::HashMap;
use itertools::Itertools;
use serde::Serialize;

use crate::data_structs::record::AlnRecord;
use crate::data_structs::typedef::{
    CountType,
    PosType,
    QcSmallStr,
};
use crate::utils::compare_seq_names;

/// Bucket width of the per-chromosome coverage histogram.
pub const COVERAGE_BIN_WIDTH: PosType = 100_000;

/// Name resolving to no chromosome in a [`ChromRegistry`].
pub const NO_CHROMOSOME: &str = "*";

/// One reference sequence and its accumulated per-run statistics.
///
/// The observed length grows monotonically: annotation features declare an
/// initial extent and every alignment end seen afterwards can push it
/// further.
#[derive(Debug, Clone, Serialize)]
pub struct Chromosome {
    name:      QcSmallStr,
    length:    PosType,
    seq_count: CountType,
    coverage:  Vec<CountType>,
}

impl Chromosome {
    pub fn new(name: QcSmallStr) -> Self {
        Self {
            name,
            length: 0,
            seq_count: 0,
            coverage: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn length(&self) -> PosType {
        self.length
    }

    pub fn seq_count(&self) -> CountType {
        self.seq_count
    }

    /// Coverage histogram, one bucket per [`COVERAGE_BIN_WIDTH`] of
    /// reference coordinates.
    pub fn coverage(&self) -> &[CountType] {
        &self.coverage
    }

    /// Extends the observed length to at least `end`.
    pub fn extend_to(
        &mut self,
        end: PosType,
    ) {
        if end > self.length {
            self.length = end;
        }
    }

    /// Folds one alignment into the running statistics.
    pub fn process_record(
        &mut self,
        record: &AlnRecord,
    ) {
        self.extend_to(record.end());
        self.seq_count += 1;

        let bucket = (record.start() / COVERAGE_BIN_WIDTH) as usize;
        if bucket >= self.coverage.len() {
            self.coverage.resize(bucket + 1, 0);
        }
        self.coverage[bucket] += 1;
    }
}

impl PartialEq for Chromosome {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.name == other.name
    }
}

impl Eq for Chromosome {}

impl PartialOrd for Chromosome {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Chromosome {
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        compare_seq_names(self.name(), other.name())
            .then_with(|| self.name().cmp(other.name()))
    }
}

/// Canonical name-to-chromosome mapping for one run.
///
/// Chromosomes are created on first reference and never removed; the
/// registry lives as long as the run does.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChromRegistry {
    map: HashMap<QcSmallStr, Chromosome>,
}

impl ChromRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates-or-returns the chromosome with the given name. The
    /// [`NO_CHROMOSOME`] sentinel (and the empty name) resolve to no
    /// entity.
    pub fn get_or_create(
        &mut self,
        name: &str,
    ) -> Option<&mut Chromosome> {
        if name.is_empty() || name == NO_CHROMOSOME {
            return None;
        }
        Some(
            self.map
                .entry(QcSmallStr::from(name))
                .or_insert_with(|| Chromosome::new(QcSmallStr::from(name))),
        )
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&Chromosome> {
        self.map.get(&QcSmallStr::from(name))
    }

    /// Every known chromosome, sorted by the sequence-name ordering rule.
    pub fn all_sorted(&self) -> Vec<&Chromosome> {
        self.map.values().sorted().collect()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
