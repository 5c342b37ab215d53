use hashbrown::HashMap;
use itertools::Itertools;
use log::debug;

use crate::data_structs::annotation::feature::Feature;
use crate::data_structs::chromosome::ChromRegistry;
use crate::data_structs::typedef::{
    CountType,
    PosType,
    QcSmallStr,
};

/// Width of one seek bin in reference coordinates.
pub const BIN_WIDTH: PosType = 100_000;

/// Sorted feature array plus seek bins for one chromosome.
///
/// `bins[i]` holds the index of the first feature whose start lies at or
/// after bin `i`'s lower bound; a query seeks through it instead of
/// scanning the whole array.
#[derive(Debug, Clone)]
struct ChromSlot {
    features: Vec<Feature>,
    bins:     Vec<usize>,
}

impl ChromSlot {
    fn build(
        mut features: Vec<Feature>,
        chrom_length: PosType,
    ) -> Self {
        features.sort_unstable();

        let mut n_bins = (chrom_length / BIN_WIDTH) as usize + 1;
        if chrom_length % BIN_WIDTH != 0 {
            n_bins += 1;
        }

        let mut bins = Vec::with_capacity(n_bins);
        let mut next = 0usize;
        for bin in 0..n_bins {
            let lower_bound = bin as PosType * BIN_WIDTH;
            while next < features.len() && features[next].start() < lower_bound {
                next += 1;
            }
            bins.push(next);
        }

        Self { features, bins }
    }
}

/// Cache of the last chromosome a query resolved, invalidated whenever the
/// queried name changes.
#[derive(Debug, Clone, Default)]
struct LastResolved {
    seqname: QcSmallStr,
    slot:    Option<usize>,
}

/// Bin-indexed overlap lookup over the features of one subclass.
///
/// Features are accepted in any order until the first query finalizes the
/// index; afterwards the structure is immutable and adding is a contract
/// violation. Queries count how many queried intervals overlapped at least
/// one feature.
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    pending:   HashMap<QcSmallStr, Vec<Feature>>,
    slots:     Vec<ChromSlot>,
    slot_ids:  HashMap<QcSmallStr, usize>,
    last:      LastResolved,
    finalized: bool,
    count:     usize,
    hits:      CountType,
}

impl FeatureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of features held by this index.
    pub fn feature_count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of queried intervals that overlapped at least one feature.
    pub fn hit_count(&self) -> CountType {
        self.hits
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Adds a feature to the not-yet-finalized index.
    ///
    /// # Panics
    ///
    /// Panics if the index has already been finalized by a query.
    pub fn add(
        &mut self,
        feature: Feature,
    ) {
        assert!(
            !self.finalized,
            "Feature added to an already finalized index"
        );
        self.count += 1;
        self.pending
            .entry(QcSmallStr::from(feature.seqname()))
            .or_default()
            .push(feature);
    }

    /// Sorts every chromosome's features and builds the seek bins. Bin
    /// array sizes come from the registered chromosome lengths.
    pub fn finalize(
        &mut self,
        chromosomes: &ChromRegistry,
    ) {
        if self.finalized {
            return;
        }

        for (seqname, features) in self.pending.drain().sorted_by(|a, b| a.0.cmp(&b.0)) {
            let chrom_length = chromosomes
                .get(seqname.as_str())
                .map(|c| c.length())
                .unwrap_or_else(|| {
                    features
                        .iter()
                        .map(|f| f.end())
                        .max()
                        .unwrap_or(0)
                });
            self.slot_ids
                .insert(seqname, self.slots.len());
            self.slots
                .push(ChromSlot::build(features, chrom_length));
        }
        self.finalized = true;
        self.last = LastResolved::default();
    }

    /// Counts the query interval as hit if any feature on `seqname`
    /// overlaps the half-open interval `[start, end)`.
    ///
    /// Finalizes the index on first use. A query whose start falls beyond
    /// the indexed bin range is a tolerated data-quality condition: it is
    /// logged and skipped.
    pub fn count_overlap(
        &mut self,
        seqname: &str,
        start: PosType,
        end: PosType,
        chromosomes: &ChromRegistry,
    ) {
        if !self.finalized {
            self.finalize(chromosomes);
        }

        if self.last.seqname.as_str() != seqname {
            self.last = LastResolved {
                seqname: QcSmallStr::from(seqname),
                slot:    self
                    .slot_ids
                    .get(&QcSmallStr::from(seqname))
                    .copied(),
            };
        }
        let Some(slot) = self.last.slot else {
            return;
        };
        let chrom = &self.slots[slot];

        let bin = (start / BIN_WIDTH) as usize;
        if bin >= chrom.bins.len() {
            debug!(
                "Interval {}:{}-{} starts beyond the indexed range ({} bins); skipping",
                seqname,
                start,
                end,
                chrom.bins.len()
            );
            return;
        }

        let mut idx = chrom.bins[bin];
        while idx < chrom.features.len() {
            let feature = &chrom.features[idx];
            if feature.start() > end {
                break;
            }
            if feature.overlaps(start, end) {
                self.hits += 1;
                break;
            }
            idx += 1;
        }
    }

    /// Sorted features for one chromosome, if the index holds any.
    /// Available only after finalization.
    pub fn features(
        &self,
        seqname: &str,
    ) -> Option<&[Feature]> {
        self.slot_ids
            .get(&QcSmallStr::from(seqname))
            .map(|&slot| self.slots[slot].features.as_slice())
    }

    /// Number of seek bins built for one chromosome.
    pub fn bin_count(
        &self,
        seqname: &str,
    ) -> Option<usize> {
        self.slot_ids
            .get(&QcSmallStr::from(seqname))
            .map(|&slot| self.slots[slot].bins.len())
    }
}
