use arcstr::ArcStr;
use hashbrown::HashMap;
use log::debug;

use crate::data_structs::annotation::feature::Feature;
use crate::data_structs::annotation::index::FeatureIndex;
use crate::data_structs::chromosome::ChromRegistry;
use crate::data_structs::record::AlnRecord;

/// Subclass-to-index container for one feature category.
#[derive(Debug, Clone, Default)]
pub struct FeatureCategory {
    subclasses: HashMap<ArcStr, FeatureIndex>,
}

impl FeatureCategory {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(
        &mut self,
        feature: Feature,
    ) {
        self.subclasses
            .entry(feature.subclass().clone())
            .or_default()
            .add(feature);
    }

    pub fn subclass(
        &self,
        name: &str,
    ) -> Option<&FeatureIndex> {
        self.subclasses.get(name)
    }

    pub fn subclasses(&self) -> impl Iterator<Item = (&ArcStr, &FeatureIndex)> {
        self.subclasses.iter()
    }

    pub fn len(&self) -> usize {
        self.subclasses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subclasses.is_empty()
    }
}

/// Per-run annotation state: the chromosome registry plus every feature
/// category's overlap indexes.
///
/// Features are routed to their (category, subclass) index, creating
/// containers on demand; containers are append-only until the first record
/// is processed, which finalizes the indexes it touches. After the last
/// record of a run [`AnnotationSet::flush_cache`] must be called exactly
/// once, before any final count is read.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    chromosomes:   ChromRegistry,
    categories:    HashMap<ArcStr, FeatureCategory>,
    feature_count: usize,
    flushed:       bool,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chromosomes(&self) -> &ChromRegistry {
        &self.chromosomes
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn category(
        &self,
        name: &str,
    ) -> Option<&FeatureCategory> {
        self.categories.get(name)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&ArcStr, &FeatureCategory)> {
        self.categories.iter()
    }

    /// Routes a feature to its (category, subclass) index. The owning
    /// chromosome's registered length is extended to cover the feature, so
    /// seek bins built later span the annotated genome.
    pub fn add_feature(
        &mut self,
        feature: Feature,
    ) {
        if let Some(chrom) = self.chromosomes.get_or_create(feature.seqname()) {
            chrom.extend_to(feature.end());
        }
        self.feature_count += 1;
        self.categories
            .entry(feature.category().clone())
            .or_default()
            .add(feature);
    }

    /// Folds one record into the chromosome statistics and fans it out to
    /// every feature index.
    pub fn process_record(
        &mut self,
        record: &AlnRecord,
    ) {
        debug_assert!(
            !self.flushed,
            "Record processed after the annotation cache was flushed"
        );

        if record.is_aligned() {
            if let Some(chrom) = self.chromosomes.get_or_create(record.seqname()) {
                chrom.process_record(record);
            }
        }

        for category in self.categories.values_mut() {
            for index in category.subclasses.values_mut() {
                index.count_overlap(
                    record.seqname(),
                    record.start(),
                    record.end(),
                    &self.chromosomes,
                );
            }
        }
    }

    /// End-of-stream hook, to be invoked exactly once after the last
    /// record of a run. Any batched counting strategy finalizes here;
    /// final counts are reliable only afterwards.
    ///
    /// # Panics
    ///
    /// Panics if called twice for the same run.
    pub fn flush_cache(&mut self) {
        assert!(!self.flushed, "Annotation cache flushed twice");
        self.flushed = true;
        debug!(
            "Annotation cache flushed: {} features in {} categories",
            self.feature_count,
            self.categories.len()
        );
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    /// Flat iterator over every (category, subclass, index) triple.
    pub fn indexes(&self) -> impl Iterator<Item = (&ArcStr, &ArcStr, &FeatureIndex)> {
        self.categories.iter().flat_map(|(category, container)| {
            container
                .subclasses
                .iter()
                .map(move |(subclass, index)| (category, subclass, index))
        })
    }
}
