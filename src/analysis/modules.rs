//! A small library of QC modules driven by the pipeline.

use std::any::Any;

use serde::Serialize;

use crate::analysis::module::AnalysisModule;
use crate::data_structs::annotation::AnnotationSet;
use crate::data_structs::record::AlnRecord;
use crate::data_structs::typedef::CountType;

/// Per-value histogram of mapping qualities.
///
/// Raises a warning when more than half of the observed reads carry
/// mapping quality zero.
pub struct MappingQualityDistribution {
    counts: Vec<CountType>,
    total:  CountType,
}

impl Default for MappingQualityDistribution {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingQualityDistribution {
    pub fn new() -> Self {
        Self {
            counts: vec![0; usize::from(u8::MAX) + 1],
            total:  0,
        }
    }

    /// Number of reads observed with the given mapping quality.
    pub fn count(
        &self,
        mapq: u8,
    ) -> CountType {
        self.counts[usize::from(mapq)]
    }

    pub fn counts(&self) -> &[CountType] {
        &self.counts
    }

    pub fn total(&self) -> CountType {
        self.total
    }
}

impl AnalysisModule for MappingQualityDistribution {
    fn name(&self) -> &str {
        "Mapping quality distribution"
    }

    fn reset(&mut self) {
        self.counts.fill(0);
        self.total = 0;
    }

    fn on_record(
        &mut self,
        record: &AlnRecord,
    ) {
        self.counts[usize::from(record.mapq())] += 1;
        self.total += 1;
    }

    fn raises_warning(&self) -> bool {
        self.total > 0 && self.counts[0] * 2 > self.total
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Counts total, aligned and unaligned reads.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ReadCounter {
    total:     CountType,
    aligned:   CountType,
    unaligned: CountType,
}

impl ReadCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> CountType {
        self.total
    }

    pub fn aligned(&self) -> CountType {
        self.aligned
    }

    pub fn unaligned(&self) -> CountType {
        self.unaligned
    }
}

impl AnalysisModule for ReadCounter {
    fn name(&self) -> &str {
        "Read counts"
    }

    fn reset(&mut self) {
        self.total = 0;
        self.aligned = 0;
        self.unaligned = 0;
    }

    fn on_record(
        &mut self,
        record: &AlnRecord,
    ) {
        self.total += 1;
        if record.is_aligned() {
            self.aligned += 1;
        }
        else {
            self.unaligned += 1;
        }
    }

    fn raises_error(&self) -> bool {
        self.total > 0 && self.aligned == 0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Overlap counts of one annotated (category, subclass) pair.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureClassSummary {
    pub category: String,
    pub subclass: String,
    pub features: usize,
    pub hits:     CountType,
}

/// Snapshot of per-subclass feature overlap counts.
///
/// Consumes the annotation set once, after the stream is exhausted and the
/// cache flushed; it never looks at individual records. Raises a warning
/// when an annotated subclass was never hit by any read.
#[derive(Debug, Default, Clone, Serialize)]
pub struct FeatureCoverage {
    summaries: Vec<FeatureClassSummary>,
}

impl FeatureCoverage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summaries(&self) -> &[FeatureClassSummary] {
        &self.summaries
    }
}

impl AnalysisModule for FeatureCoverage {
    fn name(&self) -> &str {
        "Feature coverage"
    }

    fn reset(&mut self) {
        self.summaries.clear();
    }

    fn wants_records(&self) -> bool {
        false
    }

    fn wants_annotation(&self) -> bool {
        true
    }

    fn on_annotation(
        &mut self,
        annotation: &AnnotationSet,
    ) {
        self.summaries = annotation
            .indexes()
            .map(|(category, subclass, index)| {
                FeatureClassSummary {
                    category: category.to_string(),
                    subclass: subclass.to_string(),
                    features: index.feature_count(),
                    hits:     index.hit_count(),
                }
            })
            .collect();
        self.summaries
            .sort_by(|a, b| {
                (a.category.as_str(), a.subclass.as_str())
                    .cmp(&(b.category.as_str(), b.subclass.as_str()))
            });
    }

    fn raises_warning(&self) -> bool {
        self.summaries
            .iter()
            .any(|s| s.features > 0 && s.hits == 0)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
