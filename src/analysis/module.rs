use std::any::Any;

use crate::data_structs::annotation::AnnotationSet;
use crate::data_structs::record::AlnRecord;
use crate::io::source::SourceInfo;

/// Capability contract of one QC analysis module.
///
/// The pipeline does not know what a module computes, only how to drive
/// it: hooks are invoked conditionally on the declared capability flags,
/// so a module implements only what it needs. Modules must be
/// independently resettable so one module set can be re-run.
pub trait AnalysisModule: Send + Sync {
    fn name(&self) -> &str;

    /// Clears all accumulated state, returning the module to its
    /// just-constructed condition.
    fn reset(&mut self);

    /// Whether [`AnalysisModule::on_record`] should be called for every
    /// record of the stream.
    fn wants_records(&self) -> bool {
        true
    }

    /// Whether [`AnalysisModule::on_annotation`] should be called once the
    /// stream is exhausted and the annotation cache flushed.
    fn wants_annotation(&self) -> bool {
        false
    }

    fn on_file_start(
        &mut self,
        _source: &SourceInfo,
    ) {
    }

    fn on_record(
        &mut self,
        _record: &AlnRecord,
    ) {
    }

    fn on_annotation(
        &mut self,
        _annotation: &AnnotationSet,
    ) {
    }

    /// Whether the accumulated statistic crosses the module's error
    /// threshold.
    fn raises_error(&self) -> bool {
        false
    }

    /// Whether the accumulated statistic crosses the module's warning
    /// threshold.
    fn raises_warning(&self) -> bool {
        false
    }

    /// Whether the report renderer should skip this module.
    fn exclude_from_report(&self) -> bool {
        false
    }

    /// Concrete-type access for the report renderer.
    fn as_any(&self) -> &dyn Any;
}
