pub use crate::analysis::module::AnalysisModule;
pub use crate::analysis::modules::{
    FeatureCoverage,
    MappingQualityDistribution,
    ReadCounter,
};
pub use crate::analysis::queue::{
    AnalysisQueue,
    QueueConfig,
};
pub use crate::analysis::runner::{
    AnalysisEvent,
    AnalysisReport,
    AnalysisRunner,
    AnnotationSource,
    RunState,
    RunnerConfig,
};
pub use crate::data_structs::annotation::{
    AnnotationSet,
    Feature,
    FeatureCategory,
    FeatureIndex,
    FeatureLocation,
    BIN_WIDTH,
};
pub use crate::data_structs::chromosome::{
    ChromRegistry,
    Chromosome,
    NO_CHROMOSOME,
};
pub use crate::data_structs::enums::Strand;
pub use crate::data_structs::genome::Genome;
pub use crate::data_structs::record::{
    AlnRecord,
    NO_REFERENCE,
};
pub use crate::data_structs::typedef::{
    CountType,
    PosType,
    QcSmallStr,
};
pub use crate::io::gff::{
    annotation_from_gff,
    load_gff,
};
pub use crate::io::sam::SamReader;
pub use crate::io::source::{
    MemorySource,
    RecordSource,
    SourceInfo,
};
