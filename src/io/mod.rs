pub mod gff;
pub mod sam;
pub mod source;

pub use sam::SamReader;
pub use source::{
    MemorySource,
    RecordSource,
    SourceInfo,
};
