//! # alnqc
//!
//! `alnqc` is a Rust library for streaming quality-control analysis of
//! aligned sequencing data. It pulls alignment records out of an input
//! source one at a time, fans each record out to a set of QC analysis
//! modules and to a genomic annotation engine, and broadcasts progress and
//! completion to any number of listeners, while a scheduling queue bounds
//! how many files are analysed concurrently.
//!
//! ## Key Features
//!
//! * **Single-pass pipeline**: records are processed strictly in source
//!   order, once; per-module statistics, chromosome stats and annotation
//!   overlap counts all come out of the same pass
//!   ([`AnalysisRunner`]).
//! * **Bin-indexed annotation lookups**: features from a GFF3 annotation
//!   are partitioned by chromosome, sorted by start and indexed by
//!   fixed-width seek bins, so asking "does this alignment overlap an
//!   exon" costs amortized near-constant time across millions of records
//!   ([`FeatureIndex`]).
//! * **Capability-based modules**: a module declares whether it wants
//!   per-record data and/or the finished annotation set, and only the
//!   hooks it needs are driven ([`AnalysisModule`]).
//! * **Event-channel listeners**: started/progress/completed/failed events
//!   go out over crossbeam channels registered before the run starts
//!   ([`AnalysisEvent`]).
//! * **Bounded concurrency**: the scheduling queue admits queued pipelines
//!   first-in-first-out as slots free up ([`AnalysisQueue`]).
//!
//! ## Usage
//!
//! ```no_run
//! use alnqc::prelude::*;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let source = SamReader::from_path(Path::new("sample.sam"))?;
//!
//!     let mut runner = AnalysisRunner::new(source)
//!         .with_annotation(AnnotationSource::GffFile("annot.gff3".into()))
//!         .with_module(MappingQualityDistribution::new())
//!         .with_module(ReadCounter::new())
//!         .with_module(FeatureCoverage::new());
//!     let events = runner.subscribe();
//!
//!     let report = runner.run()?;
//!     for event in events.try_iter() {
//!         println!("{:?}", event);
//!     }
//!     println!("{} records analysed", report.record_count());
//!     Ok(())
//! }
//! ```
//!
//! Running several files with at most two pipelines in flight:
//!
//! ```no_run
//! use alnqc::prelude::*;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let queue = AnalysisQueue::new(QueueConfig::default().with_slots(2));
//!     for file in ["a.sam", "b.sam", "c.sam"] {
//!         let source = SamReader::from_path(Path::new(file))?;
//!         queue.submit(AnalysisRunner::new(source).with_module(ReadCounter::new()));
//!     }
//!     queue.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Structure
//!
//! * [`data_structs`]: chromosomes and their registry, alignment records,
//!   annotation features and the bin-indexed [`AnnotationSet`], reference
//!   genomes with name-synonym translation.
//! * [`io`]: the [`RecordSource`] adapter contract plus the SAM and
//!   in-memory implementations, and the GFF3 annotation loader.
//! * [`analysis`]: the module contract and library, the pipeline runner
//!   and the scheduling queue.
//! * [`utils`]: shared helper macros and the sequence-name ordering rule.

pub mod analysis;
pub mod data_structs;
pub mod io;
pub mod prelude;
pub mod utils;

#[allow(unused_imports)]
use prelude::*;
