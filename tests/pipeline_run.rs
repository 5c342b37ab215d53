use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use alnqc::prelude::*;
use rstest::{
    fixture,
    rstest,
};
use tempfile::NamedTempFile;

const GFF: &str = "\
##gff-version 3
1\ttest\tgene\t1000\t5000\t.\t+\t.\tID=g1;Name=G1;biotype=protein_coding
1\ttest\texon\t1000\t1500\t.\t+\t.\tID=e1;Parent=g1
2\ttest\tgene\t2000\t3000\t.\t-\t.\tID=g2;biotype=lncRNA
";

const SAM: &str = "\
@HD\tVN:1.6\tSO:coordinate
@SQ\tSN:1\tLN:248956422
r001\t0\t1\t1100\t0\t50M\t*\t0\t0\t*\t*
r002\t0\t1\t1200\t10\t50M\t*\t0\t0\t*\t*
r003\t16\t1\t4000\t255\t50M\t*\t0\t0\t*\t*
r004\t4\t*\t0\t0\t*\t*\t0\t0\t*\t*
";

// Same reads, named through the chr-prefixed synonyms.
const SAM_SYNONYMS: &str = "\
@HD\tVN:1.6
r001\t0\tchr1\t1100\t0\t50M\t*\t0\t0\t*\t*
r002\t0\tchr1\t1200\t10\t50M\t*\t0\t0\t*\t*
r003\t16\tchr1\t4000\t255\t50M\t*\t0\t0\t*\t*
";

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn quiet_config() -> RunnerConfig {
    RunnerConfig::default().with_progress_pause(Duration::ZERO)
}

#[fixture]
fn gff_file() -> NamedTempFile {
    let _ = pretty_env_logger::try_init();
    write_temp(GFF)
}

#[fixture]
fn sam_file() -> NamedTempFile {
    write_temp(SAM)
}

fn run_pipeline(
    sam: &Path,
    annotation: AnnotationSource,
) -> (Arc<AnalysisReport>, Vec<AnalysisEvent>) {
    let source = SamReader::from_path(sam).unwrap();
    let mut runner = AnalysisRunner::new(source)
        .with_config(quiet_config())
        .with_annotation(annotation)
        .with_module(MappingQualityDistribution::new())
        .with_module(ReadCounter::new())
        .with_module(FeatureCoverage::new());
    let events = runner.subscribe();
    let report = runner.run().unwrap();
    (report, events.try_iter().collect())
}

#[rstest]
fn sam_through_gff_annotation(
    gff_file: NamedTempFile,
    sam_file: NamedTempFile,
) {
    let (report, events) = run_pipeline(
        sam_file.path(),
        AnnotationSource::GffFile(gff_file.path().to_path_buf()),
    );

    assert_eq!(report.record_count(), 4);

    let counts = report
        .module("Read counts")
        .unwrap()
        .as_any()
        .downcast_ref::<ReadCounter>()
        .unwrap();
    assert_eq!(counts.total(), 4);
    assert_eq!(counts.aligned(), 3);
    assert_eq!(counts.unaligned(), 1);

    let mapq = report
        .module("Mapping quality distribution")
        .unwrap()
        .as_any()
        .downcast_ref::<MappingQualityDistribution>()
        .unwrap();
    assert_eq!(mapq.count(0), 2); // r001 plus the unaligned r004
    assert_eq!(mapq.count(10), 1);
    assert_eq!(mapq.count(255), 1);

    // Overlap counts per (category, subclass) index.
    let annotation = report.annotation();
    assert!(annotation.is_flushed());
    let gene_pc = annotation
        .category("gene")
        .unwrap()
        .subclass("protein_coding")
        .unwrap();
    assert_eq!(gene_pc.hit_count(), 3);
    let gene_lnc = annotation
        .category("gene")
        .unwrap()
        .subclass("lncRNA")
        .unwrap();
    assert_eq!(gene_lnc.hit_count(), 0);
    let exon = annotation
        .category("exon")
        .unwrap()
        .subclass("")
        .unwrap();
    assert_eq!(exon.hit_count(), 2);

    // The coverage module snapshotted the same numbers after the flush,
    // and flags the never-hit lncRNA class.
    let coverage = report
        .module("Feature coverage")
        .unwrap()
        .as_any()
        .downcast_ref::<FeatureCoverage>()
        .unwrap();
    let lnc = coverage
        .summaries()
        .iter()
        .find(|s| s.subclass == "lncRNA")
        .unwrap();
    assert_eq!(lnc.hits, 0);
    assert!(coverage.raises_warning());

    let snapshot = serde_json::to_value(coverage.summaries()).unwrap();
    assert!(snapshot.as_array().unwrap().len() >= 3);

    assert!(matches!(events.first(), Some(AnalysisEvent::Started { .. })));
    assert!(matches!(events.last(), Some(AnalysisEvent::Completed { .. })));
}

#[rstest]
fn genome_synonyms_normalize_records(gff_file: NamedTempFile) {
    let mut genome = Genome::from_gff("test-genome", gff_file.path()).unwrap();
    genome.add_synonym("chr1", "1", 0);
    genome.add_synonym("chr2", "2", 0);

    let sam = write_temp(SAM_SYNONYMS);
    let (report, _) = run_pipeline(
        sam.path(),
        AnnotationSource::Genome(Arc::new(genome)),
    );

    // Records named chr1 landed on the canonical chromosome 1.
    let annotation = report.annotation();
    assert!(annotation.chromosomes().get("chr1").is_none());
    assert_eq!(annotation.chromosomes().get("1").unwrap().seq_count(), 3);

    let gene_pc = annotation
        .category("gene")
        .unwrap()
        .subclass("protein_coding")
        .unwrap();
    assert_eq!(gene_pc.hit_count(), 3);
}

#[rstest]
fn run_without_annotation_still_counts_reads(sam_file: NamedTempFile) {
    let (report, _) = run_pipeline(sam_file.path(), AnnotationSource::None);
    assert_eq!(report.annotation().feature_count(), 0);

    let counts = report
        .module("Read counts")
        .unwrap()
        .as_any()
        .downcast_ref::<ReadCounter>()
        .unwrap();
    assert_eq!(counts.total(), 4);

    // Chromosome statistics accumulate even without any annotation.
    let chrom = report.annotation().chromosomes().get("1").unwrap();
    assert_eq!(chrom.seq_count(), 3);
    assert_eq!(chrom.length(), 4050);
}

#[rstest]
fn truncated_sam_fails_with_a_single_event(gff_file: NamedTempFile) {
    let sam = write_temp(
        "r001\t0\t1\t100\t60\t50M\t*\t0\t0\t*\t*\nr002\t0\t1\tBAD\t60\t50M\t*\t0\t0\t*\t*\n",
    );
    let source = SamReader::from_path(sam.path()).unwrap();
    let mut runner = AnalysisRunner::new(source)
        .with_config(quiet_config())
        .with_annotation(AnnotationSource::GffFile(gff_file.path().to_path_buf()))
        .with_module(ReadCounter::new());
    let events = runner.subscribe();

    assert!(runner.run().is_err());

    let events: Vec<_> = events.try_iter().collect();
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, AnalysisEvent::Failed { .. }))
            .count(),
        1
    );
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, AnalysisEvent::Completed { .. }))
    );
}
