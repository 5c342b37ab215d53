use rand::rngs::StdRng;
use rand::{
    Rng,
    SeedableRng,
};
use rstest::{
    fixture,
    rstest,
};

use super::*;
use crate::data_structs::chromosome::ChromRegistry;
use crate::data_structs::enums::Strand;
use crate::data_structs::record::AlnRecord;
use crate::data_structs::typedef::PosType;

const CHROM_LEN: PosType = 1_000_000;

fn feature(
    seqname: &str,
    start: PosType,
    end: PosType,
) -> Feature {
    Feature::new(
        seqname.into(),
        FeatureLocation::new(start, end, Strand::Forward),
        Some("exon".into()),
        Some("protein_coding".into()),
        None,
        None,
        None,
    )
}

fn record(
    seqname: &str,
    start: PosType,
    end: PosType,
) -> AlnRecord {
    AlnRecord::new("read".into(), seqname.into(), start, end, 60, Strand::Forward)
}

#[fixture]
fn registry() -> ChromRegistry {
    let mut registry = ChromRegistry::new();
    registry
        .get_or_create("1")
        .unwrap()
        .extend_to(CHROM_LEN);
    registry
}

/// A feature that stays inside one seek bin. With features confined to
/// single bins, the bin seek is exhaustive and the index must agree with
/// a brute-force scan on every query.
fn random_bin_local_feature(rng: &mut StdRng) -> (PosType, PosType) {
    let start = rng.gen_range(0..CHROM_LEN - 1);
    let bin_end = (start / BIN_WIDTH + 1) * BIN_WIDTH;
    let max_len = (bin_end - start).min(5_000).max(1);
    let end = start + rng.gen_range(1..=max_len);
    (start, end)
}

#[rstest]
fn overlap_counts_match_brute_force(registry: ChromRegistry) {
    let mut rng = StdRng::seed_from_u64(42);

    let intervals: Vec<(PosType, PosType)> = (0..400)
        .map(|_| random_bin_local_feature(&mut rng))
        .collect();

    let mut index = FeatureIndex::new();
    for (start, end) in &intervals {
        index.add(feature("1", *start, *end));
    }

    let mut expected_hits = 0u64;
    for _ in 0..500 {
        let q_start = rng.gen_range(0..CHROM_LEN);
        let q_end = q_start + rng.gen_range(1..20_000);
        index.count_overlap("1", q_start, q_end, &registry);
        if intervals
            .iter()
            .any(|(s, e)| *s < q_end && *e > q_start)
        {
            expected_hits += 1;
        }
    }

    assert_eq!(index.hit_count(), expected_hits);
}

#[rstest]
fn queries_count_at_most_once(registry: ChromRegistry) {
    let mut index = FeatureIndex::new();
    // Three overlapping features; one query over all of them is one hit.
    index.add(feature("1", 100, 200));
    index.add(feature("1", 120, 220));
    index.add(feature("1", 140, 240));

    index.count_overlap("1", 0, 1000, &registry);
    assert_eq!(index.hit_count(), 1);

    index.count_overlap("1", 150, 160, &registry);
    assert_eq!(index.hit_count(), 2);
}

#[rstest]
fn bin_array_length_follows_chromosome_length() {
    let mut registry = ChromRegistry::new();
    registry
        .get_or_create("1")
        .unwrap()
        .extend_to(250_000);
    registry
        .get_or_create("2")
        .unwrap()
        .extend_to(200_000);

    let mut index = FeatureIndex::new();
    index.add(feature("1", 10, 20));
    index.add(feature("2", 10, 20));
    index.finalize(&registry);

    // 250_000 / 100_000 + 1 = 3, plus one extra: not an exact multiple.
    assert_eq!(index.bin_count("1"), Some(4));
    // 200_000 is an exact multiple: 2 + 1 bins.
    assert_eq!(index.bin_count("2"), Some(3));
}

#[rstest]
#[should_panic(expected = "finalized")]
fn adding_after_finalize_panics(registry: ChromRegistry) {
    let mut index = FeatureIndex::new();
    index.add(feature("1", 100, 200));
    index.count_overlap("1", 0, 50, &registry);
    index.add(feature("1", 300, 400));
}

#[rstest]
fn empty_index_answers_without_cost(registry: ChromRegistry) {
    let mut index = FeatureIndex::new();
    index.count_overlap("1", 0, 1000, &registry);
    assert!(index.is_finalized());
    assert!(index.is_empty());
    assert_eq!(index.hit_count(), 0);
}

#[rstest]
fn query_beyond_indexed_range_is_skipped() {
    let mut registry = ChromRegistry::new();
    registry.get_or_create("1").unwrap().extend_to(100);

    let mut index = FeatureIndex::new();
    index.add(feature("1", 10, 90));
    // Two bins cover the declared length; a start far past it is logged
    // and ignored rather than failing the run.
    index.count_overlap("1", 500_000, 500_100, &registry);
    assert_eq!(index.hit_count(), 0);

    index.count_overlap("1", 20, 30, &registry);
    assert_eq!(index.hit_count(), 1);
}

#[rstest]
fn unknown_chromosome_is_a_no_op(registry: ChromRegistry) {
    let mut index = FeatureIndex::new();
    index.add(feature("1", 100, 200));
    index.count_overlap("MT", 100, 200, &registry);
    assert_eq!(index.hit_count(), 0);
    index.count_overlap("1", 100, 200, &registry);
    assert_eq!(index.hit_count(), 1);
}

#[fixture]
fn small_set() -> AnnotationSet {
    let mut set = AnnotationSet::new();
    set.add_feature(feature("1", 1_000, 2_000));
    set.add_feature(feature("1", 150_000, 160_000));
    set.add_feature(feature("2", 5_000, 6_000));
    set
}

#[rstest]
fn set_routes_records_to_every_index(mut small_set: AnnotationSet) {
    small_set.process_record(&record("1", 1_500, 1_600));
    small_set.process_record(&record("2", 5_500, 5_600));
    small_set.process_record(&record("1", 900_000, 900_100));
    small_set.flush_cache();

    let index = small_set
        .category("exon")
        .unwrap()
        .subclass("protein_coding")
        .unwrap();
    assert_eq!(index.feature_count(), 3);
    assert_eq!(index.hit_count(), 2);

    let chrom1 = small_set.chromosomes().get("1").unwrap();
    assert_eq!(chrom1.seq_count(), 2);
    // Annotation declared 160_000; the far record extended it.
    assert_eq!(chrom1.length(), 900_100);
}

#[rstest]
fn flush_is_batching_independent(small_set: AnnotationSet) {
    let records: Vec<AlnRecord> = (0..10)
        .map(|i| record("1", 1_000 + i * 50, 1_100 + i * 50))
        .collect();

    let mut one_pass = small_set.clone();
    for rec in &records {
        one_pass.process_record(rec);
    }
    one_pass.flush_cache();

    let mut split_pass = small_set;
    let (head, tail) = records.split_at(3);
    for rec in head {
        split_pass.process_record(rec);
    }
    for rec in tail {
        split_pass.process_record(rec);
    }
    split_pass.flush_cache();

    let hits = |set: &AnnotationSet| {
        set.category("exon")
            .unwrap()
            .subclass("protein_coding")
            .unwrap()
            .hit_count()
    };
    assert_eq!(hits(&one_pass), hits(&split_pass));
}

#[rstest]
#[should_panic(expected = "flushed twice")]
fn double_flush_panics(mut small_set: AnnotationSet) {
    small_set.process_record(&record("1", 1_500, 1_600));
    small_set.flush_cache();
    small_set.flush_cache();
}

#[rstest]
#[should_panic(expected = "finalized")]
fn set_rejects_features_after_first_record(mut small_set: AnnotationSet) {
    small_set.process_record(&record("1", 1_500, 1_600));
    small_set.add_feature(feature("1", 700_000, 710_000));
}

#[test]
fn unaligned_records_touch_no_chromosome() {
    let mut set = AnnotationSet::new();
    set.add_feature(feature("1", 100, 200));
    set.process_record(&AlnRecord::unaligned("r".into(), 0));
    assert!(set.chromosomes().get("*").is_none());
    assert_eq!(set.chromosomes().len(), 1);
}

#[test]
fn spliced_locations_order_by_start() {
    let spliced =
        FeatureLocation::from_parts(vec![(500, 600), (100, 200)], Strand::Forward);
    assert_eq!(spliced.start(), 100);
    assert_eq!(spliced.end(), 600);
    assert_eq!(spliced.parts().len(), 2);

    let plain = FeatureLocation::new(150, 250, Strand::Forward);
    assert!(spliced < plain);
}

#[test]
fn features_serialize_for_report_consumers() {
    let feat = feature("1", 100, 200);
    let value = serde_json::to_value(&feat).unwrap();
    assert_eq!(value["seqname"], "1");
    assert_eq!(value["category"], "exon");
    assert_eq!(value["location"]["start"], 100);
}
