use std::fs::File;
use std::path::Path;

use anyhow::{
    anyhow,
    bail,
    Context,
};
use arcstr::ArcStr;
use bio::io::gff::{
    GffType,
    Reader as GffReader,
    Record as GffRecord,
};
use hashbrown::HashMap;
use log::info;

use crate::data_structs::annotation::{
    AnnotationSet,
    Feature,
    FeatureLocation,
};
use crate::data_structs::enums::Strand;
use crate::data_structs::typedef::QcSmallStr;

const PROGRESS_STRIDE: usize = 100_000;

/// Attribute keys that carry the subclass/biotype tag, in lookup order.
const BIOTYPE_KEYS: [&str; 3] = ["biotype", "gene_biotype", "transcript_biotype"];

/// Parses a GFF3 file into a fresh [`AnnotationSet`].
pub fn annotation_from_gff(path: &Path) -> anyhow::Result<AnnotationSet> {
    let mut set = AnnotationSet::new();
    load_gff(&mut set, path)?;
    Ok(set)
}

/// Parses a GFF3 file into an existing [`AnnotationSet`], returning the
/// number of features loaded. Fails on the first malformed line.
pub fn load_gff(
    set: &mut AnnotationSet,
    path: &Path,
) -> anyhow::Result<usize> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open annotation {}", path.display()))?;
    let mut reader = GffReader::new(file, GffType::GFF3);

    let mut loaded = 0usize;
    for record in reader.records() {
        let record = record
            .map_err(|e| anyhow!(e))
            .with_context(|| format!("Malformed GFF line in {}", path.display()))?;
        set.add_feature(feature_from_gff(&record)?);
        loaded += 1;
        if loaded % PROGRESS_STRIDE == 0 {
            info!("Loaded {} annotation features from {}", loaded, path.display());
        }
    }

    info!(
        "Annotation {} loaded: {} features, {} chromosomes",
        path.display(),
        loaded,
        set.chromosomes().len()
    );
    Ok(loaded)
}

fn feature_from_gff(record: &GffRecord) -> anyhow::Result<Feature> {
    let start = *record.start();
    let end = *record.end();
    if start == 0 || end < start {
        bail!(
            "Invalid feature interval {}:{}-{}",
            record.seqname(),
            start,
            end
        );
    }

    let strand = Strand::from(record.strand());
    // GFF intervals are 1-based and end-inclusive; internal coordinates
    // are half-open.
    let location = FeatureLocation::new(start, end + 1, strand);

    let subclass = BIOTYPE_KEYS
        .iter()
        .find_map(|key| record.attributes().get(*key))
        .map(|v| ArcStr::from(v.as_str()));
    let name = record
        .attributes()
        .get("Name")
        .map(|v| QcSmallStr::from(v.as_str()));
    let id = record
        .attributes()
        .get("ID")
        .map(|v| QcSmallStr::from(v.as_str()));

    let attributes: HashMap<String, String> = record
        .attributes()
        .into_iter()
        .map(|(key, values)| (key.clone(), values.join(",")))
        .collect();

    Ok(Feature::new(
        QcSmallStr::from(record.seqname()),
        location,
        Some(ArcStr::from(record.feature_type())),
        subclass,
        name,
        id,
        Some(attributes),
    ))
}
