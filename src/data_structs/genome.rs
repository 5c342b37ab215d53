use std::path::Path;

use hashbrown::HashMap;

use crate::data_structs::annotation::AnnotationSet;
use crate::data_structs::record::AlnRecord;
use crate::data_structs::typedef::QcSmallStr;

/// A pre-built reference genome: one annotation set plus a name-translation
/// layer mapping sequence-name synonyms (e.g. `chr1` for `1`) to their
/// canonical names, each with an optional coordinate offset.
#[derive(Debug, Clone, Default)]
pub struct Genome {
    name:       String,
    annotation: AnnotationSet,
    synonyms:   HashMap<QcSmallStr, Synonym>,
}

#[derive(Debug, Clone)]
struct Synonym {
    canonical: QcSmallStr,
    offset:    i64,
}

impl Genome {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builds a genome whose annotation comes from a GFF3 file.
    pub fn from_gff<S: Into<String>>(
        name: S,
        path: &Path,
    ) -> anyhow::Result<Self> {
        let annotation = crate::io::gff::annotation_from_gff(path)?;
        Ok(Self {
            name: name.into(),
            annotation,
            synonyms: HashMap::new(),
        })
    }

    pub fn with_annotation(
        mut self,
        annotation: AnnotationSet,
    ) -> Self {
        self.annotation = annotation;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotation(&self) -> &AnnotationSet {
        &self.annotation
    }

    /// Registers `alias` as a synonym of `canonical`, shifting coordinates
    /// by `offset` when records are normalized through it.
    pub fn add_synonym(
        &mut self,
        alias: &str,
        canonical: &str,
        offset: i64,
    ) {
        self.synonyms.insert(
            QcSmallStr::from(alias),
            Synonym {
                canonical: QcSmallStr::from(canonical),
                offset,
            },
        );
    }

    /// Resolves a sequence name through the synonym table.
    pub fn resolve(
        &self,
        name: &str,
    ) -> Option<(&str, i64)> {
        self.synonyms
            .get(&QcSmallStr::from(name))
            .map(|s| (s.canonical.as_str(), s.offset))
    }

    /// Rewrites a record whose sequence name is a known synonym to the
    /// canonical name and coordinate frame. Unknown names pass through
    /// untouched.
    pub fn normalize(
        &self,
        record: &mut AlnRecord,
    ) {
        if let Some((canonical, offset)) = self.resolve(record.seqname()) {
            record.set_seqname(canonical);
            if offset != 0 {
                record.shift(offset);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structs::enums::Strand;

    #[test]
    fn synonyms_translate_names_and_coordinates() {
        let mut genome = Genome::new("GRCh38");
        genome.add_synonym("chr1", "1", 0);
        genome.add_synonym("1_alt", "1", 1000);

        let mut rec =
            AlnRecord::new("r".into(), "chr1".into(), 100, 150, 60, Strand::Forward);
        genome.normalize(&mut rec);
        assert_eq!(rec.seqname(), "1");
        assert_eq!((rec.start(), rec.end()), (100, 150));

        let mut rec =
            AlnRecord::new("r".into(), "1_alt".into(), 100, 150, 60, Strand::Forward);
        genome.normalize(&mut rec);
        assert_eq!(rec.seqname(), "1");
        assert_eq!((rec.start(), rec.end()), (1100, 1150));
    }

    #[test]
    fn unknown_names_pass_through() {
        let genome = Genome::new("empty");
        let mut rec =
            AlnRecord::new("r".into(), "7".into(), 5, 10, 60, Strand::Reverse);
        genome.normalize(&mut rec);
        assert_eq!(rec.seqname(), "7");
        assert_eq!((rec.start(), rec.end()), (5, 10));
    }
}
