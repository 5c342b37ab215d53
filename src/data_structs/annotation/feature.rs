use std::cmp::Ordering;
use std::fmt::Display;

use arcstr::ArcStr;
use hashbrown::HashMap;
use nanoid::nanoid;
use serde::Serialize;

use crate::data_structs::enums::Strand;
use crate::data_structs::typedef::{
    PosType,
    QcSmallStr,
};

/// Location of one annotation interval.
///
/// Spliced features carry their sub-intervals in `parts`; an empty `parts`
/// vector means the feature is contiguous. The outer `start`/`end` always
/// bound every part.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FeatureLocation {
    start:  PosType,
    end:    PosType,
    strand: Strand,
    parts:  Vec<(PosType, PosType)>,
}

impl FeatureLocation {
    pub fn new(
        start: PosType,
        end: PosType,
        strand: Strand,
    ) -> Self {
        assert!(
            start <= end,
            "Start position must be less than or equal to end position"
        );
        Self {
            start,
            end,
            strand,
            parts: Vec::new(),
        }
    }

    /// Builds a spliced location from its sub-intervals. Parts are sorted;
    /// the outer bounds are derived from them.
    pub fn from_parts(
        mut parts: Vec<(PosType, PosType)>,
        strand: Strand,
    ) -> Self {
        assert!(!parts.is_empty(), "A spliced location needs at least one part");
        parts.sort_unstable();
        let start = parts[0].0;
        let end = parts
            .iter()
            .map(|(_, e)| *e)
            .max()
            .unwrap_or(start);
        Self {
            start,
            end,
            strand,
            parts,
        }
    }

    pub fn start(&self) -> PosType {
        self.start
    }

    pub fn end(&self) -> PosType {
        self.end
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn parts(&self) -> &[(PosType, PosType)] {
        &self.parts
    }
}

impl Display for FeatureLocation {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}-{} ({})", self.start, self.end, self.strand)
    }
}

/// One annotated genomic interval: a location on a chromosome plus its
/// category ("exon", "gene", ...), subclass/biotype tag, best-effort
/// display name and stable identifier, and any free-form tag/value
/// annotations the source carried.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    seqname:    QcSmallStr,
    location:   FeatureLocation,
    category:   ArcStr,
    subclass:   ArcStr,
    name:       Option<QcSmallStr>,
    id:         QcSmallStr,
    attributes: HashMap<String, String>,
}

impl Feature {
    pub fn new(
        seqname: QcSmallStr,
        location: FeatureLocation,
        category: Option<ArcStr>,
        subclass: Option<ArcStr>,
        name: Option<QcSmallStr>,
        id: Option<QcSmallStr>,
        attributes: Option<HashMap<String, String>>,
    ) -> Self {
        let id = id.unwrap_or_else(|| nanoid!(16).into());
        Self {
            seqname,
            location,
            category: category.unwrap_or_default(),
            subclass: subclass.unwrap_or_default(),
            name,
            id,
            attributes: attributes.unwrap_or_default(),
        }
    }

    pub fn seqname(&self) -> &str {
        self.seqname.as_str()
    }

    pub fn location(&self) -> &FeatureLocation {
        &self.location
    }

    pub fn start(&self) -> PosType {
        self.location.start()
    }

    pub fn end(&self) -> PosType {
        self.location.end()
    }

    pub fn category(&self) -> &ArcStr {
        &self.category
    }

    pub fn subclass(&self) -> &ArcStr {
        &self.subclass
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// Exact interval-intersection test against a half-open query interval.
    pub fn overlaps(
        &self,
        start: PosType,
        end: PosType,
    ) -> bool {
        self.start() < end && self.end() > start
    }
}

impl PartialOrd for Feature {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for Feature {}

impl Ord for Feature {
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        self.location
            .cmp(&other.location)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl Display for Feature {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{} {}:{}",
            self.category,
            self.seqname.as_str(),
            self.location
        )
    }
}
