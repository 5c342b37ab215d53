use std::fmt::Display;

use serde::Serialize;

use crate::data_structs::enums::Strand;
use crate::data_structs::typedef::{
    PosType,
    QcSmallStr,
};

/// Reference name carried by records without an alignment.
pub const NO_REFERENCE: &str = "*";

/// One aligned sequencing read: reference name, half-open reference
/// interval, mapping quality and strand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlnRecord {
    name:    QcSmallStr,
    seqname: QcSmallStr,
    start:   PosType,
    end:     PosType,
    mapq:    u8,
    strand:  Strand,
}

impl AlnRecord {
    pub fn new(
        name: QcSmallStr,
        seqname: QcSmallStr,
        start: PosType,
        end: PosType,
        mapq: u8,
        strand: Strand,
    ) -> Self {
        assert!(
            start <= end,
            "Start position must be less than or equal to end position"
        );
        Self {
            name,
            seqname,
            start,
            end,
            mapq,
            strand,
        }
    }

    /// Builds an unaligned record. Carries the [`NO_REFERENCE`] sentinel
    /// and no coordinates.
    pub fn unaligned(
        name: QcSmallStr,
        mapq: u8,
    ) -> Self {
        Self {
            name,
            seqname: QcSmallStr::from(NO_REFERENCE),
            start: 0,
            end: 0,
            mapq,
            strand: Strand::None,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn seqname(&self) -> &str {
        self.seqname.as_str()
    }

    pub fn start(&self) -> PosType {
        self.start
    }

    pub fn end(&self) -> PosType {
        self.end
    }

    pub fn mapq(&self) -> u8 {
        self.mapq
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Length of the reference interval covered by the alignment.
    pub fn span(&self) -> PosType {
        self.end - self.start
    }

    /// Whether this record maps to a real reference sequence.
    pub fn is_aligned(&self) -> bool {
        !self.seqname.is_empty() && self.seqname.as_str() != NO_REFERENCE
    }

    pub fn set_seqname(
        &mut self,
        seqname: &str,
    ) {
        self.seqname = QcSmallStr::from(seqname);
    }

    /// Shifts both coordinates by a signed offset, saturating at zero.
    pub fn shift(
        &mut self,
        offset: i64,
    ) {
        self.start = apply_offset(self.start, offset);
        self.end = apply_offset(self.end, offset);
    }
}

fn apply_offset(
    pos: PosType,
    offset: i64,
) -> PosType {
    if offset >= 0 {
        pos.saturating_add(offset as PosType)
    }
    else {
        pos.saturating_sub(offset.unsigned_abs())
    }
}

impl Display for AlnRecord {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}:{}-{} ({}) mapq={}",
            self.seqname.as_str(),
            self.start,
            self.end,
            self.strand,
            self.mapq
        )
    }
}
