use std::fs::File;
use std::path::{
    Path,
    PathBuf,
};

use anyhow::{
    anyhow,
    bail,
    Context,
};
use csv::StringRecord;
use log::debug;

use crate::data_structs::enums::Strand;
use crate::data_structs::record::{
    AlnRecord,
    NO_REFERENCE,
};
use crate::data_structs::typedef::{
    PosType,
    QcSmallStr,
};
use crate::io::source::RecordSource;

const FLAG_UNMAPPED: u16 = 0x4;
const FLAG_REVERSE: u16 = 0x10;

/// Streaming reader over plain-text SAM.
///
/// Header lines (`@...`) are skipped; each remaining tab-delimited line is
/// parsed into an [`AlnRecord`]. The reader keeps one record of lookahead
/// so that [`RecordSource::has_next`] can answer without consuming, and
/// estimates progress from the byte position within the file.
pub struct SamReader {
    name:     String,
    path:     PathBuf,
    reader:   csv::Reader<File>,
    peeked:   Option<csv::Result<Option<StringRecord>>>,
    file_len: u64,
}

impl SamReader {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let file_len = std::fs::metadata(path)
            .with_context(|| format!("Failed to stat {}", path.display()))?
            .len();
        let reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .comment(Some(b'@'))
            .from_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Opened SAM source {} ({} bytes)", name, file_len);
        Ok(Self {
            name,
            path: path.to_path_buf(),
            reader,
            peeked: None,
            file_len,
        })
    }

    fn fill_peek(&mut self) {
        if self.peeked.is_none() {
            let mut raw = StringRecord::new();
            self.peeked = Some(match self.reader.read_record(&mut raw) {
                Ok(true) => Ok(Some(raw)),
                Ok(false) => Ok(None),
                Err(e) => Err(e),
            });
        }
    }
}

impl RecordSource for SamReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn has_next(&mut self) -> bool {
        self.fill_peek();
        // A pending read error still counts: it surfaces on the next pull.
        !matches!(self.peeked, Some(Ok(None)))
    }

    fn next_record(&mut self) -> anyhow::Result<AlnRecord> {
        self.fill_peek();
        match self.peeked.take() {
            Some(Ok(Some(raw))) => parse_record(&raw),
            Some(Ok(None)) | None => bail!("Record pulled from an exhausted source"),
            Some(Err(e)) => Err(anyhow!(e)).context("Malformed SAM line"),
        }
    }

    fn percent_complete(&self) -> u32 {
        if self.file_len == 0 {
            return 100;
        }
        (self.reader.position().byte() * 100 / self.file_len) as u32
    }
}

fn parse_record(raw: &StringRecord) -> anyhow::Result<AlnRecord> {
    if raw.len() < 6 {
        bail!("SAM line has {} fields, expected at least 6", raw.len());
    }

    let name = QcSmallStr::from(raw.get(0).unwrap_or_default());
    let flag: u16 = raw
        .get(1)
        .unwrap_or_default()
        .parse()
        .map_err(|_| anyhow!("Invalid FLAG field: {:?}", raw.get(1)))?;
    let seqname = raw.get(2).unwrap_or_default();
    let pos: PosType = raw
        .get(3)
        .unwrap_or_default()
        .parse()
        .map_err(|_| anyhow!("Invalid POS field: {:?}", raw.get(3)))?;
    let mapq: u8 = raw
        .get(4)
        .unwrap_or_default()
        .parse()
        .map_err(|_| anyhow!("Invalid MAPQ field: {:?}", raw.get(4)))?;
    let cigar = raw.get(5).unwrap_or_default();

    if flag & FLAG_UNMAPPED != 0 || seqname == NO_REFERENCE {
        return Ok(AlnRecord::unaligned(name, mapq));
    }

    let strand = if flag & FLAG_REVERSE != 0 {
        Strand::Reverse
    }
    else {
        Strand::Forward
    };
    let span = reference_span(cigar)?;

    Ok(AlnRecord::new(
        name,
        QcSmallStr::from(seqname),
        pos,
        pos + span,
        mapq,
        strand,
    ))
}

/// Number of reference bases consumed by a CIGAR string. `M`, `D`, `N`,
/// `=` and `X` consume the reference; `I`, `S`, `H` and `P` do not.
fn reference_span(cigar: &str) -> anyhow::Result<PosType> {
    if cigar == "*" {
        return Ok(0);
    }

    let mut span: PosType = 0;
    let mut count: PosType = 0;
    for ch in cigar.chars() {
        if let Some(digit) = ch.to_digit(10) {
            count = count * 10 + digit as PosType;
            continue;
        }
        match ch {
            'M' | 'D' | 'N' | '=' | 'X' => span += count,
            'I' | 'S' | 'H' | 'P' => {},
            _ => bail!("Invalid CIGAR operation {:?} in {:?}", ch, cigar),
        }
        count = 0;
    }
    Ok(span)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAM: &str = "\
@HD\tVN:1.6\tSO:coordinate
@SQ\tSN:1\tLN:248956422
r001\t0\t1\t100\t60\t50M\t*\t0\t0\t*\t*
r002\t16\t1\t300\t10\t20M5D25M\t*\t0\t0\t*\t*
r003\t4\t*\t0\t0\t*\t*\t0\t0\t*\t*
";

    fn write_sam(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_records_and_skips_headers() {
        let file = write_sam(SAM);
        let mut reader = SamReader::from_path(file.path()).unwrap();

        assert!(reader.has_next());
        let first = reader.next_record().unwrap();
        assert_eq!(first.seqname(), "1");
        assert_eq!((first.start(), first.end()), (100, 150));
        assert_eq!(first.mapq(), 60);
        assert_eq!(first.strand(), Strand::Forward);

        let second = reader.next_record().unwrap();
        assert_eq!((second.start(), second.end()), (300, 350));
        assert_eq!(second.strand(), Strand::Reverse);

        let third = reader.next_record().unwrap();
        assert!(!third.is_aligned());

        assert!(!reader.has_next());
        assert_eq!(reader.percent_complete(), 100);
    }

    #[test]
    fn malformed_position_fails_the_pull() {
        let file = write_sam("r001\t0\t1\tnot_a_number\t60\t50M\t*\t0\t0\t*\t*\n");
        let mut reader = SamReader::from_path(file.path()).unwrap();
        assert!(reader.has_next());
        let err = reader.next_record().unwrap_err();
        assert!(err.to_string().contains("POS"));
    }

    #[test]
    fn reference_span_follows_cigar_semantics() {
        assert_eq!(reference_span("50M").unwrap(), 50);
        assert_eq!(reference_span("20M5D25M").unwrap(), 50);
        assert_eq!(reference_span("10S40M").unwrap(), 40);
        assert_eq!(reference_span("10M200N10M").unwrap(), 220);
        assert!(reference_span("10Q").is_err());
    }
}
