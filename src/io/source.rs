use std::collections::VecDeque;
use std::path::{
    Path,
    PathBuf,
};

use anyhow::bail;
use serde::Serialize;

use crate::data_structs::record::AlnRecord;

/// Descriptor of an input source, handed to analysis modules when a file
/// starts.
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub name: String,
    pub path: Option<PathBuf>,
}

/// Contract exposed by a file-format adapter: sequential pull of alignment
/// records with a progress estimate.
pub trait RecordSource {
    /// Human-readable name of the source (usually the file name).
    fn name(&self) -> &str;

    fn path(&self) -> Option<&Path> {
        None
    }

    /// Whether another record (or a pending format error) is available.
    fn has_next(&mut self) -> bool;

    /// Pulls the next record. A malformed record fails here and is fatal
    /// to the run consuming this source.
    fn next_record(&mut self) -> anyhow::Result<AlnRecord>;

    /// Percent of the source consumed so far. May exceed 100 when the
    /// size estimate was wrong.
    fn percent_complete(&self) -> u32;

    fn info(&self) -> SourceInfo {
        SourceInfo {
            name: self.name().to_string(),
            path: self.path().map(Path::to_path_buf),
        }
    }
}

enum QueuedItem {
    Record(AlnRecord),
    Failure(String),
}

/// In-memory record source.
///
/// Holds a queue of pre-built records, plus optionally an injected format
/// failure, and reports progress from the consumed fraction. Useful for
/// driving a pipeline without touching the filesystem.
pub struct MemorySource {
    name:     String,
    queue:    VecDeque<QueuedItem>,
    total:    usize,
    consumed: usize,
}

impl MemorySource {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name:     name.into(),
            queue:    VecDeque::new(),
            total:    0,
            consumed: 0,
        }
    }

    pub fn from_records<S, I>(
        name: S,
        records: I,
    ) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = AlnRecord>, {
        let mut source = Self::new(name);
        for record in records {
            source.push(record);
        }
        source
    }

    pub fn push(
        &mut self,
        record: AlnRecord,
    ) {
        self.queue.push_back(QueuedItem::Record(record));
        self.total += 1;
    }

    /// Queues a format failure; pulling it fails the consuming run.
    pub fn push_failure<S: Into<String>>(
        &mut self,
        message: S,
    ) {
        self.queue
            .push_back(QueuedItem::Failure(message.into()));
        self.total += 1;
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl RecordSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_next(&mut self) -> bool {
        !self.queue.is_empty()
    }

    fn next_record(&mut self) -> anyhow::Result<AlnRecord> {
        self.consumed += 1;
        match self.queue.pop_front() {
            Some(QueuedItem::Record(record)) => Ok(record),
            Some(QueuedItem::Failure(message)) => bail!("{}", message),
            None => bail!("Record pulled from an exhausted source"),
        }
    }

    fn percent_complete(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        (self.consumed * 100 / self.total) as u32
    }
}
