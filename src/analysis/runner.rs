use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{
    unbounded,
    Receiver,
    Sender,
};
use log::{
    debug,
    warn,
};

use crate::analysis::module::AnalysisModule;
use crate::data_structs::annotation::AnnotationSet;
use crate::data_structs::genome::Genome;
use crate::io::gff::annotation_from_gff;
use crate::io::source::{
    RecordSource,
    SourceInfo,
};
use crate::{
    getter_fn,
    with_field_fn,
};

/// Where a run's annotation comes from.
#[derive(Debug, Clone, Default)]
pub enum AnnotationSource {
    /// No annotation; overlap counting is a structural no-op.
    #[default]
    None,
    /// An ad hoc GFF3 file, parsed before the first record.
    GffFile(PathBuf),
    /// A pre-built reference genome. Its annotation set is cloned for the
    /// run and records are normalized through its synonym table.
    Genome(Arc<Genome>),
}

/// Pipeline tuning knobs. No ambient defaults: every runner owns its
/// config.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Records between progress re-evaluations.
    pub progress_stride: u64,
    /// Minimum percent-complete advance that triggers a progress event.
    pub progress_step:   u32,
    /// Cooperative pause after emitting a progress event.
    pub progress_pause:  Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            progress_stride: 1000,
            progress_step:   5,
            progress_pause:  Duration::from_millis(5),
        }
    }
}

impl RunnerConfig {
    with_field_fn!(progress_stride, u64);

    with_field_fn!(progress_step, u32);

    with_field_fn!(progress_pause, Duration);
}

/// Lifecycle states of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Created,
    AnnotationLoading,
    Running,
    AnnotationFlush,
    Completed,
    Failed,
}

/// Everything a finished run exposes to report consumers: the source
/// descriptor, the final module set and the annotation set.
pub struct AnalysisReport {
    source:     SourceInfo,
    modules:    Vec<Box<dyn AnalysisModule>>,
    annotation: AnnotationSet,
    records:    u64,
}

impl AnalysisReport {
    getter_fn!(source, SourceInfo);

    getter_fn!(annotation, AnnotationSet);

    pub fn modules(&self) -> &[Box<dyn AnalysisModule>] {
        &self.modules
    }

    pub fn module(
        &self,
        name: &str,
    ) -> Option<&dyn AnalysisModule> {
        self.modules
            .iter()
            .find(|m| m.name() == name)
            .map(|m| m.as_ref())
    }

    pub fn record_count(&self) -> u64 {
        self.records
    }
}

/// Events broadcast over a run's listener channels.
#[derive(Clone)]
pub enum AnalysisEvent {
    /// The run started. Precedes every record-level event.
    Started { source: String },
    /// Percent-complete advanced by at least the configured step.
    Progress { source: String, percent: u32 },
    /// Terminal: the run finished and its results are readable.
    Completed {
        source: String,
        report: Arc<AnalysisReport>,
    },
    /// Terminal: the run aborted on a parse or format error.
    Failed { source: String, message: String },
}

impl fmt::Debug for AnalysisEvent {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            AnalysisEvent::Started { source } => {
                write!(f, "Started({})", source)
            },
            AnalysisEvent::Progress { source, percent } => {
                write!(f, "Progress({}, {}%)", source, percent)
            },
            AnalysisEvent::Completed { source, .. } => {
                write!(f, "Completed({})", source)
            },
            AnalysisEvent::Failed { source, message } => {
                write!(f, "Failed({}, {})", source, message)
            },
        }
    }
}

/// One end-to-end execution of a module set against one input source.
///
/// Drives the state machine `Created -> AnnotationLoading -> Running ->
/// AnnotationFlush -> Completed`, with `Failed` reachable from any
/// non-terminal state. Listeners subscribe before [`AnalysisRunner::run`];
/// `Started` is guaranteed to precede every record-level event and exactly
/// one terminal event (`Completed` or `Failed`) closes every run.
pub struct AnalysisRunner {
    source:     Box<dyn RecordSource + Send>,
    annotation: AnnotationSource,
    modules:    Vec<Box<dyn AnalysisModule>>,
    listeners:  Vec<Sender<AnalysisEvent>>,
    config:     RunnerConfig,
    state:      RunState,
}

impl AnalysisRunner {
    pub fn new<S: RecordSource + Send + 'static>(source: S) -> Self {
        Self {
            source:     Box::new(source),
            annotation: AnnotationSource::default(),
            modules:    Vec::new(),
            listeners:  Vec::new(),
            config:     RunnerConfig::default(),
            state:      RunState::Created,
        }
    }

    pub fn with_annotation(
        mut self,
        annotation: AnnotationSource,
    ) -> Self {
        self.annotation = annotation;
        self
    }

    pub fn with_config(
        mut self,
        config: RunnerConfig,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn with_module<M: AnalysisModule + 'static>(
        mut self,
        module: M,
    ) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn with_boxed_modules(
        mut self,
        modules: Vec<Box<dyn AnalysisModule>>,
    ) -> Self {
        self.modules.extend(modules);
        self
    }

    /// Opens a fresh listener channel on this run. Must be called before
    /// [`AnalysisRunner::run`].
    pub fn subscribe(&mut self) -> Receiver<AnalysisEvent> {
        let (tx, rx) = unbounded();
        self.listeners.push(tx);
        rx
    }

    /// Registers an existing channel handle, so several runs can share one
    /// listener.
    pub fn add_listener(
        &mut self,
        listener: Sender<AnalysisEvent>,
    ) {
        self.listeners.push(listener);
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    fn broadcast(
        &self,
        event: AnalysisEvent,
    ) {
        for listener in &self.listeners {
            // A dropped receiver only means that subscriber lost interest.
            let _ = listener.send(event.clone());
        }
    }

    fn fail(
        &mut self,
        source: &str,
        error: &anyhow::Error,
    ) {
        self.state = RunState::Failed;
        warn!("Analysis of {} failed: {:#}", source, error);
        self.broadcast(AnalysisEvent::Failed {
            source:  source.to_string(),
            message: format!("{:#}", error),
        });
    }

    /// Runs the pipeline to its terminal state.
    ///
    /// On success the returned report is the same `Arc` carried by the
    /// `Completed` event; on failure the error already went out as the
    /// run's single `Failed` event.
    pub fn run(mut self) -> anyhow::Result<Arc<AnalysisReport>> {
        let info = self.source.info();
        let source_name = info.name.clone();

        self.state = RunState::AnnotationLoading;
        self.broadcast(AnalysisEvent::Started {
            source: source_name.clone(),
        });

        let genome = match &self.annotation {
            AnnotationSource::Genome(genome) => Some(genome.clone()),
            _ => None,
        };
        let mut annotation = match &self.annotation {
            AnnotationSource::None => AnnotationSet::new(),
            AnnotationSource::GffFile(path) => {
                match annotation_from_gff(path) {
                    Ok(set) => set,
                    Err(e) => {
                        self.fail(&source_name, &e);
                        return Err(e);
                    },
                }
            },
            AnnotationSource::Genome(genome) => genome.annotation().clone(),
        };

        self.state = RunState::Running;
        for module in self.modules.iter_mut() {
            module.on_file_start(&info);
        }

        let mut records: u64 = 0;
        let mut last_reported: u32 = 0;
        loop {
            if !self.source.has_next() {
                break;
            }
            let mut record = match self.source.next_record() {
                Ok(record) => record,
                Err(e) => {
                    self.fail(&source_name, &e);
                    return Err(e);
                },
            };
            if let Some(genome) = &genome {
                genome.normalize(&mut record);
            }

            annotation.process_record(&record);
            for module in self
                .modules
                .iter_mut()
                .filter(|m| m.wants_records())
            {
                module.on_record(&record);
            }

            records += 1;
            if records % self.config.progress_stride == 0 {
                let percent = self.source.percent_complete();
                if percent >= last_reported + self.config.progress_step {
                    last_reported = percent;
                    self.broadcast(AnalysisEvent::Progress {
                        source: source_name.clone(),
                        percent,
                    });
                    if !self.config.progress_pause.is_zero() {
                        thread::sleep(self.config.progress_pause);
                    }
                }
            }
        }

        self.state = RunState::AnnotationFlush;
        annotation.flush_cache();

        for module in self
            .modules
            .iter_mut()
            .filter(|m| m.wants_annotation())
        {
            module.on_annotation(&annotation);
        }

        self.state = RunState::Completed;
        debug!("Analysis of {} completed: {} records", source_name, records);
        let report = Arc::new(AnalysisReport {
            source: info,
            modules: std::mem::take(&mut self.modules),
            annotation,
            records,
        });
        self.broadcast(AnalysisEvent::Completed {
            source: source_name,
            report: report.clone(),
        });
        Ok(report)
    }
}
