use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};
use std::sync::{
    Arc,
    Condvar,
    Mutex,
};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{
    unbounded,
    Sender,
};
use log::{
    debug,
    warn,
};

use crate::analysis::runner::AnalysisRunner;
use crate::with_field_fn;

const IDLE_POLL: Duration = Duration::from_millis(50);

/// Admission limits for the scheduling queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Number of pipelines allowed to execute concurrently.
    pub slots: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { slots: 1 }
    }
}

impl QueueConfig {
    with_field_fn!(slots, usize);
}

/// Counting semaphore over the configured slots.
struct SlotPool {
    total:     usize,
    available: Mutex<usize>,
    freed:     Condvar,
}

impl SlotPool {
    fn new(total: usize) -> Self {
        Self {
            total,
            available: Mutex::new(total),
            freed: Condvar::new(),
        }
    }

    fn acquire(&self) {
        let mut available = self
            .available
            .lock()
            .expect("Slot pool lock poisoned");
        while *available == 0 {
            available = self
                .freed
                .wait(available)
                .expect("Slot pool lock poisoned");
        }
        *available -= 1;
    }

    fn release(&self) {
        let mut available = self
            .available
            .lock()
            .expect("Slot pool lock poisoned");
        *available += 1;
        self.freed.notify_one();
    }

    fn used(&self) -> usize {
        self.total
            - *self
                .available
                .lock()
                .expect("Slot pool lock poisoned")
    }
}

/// Bounds the number of concurrently executing pipelines.
///
/// Submissions are dispatched first-in-first-out by a background thread;
/// a runner launches only once one of the configured slots is free, so at
/// most `slots` pipelines execute at any moment while the rest wait.
/// Completion or failure of a run releases its slot exactly once; one
/// run's failure never disturbs the others' accounting.
pub struct AnalysisQueue {
    sender:     Option<Sender<AnalysisRunner>>,
    pending:    Arc<AtomicUsize>,
    slots:      Arc<SlotPool>,
    dispatcher: Option<JoinHandle<()>>,
}

impl AnalysisQueue {
    pub fn new(config: QueueConfig) -> Self {
        let (sender, receiver) = unbounded::<AnalysisRunner>();
        let pending = Arc::new(AtomicUsize::new(0));
        let slots = Arc::new(SlotPool::new(config.slots.max(1)));

        let worker_pending = pending.clone();
        let worker_slots = slots.clone();
        let dispatcher = thread::spawn(move || {
            let mut workers = Vec::new();
            while let Ok(runner) = receiver.recv() {
                worker_slots.acquire();
                debug!("Dispatching analysis of {}", runner.source_name());

                let run_pending = worker_pending.clone();
                let run_slots = worker_slots.clone();
                workers.push(thread::spawn(move || {
                    if let Err(e) = runner.run() {
                        // Already broadcast to the run's listeners; the
                        // queue only logs it.
                        warn!("Queued analysis failed: {:#}", e);
                    }
                    run_slots.release();
                    run_pending.fetch_sub(1, Ordering::AcqRel);
                }));
            }
            for worker in workers {
                let _ = worker.join();
            }
        });

        Self {
            sender: Some(sender),
            pending,
            slots,
            dispatcher: Some(dispatcher),
        }
    }

    /// Enqueues a runner. Work is admitted in submission order as slots
    /// free up.
    pub fn submit(
        &self,
        runner: AnalysisRunner,
    ) {
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.sender
            .as_ref()
            .expect("Queue already shut down")
            .send(runner)
            .expect("Dispatcher thread terminated");
    }

    /// Submitted runs that have not yet reported completion or failure.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Slots currently held by executing pipelines.
    pub fn used_slots(&self) -> usize {
        self.slots.used()
    }

    /// Polls the remaining-work counter until every submitted run has
    /// reported completion or failure.
    pub fn wait_idle(&self) {
        while self.pending() > 0 {
            thread::sleep(IDLE_POLL);
        }
    }

    /// Waits for all submitted work, then stops the dispatcher.
    pub fn shutdown(mut self) {
        self.wait_idle();
        self.close();
    }

    fn close(&mut self) {
        self.sender.take();
        if let Some(dispatcher) = self.dispatcher.take() {
            let _ = dispatcher.join();
        }
    }
}

impl Drop for AnalysisQueue {
    fn drop(&mut self) {
        self.close();
    }
}
