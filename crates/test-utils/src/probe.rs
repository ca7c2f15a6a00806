//! Execution probe: records when resolvers start and finish so tests can
//! assert ordering and overlap without relying on wall-clock races.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;
use taskgraph::task::{Task, TaskBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeEventKind {
    Started,
    Finished,
}

#[derive(Debug, Clone)]
pub struct ProbeEvent {
    pub task: String,
    pub kind: ProbeEventKind,
    pub at: Instant,
}

/// Shared, append-only event log. Clones record into the same log.
#[derive(Debug, Clone, Default)]
pub struct ExecutionProbe {
    events: Arc<Mutex<Vec<ProbeEvent>>>,
}

impl ExecutionProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, task: &str, kind: ProbeEventKind) {
        self.events.lock().unwrap().push(ProbeEvent {
            task: task.to_string(),
            kind,
            at: Instant::now(),
        });
    }

    pub fn events(&self) -> Vec<ProbeEvent> {
        self.events.lock().unwrap().clone()
    }

    /// How many times `task` started.
    pub fn starts(&self, task: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.task == task && e.kind == ProbeEventKind::Started)
            .count()
    }

    /// Task names in the order they started.
    pub fn start_order(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.kind == ProbeEventKind::Started)
            .map(|e| e.task)
            .collect()
    }

    fn position(&self, task: &str, kind: ProbeEventKind) -> Option<usize> {
        self.events()
            .iter()
            .position(|e| e.task == task && e.kind == kind)
    }

    /// True if `first` finished before `second` started.
    pub fn finished_before_started(&self, first: &str, second: &str) -> bool {
        match (
            self.position(first, ProbeEventKind::Finished),
            self.position(second, ProbeEventKind::Started),
        ) {
            (Some(done), Some(start)) => done < start,
            _ => false,
        }
    }

    /// True if the execution windows of `a` and `b` overlapped.
    pub fn overlapped(&self, a: &str, b: &str) -> bool {
        let window = |task: &str| {
            Some((
                self.position(task, ProbeEventKind::Started)?,
                self.position(task, ProbeEventKind::Finished)?,
            ))
        };
        match (window(a), window(b)) {
            (Some((a_start, a_end)), Some((b_start, b_end))) => a_start < b_end && b_start < a_end,
            _ => false,
        }
    }

    /// Largest number of resolvers running at the same time.
    pub fn max_in_flight(&self) -> usize {
        let mut current = 0usize;
        let mut max = 0usize;
        for event in self.events() {
            match event.kind {
                ProbeEventKind::Started => {
                    current += 1;
                    max = max.max(current);
                }
                ProbeEventKind::Finished => current = current.saturating_sub(1),
            }
        }
        max
    }

    /// Finish `builder` with a resolver that records its window, sleeps for
    /// `delay` and resolves to `output`.
    pub fn task<C: Send + 'static>(
        &self,
        builder: &TaskBuilder<C>,
        name: &str,
        delay: Duration,
        output: Value,
    ) -> Task<C> {
        let probe = self.clone();
        let label = name.to_string();

        builder.name(name).resolver(move |_args| {
            let probe = probe.clone();
            let label = label.clone();
            let output = output.clone();
            async move {
                probe.record(&label, ProbeEventKind::Started);
                tokio::time::sleep(delay).await;
                probe.record(&label, ProbeEventKind::Finished);
                Ok::<_, anyhow::Error>(output)
            }
        })
    }

    /// Like [`ExecutionProbe::task`] but the resolver fails with `message`.
    pub fn failing_task<C: Send + 'static>(
        &self,
        builder: &TaskBuilder<C>,
        name: &str,
        delay: Duration,
        message: &str,
    ) -> Task<C> {
        let probe = self.clone();
        let label = name.to_string();
        let message = message.to_string();

        builder.name(name).resolver(move |_args| {
            let probe = probe.clone();
            let label = label.clone();
            let message = message.clone();
            async move {
                probe.record(&label, ProbeEventKind::Started);
                tokio::time::sleep(delay).await;
                probe.record(&label, ProbeEventKind::Finished);
                Err::<Value, _>(anyhow::anyhow!("{message}"))
            }
        })
    }
}
