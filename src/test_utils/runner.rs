//! A deterministic [`ExampleRunner`] for tests.

use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::core::DocsError;
use crate::examples::{ExampleRunner, ExampleUnit, ExecutionResult};

/// Runner that never spawns a process.
///
/// Each example prints `"<id>\n"` unless an output was scripted for it.
/// Calls and concurrency are counted so tests can assert on scheduling.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    outputs: HashMap<String, (String, i32)>,
    delays: HashMap<String, Duration>,
    failures: HashSet<String>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the stdout and exit code of one example.
    #[must_use]
    pub fn with_output(mut self, id: &str, stdout: &str, exit_code: i32) -> Self {
        self.outputs.insert(id.to_string(), (stdout.to_string(), exit_code));
        self
    }

    /// Delays one example before it reports.
    #[must_use]
    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    /// Makes one example fail to launch.
    #[must_use]
    pub fn failing_on(mut self, id: &str) -> Self {
        self.failures.insert(id.to_string());
        self
    }

    /// Number of runs started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of runs observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl ExampleRunner for ScriptedRunner {
    async fn run(&self, unit: &ExampleUnit) -> Result<ExecutionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&unit.id) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failures.contains(&unit.id) {
            return Err(DocsError::ToolchainLaunch {
                example: unit.id.clone(),
                program: "scripted".to_string(),
                reason: "forced failure".to_string(),
            }
            .into());
        }

        let (stdout, exit_code) = self
            .outputs
            .get(&unit.id)
            .cloned()
            .unwrap_or_else(|| (format!("{}\n", unit.id), 0));

        Ok(ExecutionResult {
            id: unit.id.clone(),
            source: unit.source.clone(),
            normalized: unit.normalized.clone(),
            stdout,
            stderr: String::new(),
            exit_code,
            duration_ms: 1,
        })
    }
}
