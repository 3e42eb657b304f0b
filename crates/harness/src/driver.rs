//! Benchmark matrix driver.
//!
//! Walks kernel × world size × repetition in that order. Each point is
//! validated, invoked, extracted and persisted before the next one starts,
//! and the first failure aborts the whole run.

use crate::config::HarnessConfig;
use crate::error::{BenchError, Result, RunSpec};
use crate::extract::MetricExtractor;
use crate::sink::{ResultSink, StatRecord};
use kernelbench_backend::{BackendInvoker, Invocation};
use kernelbench_kernels::{ConstraintValidator, KernelRegistry};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Validating,
    Invoking,
    Extracting,
    Persisting,
    Done,
    Aborted,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub backend: String,
    pub result_file: PathBuf,
    pub points: usize,
    pub records: usize,
    /// Invocations of kernels without configured stats.
    pub empty_invocations: usize,
}

/// Enumerate the matrix in execution order.
pub fn enumerate(registry: &KernelRegistry, config: &HarnessConfig) -> Vec<RunSpec> {
    let kernels: Vec<String> = match &config.kernel {
        Some(kernel) => vec![kernel.clone()],
        None => registry
            .default_run_set()
            .map(|kernel| kernel.name.clone())
            .collect(),
    };

    let mut plan = Vec::with_capacity(kernels.len() * config.world_sizes.len() * config.repeats);
    for kernel in &kernels {
        for &world_size in &config.world_sizes {
            for run in 0..config.repeats {
                plan.push(RunSpec {
                    kernel: kernel.clone(),
                    world_size,
                    run,
                });
            }
        }
    }
    plan
}

/// Validate every point up front without invoking anything.
pub fn check_plan(registry: &KernelRegistry, plan: &[RunSpec]) -> Result<()> {
    let validator = ConstraintValidator::new(registry);
    for spec in plan {
        validator
            .validate(&spec.kernel, spec.world_size)
            .map_err(|reason| BenchError::rejected(spec.clone(), reason))?;
    }
    Ok(())
}

pub struct MatrixDriver<'a, B: ?Sized> {
    registry: &'a KernelRegistry,
    backend: &'a B,
    extractor: MetricExtractor,
    state: RunState,
}

impl<'a, B: BackendInvoker + ?Sized> MatrixDriver<'a, B> {
    pub fn new(registry: &'a KernelRegistry, backend: &'a B) -> Self {
        Self {
            registry,
            backend,
            extractor: MetricExtractor::new(),
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn run(&mut self, config: &HarnessConfig, sink: &mut ResultSink) -> Result<RunSummary> {
        let plan = enumerate(self.registry, config);
        info!(
            backend = self.backend.name(),
            points = plan.len(),
            result_file = %sink.path().display(),
            "starting benchmark matrix"
        );

        let mut summary = RunSummary {
            backend: self.backend.name().to_string(),
            result_file: sink.path().to_path_buf(),
            points: 0,
            records: 0,
            empty_invocations: 0,
        };

        for spec in &plan {
            match self.step(spec, sink) {
                Ok(written) => {
                    summary.points += 1;
                    summary.records += written;
                    if written == 0 {
                        summary.empty_invocations += 1;
                    }
                }
                Err(err) => {
                    self.state = RunState::Aborted;
                    error!(error = %err, "aborting benchmark matrix");
                    return Err(err);
                }
            }
        }

        self.state = RunState::Done;
        info!(
            points = summary.points,
            records = summary.records,
            "benchmark matrix complete"
        );
        Ok(summary)
    }

    fn step(&mut self, spec: &RunSpec, sink: &mut ResultSink) -> Result<usize> {
        self.state = RunState::Validating;
        let kernel = ConstraintValidator::new(self.registry)
            .validate(&spec.kernel, spec.world_size)
            .map_err(|reason| BenchError::rejected(spec.clone(), reason))?;

        self.state = RunState::Invoking;
        let invocation = Invocation::new(kernel, spec.world_size);
        info!(
            kernel = %spec.kernel,
            world_size = spec.world_size,
            run = spec.run,
            "invoking kernel"
        );
        debug!(cmdline = %invocation.cmdline, executable = %invocation.executable.display(), "resolved command line");
        let raw = self
            .backend
            .invoke(&invocation)
            .map_err(|source| BenchError::InvocationFailed {
                point: spec.clone(),
                source,
            })?;
        debug!(output = %raw, "kernel output");

        self.state = RunState::Extracting;
        if !kernel.has_stats() {
            info!(kernel = %spec.kernel, "no stats configured for kernel");
            return Ok(0);
        }
        let stats = self
            .extractor
            .extract(&raw, &kernel.stats)
            .map_err(|err| err.at(spec.clone()))?;

        self.state = RunState::Persisting;
        for stat in &stats {
            info!(kernel = %spec.kernel, stat = %stat.label, value = stat.value, "got stat");
            sink.append(&StatRecord {
                kernel: spec.kernel.clone(),
                world_size: spec.world_size,
                run: spec.run,
                stat_name: stat.label.clone(),
                stat_value: stat.value,
            })?;
        }
        Ok(stats.len())
    }
}
