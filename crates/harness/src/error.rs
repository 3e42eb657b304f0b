//! Error types for benchmark runs.
//!
//! Every variant raised while walking the matrix carries the matrix point it
//! happened at, so the failing invocation can be reproduced by hand.

use kernelbench_backend::InvocationError;
use kernelbench_kernels::Rejection;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BenchError>;

/// One (kernel, world size, repetition) point of the benchmark matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub kernel: String,
    pub world_size: usize,
    pub run: usize,
}

impl fmt::Display for RunSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "kernel={} world_size={} run={}",
            self.kernel, self.world_size, self.run
        )
    }
}

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("{point}: unknown kernel")]
    UnknownKernel { point: RunSpec },

    #[error("{point}: {reason}")]
    InvalidProcessCount { point: RunSpec, reason: Rejection },

    #[error("{point}: invocation failed: {source}")]
    InvocationFailed {
        point: RunSpec,
        #[source]
        source: InvocationError,
    },

    #[error("{point}: could not find stat '{label}' in output")]
    StatNotFound { point: RunSpec, label: String },

    #[error("{point}: stat '{label}' is ambiguous ({segments} output segments)")]
    AmbiguousStat {
        point: RunSpec,
        label: String,
        segments: usize,
    },

    #[error("{point}: stat '{label}' has no readable value")]
    MalformedStat { point: RunSpec, label: String },

    #[error("backend setup failed: {0}")]
    Backend(#[source] InvocationError),

    #[error("result file error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    pub fn rejected(point: RunSpec, reason: Rejection) -> Self {
        match reason {
            Rejection::UnknownKernel => BenchError::UnknownKernel { point },
            reason => BenchError::InvalidProcessCount { point, reason },
        }
    }

    /// Matrix point the failure happened at, if it happened inside the run.
    pub fn point(&self) -> Option<&RunSpec> {
        match self {
            BenchError::UnknownKernel { point }
            | BenchError::InvalidProcessCount { point, .. }
            | BenchError::InvocationFailed { point, .. }
            | BenchError::StatNotFound { point, .. }
            | BenchError::AmbiguousStat { point, .. }
            | BenchError::MalformedStat { point, .. } => Some(point),
            BenchError::Backend(_) | BenchError::Csv(_) | BenchError::Io(_) => None,
        }
    }
}
