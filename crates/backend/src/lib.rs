//! Execution backends for the kernel benchmark matrix.
//!
//! Two variants sit behind [`BackendInvoker`]:
//!
//! - [`RemoteCompute`]: one synchronous HTTP call to a managed function endpoint.
//! - [`NativeCluster`]: an `mpirun` launch executed on the master pod of a
//!   pod group through `kubectl exec`.
//!
//! Both return the raw console text of the kernel. Deciding whether that text
//! describes a successful run is left to metric extraction.

pub mod discovery;
pub mod native;
pub mod remote;
pub mod runner;

pub use discovery::{discover_pods, PodAddress};
pub use native::{NativeCluster, NativeClusterConfig, NATIVE_BACKEND};
pub use remote::{RemoteCompute, RemoteComputeConfig};
pub use runner::{CommandOutput, CommandRunner, KubectlRunner};

use kernelbench_kernels::KernelSpec;
use std::path::PathBuf;
use thiserror::Error;

/// A fully resolved kernel launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub kernel: String,
    pub executable: PathBuf,
    pub cmdline: String,
    pub world_size: usize,
}

impl Invocation {
    pub fn new(kernel: &KernelSpec, world_size: usize) -> Self {
        Self {
            kernel: kernel.name.clone(),
            executable: kernel.executable.clone(),
            cmdline: kernel.cmdline(),
            world_size,
        }
    }
}

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("pod discovery failed: {0}")]
    Discovery(String),
    #[error("no pods found in namespace '{namespace}' matching '{selector}'")]
    NoPods { namespace: String, selector: String },
}

/// Capability shared by every backend: run one kernel launch, return its text.
pub trait BackendInvoker {
    /// Short backend name used in result file names.
    fn name(&self) -> &str;

    fn invoke(&self, invocation: &Invocation) -> Result<String, InvocationError>;
}

impl<B: BackendInvoker + ?Sized> BackendInvoker for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn invoke(&self, invocation: &Invocation) -> Result<String, InvocationError> {
        (**self).invoke(invocation)
    }
}
