//! Native MPI cluster backend driven through `kubectl exec`.

use crate::discovery::{discover_pods, PodAddress};
use crate::runner::{CommandRunner, KubectlRunner};
use crate::{BackendInvoker, Invocation, InvocationError};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Result-file name of this backend, known before the pod group is reached.
pub const NATIVE_BACKEND: &str = "native";

#[derive(Debug, Clone)]
pub struct NativeClusterConfig {
    /// Namespace holding the pod group.
    pub namespace: String,
    /// Label selector identifying the pod group.
    pub selector: String,
    pub hostfile: PathBuf,
    /// Unprivileged account the launcher runs as inside the pod.
    pub service_account: String,
    pub launcher: String,
}

impl Default for NativeClusterConfig {
    fn default() -> Self {
        Self {
            namespace: "kernels".into(),
            selector: "app=kernels".into(),
            hostfile: PathBuf::from("/home/mpirun/hostfile"),
            service_account: "mpirun".into(),
            launcher: "mpirun".into(),
        }
    }
}

pub struct NativeCluster<R = KubectlRunner> {
    config: NativeClusterConfig,
    runner: R,
    pods: Vec<PodAddress>,
}

impl<R: CommandRunner> NativeCluster<R> {
    /// Discover the pod group and pin its first pod as the master.
    pub fn connect(config: NativeClusterConfig, runner: R) -> Result<Self, InvocationError> {
        let pods = discover_pods(&runner, &config.namespace, &config.selector)?;
        if pods.is_empty() {
            return Err(InvocationError::NoPods {
                namespace: config.namespace.clone(),
                selector: config.selector.clone(),
            });
        }
        info!(
            namespace = %config.namespace,
            pods = pods.len(),
            master = %pods[0].name,
            "discovered cluster pods"
        );
        Ok(Self {
            config,
            runner,
            pods,
        })
    }

    pub fn master(&self) -> &PodAddress {
        &self.pods[0]
    }

    pub fn pods(&self) -> &[PodAddress] {
        &self.pods
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// The `mpirun` line executed on the master pod.
    pub fn launch_command(&self, invocation: &Invocation) -> String {
        let mut parts = vec![
            self.config.launcher.clone(),
            format!("-np {}", invocation.world_size),
            format!("-hostfile {}", self.config.hostfile.display()),
            invocation.executable.display().to_string(),
        ];
        if !invocation.cmdline.is_empty() {
            parts.push(invocation.cmdline.clone());
        }
        parts.join(" ")
    }

    /// Full `kubectl` argument vector wrapping the launch as the service account.
    pub fn exec_args(&self, invocation: &Invocation) -> Vec<String> {
        vec![
            "-n".into(),
            self.config.namespace.clone(),
            "exec".into(),
            self.master().name.clone(),
            "--".into(),
            "su".into(),
            self.config.service_account.clone(),
            "-c".into(),
            self.launch_command(invocation),
        ]
    }
}

impl<R: CommandRunner> BackendInvoker for NativeCluster<R> {
    fn name(&self) -> &str {
        NATIVE_BACKEND
    }

    fn invoke(&self, invocation: &Invocation) -> Result<String, InvocationError> {
        let args = self.exec_args(invocation);
        debug!(master = %self.master().name, launch = %self.launch_command(invocation), "executing on cluster");

        let output = self.runner.run("kubectl", &args)?;
        if !output.success {
            warn!(
                kernel = %invocation.kernel,
                world_size = invocation.world_size,
                code = ?output.code,
                "remote command exited unsuccessfully"
            );
        }
        Ok(output.text)
    }
}
