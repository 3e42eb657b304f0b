//! Managed compute-function backend.

use crate::{BackendInvoker, Invocation, InvocationError};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
struct InvocationRequest<'a> {
    user: &'a str,
    function: &'a str,
    cmdline: &'a str,
    mpi_world_size: usize,
}

#[derive(Debug, Clone)]
pub struct RemoteComputeConfig {
    pub host: String,
    pub port: u16,
    /// Namespace the kernels are uploaded under on the endpoint.
    pub user: String,
    /// Value for the `Host` header when the endpoint sits behind a Knative ingress.
    pub knative_host: Option<String>,
}

impl Default for RemoteComputeConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 8080,
            user: "prk".into(),
            knative_host: None,
        }
    }
}

pub struct RemoteCompute {
    config: RemoteComputeConfig,
    agent: ureq::Agent,
}

impl RemoteCompute {
    pub fn new(config: RemoteComputeConfig) -> Self {
        Self {
            config,
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.config.host, self.config.port)
    }

    pub fn config(&self) -> &RemoteComputeConfig {
        &self.config
    }
}

impl BackendInvoker for RemoteCompute {
    fn name(&self) -> &str {
        "wasm"
    }

    fn invoke(&self, invocation: &Invocation) -> Result<String, InvocationError> {
        let body = InvocationRequest {
            user: &self.config.user,
            function: &invocation.kernel,
            cmdline: &invocation.cmdline,
            mpi_world_size: invocation.world_size,
        };
        debug!(url = %self.url(), function = body.function, cmdline = body.cmdline, "posting invocation");

        let mut request = self.agent.post(&self.url());
        if let Some(host) = &self.config.knative_host {
            request = request.set("Host", host);
        }

        match request.send_json(&body) {
            Ok(response) => {
                let status = response.status();
                let text = response
                    .into_string()
                    .map_err(|e| InvocationError::Transport(e.to_string()))?;
                if !(200..300).contains(&status) {
                    return Err(InvocationError::Status { status, body: text });
                }
                Ok(text)
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(InvocationError::Status { status, body })
            }
            Err(ureq::Error::Transport(e)) => Err(InvocationError::Transport(e.to_string())),
        }
    }
}
