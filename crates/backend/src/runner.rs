//! Blocking shell execution used by the cluster backend.

use crate::InvocationError;
use std::process::Command;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub success: bool,
    /// Stdout followed by stderr.
    pub text: String,
}

pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, InvocationError>;
}

/// Runs commands on the local host, typically `kubectl`.
#[derive(Debug, Default, Clone, Copy)]
pub struct KubectlRunner;

impl CommandRunner for KubectlRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, InvocationError> {
        debug!(program, args = %args.join(" "), "running command");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| InvocationError::Spawn {
                command: format!("{} {}", program, args.join(" ")),
                source,
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CommandOutput {
            code: output.status.code(),
            success: output.status.success(),
            text,
        })
    }
}
