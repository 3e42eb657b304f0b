//! Kernel configuration structures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Iteration count shared by every timed kernel in the default catalog.
pub const ITERATIONS: u64 = 20000;

pub const SPARSE_GRID_SIZE_LOG2: u32 = 10;
pub const SPARSE_GRID_SIZE: u64 = 1 << SPARSE_GRID_SIZE_LOG2;

/// Install prefix of the natively built kernels on the cluster image.
pub const NATIVE_BUILD_ROOT: &str = "/code/experiment-mpi/third-party/kernels-native";

/// One positional argument of a kernel command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgParam {
    pub name: String,
    pub value: u64,
}

/// Ordered, typed command-line arguments for a kernel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArgTemplate {
    params: Vec<ArgParam>,
}

impl ArgTemplate {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    pub fn param(mut self, name: impl Into<String>, value: u64) -> Self {
        self.params.push(ArgParam {
            name: name.into(),
            value,
        });
        self
    }

    pub fn params(&self) -> &[ArgParam] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.params
            .iter()
            .find(|param| param.name == name)
            .map(|param| param.value)
    }

    /// Resolved argument string, values joined by single spaces.
    pub fn render(&self) -> String {
        self.params
            .iter()
            .map(|param| param.value.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Legality rule on the process count a kernel may run with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum KernelConstraint {
    #[default]
    None,
    PowerOfTwo,
    DividesGrid {
        grid_size: u64,
    },
}

impl fmt::Display for KernelConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelConstraint::None => write!(f, "any"),
            KernelConstraint::PowerOfTwo => write!(f, "power-of-two"),
            KernelConstraint::DividesGrid { grid_size } => write!(f, "divides {grid_size}"),
        }
    }
}

/// Catalog entry for a single benchmark kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelSpec {
    pub name: String,
    pub args: ArgTemplate,
    pub executable: PathBuf,
    /// Labels the kernel prints ahead of each measurement. Empty means the
    /// kernel is invocable but nothing is extracted from its output.
    #[serde(default)]
    pub stats: Vec<String>,
    #[serde(default)]
    pub constraint: KernelConstraint,
}

impl KernelSpec {
    pub fn new(name: impl Into<String>, args: ArgTemplate, executable: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            args,
            executable: executable.into(),
            stats: Vec::new(),
            constraint: KernelConstraint::None,
        }
    }

    pub fn with_stats(mut self, stats: &[&str]) -> Self {
        self.stats = stats.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_constraint(mut self, constraint: KernelConstraint) -> Self {
        self.constraint = constraint;
        self
    }

    pub fn has_stats(&self) -> bool {
        !self.stats.is_empty()
    }

    pub fn cmdline(&self) -> String {
        self.args.render()
    }

    pub fn native_executable(&self) -> &Path {
        &self.executable
    }
}

/// Path of a kernel binary inside the native build tree.
pub fn native_path(group: &str, binary: &str) -> PathBuf {
    Path::new(NATIVE_BUILD_ROOT).join("MPI1").join(group).join(binary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_renders_in_order() {
        let args = ArgTemplate::new()
            .param("iterations", ITERATIONS)
            .param("order", 2000)
            .param("tile_size", 64);
        assert_eq!(args.render(), "20000 2000 64");
        assert_eq!(args.get("tile_size"), Some(64));
        assert_eq!(args.get("missing"), None);
    }

    #[test]
    fn test_constraint_serialization() {
        let json = serde_json::to_string(&KernelConstraint::DividesGrid { grid_size: 1024 }).unwrap();
        assert!(json.contains("divides-grid"));
        let parsed: KernelConstraint = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, KernelConstraint::DividesGrid { grid_size: 1024 });
    }

    #[test]
    fn test_native_path_layout() {
        let path = native_path("Synch_p2p", "p2p");
        assert_eq!(
            path,
            PathBuf::from("/code/experiment-mpi/third-party/kernels-native/MPI1/Synch_p2p/p2p")
        );
    }
}
