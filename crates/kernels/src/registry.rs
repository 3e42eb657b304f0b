//! Kernel registry for lookup and discovery.

use crate::config::{
    native_path, ArgTemplate, KernelConstraint, KernelSpec, ITERATIONS, SPARSE_GRID_SIZE,
    SPARSE_GRID_SIZE_LOG2,
};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const RATE_MFLOPS: &str = "Rate (MFlops/s)";
pub const RATE_MBS: &str = "Rate (MB/s)";
pub const RATE_GUPS: &str = "Rate (GUPS/s)";
pub const AVG_TIME: &str = "Avg time (s)";
pub const TIME: &str = "Time (s)";

/// Process counts tried when a run does not pin one.
pub const DEFAULT_WORLD_SIZES: [usize; 5] = [1, 2, 3, 4, 5];

/// Immutable catalog of kernels, kept in registration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KernelRegistry {
    kernels: Vec<KernelSpec>,
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self {
            kernels: Vec::new(),
        }
    }

    pub fn with_default_kernels() -> Self {
        let mut registry = Self::new();
        registry.register(
            KernelSpec::new(
                "dgemm",
                ArgTemplate::new()
                    .param("iterations", ITERATIONS)
                    .param("order", 500)
                    .param("outer_block", 32)
                    .param("inner_block", 1),
                native_path("DGEMM", "dgemm"),
            ),
        );
        registry.register(
            KernelSpec::new(
                "nstream",
                ArgTemplate::new()
                    .param("iterations", ITERATIONS)
                    .param("length", 2_000_000)
                    .param("offset", 0),
                native_path("Nstream", "nstream"),
            )
            .with_stats(&[AVG_TIME, RATE_MBS]),
        );
        registry.register(
            KernelSpec::new(
                "random",
                ArgTemplate::new()
                    .param("update_ratio", 16)
                    .param("table_size", 16),
                native_path("Random", "random"),
            )
            .with_stats(&[RATE_GUPS, TIME])
            .with_constraint(KernelConstraint::PowerOfTwo),
        );
        registry.register(
            KernelSpec::new(
                "reduce",
                ArgTemplate::new()
                    .param("iterations", ITERATIONS)
                    .param("length", 2_000_000),
                native_path("Reduce", "reduce"),
            )
            .with_stats(&[RATE_MFLOPS, AVG_TIME]),
        );
        registry.register(
            KernelSpec::new(
                "sparse",
                ArgTemplate::new()
                    .param("iterations", ITERATIONS)
                    .param("grid_size_log2", SPARSE_GRID_SIZE_LOG2 as u64)
                    .param("radius", 4),
                native_path("Sparse", "sparse"),
            )
            .with_stats(&[RATE_MFLOPS, AVG_TIME])
            .with_constraint(KernelConstraint::DividesGrid {
                grid_size: SPARSE_GRID_SIZE,
            }),
        );
        registry.register(
            KernelSpec::new(
                "stencil",
                ArgTemplate::new()
                    .param("iterations", ITERATIONS)
                    .param("dimension", 1000),
                native_path("Stencil", "stencil"),
            )
            .with_stats(&[RATE_MFLOPS, AVG_TIME]),
        );
        registry.register(
            KernelSpec::new(
                "global",
                ArgTemplate::new()
                    .param("iterations", ITERATIONS)
                    .param("scramble_length", 10000),
                native_path("Synch_global", "global"),
            ),
        );
        registry.register(
            KernelSpec::new(
                "p2p",
                ArgTemplate::new()
                    .param("iterations", ITERATIONS)
                    .param("dim1", 1000)
                    .param("dim2", 100),
                native_path("Synch_p2p", "p2p"),
            )
            .with_stats(&[RATE_MFLOPS, AVG_TIME]),
        );
        registry.register(
            KernelSpec::new(
                "transpose",
                ArgTemplate::new()
                    .param("iterations", ITERATIONS)
                    .param("order", 2000)
                    .param("tile_size", 64),
                native_path("Transpose", "transpose"),
            )
            .with_stats(&[RATE_MBS, AVG_TIME]),
        );
        registry
    }

    pub fn register(&mut self, kernel: KernelSpec) {
        self.kernels.push(kernel);
    }

    pub fn kernels(&self) -> &[KernelSpec] {
        &self.kernels
    }

    pub fn find(&self, name: &str) -> Option<&KernelSpec> {
        self.kernels.iter().find(|kernel| kernel.name == name)
    }

    /// Kernels run when no single kernel is requested: those that report stats.
    pub fn default_run_set(&self) -> impl Iterator<Item = &KernelSpec> {
        self.kernels.iter().filter(|kernel| kernel.has_stats())
    }

    /// Check catalog consistency.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for kernel in &self.kernels {
            if kernel.name.trim().is_empty() {
                return Err("Kernel name must not be empty".into());
            }
            if !seen.insert(kernel.name.as_str()) {
                return Err(format!("Duplicate kernel '{}'", kernel.name));
            }
            if kernel.stats.iter().any(|stat| stat.trim().is_empty()) {
                return Err(format!("Kernel '{}' has an empty stat label", kernel.name));
            }
            if let KernelConstraint::DividesGrid { grid_size: 0 } = kernel.constraint {
                return Err(format!("Kernel '{}' has a zero grid size", kernel.name));
            }
        }
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        let registry: Self = serde_json::from_slice(&data)?;
        registry
            .validate()
            .map_err(|e| anyhow!("invalid kernel catalog {}: {}", path.display(), e))?;
        Ok(registry)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let blob = serde_json::to_vec_pretty(self)?;
        fs::write(path, blob)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let registry = KernelRegistry::with_default_kernels();
        assert!(registry.validate().is_ok());
        assert_eq!(registry.kernels().len(), 9);
        assert_eq!(registry.find("reduce").unwrap().cmdline(), "20000 2000000");
        assert_eq!(registry.find("sparse").unwrap().cmdline(), "20000 10 4");
        assert_eq!(registry.find("random").unwrap().cmdline(), "16 16");
    }

    #[test]
    fn test_default_run_set_skips_statless_kernels() {
        let registry = KernelRegistry::with_default_kernels();
        let names: Vec<&str> = registry
            .default_run_set()
            .map(|kernel| kernel.name.as_str())
            .collect();
        assert_eq!(
            names,
            ["nstream", "random", "reduce", "sparse", "stencil", "p2p", "transpose"]
        );
        assert!(registry.find("dgemm").is_some());
    }

    #[test]
    fn test_duplicate_kernel_rejected() {
        let mut registry = KernelRegistry::with_default_kernels();
        registry.register(KernelSpec::new("reduce", ArgTemplate::new(), "/bin/true"));
        assert!(registry.validate().is_err());
    }

    #[test]
    fn test_catalog_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog").join("kernels.json");
        let registry = KernelRegistry::with_default_kernels();
        registry.save_to_file(&path).unwrap();

        let loaded = KernelRegistry::load_from_file(&path).unwrap();
        assert_eq!(loaded.kernels(), registry.kernels());
    }

    #[test]
    fn test_catalog_with_blank_stat_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kernels.json");
        let mut registry = KernelRegistry::new();
        registry.register(
            KernelSpec::new("reduce", ArgTemplate::new(), "/bin/reduce").with_stats(&["  "]),
        );
        registry.save_to_file(&path).unwrap();
        assert!(KernelRegistry::load_from_file(&path).is_err());
    }
}
