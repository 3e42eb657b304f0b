//! Run configuration.

use kernelbench_kernels::DEFAULT_WORLD_SIZES;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub results_dir: PathBuf,
    /// Kernel family, used as result sub-directory and file prefix.
    pub family: String,
    /// Run only this kernel instead of the registry's default set.
    pub kernel: Option<String>,
    pub world_sizes: Vec<usize>,
    pub repeats: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            family: "kernels".into(),
            kernel: None,
            world_sizes: DEFAULT_WORLD_SIZES.to_vec(),
            repeats: 1,
        }
    }
}

impl HarnessConfig {
    /// `<results_dir>/<family>/<family>_<backend>.csv`
    pub fn result_path(&self, backend: &str) -> PathBuf {
        self.results_dir
            .join(&self.family)
            .join(format!("{}_{}.csv", self.family, backend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_path() {
        let config = HarnessConfig::default();
        assert_eq!(
            config.result_path("native"),
            PathBuf::from("results/kernels/kernels_native.csv")
        );
        assert_eq!(config.world_sizes, [1, 2, 3, 4, 5]);
    }
}
