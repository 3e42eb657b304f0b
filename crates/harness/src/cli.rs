//! CLI wiring for kernelbench.

use crate::config::HarnessConfig;
use crate::driver::{check_plan, enumerate, MatrixDriver, RunSummary};
use crate::error::BenchError;
use crate::sink::ResultSink;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use kernelbench_backend::{
    BackendInvoker, CommandRunner, KubectlRunner, NativeCluster, NativeClusterConfig,
    RemoteCompute, RemoteComputeConfig, NATIVE_BACKEND,
};
use kernelbench_kernels::{KernelRegistry, DEFAULT_WORLD_SIZES};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "kernelbench", about = "Run the MPI kernel benchmark matrix")]
pub struct Cli {
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    /// JSON kernel catalog replacing the built-in one.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct MatrixArgs {
    /// Run a single kernel instead of every kernel that reports stats.
    #[arg(long)]
    pub kernel: Option<String>,
    /// Run a single world size instead of the default candidates.
    #[arg(long)]
    pub nprocs: Option<usize>,
    #[arg(long, default_value_t = 1)]
    pub repeats: usize,
    /// Enumerate and validate the matrix without invoking anything.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run kernels on the managed compute endpoint.
    Wasm {
        #[command(flatten)]
        matrix: MatrixArgs,
        #[arg(long, default_value = "localhost")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long, env = "KERNELS_USER", default_value = "prk")]
        user: String,
        /// Host header for a Knative ingress.
        #[arg(long)]
        knative_host: Option<String>,
    },
    /// Run kernels natively with mpirun on the cluster pod group.
    Native {
        #[command(flatten)]
        matrix: MatrixArgs,
        #[arg(long, default_value = "kernels")]
        namespace: String,
        #[arg(long, default_value = "app=kernels")]
        selector: String,
        #[arg(long, default_value = "/home/mpirun/hostfile")]
        hostfile: PathBuf,
    },
    /// Print the kernel catalog.
    List,
}

impl MatrixArgs {
    fn to_config(&self, results_dir: PathBuf) -> HarnessConfig {
        HarnessConfig {
            results_dir,
            kernel: self.kernel.clone(),
            world_sizes: match self.nprocs {
                Some(n) => vec![n],
                None => DEFAULT_WORLD_SIZES.to_vec(),
            },
            repeats: self.repeats,
            ..HarnessConfig::default()
        }
    }
}

pub fn run_cli(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let Cli {
        results_dir,
        catalog,
        command,
    } = cli;

    let registry = match catalog {
        Some(path) => {
            info!(path = %path.display(), "loading kernel catalog");
            KernelRegistry::load_from_file(&path)?
        }
        None => KernelRegistry::with_default_kernels(),
    };

    match command {
        Command::List => {
            for kernel in registry.kernels() {
                println!(
                    "{:<10} np={:<14} args=\"{}\" stats=[{}]",
                    kernel.name,
                    kernel.constraint.to_string(),
                    kernel.cmdline(),
                    kernel.stats.join(", ")
                );
            }
        }
        Command::Wasm {
            matrix,
            host,
            port,
            user,
            knative_host,
        } => {
            let config = matrix.to_config(results_dir);
            if matrix.dry_run {
                return dry_run(&registry, &config);
            }
            let backend = RemoteCompute::new(RemoteComputeConfig {
                host,
                port,
                user,
                knative_host,
            });
            let mut sink = ResultSink::create(config.result_path(backend.name()))?;
            let summary = run_matrix(&registry, &backend, &config, &mut sink)?;
            sink.close()?;
            print_summary(&summary)?;
        }
        Command::Native {
            matrix,
            namespace,
            selector,
            hostfile,
        } => {
            let config = matrix.to_config(results_dir);
            if matrix.dry_run {
                return dry_run(&registry, &config);
            }
            let cluster_config = NativeClusterConfig {
                namespace,
                selector,
                hostfile,
                ..NativeClusterConfig::default()
            };
            let summary = run_native(&registry, &config, cluster_config, KubectlRunner)?;
            print_summary(&summary)?;
        }
    }
    Ok(())
}

fn run_matrix<B: BackendInvoker + ?Sized>(
    registry: &KernelRegistry,
    backend: &B,
    config: &HarnessConfig,
    sink: &mut ResultSink,
) -> Result<RunSummary> {
    let mut driver = MatrixDriver::new(registry, backend);
    Ok(driver.run(config, sink)?)
}

/// Truncate the native result file, then reach the pod group and run.
///
/// A discovery failure leaves a header-only file, never the previous run's rows.
pub fn run_native<R: CommandRunner>(
    registry: &KernelRegistry,
    config: &HarnessConfig,
    cluster_config: NativeClusterConfig,
    runner: R,
) -> Result<RunSummary> {
    let mut sink = ResultSink::create(config.result_path(NATIVE_BACKEND))?;
    let backend = NativeCluster::connect(cluster_config, runner).map_err(BenchError::Backend)?;
    let summary = run_matrix(registry, &backend, config, &mut sink)?;
    sink.close()?;
    Ok(summary)
}

fn print_summary(summary: &RunSummary) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

fn dry_run(registry: &KernelRegistry, config: &HarnessConfig) -> Result<()> {
    let plan = enumerate(registry, config);
    check_plan(registry, &plan)?;
    for spec in &plan {
        println!("{spec}");
    }
    info!(points = plan.len(), "matrix is valid");
    Ok(())
}
