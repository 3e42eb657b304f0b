//! Process-count legality checks.

use crate::config::{KernelConstraint, KernelSpec};
use crate::registry::KernelRegistry;
use thiserror::Error;

/// Why a (kernel, process count) pair cannot be run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("unknown kernel")]
    UnknownKernel,
    #[error("process count must be positive")]
    ZeroProcesses,
    #[error("requires power-of-two process count")]
    NotPowerOfTwo,
    #[error("process count must divide grid size (grid_size={grid_size})")]
    DoesNotDivideGrid { grid_size: u64 },
}

impl KernelConstraint {
    pub fn check(&self, world_size: usize) -> Result<(), Rejection> {
        if world_size == 0 {
            return Err(Rejection::ZeroProcesses);
        }
        match *self {
            KernelConstraint::None => Ok(()),
            KernelConstraint::PowerOfTwo if world_size.is_power_of_two() => Ok(()),
            KernelConstraint::PowerOfTwo => Err(Rejection::NotPowerOfTwo),
            KernelConstraint::DividesGrid { grid_size } => {
                if grid_size % world_size as u64 == 0 {
                    Ok(())
                } else {
                    Err(Rejection::DoesNotDivideGrid { grid_size })
                }
            }
        }
    }
}

/// Pure check of a kernel name and process count against the registry.
#[derive(Clone, Copy)]
pub struct ConstraintValidator<'a> {
    registry: &'a KernelRegistry,
}

impl<'a> ConstraintValidator<'a> {
    pub fn new(registry: &'a KernelRegistry) -> Self {
        Self { registry }
    }

    /// Resolve `kernel` and check `world_size` against its constraint.
    pub fn validate(&self, kernel: &str, world_size: usize) -> Result<&'a KernelSpec, Rejection> {
        let spec = self.registry.find(kernel).ok_or(Rejection::UnknownKernel)?;
        spec.constraint.check(world_size)?;
        Ok(spec)
    }
}
