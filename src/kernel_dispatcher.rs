//! Runtime-selected dispatcher over the CPU and CUDA evaluators.
//!
//! Convenience layer for callers that keep their batches in host memory:
//! uploads the operands, runs the requested metric on the detected
//! backend, and writes the accumulated score matrix back for the accuracy
//! path. Callers that manage device-resident matrices themselves should
//! use [`crate::ops`] directly on a concrete backend.

#[cfg(feature = "cuda")]
use log::warn;

use crate::backend_trait::{BackendResult, EvalBackend};
use crate::cpu_kernels::CpuEvaluator;
#[cfg(feature = "cuda")]
use crate::cuda_kernels::CudaEvaluator;
use crate::ops::{evaluate_accuracy, evaluate_log_loss};
use crate::runtime_detection::{detect_backend, BackendType};

/// Borrowed column-major host matrix.
#[derive(Debug, Clone, Copy)]
pub struct HostMatrix<'a> {
    pub rows: usize,
    pub cols: usize,
    pub data: &'a [f32],
}

impl<'a> HostMatrix<'a> {
    pub fn new(rows: usize, cols: usize, data: &'a [f32]) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "host buffer length does not match {rows}x{cols}"
        );
        Self { rows, cols, data }
    }
}

/// Mutably borrowed column-major host matrix (the accuracy path writes
/// the accumulated scores back through it).
#[derive(Debug)]
pub struct HostMatrixMut<'a> {
    pub rows: usize,
    pub cols: usize,
    pub data: &'a mut [f32],
}

impl<'a> HostMatrixMut<'a> {
    pub fn new(rows: usize, cols: usize, data: &'a mut [f32]) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "host buffer length does not match {rows}x{cols}"
        );
        Self { rows, cols, data }
    }
}

/// Metric entry points over the backend picked at runtime.
pub enum KernelDispatcher {
    #[cfg(feature = "cuda")]
    Cuda(CudaEvaluator),
    Cpu(CpuEvaluator),
}

impl KernelDispatcher {
    /// Select the detected backend, falling back to the CPU reference
    /// when CUDA device or kernel setup fails.
    pub fn new() -> Self {
        match detect_backend() {
            #[cfg(feature = "cuda")]
            BackendType::Cuda => match CudaEvaluator::new(0) {
                Ok(eval) => Self::Cuda(eval),
                Err(err) => {
                    warn!("CUDA backend init failed, falling back to CPU: {err}");
                    Self::Cpu(CpuEvaluator::new())
                }
            },
            _ => Self::Cpu(CpuEvaluator::new()),
        }
    }

    pub fn backend_type(&self) -> BackendType {
        match self {
            #[cfg(feature = "cuda")]
            Self::Cuda(_) => BackendType::Cuda,
            Self::Cpu(_) => BackendType::Cpu,
        }
    }

    /// `Z := Wᵀ·X + Z`, then classification accuracy; `z` is updated in
    /// place like the device-level pipeline.
    pub fn accuracy(
        &self,
        w: HostMatrix<'_>,
        x: HostMatrix<'_>,
        y: HostMatrix<'_>,
        z: &mut HostMatrixMut<'_>,
        verbose: bool,
    ) -> BackendResult<f32> {
        match self {
            #[cfg(feature = "cuda")]
            Self::Cuda(backend) => run_accuracy(backend, w, x, y, z, verbose),
            Self::Cpu(backend) => run_accuracy(backend, w, x, y, z, verbose),
        }
    }

    /// Unnormalized total cross-entropy of `p` against `y`.
    pub fn log_loss(
        &self,
        p: HostMatrix<'_>,
        y: HostMatrix<'_>,
        verbose: bool,
    ) -> BackendResult<f32> {
        match self {
            #[cfg(feature = "cuda")]
            Self::Cuda(backend) => run_log_loss(backend, p, y, verbose),
            Self::Cpu(backend) => run_log_loss(backend, p, y, verbose),
        }
    }
}

impl Default for KernelDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn run_accuracy<B: EvalBackend>(
    backend: &B,
    w: HostMatrix<'_>,
    x: HostMatrix<'_>,
    y: HostMatrix<'_>,
    z: &mut HostMatrixMut<'_>,
    verbose: bool,
) -> BackendResult<f32> {
    let w_dev = backend.upload(w.rows, w.cols, w.data)?;
    let x_dev = backend.upload(x.rows, x.cols, x.data)?;
    let y_dev = backend.upload(y.rows, y.cols, y.data)?;
    let mut z_dev = backend.upload(z.rows, z.cols, z.data)?;
    let acc = evaluate_accuracy(backend, &w_dev, &x_dev, &y_dev, &mut z_dev, verbose)?;
    let updated = backend.download(&z_dev)?;
    z.data.copy_from_slice(&updated);
    Ok(acc)
}

fn run_log_loss<B: EvalBackend>(
    backend: &B,
    p: HostMatrix<'_>,
    y: HostMatrix<'_>,
    verbose: bool,
) -> BackendResult<f32> {
    let p_dev = backend.upload(p.rows, p.cols, p.data)?;
    let y_dev = backend.upload(y.rows, y.cols, y.data)?;
    evaluate_log_loss(backend, &p_dev, &y_dev, verbose)
}
