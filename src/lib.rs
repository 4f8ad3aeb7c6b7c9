//! linclf-kernels: accelerator-resident evaluation metrics for linear
//! classifiers.
//!
//! Two entry points, each an independent pipeline over a shared kernel
//! family:
//! - [`ops::evaluate_accuracy`]: dense GEMM (`Z := Wᵀ·X + Z`), per-column
//!   arg-max with atomic vote counting, scalar copy-back.
//! - [`ops::evaluate_log_loss`]: element-wise `ln`, dense GEMM
//!   (`Z := -Yᵀ·log P`), diagonal-trace reduction.
//!
//! The pipelines are generic over [`backend_trait::EvalBackend`]. The
//! CUDA backend (cuBLAS for the multiplies, NVRTC-compiled kernels for
//! the transform and reductions, via cudarc's dynamic loading) and the
//! CPU reference backend implement identical column-major semantics, so
//! the CPU path doubles as the test oracle for the GPU path.
//!
//! # Quick start
//!
//! ```ignore
//! use linclf_kernels::{HostMatrix, HostMatrixMut, KernelDispatcher};
//!
//! let dispatcher = KernelDispatcher::new(); // CUDA if present, else CPU
//! let acc = dispatcher.accuracy(w, x, y, &mut z, false)?;
//! let nll = dispatcher.log_loss(p, y, false)?;
//! ```

pub mod backend_trait;
pub mod cpu_kernels;
#[cfg(feature = "cuda")]
pub mod cuda_kernels;
pub mod kernel_dispatcher;
pub mod kernel_types;
pub mod layout;
pub mod ops;
pub mod runtime_detection;

pub use backend_trait::{BackendError, BackendResult, EvalBackend};
pub use cpu_kernels::{CpuEvaluator, CpuMatrix};
#[cfg(feature = "cuda")]
pub use cuda_kernels::{CudaEvaluator, CudaMatrix};
pub use kernel_dispatcher::{HostMatrix, HostMatrixMut, KernelDispatcher};
pub use kernel_types::GemmConfig;
pub use layout::{col_major, MatrixDims};
pub use ops::{evaluate_accuracy, evaluate_log_loss};
pub use runtime_detection::{detect_backend, BackendType};
