use thiserror::Error;

use crate::kernel_types::GemmConfig;
use crate::layout::MatrixDims;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("cuda driver error: {0}")]
    Cuda(String),
    #[error("kernel compile error: {0}")]
    Compile(String),
    #[error("kernel not found: {0}")]
    KernelMissing(&'static str),
    #[error("gemm failed with status {status} (m={m}, n={n}, k={k})")]
    Gemm {
        status: &'static str,
        m: usize,
        n: usize,
        k: usize,
    },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(feature = "cuda")]
impl From<cudarc::driver::DriverError> for BackendError {
    fn from(err: cudarc::driver::DriverError) -> Self {
        BackendError::Cuda(format!("{err:?}"))
    }
}

/// Execution backend for the metric pipelines.
///
/// Every method keeps the crate-wide column-major convention (see
/// [`crate::layout::col_major`]). Shape mismatches are programmer errors
/// and assert; `Err` is reserved for runtime failures — driver errors,
/// allocation failures, and a cuBLAS GEMM reporting a non-success status
/// (which is escalated to [`BackendError::Gemm`] rather than computing on
/// a possibly-unwritten buffer).
pub trait EvalBackend {
    type Matrix: MatrixDims;

    /// Allocate a zero-filled `rows x cols` device matrix.
    fn alloc_zeroed(&self, rows: usize, cols: usize) -> BackendResult<Self::Matrix>;

    /// Copy a column-major host buffer to a fresh device matrix.
    fn upload(&self, rows: usize, cols: usize, data: &[f32]) -> BackendResult<Self::Matrix>;

    /// Copy a device matrix back to a column-major host vector.
    fn download(&self, m: &Self::Matrix) -> BackendResult<Vec<f32>>;

    /// `C := alpha * op(A) * op(B) + beta * C`.
    fn gemm(
        &self,
        cfg: GemmConfig,
        a: &Self::Matrix,
        b: &Self::Matrix,
        c: &mut Self::Matrix,
    ) -> BackendResult<()>;

    /// `dst[i, j] := ln(src[i, j])` for every element. No clamping:
    /// non-positive inputs produce `-inf`/NaN and propagate.
    fn log_map(&self, src: &Self::Matrix, dst: &mut Self::Matrix) -> BackendResult<()>;

    /// `dst[i, j] := ln(src[i, j])` where `labels[i, j] > 0`, else `0`.
    ///
    /// Cross-entropy treats `0 * ln(0)` as 0, so entries carrying no
    /// label mass must not poison the downstream product with
    /// `0 * -inf = NaN`. Entries with positive label mass stay
    /// unclamped: label mass on a zero probability still yields `-inf`.
    fn masked_log_map(
        &self,
        src: &Self::Matrix,
        labels: &Self::Matrix,
        dst: &mut Self::Matrix,
    ) -> BackendResult<()>;

    /// For each column of `scores`, find the arg-max row (ties keep the
    /// lowest index) and count a vote when `labels[argmax, col] >= 0.5`.
    /// Returns the vote count.
    fn argmax_vote(&self, scores: &Self::Matrix, labels: &Self::Matrix) -> BackendResult<u32>;

    /// Sum of `z[k, k]` for `k in 0..min(rows, cols)`, accumulated into an
    /// explicitly zero-initialized scalar.
    fn trace_sum(&self, z: &Self::Matrix) -> BackendResult<f32>;
}
